//! Router 指标收集模块
//!
//! 路由决策、重配置与诊断事件的 Prometheus 指标。

use contracts::{DestinationId, Diagnostic};
use metrics::{counter, gauge, histogram};

/// Histogram of reconfiguration durations, in milliseconds
pub const RECONFIGURATION_DURATION_METRIC: &str = "sink_router_reconfiguration_duration_ms";

/// 记录一次路由决策
///
/// 每个事件对每个目的地各调用一次。
pub fn record_event_routed(destination: DestinationId, forwarded: bool) {
    let decision = if forwarded { "forwarded" } else { "skipped" };
    counter!(
        "sink_router_events_routed_total",
        "destination" => destination.label(),
        "decision" => decision
    )
    .increment(1);
}

/// 记录表达式求值失败（fail-open 转发）
pub fn record_fail_open(destination: DestinationId) {
    counter!(
        "sink_router_evaluation_failures_total",
        "destination" => destination.label()
    )
    .increment(1);
}

/// 记录目的地写入/关闭失败
pub fn record_destination_failure(destination: DestinationId, stage: &'static str) {
    counter!(
        "sink_router_destination_failures_total",
        "destination" => destination.label(),
        "stage" => stage
    )
    .increment(1);
}

/// 记录表达式编译失败
pub fn record_compile_failure(destination: DestinationId) {
    counter!(
        "sink_router_compile_failures_total",
        "destination" => destination.label()
    )
    .increment(1);
}

/// 记录一次重配置结果
pub fn record_reconfiguration(outcome: &'static str) {
    counter!("sink_router_reconfigurations_total", "outcome" => outcome).increment(1);
}

/// 记录当前生效的配置版本
pub fn record_active_version(version: u64) {
    gauge!("sink_router_active_version").set(version as f64);
}

/// 记录重配置耗时（编译 + 发布）
pub fn record_reconfiguration_duration_ms(duration_ms: f64) {
    histogram!(RECONFIGURATION_DURATION_METRIC).record(duration_ms);
}

/// 按诊断类型更新指标
///
/// 由 `TracingSelfLog` 对每条诊断调用。
pub fn record_diagnostic(diagnostic: &Diagnostic) {
    match diagnostic {
        Diagnostic::ConfigurationChanged { .. } => {
            counter!("sink_router_configuration_changes_total").increment(1);
        }
        Diagnostic::ExpressionCompiled { .. } | Diagnostic::ExpressionSuperseded { .. } => {}
        Diagnostic::ExpressionCompileFailed { destination, .. } => {
            record_compile_failure(*destination);
        }
        Diagnostic::ExpressionEvaluationFailed { destination, .. } => {
            record_fail_open(*destination);
        }
        Diagnostic::ReconfigurationApplied { version, failed, .. } => {
            record_active_version(*version);
            record_reconfiguration(if *failed == 0 { "applied" } else { "partial" });
        }
        Diagnostic::ReconfigurationAbandoned { .. } => record_reconfiguration("abandoned"),
        Diagnostic::DestinationEmitFailed { destination, .. } => {
            record_destination_failure(*destination, "emit");
        }
        Diagnostic::DestinationCloseFailed { destination, .. } => {
            record_destination_failure(*destination, "close");
        }
    }
}

/// 统计摘要
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}
