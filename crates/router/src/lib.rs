//! # Router
//!
//! 条件双路由模块。
//!
//! 负责：
//! - 按两条可热更新的表达式，将每个 `LogEvent` 独立转发到 sink A / sink B
//! - 配置变更时重新编译并原子替换谓词，不阻塞 `emit`
//! - 求值失败时放行 (fail-open)，未配置时拒绝 (default-deny)

pub mod builder;
pub mod error;
pub mod metrics;
pub mod reconfigure;
pub mod router;
pub mod sinks;
pub mod slot;

use std::any::Any;

pub use builder::{router_sink, DestinationConfiguration, RouterSinkBuilder};
pub use contracts::{DestinationId, EventSink, LogEvent, RouterOptions};
pub use error::RouterError;
pub use metrics::{DestinationSnapshot, RouterMetrics, RouterMetricsSnapshot};
pub use reconfigure::{ReconfigureOutcome, RouterSettings, DEFAULT_RECONFIGURE_TIMEOUT};
pub use router::RouterSink;
pub use sinks::{FileSink, FileSinkConfig, LogSink, MemorySink};
pub use slot::{PredicateSlot, Published, RoutingSlots};

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
