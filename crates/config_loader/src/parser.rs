//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。
//!
//! 路由表达式可以写在文件顶层，也可以放在 `router` / `Router` 表下：
//!
//! ```toml
//! [Router]
//! ShouldEmitSinkAExpression = "Level >= Warning"
//! ShouldEmitSinkBExpression = 'Properties.ContainsKey("audit")'
//! ```

use contracts::{ContractError, RouterOptions};

/// Section names searched before falling back to the top level
const SECTION_NAMES: [&str; 2] = ["Router", "router"];

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<RouterOptions, ContractError> {
    let table: toml::Table = toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })?;

    let section = SECTION_NAMES
        .iter()
        .find_map(|name| table.get(*name).cloned())
        .unwrap_or(toml::Value::Table(table));

    section.try_into().map_err(|e: toml::de::Error| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<RouterOptions, ContractError> {
    let mut root: serde_json::Value =
        serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
            message: format!("JSON parse error: {e}"),
            source: Some(Box::new(e)),
        })?;

    let section = SECTION_NAMES
        .iter()
        .find_map(|name| root.get_mut(*name).map(serde_json::Value::take))
        .unwrap_or(root);

    serde_json::from_value(section).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<RouterOptions, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_section() {
        let content = r#"
[Router]
ShouldEmitSinkAExpression = "Level >= Warning"
ShouldEmitSinkBExpression = 'Properties.ContainsKey("audit")'
"#;
        let options = parse_toml(content).unwrap();
        assert_eq!(options.should_emit_sink_a_expression, "Level >= Warning");
        assert_eq!(
            options.should_emit_sink_b_expression,
            r#"Properties.ContainsKey("audit")"#
        );
    }

    #[test]
    fn test_parse_toml_top_level_snake_case() {
        let content = r#"should_emit_sink_a_expression = "true""#;
        let options = parse_toml(content).unwrap();
        assert_eq!(options.should_emit_sink_a_expression, "true");
        assert_eq!(options.should_emit_sink_b_expression, "");
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{ "Router": { "ShouldEmitSinkBExpression": "Level == Error" } }"#;
        let options = parse_json(content).unwrap();
        assert_eq!(options.should_emit_sink_a_expression, "");
        assert_eq!(options.should_emit_sink_b_expression, "Level == Error");

        let flat = parse_json(r#"{ "ShouldEmitSinkAExpression": "true" }"#).unwrap();
        assert_eq!(flat.should_emit_sink_a_expression, "true");
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let result = parse_toml("invalid toml [[[");
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }

    #[test]
    fn test_parse_wrong_type() {
        let result = parse_toml("ShouldEmitSinkAExpression = 3");
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
