//! # Config Loader
//!
//! Configuration loading and change-source module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files into `RouterOptions`
//! - Validate configuration legality
//! - Supply options to the router as an `OptionsSource`
//!   (`OptionsMonitor`, optionally fed by a `FileOptionsWatcher`)
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let options = ConfigLoader::load_from_path(Path::new("router.toml")).unwrap();
//! println!("sink A: {}", options.should_emit_sink_a_expression);
//! ```

mod monitor;
mod parser;
mod validator;
mod watcher;

pub use contracts::RouterOptions;
pub use monitor::OptionsMonitor;
pub use parser::ConfigFormat;
pub use watcher::{FileOptionsWatcher, DEFAULT_WATCH_INTERVAL};

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<RouterOptions, ContractError> {
        let format = Self::format_of(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<RouterOptions, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Serialize RouterOptions to JSON string
    pub fn to_json(options: &RouterOptions) -> Result<String, ContractError> {
        serde_json::to_string_pretty(options)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }

    /// Infer configuration format from file extension
    pub fn format_of(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}

impl ConfigLoader {
    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<RouterOptions, ContractError> {
        let options = parser::parse(content, format)?;
        validator::validate(&options)?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTER_TOML: &str = r#"
[Router]
ShouldEmitSinkAExpression = "Level >= Warning"
ShouldEmitSinkBExpression = ""
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(ROUTER_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let options = result.unwrap();
        assert_eq!(options.should_emit_sink_a_expression, "Level >= Warning");
        assert_eq!(options.normalized().should_emit_sink_b_expression, "false");
    }

    #[test]
    fn test_round_trip_json() {
        let options = ConfigLoader::load_from_str(ROUTER_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&options).unwrap();
        assert!(json.contains("ShouldEmitSinkAExpression"));
        let back = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(options, back);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = format!("ShouldEmitSinkAExpression = \"{}\"", "a".repeat(9000));
        let result = ConfigLoader::load_from_str(&content, ConfigFormat::Toml);
        assert!(matches!(result, Err(ContractError::ConfigValidation { .. })));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ConfigLoader::load_from_path(Path::new("router.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }
}
