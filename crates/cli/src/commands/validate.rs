//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use config_loader::{ConfigLoader, RouterOptions};
use contracts::DestinationId;
use expression::ExpressionEngine;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    destinations: Vec<DestinationReport>,
}

#[derive(Serialize)]
struct DestinationReport {
    destination: String,
    expression: String,
    compiled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: Vec::new(),
            destinations: Vec::new(),
        };
    }

    match ConfigLoader::load_from_path(&args.config) {
        Ok(options) => {
            let destinations = check_expressions(&options);
            ValidationResult {
                valid: destinations.iter().all(|d| d.compiled),
                config_path,
                error: None,
                warnings: collect_warnings(&options),
                destinations,
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: Vec::new(),
            destinations: Vec::new(),
        },
    }
}

/// Compile both expressions the way the router would
fn check_expressions(options: &RouterOptions) -> Vec<DestinationReport> {
    let engine = ExpressionEngine::new();
    let normalized = options.normalized();

    DestinationId::BOTH
        .into_iter()
        .map(|destination| {
            let expression = normalized.expression(destination).to_string();
            let error = engine.check(&expression).err().map(|e| e.to_string());
            DestinationReport {
                destination: destination.to_string(),
                compiled: error.is_none(),
                expression,
                error,
            }
        })
        .collect()
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(options: &RouterOptions) -> Vec<String> {
    DestinationId::BOTH
        .into_iter()
        .filter(|destination| options.expression(*destination).trim().is_empty())
        .map(|destination| {
            format!("{destination} has no expression - it will receive no events")
        })
        .collect()
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }

    if !result.destinations.is_empty() {
        println!();
        for report in &result.destinations {
            let mark = if report.compiled { "✓" } else { "✗" };
            println!("  {} {}: {}", mark, report.destination, report.expression);
            if let Some(ref error) = report.error {
                println!("      {}", error);
            }
        }
    }

    if !result.warnings.is_empty() {
        println!("\n⚠ Warnings:");
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn validate(content: &str) -> ValidationResult {
        let dir = tempdir().unwrap();
        let path = dir.path().join("router.toml");
        fs::write(&path, content).unwrap();
        validate_config(&ValidateArgs {
            config: path,
            json: true,
        })
    }

    #[test]
    fn test_valid_config_with_warning() {
        let result = validate("[Router]\nShouldEmitSinkAExpression = \"Level >= Error\"\n");
        assert!(result.valid);
        assert_eq!(result.destinations.len(), 2);
        assert_eq!(result.destinations[1].expression, "false");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("sink B"));
    }

    #[test]
    fn test_expression_that_does_not_compile() {
        let result = validate("ShouldEmitSinkAExpression = \"Level >=\"\nShouldEmitSinkBExpression = \"true\"\n");
        assert!(!result.valid);
        assert!(!result.destinations[0].compiled);
        assert!(result.destinations[0].error.is_some());
        assert!(result.destinations[1].compiled);
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: "/nonexistent/router.toml".into(),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
