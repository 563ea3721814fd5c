//! 配置校验模块
//!
//! 校验规则：
//! - 表达式长度不超过 `MAX_EXPRESSION_LEN`
//! - 表达式不含控制字符 (换行/制表符除外)
//!
//! 表达式本身的语法由 router 在重配置时编译校验。

use contracts::{ContractError, RouterOptions, MAX_EXPRESSION_LEN};
use validator::Validate;

/// 校验 RouterOptions 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(options: &RouterOptions) -> Result<(), ContractError> {
    validate_lengths(options)?;
    validate_characters("ShouldEmitSinkAExpression", &options.should_emit_sink_a_expression)?;
    validate_characters("ShouldEmitSinkBExpression", &options.should_emit_sink_b_expression)?;
    Ok(())
}

/// 校验表达式长度 (validator derive)
fn validate_lengths(options: &RouterOptions) -> Result<(), ContractError> {
    let Err(errors) = options.validate() else {
        return Ok(());
    };

    let mut fields: Vec<_> = errors.field_errors().into_keys().collect();
    fields.sort();
    let field = fields
        .first()
        .map(|f| serialized_name(f))
        .unwrap_or("RouterOptions");
    Err(ContractError::config_validation(
        field,
        format!("expression must be at most {MAX_EXPRESSION_LEN} characters"),
    ))
}

/// 校验控制字符
fn validate_characters(field: &str, expression: &str) -> Result<(), ContractError> {
    match expression
        .chars()
        .find(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
    {
        Some(c) => Err(ContractError::config_validation(
            field,
            format!("control character U+{:04X} is not allowed", c as u32),
        )),
        None => Ok(()),
    }
}

fn serialized_name(field: &str) -> &'static str {
    match field {
        "should_emit_sink_a_expression" => "ShouldEmitSinkAExpression",
        "should_emit_sink_b_expression" => "ShouldEmitSinkBExpression",
        _ => "RouterOptions",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_options() {
        assert!(validate(&RouterOptions::new("Level >= Warning", "")).is_ok());
        assert!(validate(&RouterOptions::new("Level >= Warning\n&& true", "")).is_ok());
    }

    #[test]
    fn test_expression_too_long() {
        let long = "true || ".repeat(2000) + "true";
        let err = validate(&RouterOptions::new("", long)).unwrap_err();
        match err {
            ContractError::ConfigValidation { field, .. } => {
                assert_eq!(field, "ShouldEmitSinkBExpression")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_control_character() {
        let err = validate(&RouterOptions::new("true\u{0}", "")).unwrap_err();
        assert!(err.to_string().contains("U+0000"));
    }
}
