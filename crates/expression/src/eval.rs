//! Tree-walking evaluator for bound expressions.

use chrono::{Datelike, Timelike};
use contracts::LogEvent;
use std::borrow::Cow;
use std::cmp::Ordering;

use crate::ast::{BinaryOp, Const, Expr, Member, Method};
use crate::error::EvalError;
use crate::value::Value;

type EResult<T> = Result<T, EvalError>;

/// Evaluate a predicate root; anything but a bool is an error
pub fn eval_predicate(expr: &Expr, event: &LogEvent) -> EResult<bool> {
    eval(expr, event)?.as_bool("expression result")
}

pub fn eval<'a>(expr: &'a Expr, event: &'a LogEvent) -> EResult<Value<'a>> {
    match expr {
        Expr::Const(c) => Ok(constant(c)),
        Expr::This => Ok(Value::Event(event)),
        Expr::Member { target, member } => {
            let target = eval(target, event)?;
            member_of(target, *member)
        }
        Expr::Call {
            target,
            method,
            args,
        } => {
            let target = eval(target, event)?;
            let args = args
                .iter()
                .map(|arg| eval(arg, event))
                .collect::<EResult<Vec<_>>>()?;
            call(target, *method, &args)
        }
        Expr::Index { target, index } => {
            let target = eval(target, event)?;
            let index = eval(index, event)?;
            index_into(target, &index)
        }
        Expr::Not(operand) => Ok(Value::Bool(!eval(operand, event)?.as_bool("'!'")?)),
        Expr::Neg(operand) => match eval(operand, event)? {
            Value::Int(i) => i
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| EvalError::new("integer overflow in negation")),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(EvalError::new(format!("'-' expects number, got {}", other.kind()))),
        },
        // short-circuit: the right side is not evaluated when the left decides
        Expr::And(left, right) => {
            if !eval(left, event)?.as_bool("'&&'")? {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(eval(right, event)?.as_bool("'&&'")?))
        }
        Expr::Or(left, right) => {
            if eval(left, event)?.as_bool("'||'")? {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(eval(right, event)?.as_bool("'||'")?))
        }
        Expr::Compare { op, left, right } => {
            let l = eval(left, event)?;
            let r = eval(right, event)?;
            compare(*op, &l, &r).map(Value::Bool)
        }
    }
}

fn constant(c: &Const) -> Value<'_> {
    match c {
        Const::Bool(b) => Value::Bool(*b),
        Const::Int(i) => Value::Int(*i),
        Const::Float(f) => Value::Float(*f),
        Const::String(s) => Value::Str(Cow::Borrowed(s.as_str())),
        Const::Level(level) => Value::Level(*level),
        Const::Null => Value::Null,
    }
}

fn compare(op: BinaryOp, l: &Value<'_>, r: &Value<'_>) -> EResult<bool> {
    let result = match op {
        BinaryOp::Eq => l.loose_eq(r),
        BinaryOp::Ne => !l.loose_eq(r),
        BinaryOp::Lt => l.try_cmp(r)? == Ordering::Less,
        BinaryOp::Le => l.try_cmp(r)? != Ordering::Greater,
        BinaryOp::Gt => l.try_cmp(r)? == Ordering::Greater,
        BinaryOp::Ge => l.try_cmp(r)? != Ordering::Less,
        BinaryOp::And | BinaryOp::Or => {
            return Err(EvalError::new(format!(
                "'{}' is not a comparison",
                op.symbol()
            )))
        }
    };
    Ok(result)
}

fn member_of(target: Value<'_>, member: Member) -> EResult<Value<'_>> {
    let value = match (target, member) {
        (Value::Event(e), Member::Timestamp) => Value::Timestamp(e.timestamp),
        (Value::Event(e), Member::Level) => Value::Level(e.level),
        (Value::Event(e), Member::MessageTemplate) => Value::Template(&e.message_template),
        (Value::Event(e), Member::Properties) => Value::Properties(&e.properties),
        (Value::Event(e), Member::Exception) => match &e.exception {
            Some(text) => Value::Str(Cow::Borrowed(text.as_str())),
            None => Value::Null,
        },
        (Value::Template(t), Member::Text) => Value::Str(Cow::Borrowed(t.text())),
        (Value::Properties(p), Member::Count) => Value::Int(p.len() as i64),
        (Value::Sequence(items), Member::Count | Member::Length) => Value::Int(items.len() as i64),
        (Value::Structure(fields), Member::Count) => Value::Int(fields.len() as i64),
        (Value::Str(s), Member::Length) => Value::Int(s.chars().count() as i64),
        (Value::Timestamp(ts), Member::Year) => Value::Int(i64::from(ts.year())),
        (Value::Timestamp(ts), Member::Month) => Value::Int(i64::from(ts.month())),
        (Value::Timestamp(ts), Member::Day) => Value::Int(i64::from(ts.day())),
        (Value::Timestamp(ts), Member::Hour) => Value::Int(i64::from(ts.hour())),
        (Value::Timestamp(ts), Member::Minute) => Value::Int(i64::from(ts.minute())),
        (Value::Timestamp(ts), Member::Second) => Value::Int(i64::from(ts.second())),
        (other, member) => {
            return Err(EvalError::new(format!(
                "{} has no member '{}'",
                other.kind(),
                member.name()
            )))
        }
    };
    Ok(value)
}

fn str_arg<'v>(args: &'v [Value<'_>], i: usize, method: Method) -> EResult<&'v str> {
    args.get(i)
        .ok_or_else(|| EvalError::new(format!("'{}' is missing an argument", method.name())))?
        .as_str(method.name())
}

fn call<'a>(target: Value<'a>, method: Method, args: &[Value<'_>]) -> EResult<Value<'a>> {
    if matches!(target, Value::Null) {
        return Err(EvalError::new(format!(
            "cannot call '{}' on null",
            method.name()
        )));
    }
    if method == Method::ToString {
        return Ok(Value::Str(Cow::Owned(target.to_string())));
    }

    let value = match (target, method) {
        (Value::Event(e), Method::RenderMessage) => Value::Str(Cow::Owned(e.render_message())),
        (Value::Properties(p), Method::ContainsKey) => {
            Value::Bool(p.contains_key(str_arg(args, 0, method)?))
        }
        (Value::Structure(fields), Method::ContainsKey) => {
            Value::Bool(fields.contains_key(str_arg(args, 0, method)?))
        }
        (Value::Str(s), Method::Contains) => Value::Bool(s.contains(str_arg(args, 0, method)?)),
        (Value::Sequence(items), Method::Contains) => {
            let needle = args
                .first()
                .ok_or_else(|| EvalError::new("'Contains' is missing an argument"))?;
            Value::Bool(
                items
                    .iter()
                    .any(|item| Value::from_property(item).loose_eq(needle)),
            )
        }
        (Value::Str(s), Method::StartsWith) => {
            Value::Bool(s.starts_with(str_arg(args, 0, method)?))
        }
        (Value::Str(s), Method::EndsWith) => Value::Bool(s.ends_with(str_arg(args, 0, method)?)),
        (Value::Str(s), Method::ToLower) => Value::Str(Cow::Owned(s.to_lowercase())),
        (Value::Str(s), Method::ToUpper) => Value::Str(Cow::Owned(s.to_uppercase())),
        (other, method) => {
            return Err(EvalError::new(format!(
                "{} has no method '{}'",
                other.kind(),
                method.name()
            )))
        }
    };
    Ok(value)
}

fn index_into<'a>(target: Value<'a>, index: &Value<'_>) -> EResult<Value<'a>> {
    match (target, index) {
        (Value::Properties(p), Value::Str(key)) => p
            .get(key.as_ref())
            .map(Value::from_property)
            .ok_or_else(|| EvalError::new(format!("property '{key}' not found"))),
        (Value::Structure(fields), Value::Str(key)) => fields
            .get(key.as_ref())
            .map(Value::from_property)
            .ok_or_else(|| EvalError::new(format!("field '{key}' not found"))),
        (Value::Sequence(items), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| items.get(i))
            .map(Value::from_property)
            .ok_or_else(|| {
                EvalError::new(format!(
                    "index {i} is out of range for sequence of length {}",
                    items.len()
                ))
            }),
        (target, index) => Err(EvalError::new(format!(
            "cannot index {} with {}",
            target.kind(),
            index.kind()
        ))),
    }
}
