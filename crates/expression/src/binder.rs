//! Name resolution and static type checking.
//!
//! Turns a parsed [`Syntax`] tree into an [`Expr`] with every identifier,
//! member and method resolved. Anything that cannot be resolved is a
//! compile error; checks that depend on event data (property lookups) are
//! deferred to evaluation through [`Ty::Dynamic`].

use contracts::LogLevel;

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::Span;

type BResult<T> = Result<T, ParseError>;

/// Names under which the level enumeration can be referenced
const LEVEL_TYPE_NAMES: [&str; 2] = ["LogEventLevel", "LogLevel"];

/// Bind `syntax` and require a boolean result
pub fn bind_predicate(syntax: &Syntax) -> BResult<Expr> {
    let (expr, ty) = bind(syntax)?;
    match ty {
        Ty::Bool | Ty::Dynamic => Ok(expr),
        other => Err(ParseError::at(
            syntax.span(),
            format!("expression must evaluate to bool, found {}", other.name()),
        )),
    }
}

fn bind(syntax: &Syntax) -> BResult<(Expr, Ty)> {
    match syntax {
        Syntax::Literal(lit, _) => Ok(bind_literal(lit)),
        Syntax::Ident(name, span) => bind_ident(name, *span),
        Syntax::Member { target, name, span } => bind_member(target, name, *span),
        Syntax::Call {
            target,
            name,
            args,
            span,
        } => bind_call(target, name, args, *span),
        Syntax::Index {
            target,
            index,
            span,
        } => bind_index(target, index, *span),
        Syntax::Unary { op, operand, span } => bind_unary(*op, operand, *span),
        Syntax::Binary {
            op,
            left,
            right,
            span,
        } => bind_binary(*op, left, right, *span),
    }
}

fn bind_literal(lit: &Literal) -> (Expr, Ty) {
    match lit {
        Literal::Bool(b) => (Expr::Const(Const::Bool(*b)), Ty::Bool),
        Literal::Int(i) => (Expr::Const(Const::Int(*i)), Ty::Number),
        Literal::Float(f) => (Expr::Const(Const::Float(*f)), Ty::Number),
        Literal::String(s) => (Expr::Const(Const::String(s.clone())), Ty::String),
        Literal::Null => (Expr::Const(Const::Null), Ty::Null),
    }
}

fn bind_ident(name: &str, span: Span) -> BResult<(Expr, Ty)> {
    if name == "this" {
        return Ok((Expr::This, Ty::Event));
    }

    if let Some(member) = event_member(name) {
        let ty = member_ty(member);
        return Ok((
            Expr::Member {
                target: Box::new(Expr::This),
                member,
            },
            ty,
        ));
    }

    if let Some(level) = level_constant(name) {
        return Ok((Expr::Const(Const::Level(level)), Ty::Level));
    }

    if LEVEL_TYPE_NAMES.contains(&name) {
        return Err(ParseError::at(
            span,
            format!("'{name}' is a type, reference one of its levels like '{name}.Warning'"),
        ));
    }

    Err(ParseError::at(span, format!("unknown identifier '{name}'")))
}

fn bind_member(target: &Syntax, name: &str, span: Span) -> BResult<(Expr, Ty)> {
    // `LogEventLevel.Warning`
    if let Syntax::Ident(type_name, _) = target {
        if LEVEL_TYPE_NAMES.contains(&type_name.as_str()) {
            return level_constant(name)
                .map(|level| (Expr::Const(Const::Level(level)), Ty::Level))
                .ok_or_else(|| {
                    ParseError::at(span, format!("'{type_name}' has no level named '{name}'"))
                });
        }
    }

    let (target, target_ty) = bind(target)?;
    let member = resolve_member(target_ty, name)
        .ok_or_else(|| ParseError::at(span, format!("{} has no member '{name}'", target_ty.name())))?;

    let ty = match target_ty {
        Ty::Dynamic => dynamic_member_ty(member),
        _ => member_ty(member),
    };
    Ok((
        Expr::Member {
            target: Box::new(target),
            member,
        },
        ty,
    ))
}

fn bind_call(target: &Syntax, name: &str, args: &[Syntax], span: Span) -> BResult<(Expr, Ty)> {
    let (target, target_ty) = bind(target)?;
    let method = resolve_method(target_ty, name)
        .ok_or_else(|| ParseError::at(span, format!("{} has no method '{name}'", target_ty.name())))?;

    if args.len() != method.arity() {
        return Err(ParseError::at(
            span,
            format!(
                "'{}' takes {} argument(s), got {}",
                method.name(),
                method.arity(),
                args.len()
            ),
        ));
    }

    let mut bound = Vec::with_capacity(args.len());
    for arg in args {
        let (expr, ty) = bind(arg)?;
        let expects_string = matches!(
            method,
            Method::ContainsKey | Method::StartsWith | Method::EndsWith
        ) || (method == Method::Contains && target_ty == Ty::String);
        if expects_string && !matches!(ty, Ty::String | Ty::Dynamic) {
            return Err(ParseError::at(
                arg.span(),
                format!("'{}' expects a string argument, got {}", method.name(), ty.name()),
            ));
        }
        bound.push(expr);
    }

    let ty = match method {
        Method::ContainsKey | Method::Contains | Method::StartsWith | Method::EndsWith => Ty::Bool,
        Method::ToLower | Method::ToUpper | Method::ToString | Method::RenderMessage => Ty::String,
    };
    Ok((
        Expr::Call {
            target: Box::new(target),
            method,
            args: bound,
        },
        ty,
    ))
}

fn bind_index(target: &Syntax, index: &Syntax, span: Span) -> BResult<(Expr, Ty)> {
    let (target, target_ty) = bind(target)?;
    let (index, index_ty) = bind(index)?;

    match target_ty {
        Ty::Properties if !matches!(index_ty, Ty::String | Ty::Dynamic) => Err(ParseError::at(
            span,
            format!("properties are indexed by string, got {}", index_ty.name()),
        )),
        Ty::Properties | Ty::Dynamic => Ok((
            Expr::Index {
                target: Box::new(target),
                index: Box::new(index),
            },
            Ty::Dynamic,
        )),
        other => Err(ParseError::at(
            span,
            format!("cannot index into {}", other.name()),
        )),
    }
}

fn bind_unary(op: UnaryOp, operand: &Syntax, span: Span) -> BResult<(Expr, Ty)> {
    let (expr, ty) = bind(operand)?;
    match op {
        UnaryOp::Not => {
            expect_ty(ty, &[Ty::Bool], "!", span)?;
            Ok((Expr::Not(Box::new(expr)), Ty::Bool))
        }
        UnaryOp::Neg => {
            expect_ty(ty, &[Ty::Number], "-", span)?;
            Ok((Expr::Neg(Box::new(expr)), Ty::Number))
        }
    }
}

fn bind_binary(op: BinaryOp, left: &Syntax, right: &Syntax, span: Span) -> BResult<(Expr, Ty)> {
    let (l, lt) = bind(left)?;
    let (r, rt) = bind(right)?;

    match op {
        BinaryOp::And | BinaryOp::Or => {
            expect_ty(lt, &[Ty::Bool], op.symbol(), left.span())?;
            expect_ty(rt, &[Ty::Bool], op.symbol(), right.span())?;
            let expr = if op == BinaryOp::And {
                Expr::And(Box::new(l), Box::new(r))
            } else {
                Expr::Or(Box::new(l), Box::new(r))
            };
            Ok((expr, Ty::Bool))
        }
        BinaryOp::Eq | BinaryOp::Ne => {
            let comparable = lt == rt
                || matches!(lt, Ty::Dynamic | Ty::Null)
                || matches!(rt, Ty::Dynamic | Ty::Null);
            if !comparable {
                return Err(mismatch(op, lt, rt, span));
            }
            Ok((compare(op, l, r), Ty::Bool))
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let orderable = [Ty::Number, Ty::String, Ty::Level, Ty::Timestamp, Ty::Dynamic];
            if !orderable.contains(&lt) || !orderable.contains(&rt) {
                return Err(mismatch(op, lt, rt, span));
            }
            if lt != rt && lt != Ty::Dynamic && rt != Ty::Dynamic {
                return Err(mismatch(op, lt, rt, span));
            }
            Ok((compare(op, l, r), Ty::Bool))
        }
    }
}

fn compare(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Compare {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn mismatch(op: BinaryOp, lt: Ty, rt: Ty, span: Span) -> ParseError {
    ParseError::at(
        span,
        format!(
            "operator '{}' cannot be applied to {} and {}",
            op.symbol(),
            lt.name(),
            rt.name()
        ),
    )
}

fn expect_ty(actual: Ty, allowed: &[Ty], op: &str, span: Span) -> BResult<()> {
    if actual == Ty::Dynamic || allowed.contains(&actual) {
        return Ok(());
    }
    Err(ParseError::at(
        span,
        format!("operator '{op}' cannot be applied to {}", actual.name()),
    ))
}

/// Event members, matched case-insensitively
fn event_member(name: &str) -> Option<Member> {
    let member = match name.to_ascii_lowercase().as_str() {
        "timestamp" => Member::Timestamp,
        "level" => Member::Level,
        "messagetemplate" => Member::MessageTemplate,
        "properties" => Member::Properties,
        "exception" => Member::Exception,
        _ => return None,
    };
    Some(member)
}

/// Canonical level names, matched case-insensitively
fn level_constant(name: &str) -> Option<LogLevel> {
    LogLevel::ALL
        .into_iter()
        .find(|level| level.as_str().eq_ignore_ascii_case(name))
}

fn resolve_member(target: Ty, name: &str) -> Option<Member> {
    if target == Ty::Event {
        return event_member(name);
    }

    let member = match name {
        "Text" => Member::Text,
        "Count" => Member::Count,
        "Length" => Member::Length,
        "Year" => Member::Year,
        "Month" => Member::Month,
        "Day" => Member::Day,
        "Hour" => Member::Hour,
        "Minute" => Member::Minute,
        "Second" => Member::Second,
        _ => return None,
    };

    let allowed = match target {
        Ty::Template => member == Member::Text,
        Ty::Properties => member == Member::Count,
        Ty::String => member == Member::Length,
        Ty::Timestamp => matches!(
            member,
            Member::Year | Member::Month | Member::Day | Member::Hour | Member::Minute | Member::Second
        ),
        Ty::Dynamic => matches!(member, Member::Count | Member::Length),
        _ => false,
    };
    allowed.then_some(member)
}

fn resolve_method(target: Ty, name: &str) -> Option<Method> {
    let method = match name {
        "ContainsKey" => Method::ContainsKey,
        "Contains" => Method::Contains,
        "StartsWith" => Method::StartsWith,
        "EndsWith" => Method::EndsWith,
        "ToLower" => Method::ToLower,
        "ToUpper" => Method::ToUpper,
        "ToString" => Method::ToString,
        "RenderMessage" => Method::RenderMessage,
        _ => return None,
    };

    let allowed = match method {
        Method::ToString => true,
        Method::RenderMessage => target == Ty::Event,
        Method::ContainsKey => matches!(target, Ty::Properties | Ty::Dynamic),
        Method::Contains => matches!(target, Ty::String | Ty::Dynamic),
        Method::StartsWith | Method::EndsWith | Method::ToLower | Method::ToUpper => {
            matches!(target, Ty::String | Ty::Dynamic)
        }
    };
    allowed.then_some(method)
}

fn member_ty(member: Member) -> Ty {
    match member {
        Member::Timestamp => Ty::Timestamp,
        Member::Level => Ty::Level,
        Member::MessageTemplate => Ty::Template,
        Member::Properties => Ty::Properties,
        // string or null
        Member::Exception => Ty::Dynamic,
        Member::Text => Ty::String,
        Member::Count
        | Member::Length
        | Member::Year
        | Member::Month
        | Member::Day
        | Member::Hour
        | Member::Minute
        | Member::Second => Ty::Number,
    }
}

fn dynamic_member_ty(member: Member) -> Ty {
    match member {
        Member::Count | Member::Length => Ty::Number,
        _ => Ty::Dynamic,
    }
}
