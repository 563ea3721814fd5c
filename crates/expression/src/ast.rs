// src/ast.rs
//
// Two trees: `Syntax` is what the parser produces (names still unresolved),
// `Expr` is what the binder produces and the evaluator walks.

use contracts::LogLevel;

use crate::lexer::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Syntax {
    Literal(Literal, Span),
    Ident(String, Span),
    Member {
        target: Box<Syntax>,
        name: String,
        span: Span,
    },
    Call {
        target: Box<Syntax>,
        name: String,
        args: Vec<Syntax>,
        span: Span,
    },
    Index {
        target: Box<Syntax>,
        index: Box<Syntax>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Syntax>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Syntax>,
        right: Box<Syntax>,
        span: Span,
    },
}

impl Syntax {
    pub fn span(&self) -> Span {
        match self {
            Syntax::Literal(_, span) | Syntax::Ident(_, span) => *span,
            Syntax::Member { span, .. }
            | Syntax::Call { span, .. }
            | Syntax::Index { span, .. }
            | Syntax::Unary { span, .. }
            | Syntax::Binary { span, .. } => *span,
        }
    }
}

/// Static type of a bound expression. `Dynamic` defers checks to evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ty {
    Bool,
    Number,
    String,
    Level,
    Timestamp,
    Properties,
    Template,
    Event,
    Null,
    Dynamic,
}

impl Ty {
    pub fn name(&self) -> &'static str {
        match self {
            Ty::Bool => "bool",
            Ty::Number => "number",
            Ty::String => "string",
            Ty::Level => "level",
            Ty::Timestamp => "timestamp",
            Ty::Properties => "properties",
            Ty::Template => "message template",
            Ty::Event => "event",
            Ty::Null => "null",
            Ty::Dynamic => "dynamic",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Const {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Level(LogLevel),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    Timestamp,
    Level,
    MessageTemplate,
    Properties,
    Exception,
    Text,
    Count,
    Length,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl Member {
    pub fn name(&self) -> &'static str {
        match self {
            Member::Timestamp => "Timestamp",
            Member::Level => "Level",
            Member::MessageTemplate => "MessageTemplate",
            Member::Properties => "Properties",
            Member::Exception => "Exception",
            Member::Text => "Text",
            Member::Count => "Count",
            Member::Length => "Length",
            Member::Year => "Year",
            Member::Month => "Month",
            Member::Day => "Day",
            Member::Hour => "Hour",
            Member::Minute => "Minute",
            Member::Second => "Second",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    ContainsKey,
    Contains,
    StartsWith,
    EndsWith,
    ToLower,
    ToUpper,
    ToString,
    RenderMessage,
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::ContainsKey => "ContainsKey",
            Method::Contains => "Contains",
            Method::StartsWith => "StartsWith",
            Method::EndsWith => "EndsWith",
            Method::ToLower => "ToLower",
            Method::ToUpper => "ToUpper",
            Method::ToString => "ToString",
            Method::RenderMessage => "RenderMessage",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Method::ContainsKey | Method::Contains | Method::StartsWith | Method::EndsWith => 1,
            Method::ToLower | Method::ToUpper | Method::ToString | Method::RenderMessage => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(Const),
    This,
    Member {
        target: Box<Expr>,
        member: Member,
    },
    Call {
        target: Box<Expr>,
        method: Method,
        args: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Not(Box<Expr>),
    Neg(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}
