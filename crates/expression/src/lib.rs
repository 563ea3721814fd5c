//! # Expression
//!
//! Routing expression engine.
//!
//! Compiles a boolean expression over one implicit log event into a
//! [`contracts::Predicate`]:
//! - `lexer` / `parser`: text to syntax tree
//! - `binder`: name resolution and static type checks
//! - `eval`: tree-walking evaluation against a `LogEvent`
//!
//! # Example
//!
//! ```
//! use contracts::{LogEvent, LogLevel, PredicateCompiler};
//! use expression::ExpressionEngine;
//!
//! let predicate = ExpressionEngine::new()
//!     .compile(r#"Level >= Warning && Properties.ContainsKey("audit")"#)
//!     .unwrap();
//! let event = LogEvent::new(LogLevel::Error, "denied").with_property("audit", true);
//! assert!(predicate.evaluate(&event).unwrap());
//! ```

pub mod ast;
pub mod binder;
mod engine;
mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
mod value;

pub use engine::{CompiledExpression, ExpressionEngine};
pub use error::{EvalError, ParseError};
pub use value::Value;
