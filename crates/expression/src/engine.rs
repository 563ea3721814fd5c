//! ExpressionEngine - compiles routing expressions into predicates

use std::sync::Arc;

use contracts::{CompiledPredicate, ContractError, LogEvent, Predicate, PredicateCompiler};
use tracing::{debug, instrument};

use crate::ast::Expr;
use crate::binder::bind_predicate;
use crate::error::ParseError;
use crate::eval::eval_predicate;
use crate::parser::Parser;

/// Stateless compiler for routing expressions
///
/// Safe to share across threads and reuse for every recompilation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionEngine;

impl ExpressionEngine {
    /// Create a new engine
    pub fn new() -> Self {
        Self
    }

    /// Shared engine handle, as the router expects it
    pub fn shared() -> Arc<dyn PredicateCompiler> {
        Arc::new(Self)
    }

    /// Parse and bind `text` without wrapping it as a predicate
    pub fn check(&self, text: &str) -> Result<(), ParseError> {
        bind_predicate(&Parser::parse(text)?).map(|_| ())
    }

    /// Compile `text` into a concrete expression
    ///
    /// # Errors
    /// Returns the first lex, parse or binding error with its position.
    #[instrument(name = "expression_compile", skip(self), level = "debug")]
    pub fn compile_expression(&self, text: &str) -> Result<CompiledExpression, ParseError> {
        let syntax = Parser::parse(text)?;
        let expr = bind_predicate(&syntax)?;
        debug!(expression = %text, "Expression compiled");
        Ok(CompiledExpression {
            source: text.to_string(),
            expr,
        })
    }
}

impl PredicateCompiler for ExpressionEngine {
    fn compile(&self, text: &str) -> Result<CompiledPredicate, ContractError> {
        let compiled = self
            .compile_expression(text)
            .map_err(|e| ContractError::expression_compile(text, e.to_string()))?;
        Ok(Arc::new(compiled))
    }
}

/// Bound expression ready for evaluation
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    source: String,
    expr: Expr,
}

impl CompiledExpression {
    /// Bound tree
    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl Predicate for CompiledExpression {
    fn evaluate(&self, event: &LogEvent) -> Result<bool, ContractError> {
        eval_predicate(&self.expr, event)
            .map_err(|e| ContractError::expression_evaluation(&self.source, e.0))
    }

    fn source(&self) -> &str {
        &self.source
    }
}
