//! Predicate traits - Expression Engine interface
//!
//! Keeps the router independent of the expression facility behind it.

use std::fmt;
use std::sync::Arc;

use crate::{ContractError, LogEvent, DEFAULT_DENY_EXPRESSION};

/// Compiled boolean function of one event
///
/// Implementations carry no mutable state and may be evaluated from many
/// threads at once.
pub trait Predicate: Send + Sync {
    /// Evaluate against one event
    ///
    /// # Errors
    /// Returns [`ContractError::ExpressionEvaluation`] when the expression
    /// cannot produce a boolean for this event.
    fn evaluate(&self, event: &LogEvent) -> Result<bool, ContractError>;

    /// Expression text this predicate was compiled from
    fn source(&self) -> &str;
}

/// Shared handle to a compiled predicate
pub type CompiledPredicate = Arc<dyn Predicate>;

/// Turns expression text into predicates
pub trait PredicateCompiler: Send + Sync {
    /// Compile `text`
    ///
    /// # Errors
    /// Returns [`ContractError::ExpressionCompile`] when `text` is not a
    /// valid boolean expression.
    fn compile(&self, text: &str) -> Result<CompiledPredicate, ContractError>;
}

/// Predicate that never matches
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFalse;

impl AlwaysFalse {
    /// Shared instance, the initial content of every slot
    pub fn shared() -> CompiledPredicate {
        Arc::new(AlwaysFalse)
    }
}

impl Predicate for AlwaysFalse {
    fn evaluate(&self, _event: &LogEvent) -> Result<bool, ContractError> {
        Ok(false)
    }

    fn source(&self) -> &str {
        DEFAULT_DENY_EXPRESSION
    }
}

impl fmt::Debug for dyn Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.source()).finish()
    }
}
