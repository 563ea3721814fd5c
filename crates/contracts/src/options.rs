//! RouterOptions - Reconfiguration input
//!
//! The two routing expressions and the push-style source that supplies them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use validator::Validate;

use crate::DestinationId;

/// Expression used when a routing rule is unset
pub const DEFAULT_DENY_EXPRESSION: &str = "false";

/// Upper bound on a single routing expression, in characters
pub const MAX_EXPRESSION_LEN: u64 = 8192;

/// Routing configuration
///
/// Each field is a boolean expression over the implicit event. Empty means
/// unset and is normalized to [`DEFAULT_DENY_EXPRESSION`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RouterOptions {
    /// Decides whether an event goes to sink A
    #[serde(
        default,
        rename = "ShouldEmitSinkAExpression",
        alias = "should_emit_sink_a_expression"
    )]
    #[validate(length(max = MAX_EXPRESSION_LEN))]
    pub should_emit_sink_a_expression: String,

    /// Decides whether an event goes to sink B
    #[serde(
        default,
        rename = "ShouldEmitSinkBExpression",
        alias = "should_emit_sink_b_expression"
    )]
    #[validate(length(max = MAX_EXPRESSION_LEN))]
    pub should_emit_sink_b_expression: String,
}

impl RouterOptions {
    /// Create options from two expressions
    pub fn new(sink_a: impl Into<String>, sink_b: impl Into<String>) -> Self {
        Self {
            should_emit_sink_a_expression: sink_a.into(),
            should_emit_sink_b_expression: sink_b.into(),
        }
    }

    /// Expression text for one destination
    pub fn expression(&self, destination: DestinationId) -> &str {
        match destination {
            DestinationId::A => &self.should_emit_sink_a_expression,
            DestinationId::B => &self.should_emit_sink_b_expression,
        }
    }

    /// Copy with blank expressions replaced by the default-deny expression
    pub fn normalized(&self) -> Self {
        Self {
            should_emit_sink_a_expression: normalize(&self.should_emit_sink_a_expression),
            should_emit_sink_b_expression: normalize(&self.should_emit_sink_b_expression),
        }
    }
}

fn normalize(expression: &str) -> String {
    if expression.trim().is_empty() {
        DEFAULT_DENY_EXPRESSION.to_string()
    } else {
        expression.to_string()
    }
}

/// Change listener type
///
/// Called with the new value every time the options change. May be invoked
/// from any thread, including concurrently.
pub type OptionsListener = Arc<dyn Fn(&RouterOptions) + Send + Sync>;

/// Push-style configuration source
///
/// Exposes the current value and notifies subscribers on every change.
pub trait OptionsSource: Send + Sync {
    /// Current options value
    fn current(&self) -> RouterOptions;

    /// Register a change listener
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// cancelled or dropped.
    fn subscribe(&self, listener: OptionsListener) -> Subscription;
}

/// Handle to a registered listener
///
/// Unsubscribes on [`Subscription::cancel`] or on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Create a subscription that runs `cancel` when released
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Subscription with nothing to release
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    /// Unsubscribe now
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
