//! # Contracts
//!
//! Frozen interface contracts shared by every router crate: the event model,
//! routing options, destination and predicate traits, diagnostics and the
//! error taxonomy. All business crates depend on this crate, never the
//! reverse.
//!
//! ## Time Model
//! - Event timestamps are UTC wall-clock (`chrono::DateTime<Utc>`)

mod diagnostic;
mod error;
mod event;
mod options;
mod predicate;
mod sink;

pub use diagnostic::*;
pub use error::*;
pub use event::*;
pub use options::*;
pub use predicate::*;
pub use sink::*;
