//! Command implementations.

mod eval;
mod input;
mod run;
mod validate;

pub use eval::run_eval;
pub use run::run_router;
pub use validate::run_validate;
