//! Command implementations.

mod run;
mod validate;

pub use run::run_client;
pub use validate::run_validate;
