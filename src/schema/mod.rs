//! Schema module - Configuration and reporting types for optimization runs.

mod evolver;
mod report;
mod run;

pub use evolver::*;
pub use report::*;
pub use run::*;
