//! Batch runtime: intake checks, price cohorts, parallel evaluation,
//! escalation and report assembly.

pub mod types;
pub mod validator;

pub use types::*;
pub use validator::BatchValidator;
