//! Category rule sets and the registry that serves them.
//!
//! Categories are data: adding one is a rules-file change, not code.

pub mod builtin;
pub mod registry;
pub mod types;

pub use registry::{BuiltinRules, CategorySummary, JsonFileRules, RuleRegistry, RuleSnapshot, RuleSource, RulesFile};
pub use types::*;
