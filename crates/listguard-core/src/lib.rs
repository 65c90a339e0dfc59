//! listguard core: listing and verdict types, text normalization,
//! configuration, errors.

pub mod config;
pub mod error;
pub mod listing;
pub mod text;
pub mod verdict;

pub use config::{FilterSettings, ListguardConfig};
pub use error::{Error, Result};
pub use listing::Listing;
pub use verdict::{ReasonCode, Stage, Verdict, VerdictRecord};
