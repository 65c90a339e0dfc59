//! Listing validation stages.
//!
//! Each stage reads a shared [`ListingContext`] and yields at most one
//! verdict; [`validate_listing`] runs them in order through the
//! [`VerdictAggregator`]. Nothing here does I/O.

pub mod accessory;
pub mod aggregate;
pub mod conflict;
pub mod context;
pub mod extract;
pub mod matcher;
pub mod pipeline;
pub mod price;

pub use aggregate::{Resolution, VerdictAggregator};
pub use context::ListingContext;
pub use extract::{extract, extract_all, ModelHit, ModelToken};
pub use pipeline::{joins_cohort, validate_listing, validate_listing_with, Evaluation};
pub use price::{AnomalyCheck, PriceCohort, PriceSignal};
