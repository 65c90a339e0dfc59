//! The adjudicator seam.

use std::future::Future;
use std::pin::Pin;

use listguard_core::{Error, Result};

use crate::types::{Adjudication, AdjudicationRequest};

/// Boxed future type for returning different adjudicator implementations.
pub type BoxedAdjudication<'a> = Pin<Box<dyn Future<Output = Result<Vec<Adjudication>>> + Send + 'a>>;

/// External classifier for listings the rules could not settle.
pub trait Adjudicator: Send + Sync {
    /// Short name for logs and status.
    fn name(&self) -> &str;

    /// Judge every item of one request.
    ///
    /// Answers may come back in any order; each should carry the item id.
    fn adjudicate<'a>(&'a self, request: &'a AdjudicationRequest) -> BoxedAdjudication<'a>;

    /// Whether calls can succeed at all (a provider key is configured).
    fn is_available(&self) -> bool {
        true
    }
}

/// Used when no provider is configured. Every call fails immediately.
pub struct DisabledAdjudicator;

impl Adjudicator for DisabledAdjudicator {
    fn name(&self) -> &str {
        "disabled"
    }

    fn adjudicate<'a>(&'a self, _request: &'a AdjudicationRequest) -> BoxedAdjudication<'a> {
        Box::pin(async { Err(Error::Escalation("no adjudicator configured".into())) })
    }

    fn is_available(&self) -> bool {
        false
    }
}
