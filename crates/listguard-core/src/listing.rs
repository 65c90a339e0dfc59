//! Scraped listing records.

use serde::{Deserialize, Serialize};

/// One scraped marketplace candidate awaiting validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Caller-side reference, echoed back as `listingRef`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: Option<f64>,
    pub category: String,
    pub query: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
}

impl Listing {
    /// Convenience constructor used by tests and the CLI.
    pub fn new(title: &str, price: f64, category: &str, query: &str) -> Self {
        Self {
            title: title.to_string(),
            price: Some(price),
            category: category.to_string(),
            query: query.to_string(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Reference used in output records: the caller id, else `#<index>`.
    pub fn reference(&self, index: usize) -> String {
        match &self.id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!("#{}", index),
        }
    }

    /// Usable price, if any. Zero, negative and non-finite prices are missing.
    pub fn valid_price(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite() && *p > 0.0)
    }

    /// A listing without a title or a usable price cannot be validated.
    pub fn is_malformed(&self) -> bool {
        self.title.trim().is_empty() || self.valid_price().is_none()
    }
}
