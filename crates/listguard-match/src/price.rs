//! Price anomaly detection against a frozen cohort.
//!
//! A cohort is the valid prices of one (category, normalized query) group in
//! the current batch, minus listings the accessory or conflict stage already
//! claims. It is built before any of its listings is scored, so the outcome
//! does not depend on evaluation order.
//!
//! The reference price is a trimmed mean over the prices inside the IQR
//! fences, so a handful of junk prices cannot drag it down. A price is
//! flagged by the first of these checks that fires:
//!
//! - too cheap: well under the reference and under the category ceiling
//! - z-score: too many standard deviations under the reference
//! - below the lower IQR fence
//! - price gap: the cheapest listing, far under the next cheapest

use serde::{Deserialize, Serialize};

use listguard_rules::PriceAnomalyParams;

/// Fence width used when picking the prices the reference is computed from.
const REFERENCE_FENCE: f64 = 1.5;
/// Share cut from each end before averaging.
const TRIM: f64 = 0.1;

/// Frozen price statistics of one cohort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceCohort {
    /// Ascending.
    sorted: Vec<f64>,
    mean: f64,
    std_dev: f64,
    q1: f64,
    q3: f64,
    median: f64,
    trimmed_mean: f64,
}

impl PriceCohort {
    /// Non-finite and non-positive prices are skipped.
    pub fn new(prices: impl IntoIterator<Item = f64>) -> Self {
        let mut sorted: Vec<f64> = prices
            .into_iter()
            .filter(|p| p.is_finite() && *p > 0.0)
            .collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let variance = sorted.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n as f64;

        let q1 = sorted[n / 4];
        let q3 = sorted[n * 3 / 4];
        let iqr = q3 - q1;
        let (low, high) = (q1 - REFERENCE_FENCE * iqr, q3 + REFERENCE_FENCE * iqr);
        // q1 and q3 sit inside their own fences, so this is never empty
        let inner: Vec<f64> = sorted
            .iter()
            .copied()
            .filter(|p| (low..=high).contains(p))
            .collect();

        Self {
            mean,
            std_dev: variance.sqrt(),
            q1,
            q3,
            median: median(&inner),
            trimmed_mean: trimmed_mean(&inner),
            sorted,
        }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Median of the prices inside the IQR fences.
    pub fn median(&self) -> f64 {
        self.median
    }

    /// Trimmed mean of the prices inside the IQR fences; the reference price.
    pub fn trimmed_mean(&self) -> f64 {
        self.trimmed_mean
    }

    pub fn quartiles(&self) -> (f64, f64) {
        (self.q1, self.q3)
    }

    /// Judge one price against the cohort.
    pub fn assess(&self, price: f64, params: &PriceAnomalyParams) -> PriceSignal {
        if !params.enabled || self.len() < 2 {
            return PriceSignal::NoSignal;
        }

        let reference = self.trimmed_mean;
        let pct_below = (reference - price) / reference;
        let z_score = (self.std_dev > 0.0).then(|| (reference - price) / self.std_dev);

        let check = if price < reference * (1.0 - params.min_percentage_difference)
            && price < params.max_suspicious_price
        {
            Some(AnomalyCheck::TooCheap)
        } else if z_score.is_some_and(|z| z > params.z_score_threshold) {
            Some(AnomalyCheck::ZScore)
        } else if self.below_fence(price, params.iqr_multiplier) {
            Some(AnomalyCheck::BelowFence)
        } else if self
            .gap_to_next(price)
            .is_some_and(|gap| gap > params.min_percentage_difference)
        {
            Some(AnomalyCheck::PriceGap)
        } else {
            None
        };

        match check {
            Some(check) => PriceSignal::Anomalous {
                check,
                reference,
                pct_below,
                z_score,
            },
            None => PriceSignal::Normal,
        }
    }

    fn below_fence(&self, price: f64, multiplier: f64) -> bool {
        let iqr = self.q3 - self.q1;
        iqr > 0.0 && price < self.q1 - multiplier * iqr
    }

    /// Relative distance from `price` up to the next cheapest cohort price,
    /// when `price` is the cheapest one.
    fn gap_to_next(&self, price: f64) -> Option<f64> {
        let (&lowest, rest) = self.sorted.split_first()?;
        let next = if price < lowest {
            lowest
        } else if price == lowest {
            *rest.first()?
        } else {
            return None;
        };
        Some((next - price) / next)
    }
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 0 => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
        _ => sorted[n / 2],
    }
}

fn trimmed_mean(sorted: &[f64]) -> f64 {
    let cut = (sorted.len() as f64 * TRIM).floor() as usize;
    let kept = &sorted[cut..sorted.len() - cut];
    if kept.is_empty() {
        return median(sorted);
    }
    kept.iter().sum::<f64>() / kept.len() as f64
}

/// Which check flagged a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnomalyCheck {
    TooCheap,
    ZScore,
    BelowFence,
    PriceGap,
}

/// Outcome of the price check. Never a verdict on its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PriceSignal {
    /// Cohort too small or detection disabled.
    NoSignal,
    Normal,
    /// Would be flagged, but the title gives a reason for the low price.
    Explained,
    #[serde(rename_all = "camelCase")]
    Anomalous {
        check: AnomalyCheck,
        reference: f64,
        pct_below: f64,
        z_score: Option<f64>,
    },
}

impl PriceSignal {
    pub fn is_anomalous(&self) -> bool {
        matches!(self, Self::Anomalous { .. })
    }

    /// Downgrade an anomaly whose low price the title accounts for.
    pub fn explained(self, explained: bool) -> Self {
        match self {
            Self::Anomalous { .. } if explained => Self::Explained,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(min_pct: f64, max_suspicious: f64, z: f64) -> PriceAnomalyParams {
        PriceAnomalyParams {
            enabled: true,
            min_percentage_difference: min_pct,
            max_suspicious_price: max_suspicious,
            z_score_threshold: z,
            iqr_multiplier: 1.5,
        }
    }

    fn check_of(signal: PriceSignal) -> Option<AnomalyCheck> {
        match signal {
            PriceSignal::Anomalous { check, .. } => Some(check),
            _ => None,
        }
    }

    #[test]
    fn test_small_cohort_no_signal() {
        let p = params(0.3, 1_000_000.0, 0.1);
        assert_eq!(PriceCohort::new(Vec::new()).assess(10.0, &p), PriceSignal::NoSignal);
        assert_eq!(PriceCohort::new([50_000.0]).assess(10.0, &p), PriceSignal::NoSignal);
    }

    #[test]
    fn test_disabled_no_signal() {
        let mut p = params(0.3, 1_000_000.0, 0.1);
        p.enabled = false;
        let cohort = PriceCohort::new([100.0, 100_000.0, 100_000.0]);
        assert_eq!(cohort.assess(100.0, &p), PriceSignal::NoSignal);
    }

    #[test]
    fn test_population_statistics() {
        let cohort = PriceCohort::new([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0, f64::NAN, -1.0]);
        assert_eq!(cohort.len(), 8);
        assert!((cohort.mean() - 5.0).abs() < 1e-9);
        assert!((cohort.std_dev() - 2.0).abs() < 1e-9);
        assert_eq!(cohort.quartiles(), (4.0, 7.0));
    }

    #[test]
    fn test_reference_ignores_outliers() {
        let mut prices = vec![70_000.0; 9];
        prices.extend([1_500.0, 1_500.0, 250_000.0]);
        let cohort = PriceCohort::new(prices);
        // the raw mean is dragged around; the fenced statistics are not
        assert!((cohort.mean() - 73_583.33).abs() < 1.0);
        assert_eq!(cohort.median(), 70_000.0);
        assert_eq!(cohort.trimmed_mean(), 70_000.0);
    }

    #[test]
    fn test_trimmed_mean_cuts_both_ends() {
        let prices: Vec<f64> = (1..=10).map(|i| i as f64 * 100.0).collect();
        let cohort = PriceCohort::new(prices);
        // 100 and 1000 are cut, 200..=900 remain
        assert!((cohort.trimmed_mean() - 550.0).abs() < 1e-9);
        assert!((cohort.median() - 550.0).abs() < 1e-9);
    }

    #[test]
    fn test_cheap_listing_flagged() {
        // videocards-style parameters
        let p = params(0.4, 5000.0, 2.5);
        let cohort = PriceCohort::new([60_000.0, 62_000.0, 3_000.0]);
        assert_eq!(check_of(cohort.assess(3_000.0, &p)), Some(AnomalyCheck::TooCheap));
        assert_eq!(cohort.assess(62_000.0, &p), PriceSignal::Normal);
    }

    #[test]
    fn test_cheap_but_above_suspicious_ceiling() {
        let p = params(0.3, 1000.0, 10.0);
        let cohort = PriceCohort::new([10_000.0, 10_000.0, 5_000.0, 4_800.0]);
        // well below the reference but above the absolute ceiling, z stays
        // small, and 4 800 sits right under it
        assert_eq!(cohort.assess(5_000.0, &p), PriceSignal::Normal);
    }

    #[test]
    fn test_zero_spread_stays_normal() {
        let p = params(0.3, 1000.0, 0.5);
        let cohort = PriceCohort::new([500.0, 500.0]);
        assert_eq!(cohort.assess(500.0, &p), PriceSignal::Normal);
    }

    #[test]
    fn test_z_score_outlier() {
        let p = params(0.9, 0.0, 1.5);
        let prices = [100.0, 101.0, 99.0, 100.0, 102.0, 98.0, 100.0, 60.0];
        let cohort = PriceCohort::new(prices);
        assert_eq!(cohort.trimmed_mean(), 100.0);
        match cohort.assess(60.0, &p) {
            PriceSignal::Anomalous {
                check, z_score, reference, ..
            } => {
                assert_eq!(check, AnomalyCheck::ZScore);
                assert_eq!(reference, 100.0);
                assert!(z_score.unwrap() > 1.5);
            }
            other => panic!("expected anomaly, got {:?}", other),
        }
    }

    #[test]
    fn test_below_iqr_fence() {
        // z and percentage checks are out of reach; only the fence can fire
        let p = params(0.9, 0.0, 100.0);
        let cohort = PriceCohort::new([900.0, 1_000.0, 1_000.0, 1_000.0, 1_100.0, 1_100.0, 1_200.0, 400.0]);
        assert_eq!(cohort.quartiles(), (1_000.0, 1_100.0));
        assert_eq!(check_of(cohort.assess(400.0, &p)), Some(AnomalyCheck::BelowFence));
        assert_eq!(cohort.assess(900.0, &p), PriceSignal::Normal);
    }

    #[test]
    fn test_gap_to_next_cheapest() {
        let p = params(0.3, 0.0, 100.0);
        let cohort = PriceCohort::new([40_000.0, 70_000.0, 72_000.0]);
        // 40 000 is 43% under the next cheapest listing
        assert_eq!(check_of(cohort.assess(40_000.0, &p)), Some(AnomalyCheck::PriceGap));
        // only the cheapest is compared
        assert_eq!(cohort.assess(70_000.0, &p), PriceSignal::Normal);

        let close = PriceCohort::new([65_000.0, 70_000.0, 72_000.0]);
        assert_eq!(close.assess(65_000.0, &p), PriceSignal::Normal);
    }

    #[test]
    fn test_explained_anomaly_is_not_flagged() {
        let p = params(0.4, 5000.0, 2.5);
        let cohort = PriceCohort::new([60_000.0, 62_000.0, 3_000.0]);
        let signal = cohort.assess(3_000.0, &p);
        assert_eq!(signal.explained(true), PriceSignal::Explained);
        assert!(!PriceSignal::Explained.is_anomalous());
        assert!(signal.explained(false).is_anomalous());
        assert_eq!(PriceSignal::Normal.explained(true), PriceSignal::Normal);
    }
}
