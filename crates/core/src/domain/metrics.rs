use crate::error::AcquisitionError;
use crate::normalize::round_to;
use serde::{Deserialize, Serialize};

/// The three ratios handed to the classification/narrative layers.
///
/// Every field is independently optional; partial data is a valid result.
/// `roe` is always on percentage scale (12.0 means 12%).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub per: Option<f64>,
    pub pbr: Option<f64>,
    pub roe: Option<f64>,
}

impl MetricSet {
    pub fn is_empty(&self) -> bool {
        self.per.is_none() && self.pbr.is_none() && self.roe.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.per.is_some() && self.pbr.is_some() && self.roe.is_some()
    }

    /// Boundary check: a resolved symbol with none of the three ratios is an error.
    pub fn require_any(self, symbol: &str) -> Result<Self, AcquisitionError> {
        if self.is_empty() {
            return Err(AcquisitionError::InsufficientData {
                symbol: symbol.to_string(),
            });
        }
        Ok(self)
    }
}

/// Providers disagree on ROE scale; fractions (|v| < 1) are lifted to percent.
///
/// Compares the magnitude, so a negative percentage such as -5.0 stays -5.0 instead of
/// becoming -500.
pub fn roe_as_percent(raw: f64) -> f64 {
    if raw.abs() < 1.0 {
        raw * 100.0
    } else {
        raw
    }
}

/// PBR = price / book value per share.
pub fn derive_pbr(price: Option<f64>, book_value_per_share: Option<f64>) -> Option<f64> {
    match (price, book_value_per_share) {
        (Some(p), Some(b)) if b != 0.0 => Some(p / b),
        _ => None,
    }
}

/// ROE(%) = EPS / BPS * 100, rounded to 2 places.
pub fn derive_roe(eps: Option<f64>, bps: Option<f64>) -> Option<f64> {
    match (eps, bps) {
        (Some(e), Some(b)) if b != 0.0 => Some(round_to(e / b * 100.0, 2)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roe_fraction_is_lifted_to_percent() {
        assert!((roe_as_percent(0.12) - 12.0).abs() < 1e-9);
        assert_eq!(roe_as_percent(12.0), 12.0);
        assert!((roe_as_percent(-0.05) + 5.0).abs() < 1e-9);
        assert_eq!(roe_as_percent(-5.0), -5.0);
    }

    #[test]
    fn derives_pbr_from_price_and_book_value() {
        assert_eq!(derive_pbr(Some(50_000.0), Some(25_000.0)), Some(2.0));
        assert_eq!(derive_pbr(Some(50_000.0), Some(0.0)), None);
        assert_eq!(derive_pbr(None, Some(25_000.0)), None);
    }

    #[test]
    fn derives_roe_from_eps_and_bps() {
        assert_eq!(derive_roe(Some(1000.0), Some(8000.0)), Some(12.5));
        assert_eq!(derive_roe(Some(1.0), Some(3.0)), Some(33.33));
        assert_eq!(derive_roe(Some(1000.0), Some(0.0)), None);
        assert_eq!(derive_roe(None, Some(8000.0)), None);
    }

    #[test]
    fn require_any_rejects_only_total_absence() {
        assert!(MetricSet::default().require_any("AAPL").is_err());
        let partial = MetricSet {
            per: Some(10.0),
            ..Default::default()
        };
        assert_eq!(partial.require_any("AAPL").unwrap(), partial);
    }
}
