//! Errors that cross the core boundary.
//!
//! Missing or partial data is never an error below this boundary; only resolution
//! failures and total absence of ratios are escalated. Display strings are stable and
//! generic, the original cause stays reachable through `source()`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no listed company matches the query")]
    NotFound { query: String },

    #[error("company name could not be romanized")]
    Transliteration(#[from] TransliterationError),

    #[error("ticker resolution failed")]
    Internal(#[source] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum TransliterationError {
    #[error("text generation service unavailable")]
    Unavailable(#[source] anyhow::Error),

    #[error("text generation output is not the expected structure")]
    Unparseable(#[source] anyhow::Error),

    #[error("text generation returned an empty name")]
    EmptyName,
}

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("symbol {symbol} resolved but no usable financial data")]
    InsufficientData { symbol: String },
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn internal_hides_cause_in_display_but_keeps_source() {
        let err = ResolveError::Internal(anyhow::anyhow!("socket closed: 10.0.0.1"));
        assert_eq!(err.to_string(), "ticker resolution failed");
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("socket closed: 10.0.0.1"));
    }

    #[test]
    fn transliteration_converts_into_resolve_error() {
        let err: ResolveError = TransliterationError::EmptyName.into();
        assert!(matches!(err, ResolveError::Transliteration(_)));
        assert!(!err.is_not_found());
    }
}
