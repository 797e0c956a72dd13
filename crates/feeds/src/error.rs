//! Error types for feed operations.

use bigdeal_core::ParseDealError;
use thiserror::Error;

/// Underlying cause of a transport or decode failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while fetching a batch of deals.
///
/// None of these are fatal: a failed cycle is retried on the next tick.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("Failed to decode feed response: {0}")]
    Decode(#[source] BoxError),

    #[error("Feed returned no deals")]
    EmptyFeed,
}

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FeedError::Decode(Box::new(err))
        } else {
            FeedError::Transport(Box::new(err))
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Decode(Box::new(err))
    }
}

impl From<ParseDealError> for FeedError {
    fn from(err: ParseDealError) -> Self {
        FeedError::Decode(Box::new(err))
    }
}

impl FeedError {
    /// Returns true for network-level failures.
    pub fn is_transient(&self) -> bool {
        matches!(self, FeedError::Transport(_))
    }

    /// Returns true when the feed simply had nothing to report.
    pub fn is_empty_feed(&self) -> bool {
        matches!(self, FeedError::EmptyFeed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(FeedError::Transport("dns".into()).is_transient());
        assert!(!FeedError::Decode("eof".into()).is_transient());
        assert!(FeedError::EmptyFeed.is_empty_feed());
        assert!(!FeedError::EmptyFeed.is_transient());
    }

    #[test]
    fn test_from_parse_deal_error() {
        let err: FeedError = ParseDealError::InvalidValue("x".into()).into();
        assert!(matches!(err, FeedError::Decode(_)));
    }

    #[test]
    fn test_from_serde_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: FeedError = json_err.into();
        assert!(matches!(err, FeedError::Decode(_)));
    }

    #[test]
    fn test_source_chain_is_kept() {
        use std::error::Error as _;

        let err: FeedError = ParseDealError::InvalidTimestamp("soon".into()).into();
        let source = err.source().expect("decode error carries its cause");
        assert!(source.downcast_ref::<ParseDealError>().is_some());
        assert_eq!(source.to_string(), "Invalid timestamp: \"soon\"");

        let json_err = serde_json::from_str::<serde_json::Value>("[").unwrap_err();
        let err: FeedError = json_err.into();
        assert!(err.source().unwrap().is::<serde_json::Error>());
    }
}
