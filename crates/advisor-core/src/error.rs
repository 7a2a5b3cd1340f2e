//! Error taxonomy for the analysis pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur while producing an analysis.
///
/// Only [`TickerNotFound`](AnalysisError::TickerNotFound), exhausted
/// [`DataProvider`](AnalysisError::DataProvider) retries and
/// [`InsufficientData`](AnalysisError::InsufficientData) ever become
/// user-visible failures; narrative errors are absorbed by the rule-based
/// fallback and cache faults degrade to a recompute.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The data provider reports the ticker does not exist
    #[error("ticker not found: {0}")]
    TickerNotFound(String),

    /// Transient data-provider failure (network, rate limit, timeout)
    #[error("data provider error: {0}")]
    DataProvider(String),

    /// Not enough financial data to compute any meaningful score
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// The narrative service failed or returned an unusable response
    #[error("narrative service error: {0}")]
    Narrative(String),

    /// Cache storage fault; treated as a miss by the pipeline
    #[error("cache storage error: {0}")]
    CacheStorage(String),

    /// Anything else
    #[error("internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Whether retrying the same request later could succeed
    pub fn retryable(&self) -> bool {
        match self {
            AnalysisError::TickerNotFound(_) | AnalysisError::InsufficientData(_) => false,
            AnalysisError::DataProvider(_)
            | AnalysisError::Narrative(_)
            | AnalysisError::CacheStorage(_) => true,
            AnalysisError::Internal(_) => false,
        }
    }

    /// Caller-facing error code
    pub fn code(&self) -> ErrorCode {
        match self {
            AnalysisError::TickerNotFound(_) => ErrorCode::TickerNotFound,
            AnalysisError::InsufficientData(_) => ErrorCode::InsufficientData,
            AnalysisError::Narrative(_) => ErrorCode::ModelError,
            AnalysisError::DataProvider(_)
            | AnalysisError::CacheStorage(_)
            | AnalysisError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Convert to the serializable shape handed to the routing layer
    pub fn to_api_error(&self) -> ApiError {
        ApiError {
            code: self.code(),
            message: self.to_string(),
            retryable: self.retryable(),
        }
    }
}

/// Closed set of caller-facing error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    TickerNotFound,
    InsufficientData,
    ModelError,
    InternalError,
}

/// The error object consumed by the routing/schema layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalysisError::TickerNotFound("XXXX".to_string());
        assert_eq!(err.to_string(), "ticker not found: XXXX");

        let err = AnalysisError::InsufficientData("no metrics for AAPL".to_string());
        assert_eq!(err.to_string(), "insufficient data: no metrics for AAPL");
    }

    #[test]
    fn test_ticker_not_found_is_not_retryable() {
        let err = AnalysisError::TickerNotFound("XXXX".to_string());
        let api = err.to_api_error();
        assert_eq!(api.code, ErrorCode::TickerNotFound);
        assert!(!api.retryable);
    }

    #[test]
    fn test_data_provider_is_retryable_internal() {
        let err = AnalysisError::DataProvider("connection reset".to_string());
        let api = err.to_api_error();
        assert_eq!(api.code, ErrorCode::InternalError);
        assert!(api.retryable);
    }

    #[test]
    fn test_narrative_maps_to_model_error() {
        let err = AnalysisError::Narrative("empty completion".to_string());
        assert_eq!(err.code(), ErrorCode::ModelError);
    }

    #[test]
    fn test_error_code_serializes_screaming() {
        let json = serde_json::to_string(&ErrorCode::TickerNotFound).expect("serialize");
        assert_eq!(json, "\"TICKER_NOT_FOUND\"");
        let json = serde_json::to_string(&ErrorCode::InsufficientData).expect("serialize");
        assert_eq!(json, "\"INSUFFICIENT_DATA\"");
    }
}
