//! Error types for challenge decoding.

/// Errors that can occur while decoding a payment challenge.
#[derive(Debug, thiserror::Error)]
pub enum ChallengeError {
    /// JSON deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response body carries no `payment` field.
    #[error("response body has no payment field")]
    MissingPayment,
}
