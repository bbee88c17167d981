//! Payment challenge and verification request types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ChallengeError;

/// Response header carrying a JSON-encoded payment challenge.
pub const CHALLENGE_HEADER: &str = "x-payment-request";

/// A gateway-issued payment challenge.
///
/// Opaque to the terminal except for [`reference`](Self::reference), which
/// correlates the challenge with its later verification. Every other field
/// the gateway sends is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentChallenge {
    /// Identifier correlating this challenge with a verification.
    pub reference: String,

    /// Gateway-defined fields, kept opaque.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PaymentChallenge {
    /// Decodes a challenge from an `x-payment-request` header value
    /// (plain JSON, not Base64).
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeError::Json`] if the value is not valid JSON or
    /// lacks a `reference` field.
    pub fn from_header(value: &str) -> Result<Self, ChallengeError> {
        Ok(serde_json::from_str(value.trim())?)
    }

    /// Extracts a challenge from the `payment` field of a response body.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeError::MissingPayment`] if the body has no
    /// `payment` field, or [`ChallengeError::Json`] if that field does not
    /// decode as a challenge.
    pub fn from_body(body: &Value) -> Result<Self, ChallengeError> {
        let payment = body
            .get("payment")
            .ok_or(ChallengeError::MissingPayment)?
            .clone();
        Ok(serde_json::from_value(payment)?)
    }
}

/// Body of a verification submission.
///
/// Serialized as `{"txid": .., "deviceId": .., "reference": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    /// Transaction id, user-supplied or synthesized by the terminal.
    pub txid: String,

    /// Device the verification is submitted for.
    pub device_id: String,

    /// Reference from the payment challenge being verified.
    pub reference: String,
}
