//! Wire types for the payterm gateway protocol.
//!
//! The gateway answers a payment request with `402 Payment Required` and a
//! payment challenge, carried either in the `x-payment-request` response
//! header or in a `payment` field of the response body. The terminal later
//! submits a verification referencing that challenge.
//!
//! This crate holds the shared types and decoding helpers; all I/O lives in
//! the simulator binary.

pub mod challenge;
pub mod error;

pub use challenge::{CHALLENGE_HEADER, PaymentChallenge, VerificationRequest};
pub use error::ChallengeError;
