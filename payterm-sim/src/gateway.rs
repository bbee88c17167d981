//! HTTP client for the gateway's payment and verification endpoints.
//!
//! Two calls, both tolerant by contract:
//!
//! - [`GatewayClient::request_payment`] — `GET /pay/<device>` expecting
//!   `402 Payment Required` with a challenge in the `x-payment-request`
//!   header or the body `payment` field. The header wins when both are
//!   present.
//! - [`GatewayClient::post_verify`] — `POST /verify`; the status is logged
//!   but never inspected for success, and the body is returned verbatim.
//!
//! Neither call propagates a transport failure: errors are logged and
//! collapsed to `None` at the public boundary, so a command handler never
//! has to treat the gateway being down as anything but "no result".

use std::time::Duration;

use payterm::{CHALLENGE_HEADER, PaymentChallenge, VerificationRequest};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::config::RunConfig;
use crate::error::StartupError;

/// Request timeout for verification submissions.
const VERIFY_TIMEOUT: Duration = Duration::from_millis(7000);

/// A client for the gateway's `/pay/<device>` and `/verify` endpoints.
#[derive(Clone, Debug)]
pub struct GatewayClient {
    /// Full URL to `GET /pay/<device>` (amount/currency appended per call).
    pay_url: Url,
    /// Full URL to `POST /verify`.
    verify_url: Url,
    /// Device id sent in every verification body.
    device_id: String,
    /// Shared reqwest HTTP client.
    client: Client,
}

/// Errors that can occur while talking to the gateway.
///
/// These never leave this module's public methods; they exist so the
/// fallible helpers keep their provenance for logging and tests.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// HTTP transport error.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The gateway answered with something other than `402 Payment Required`.
    #[error("no payment challenge issued: {context}: status {status}: {body}")]
    NoChallenge {
        /// Human-readable context.
        context: &'static str,
        /// The HTTP status code.
        status: StatusCode,
        /// The response body.
        body: String,
    },

    /// A challenge was present but did not decode.
    #[error("challenge decode error: {context}: {source}")]
    Challenge {
        /// Human-readable context.
        context: &'static str,
        /// The underlying decode error.
        #[source]
        source: payterm::ChallengeError,
    },

    /// Failed to read the response body.
    #[error("failed to read response body: {context}: {source}")]
    ResponseBodyRead {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}

impl GatewayClient {
    /// Constructs a client from the resolved run configuration.
    ///
    /// Endpoint URLs are built up front; the device id is percent-escaped
    /// into the pay path by the `url` crate.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] if the gateway base URL does not parse or
    /// cannot carry path segments.
    pub fn new(config: &RunConfig) -> Result<Self, StartupError> {
        let base = Url::parse(&config.gateway_base).map_err(|e| StartupError::GatewayUrl {
            url: config.gateway_base.clone(),
            source: e,
        })?;

        let mut pay_url = base.clone();
        pay_url
            .path_segments_mut()
            .map_err(|()| StartupError::CannotBeBase)?
            .pop_if_empty()
            .push("pay")
            .push(&config.device_id);

        let mut verify_url = base;
        verify_url
            .path_segments_mut()
            .map_err(|()| StartupError::CannotBeBase)?
            .pop_if_empty()
            .push("verify");

        Ok(Self {
            pay_url,
            verify_url,
            device_id: config.device_id.clone(),
            client: Client::new(),
        })
    }

    /// Returns the computed `GET /pay/<device>` URL (without query).
    pub const fn pay_url(&self) -> &Url {
        &self.pay_url
    }

    /// Returns the computed `POST /verify` URL.
    pub const fn verify_url(&self) -> &Url {
        &self.verify_url
    }

    /// Requests a payment challenge for the given amount and currency.
    ///
    /// Returns `None` when the gateway does not issue a challenge, for any
    /// reason: non-402 status (logged with the body), undecodable challenge,
    /// or transport failure. `None` means "nothing to verify", never "retry".
    pub async fn request_payment(&self, amount: f64, currency: &str) -> Option<PaymentChallenge> {
        match self.try_request_payment(amount, currency).await {
            Ok(challenge) => {
                tracing::info!(reference = %challenge.reference, "Payment challenge received");
                Some(challenge)
            }
            Err(GatewayError::NoChallenge { status, body, .. }) => {
                tracing::warn!(%status, body, "Gateway did not issue a payment challenge");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Payment request failed");
                None
            }
        }
    }

    async fn try_request_payment(
        &self,
        amount: f64,
        currency: &str,
    ) -> Result<PaymentChallenge, GatewayError> {
        let mut url = self.pay_url.clone();
        url.query_pairs_mut()
            .append_pair("amount", &amount.to_string())
            .append_pair("currency", currency);

        let context = "GET /pay";
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GatewayError::Http { context, source: e })?;

        let status = response.status();
        if status != StatusCode::PAYMENT_REQUIRED {
            let body = response
                .text()
                .await
                .map_err(|e| GatewayError::ResponseBodyRead { context, source: e })?;
            return Err(GatewayError::NoChallenge {
                context,
                status,
                body,
            });
        }

        // The header wins over the body `payment` field when both are present.
        if let Some(value) = response.headers().get(CHALLENGE_HEADER) {
            let raw = String::from_utf8_lossy(value.as_bytes()).into_owned();
            return PaymentChallenge::from_header(&raw)
                .map_err(|e| GatewayError::Challenge { context, source: e });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::ResponseBodyRead { context, source: e })?;
        PaymentChallenge::from_body(&body).map_err(|e| GatewayError::Challenge { context, source: e })
    }

    /// Submits a verification for a transaction id and challenge reference.
    ///
    /// The response body is returned verbatim whatever the status code; the
    /// status is logged, not inspected. Returns `None` only on transport
    /// failure.
    pub async fn post_verify(&self, txid: &str, reference: &str) -> Option<String> {
        match self.try_post_verify(txid, reference).await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!(error = %e, "Verification submission failed");
                None
            }
        }
    }

    async fn try_post_verify(&self, txid: &str, reference: &str) -> Result<String, GatewayError> {
        let request = VerificationRequest {
            txid: txid.to_owned(),
            device_id: self.device_id.clone(),
            reference: reference.to_owned(),
        };

        let context = "POST /verify";
        let response = self
            .client
            .post(self.verify_url.clone())
            .timeout(VERIFY_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Http { context, source: e })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::ResponseBodyRead { context, source: e })?;
        tracing::info!(%status, body, "Verification response");
        Ok(body)
    }
}
