//! Startup error types for the terminal simulator.
//!
//! Only configuration and connection construction failures are fatal; every
//! runtime failure is logged and absorbed at the component that hit it.

/// Errors that terminate the simulator at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The configured gateway base URL does not parse.
    #[error("invalid gateway URL {url:?}: {source}")]
    GatewayUrl {
        /// The offending URL string.
        url: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// The gateway URL uses a scheme with no realtime counterpart.
    #[error("gateway URL scheme {scheme:?} is not http or https")]
    UnsupportedScheme {
        /// The offending scheme.
        scheme: String,
    },

    /// The gateway URL cannot carry path segments (e.g. `mailto:`).
    #[error("gateway URL cannot be a base for endpoint paths")]
    CannotBeBase,

    /// Opening the realtime connection failed.
    #[error("realtime connect failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
}
