//! Payment-terminal device simulator.
//!
//! Glue between three things: an interactive console, two HTTP calls to a
//! payment gateway, and a realtime WebSocket feed of gateway events. There
//! is no persistent state; everything is process-lifetime-scoped.
//!
//! # Modules
//!
//! - [`config`] - Flag/env/default resolution into one immutable [`config::RunConfig`]
//! - [`console`] - The stdin command loop and dispatch table
//! - [`error`] - Fatal startup errors
//! - [`gateway`] - HTTP client for payment challenges and verifications
//! - [`realtime`] - WebSocket URL derivation and event listener

pub mod config;
pub mod console;
pub mod error;
pub mod gateway;
pub mod realtime;
