//! Interactive console command loop.
//!
//! Reads newline-delimited commands from stdin and dispatches on the first
//! whitespace token. The loop itself never dies from a command error; the
//! only exits are `quit`/`exit` and end of input.

use std::sync::Arc;

use payterm::PaymentChallenge;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::RunConfig;
use crate::gateway::GatewayClient;
use crate::realtime::RealtimeHandle;

/// Command summary printed by `help` and once at startup.
pub const HELP: &str = "\
commands:
  pay [amount] [currency]    request a payment challenge
  verify <txid> <reference>  submit a verification
  help                       show this summary
  exit | quit                close the connection and exit";

const PAY_USAGE: &str = "usage: pay [amount] [currency]";
const VERIFY_USAGE: &str = "usage: verify <txid> <reference>";

/// A parsed console command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Request a payment challenge, with optional amount and currency.
    Pay {
        /// Amount override; the configured default applies when `None`.
        amount: Option<f64>,
        /// Currency override; the configured default applies when `None`.
        currency: Option<String>,
    },
    /// Submit a verification.
    Verify {
        /// Transaction id to submit.
        txid: String,
        /// Challenge reference to submit.
        reference: String,
    },
    /// A recognized verb with unusable arguments; print usage, no network.
    Usage(&'static str),
    /// Print the command summary.
    Help,
    /// Close the realtime connection and exit.
    Quit,
    /// Blank input, ignored silently.
    Empty,
    /// Anything else; logged once, no network.
    Unknown(String),
}

impl Command {
    /// Parses one input line. Never fails; unusable input maps to
    /// [`Command::Usage`] or [`Command::Unknown`].
    pub fn parse(line: &str) -> Self {
        let mut tokens = line.split_whitespace();
        let Some(verb) = tokens.next() else {
            return Self::Empty;
        };
        match verb {
            "pay" => {
                let amount = match tokens.next() {
                    Some(raw) => match raw.parse() {
                        Ok(amount) => Some(amount),
                        Err(_) => return Self::Usage(PAY_USAGE),
                    },
                    None => None,
                };
                Self::Pay {
                    amount,
                    currency: tokens.next().map(str::to_owned),
                }
            }
            "verify" => match (tokens.next(), tokens.next()) {
                (Some(txid), Some(reference)) => Self::Verify {
                    txid: txid.to_owned(),
                    reference: reference.to_owned(),
                },
                // The reference is mandatory; a lone argument is a txid
                // without one.
                _ => Self::Usage(VERIFY_USAGE),
            },
            "exit" | "quit" => Self::Quit,
            "help" => Self::Help,
            _ => Self::Unknown(verb.to_owned()),
        }
    }
}

/// Runs the command loop until `quit`/`exit` or end of input, then closes
/// the realtime connection.
pub async fn run(config: Arc<RunConfig>, gateway: GatewayClient, realtime: RealtimeHandle) {
    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            // EOF behaves like `quit` so piped input terminates cleanly.
            Ok(None) => {
                tracing::info!("End of input, exiting");
                break;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read stdin");
                break;
            }
        };
        if !handle_line(&line, &config, &gateway) {
            break;
        }
    }
    realtime.close().await;
}

/// Parses one line and spawns its handler. Returns `false` on `quit`/`exit`.
///
/// Every non-quit command runs as its own task, so a slow or hung gateway
/// call never blocks the loop: input keeps being read, and overlapping calls
/// complete in whatever order the gateway answers.
fn handle_line(line: &str, config: &Arc<RunConfig>, gateway: &GatewayClient) -> bool {
    match Command::parse(line) {
        Command::Quit => false,
        command => {
            tokio::spawn(dispatch(command, Arc::clone(config), gateway.clone()));
            true
        }
    }
}

/// Handles one non-quit command. Infallible by construction: every network
/// failure is absorbed inside [`GatewayClient`] and surfaces here as `None`.
async fn dispatch(command: Command, config: Arc<RunConfig>, gateway: GatewayClient) {
    match command {
        Command::Pay { amount, currency } => {
            let amount = amount.unwrap_or(config.default_amount);
            let currency = currency.unwrap_or_else(|| config.default_currency.clone());
            let Some(challenge) = gateway.request_payment(amount, &currency).await else {
                return;
            };
            if config.auto_verify {
                schedule_auto_verify(&config, &gateway, challenge);
            }
        }
        Command::Verify { txid, reference } => {
            gateway.post_verify(&txid, &reference).await;
        }
        Command::Usage(usage) => println!("{usage}"),
        Command::Help => println!("{HELP}"),
        Command::Empty => {}
        Command::Unknown(verb) => tracing::warn!(command = %verb, "Unknown command"),
        // Handled by the loop before dispatch.
        Command::Quit => {}
    }
}

/// Spawns the deferred verification for a challenge.
///
/// Fire-and-forget: there is no cancellation handle, and the command loop
/// keeps accepting input while the delay elapses.
fn schedule_auto_verify(config: &RunConfig, gateway: &GatewayClient, challenge: PaymentChallenge) {
    let txid = synth_txid(&config.tx_prefix);
    let delay = config.verify_delay;
    tracing::info!(
        %txid,
        reference = %challenge.reference,
        delay = ?delay,
        "Auto-verify scheduled"
    );
    let gateway = gateway.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        gateway.post_verify(&txid, &challenge.reference).await;
    });
}

/// Synthesizes a transaction id: configured prefix + 6 random bytes as hex.
fn synth_txid(prefix: &str) -> String {
    let suffix: [u8; 6] = rand::random();
    format!("{prefix}{}", hex::encode(suffix))
}
