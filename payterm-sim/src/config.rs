//! Run configuration for the terminal simulator.
//!
//! One immutable [`RunConfig`] is resolved at startup and passed to every
//! component; nothing reads the environment after that. Precedence, highest
//! first: command-line flag > environment variable > built-in default.
//!
//! | option            | flag                 | env                 | default                 |
//! |-------------------|----------------------|---------------------|-------------------------|
//! | device id         | `--id` / `-i`        | `DEVICE_ID`         | `DEVICE_1`              |
//! | gateway base URL  | `--gateway` / `-g`   | `GATEWAY_BASE`      | `http://localhost:8080` |
//! | realtime path     | —                    | `WS_PATH`           | `/ws`                   |
//! | auto-verify       | `--auto-verify`/`-a` | `AUTO_VERIFY`       | `false`                 |
//! | verify delay (ms) | —                    | `VERIFY_DELAY_MS`   | `1000`                  |
//! | txid prefix       | —                    | `VERIFIER_TX_PREFIX`| `SIMTX_`                |
//! | default amount    | `--amount`           | `DEFAULT_AMOUNT`    | `0.25`                  |
//! | default currency  | `--currency`         | `DEFAULT_CURRENCY`  | `USDC`                  |
//!
//! Malformed numeric *env* values fall back to the default with a warning;
//! malformed numeric *flags* are rejected by clap at parse time. The amount
//! must be positive and follows the same split: a non-positive
//! `DEFAULT_AMOUNT` falls back with a warning, a non-positive `--amount` is
//! rejected.

use std::str::FromStr;
use std::time::Duration;

use clap::Parser;

const DEFAULT_DEVICE_ID: &str = "DEVICE_1";
const DEFAULT_GATEWAY: &str = "http://localhost:8080";
const DEFAULT_REALTIME_PATH: &str = "/ws";
const DEFAULT_VERIFY_DELAY_MS: u64 = 1000;
const DEFAULT_TX_PREFIX: &str = "SIMTX_";
const DEFAULT_AMOUNT: f64 = 0.25;
const DEFAULT_CURRENCY: &str = "USDC";

/// Command-line arguments for the simulator.
///
/// Every flag is optional; unset flags fall through to the environment and
/// then to built-in defaults (see [`RunConfig::resolve`]).
#[derive(Debug, Parser)]
#[command(name = "payterm-sim", version, about = "Payment-terminal device simulator")]
pub struct Cli {
    /// Device identifier presented to the gateway.
    #[arg(long = "id", short = 'i')]
    pub id: Option<String>,

    /// Gateway base URL (trailing slashes are stripped).
    #[arg(long, short = 'g')]
    pub gateway: Option<String>,

    /// Automatically submit a verification after each payment challenge.
    ///
    /// Presence of the flag overrides the `AUTO_VERIFY` env var entirely.
    #[arg(long, short = 'a', num_args = 0..=1, default_missing_value = "true")]
    pub auto_verify: Option<bool>,

    /// Default payment amount for the `pay` command (must be positive).
    #[arg(long, value_parser = positive_amount)]
    pub amount: Option<f64>,

    /// Default payment currency for the `pay` command.
    #[arg(long)]
    pub currency: Option<String>,
}

/// Immutable run configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Device identifier presented to the gateway.
    pub device_id: String,

    /// Gateway base URL, never ending in a slash.
    pub gateway_base: String,

    /// Path of the realtime endpoint on the gateway host.
    pub realtime_path: String,

    /// Whether each payment challenge triggers a deferred verification.
    pub auto_verify: bool,

    /// Delay before the deferred verification is submitted.
    pub verify_delay: Duration,

    /// Prefix for synthesized transaction ids.
    pub tx_prefix: String,

    /// Amount used by `pay` when none is given.
    pub default_amount: f64,

    /// Currency used by `pay` when none is given.
    pub default_currency: String,
}

impl RunConfig {
    /// Resolves the run configuration from parsed flags and an environment
    /// lookup.
    ///
    /// The lookup is injected rather than read from `std::env` so precedence
    /// can be tested without mutating process state; `main` passes
    /// `|name| std::env::var(name).ok()`.
    pub fn resolve(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Self {
        let gateway_base = cli
            .gateway
            .clone()
            .or_else(|| env("GATEWAY_BASE"))
            .unwrap_or_else(|| DEFAULT_GATEWAY.to_owned());

        Self {
            device_id: cli
                .id
                .clone()
                .or_else(|| env("DEVICE_ID"))
                .unwrap_or_else(|| DEFAULT_DEVICE_ID.to_owned()),
            gateway_base: gateway_base.trim_end_matches('/').to_owned(),
            realtime_path: env("WS_PATH").unwrap_or_else(|| DEFAULT_REALTIME_PATH.to_owned()),
            auto_verify: cli
                .auto_verify
                .unwrap_or_else(|| env("AUTO_VERIFY").is_some_and(|v| v == "true")),
            verify_delay: Duration::from_millis(parse_or_default(
                "VERIFY_DELAY_MS",
                env("VERIFY_DELAY_MS"),
                DEFAULT_VERIFY_DELAY_MS,
            )),
            tx_prefix: env("VERIFIER_TX_PREFIX").unwrap_or_else(|| DEFAULT_TX_PREFIX.to_owned()),
            default_amount: cli
                .amount
                .unwrap_or_else(|| amount_or_default(env("DEFAULT_AMOUNT"))),
            default_currency: cli
                .currency
                .clone()
                .or_else(|| env("DEFAULT_CURRENCY"))
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_owned()),
        }
    }
}

/// Clap value parser for `--amount`: a strictly positive float.
fn positive_amount(raw: &str) -> Result<f64, String> {
    let amount: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if amount > 0.0 {
        Ok(amount)
    } else {
        Err("amount must be positive".to_owned())
    }
}

/// Parses `DEFAULT_AMOUNT` from the env, falling back to the default with a
/// warning when it is malformed or not positive.
fn amount_or_default(raw: Option<String>) -> f64 {
    let amount = parse_or_default("DEFAULT_AMOUNT", raw, DEFAULT_AMOUNT);
    if amount > 0.0 {
        amount
    } else {
        tracing::warn!(
            var = "DEFAULT_AMOUNT",
            value = amount,
            "Amount must be positive, using default"
        );
        DEFAULT_AMOUNT
    }
}

/// Parses a numeric env value, falling back to the default with a warning
/// when it is malformed.
fn parse_or_default<T: FromStr>(name: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(var = name, value = %value, "Malformed numeric env value, using default");
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("payterm-sim").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = RunConfig::resolve(&cli(&[]), no_env);
        assert_eq!(config.device_id, "DEVICE_1");
        assert_eq!(config.gateway_base, "http://localhost:8080");
        assert_eq!(config.realtime_path, "/ws");
        assert!(!config.auto_verify);
        assert_eq!(config.verify_delay, Duration::from_millis(1000));
        assert_eq!(config.tx_prefix, "SIMTX_");
        assert_eq!(config.default_amount, 0.25);
        assert_eq!(config.default_currency, "USDC");
    }

    #[test]
    fn flag_beats_env_beats_default() {
        let env = |name: &str| match name {
            "DEVICE_ID" => Some("ENV_DEVICE".to_owned()),
            "GATEWAY_BASE" => Some("http://env:9090".to_owned()),
            "DEFAULT_CURRENCY" => Some("EURC".to_owned()),
            _ => None,
        };
        let config = RunConfig::resolve(&cli(&["--id", "FLAG_DEVICE"]), env);
        assert_eq!(config.device_id, "FLAG_DEVICE");
        assert_eq!(config.gateway_base, "http://env:9090");
        assert_eq!(config.default_currency, "EURC");
    }

    #[test]
    fn gateway_trailing_slashes_are_stripped() {
        let config = RunConfig::resolve(&cli(&["--gateway", "https://gw.example/"]), no_env);
        assert_eq!(config.gateway_base, "https://gw.example");

        let config = RunConfig::resolve(&cli(&[]), |name| {
            (name == "GATEWAY_BASE").then(|| "http://gw:8080///".to_owned())
        });
        assert_eq!(config.gateway_base, "http://gw:8080");
    }

    #[test]
    fn auto_verify_flag_presence_overrides_env() {
        let env_true = |name: &str| (name == "AUTO_VERIFY").then(|| "true".to_owned());

        assert!(RunConfig::resolve(&cli(&[]), env_true).auto_verify);
        assert!(RunConfig::resolve(&cli(&["--auto-verify"]), no_env).auto_verify);
        // Explicit `--auto-verify false` wins over AUTO_VERIFY=true.
        assert!(!RunConfig::resolve(&cli(&["--auto-verify", "false"]), env_true).auto_verify);
        // Anything but the literal "true" in the env is false.
        let env_yes = |name: &str| (name == "AUTO_VERIFY").then(|| "yes".to_owned());
        assert!(!RunConfig::resolve(&cli(&[]), env_yes).auto_verify);
    }

    #[test]
    fn malformed_numeric_env_falls_back_to_default() {
        let env = |name: &str| match name {
            "VERIFY_DELAY_MS" => Some("soon".to_owned()),
            "DEFAULT_AMOUNT" => Some("lots".to_owned()),
            _ => None,
        };
        let config = RunConfig::resolve(&cli(&[]), env);
        assert_eq!(config.verify_delay, Duration::from_millis(1000));
        assert_eq!(config.default_amount, 0.25);
    }

    #[test]
    fn numeric_env_values_parse() {
        let env = |name: &str| match name {
            "VERIFY_DELAY_MS" => Some("250".to_owned()),
            "DEFAULT_AMOUNT" => Some("1.5".to_owned()),
            _ => None,
        };
        let config = RunConfig::resolve(&cli(&[]), env);
        assert_eq!(config.verify_delay, Duration::from_millis(250));
        assert_eq!(config.default_amount, 1.5);
    }

    #[test]
    fn non_positive_amount_env_falls_back_to_default() {
        for bad in ["0", "-1", "-0.25"] {
            let config = RunConfig::resolve(&cli(&[]), |name| {
                (name == "DEFAULT_AMOUNT").then(|| bad.to_owned())
            });
            assert_eq!(config.default_amount, 0.25, "env value {bad:?}");
        }
    }

    #[test]
    fn non_positive_amount_flag_is_rejected_at_parse_time() {
        assert!(Cli::try_parse_from(["payterm-sim", "--amount", "0"]).is_err());
        assert!(Cli::try_parse_from(["payterm-sim", "--amount", "-1"]).is_err());
        assert!(Cli::try_parse_from(["payterm-sim", "--amount", "0.5"]).is_ok());
    }

    #[test]
    fn amount_flag_beats_env() {
        let env = |name: &str| (name == "DEFAULT_AMOUNT").then(|| "9.0".to_owned());
        let config = RunConfig::resolve(&cli(&["--amount", "0.5"]), env);
        assert_eq!(config.default_amount, 0.5);
    }
}
