//! Realtime event listener.
//!
//! The realtime endpoint is derived from the HTTP gateway base: the scheme is
//! swapped to its WebSocket counterpart (`https` → `wss`, `http` → `ws`), the
//! path is replaced with the configured realtime path, and the query is set
//! to exactly one `deviceId` parameter.
//!
//! Inbound frames are only logged, never acted upon. A closed or errored
//! connection stays closed for the rest of the process; there is no
//! reconnection.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use crate::config::RunConfig;
use crate::error::StartupError;

/// Derives the realtime endpoint URL from the gateway base URL.
///
/// # Errors
///
/// Returns [`StartupError`] if the base does not parse or its scheme has no
/// WebSocket counterpart.
pub fn realtime_url(config: &RunConfig) -> Result<Url, StartupError> {
    let mut url = Url::parse(&config.gateway_base).map_err(|e| StartupError::GatewayUrl {
        url: config.gateway_base.clone(),
        source: e,
    })?;

    let scheme = match url.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => {
            return Err(StartupError::UnsupportedScheme {
                scheme: other.to_owned(),
            });
        }
    };
    // Infallible: http(s) and ws(s) are all "special" schemes to the url crate.
    url.set_scheme(scheme)
        .map_err(|()| StartupError::UnsupportedScheme {
            scheme: scheme.to_owned(),
        })?;

    url.set_path(&config.realtime_path);
    url.set_query(None);
    url.query_pairs_mut()
        .append_pair("deviceId", &config.device_id);
    Ok(url)
}

/// Handle to the open realtime connection.
///
/// Dropping the handle closes the connection; [`RealtimeHandle::close`] does
/// the same but waits for the close frame to be sent.
#[derive(Debug)]
pub struct RealtimeHandle {
    close_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl RealtimeHandle {
    /// Sends a Close frame and waits for the listener task to finish.
    ///
    /// Best-effort: if the connection already died the task has exited and
    /// this returns immediately.
    pub async fn close(self) {
        let _ = self.close_tx.send(());
        let _ = self.task.await;
    }
}

/// Connects to the realtime endpoint and spawns the listener task.
///
/// # Errors
///
/// Returns [`StartupError`] if the URL cannot be derived or the connection
/// cannot be opened. This is the only fatal network failure in the program.
pub async fn connect(config: &RunConfig) -> Result<RealtimeHandle, StartupError> {
    let url = realtime_url(config)?;
    let (stream, _response) = connect_async(url.as_str()).await?;
    tracing::info!(device = %config.device_id, %url, "Realtime connection established");

    let (close_tx, close_rx) = oneshot::channel();
    let task = tokio::spawn(listen(stream, close_rx));
    Ok(RealtimeHandle { close_tx, task })
}

async fn listen(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mut close_rx: oneshot::Receiver<()>,
) {
    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            _ = &mut close_rx => {
                let _ = sink.send(Message::Close(None)).await;
                tracing::info!("Realtime connection closed by terminal");
                return;
            }
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => log_event(&text),
                Some(Ok(Message::Binary(bytes))) => {
                    tracing::info!(len = bytes.len(), "Inbound binary frame");
                }
                Some(Ok(Message::Close(frame))) => {
                    match frame {
                        Some(f) => tracing::info!(
                            code = %f.code,
                            reason = %f.reason,
                            "Realtime connection closed by gateway"
                        ),
                        None => tracing::info!("Realtime connection closed by gateway"),
                    }
                    return;
                }
                // Ping/pong is answered by the library.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Realtime connection error");
                    return;
                }
                None => {
                    tracing::info!("Realtime stream ended");
                    return;
                }
            }
        }
    }
}

/// Logs an inbound text frame, parsed as JSON when possible, raw otherwise.
///
/// Malformed payloads must never take the listener down.
fn log_event(text: &str) {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(event) => tracing::info!(%event, "Inbound event"),
        Err(_) => tracing::info!(raw = text, "Inbound event (unparsed)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Cli;
    use clap::Parser;

    fn config(gateway: &str, device: &str) -> RunConfig {
        let cli = Cli::parse_from(["payterm-sim", "--gateway", gateway, "--id", device]);
        RunConfig::resolve(&cli, |_| None)
    }

    #[test]
    fn plain_http_derives_plain_ws() {
        let url = realtime_url(&config("http://localhost:8080", "DEVICE_1")).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8080/ws?deviceId=DEVICE_1");
    }

    #[test]
    fn secure_http_derives_secure_ws() {
        let url = realtime_url(&config("https://gw.example", "DEVICE_1")).unwrap();
        assert_eq!(url.as_str(), "wss://gw.example/ws?deviceId=DEVICE_1");
    }

    #[test]
    fn gateway_path_is_replaced_with_the_realtime_path() {
        let cli = Cli::parse_from(["payterm-sim", "--gateway", "https://gw.example/api/v1"]);
        let config = RunConfig::resolve(&cli, |name| {
            (name == "WS_PATH").then(|| "/events".to_owned())
        });
        let url = realtime_url(&config).unwrap();
        assert_eq!(url.as_str(), "wss://gw.example/events?deviceId=DEVICE_1");
    }

    #[test]
    fn device_id_is_the_only_query_parameter_and_is_escaped() {
        let url = realtime_url(&config("http://gw.example", "device one&two")).unwrap();
        assert_eq!(url.query_pairs().count(), 1);
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "deviceId");
        assert_eq!(value, "device one&two");
        assert_eq!(url.query(), Some("deviceId=device+one%26two"));
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let err = realtime_url(&config("ftp://gw.example", "DEVICE_1")).unwrap_err();
        assert!(matches!(err, StartupError::UnsupportedScheme { .. }));
    }
}
