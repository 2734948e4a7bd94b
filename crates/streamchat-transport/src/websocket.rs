//! WebSocket client transport.
//!
//! [`open`] spawns one task per connection. The task turns socket traffic into
//! [`ConnectionEvent`]s and drains queued outbound text into the socket; the
//! page consumes the events on its own loop, one at a time.

use futures::{SinkExt, StreamExt};
use streamchat_core::{ClientConfig, Connection, ConnectionEvent, SendError};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use uuid::Uuid;

/// Receiver of connection lifecycle events.
pub type EventReceiver = mpsc::UnboundedReceiver<ConnectionEvent>;

/// Transport error.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

/// Handle to an open (or opening) WebSocket connection.
///
/// Text sent before the handshake completes is queued. Dropping every clone of
/// the handle closes the connection.
#[derive(Debug, Clone)]
pub struct WsConnection {
    id: Uuid,
    outbound: mpsc::UnboundedSender<String>,
}

impl WsConnection {
    /// Connection identifier, used in logs.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Whether the connection task has finished.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

impl Connection for WsConnection {
    fn send_text(&self, text: String) -> Result<(), SendError> {
        self.outbound
            .send(text)
            .map_err(|_| SendError::ConnectionClosed)
    }
}

/// Open a connection to the configured endpoint.
///
/// Never fails directly: a failed handshake is reported as
/// [`ConnectionEvent::Error`] followed by [`ConnectionEvent::Closed`]. Every
/// connection ends with exactly one `Closed`.
///
/// Must be called from within a Tokio runtime.
#[must_use]
pub fn open(config: &ClientConfig) -> (WsConnection, EventReceiver) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<String>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<ConnectionEvent>();
    let id = Uuid::new_v4();
    let endpoint = config.endpoint().to_string();
    install_crypto_provider();

    tokio::spawn(async move {
        if let Err(e) = run_connection(id, &endpoint, outbound_rx, &event_tx).await {
            tracing::warn!(connection = %id, "WebSocket error: {e}");
            let _ = event_tx.send(ConnectionEvent::Error(e.to_string()));
        }
        tracing::info!(connection = %id, "connection closed");
        let _ = event_tx.send(ConnectionEvent::Closed);
    });

    (
        WsConnection {
            id,
            outbound: outbound_tx,
        },
        event_rx,
    )
}

/// Install the process-wide TLS provider used by `wss` endpoints.
fn install_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        // Another thread may have installed one first.
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    }
}

async fn run_connection(
    id: Uuid,
    endpoint: &str,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: &mpsc::UnboundedSender<ConnectionEvent>,
) -> Result<(), TransportError> {
    let (socket, _response) = tokio_tungstenite::connect_async(endpoint).await?;
    tracing::info!(connection = %id, %endpoint, "connected via websocket");
    let _ = events.send(ConnectionEvent::Opened);

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            outgoing = outbound.recv() => {
                let Some(text) = outgoing else {
                    // Every handle dropped.
                    let _ = sender.close().await;
                    return Ok(());
                };
                tracing::debug!(connection = %id, bytes = text.len(), "sending frame");
                sender.send(Message::Text(text.into())).await?;
            }
            incoming = receiver.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(t))) => t.as_str().to_owned(),
                    Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                        Ok(s) => s,
                        Err(_) => {
                            tracing::warn!(connection = %id, "dropping non-UTF-8 binary frame");
                            continue;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(e.into()),
                };
                tracing::trace!(connection = %id, %text, "got message");
                let _ = events.send(ConnectionEvent::Message(text));
            }
        }
    }
}
