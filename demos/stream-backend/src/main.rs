//! Example chat backend that streams replies in the chat wire format.
//!
//! Run with: cargo run -p stream-backend
//!
//! Then point a client at ws://127.0.0.1:5007/api/v1/stream.

use std::{net::SocketAddr, time::Duration};

use axum::{
    Router,
    extract::{
        WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use streamchat_transport::{InboundFrame, OutboundFrame};
use tokio::sync::mpsc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

const DEFAULT_BIND: &str = "127.0.0.1:5007";
const CHUNK_DELAY: Duration = Duration::from_millis(80);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let addr: SocketAddr = std::env::var("STREAMCHAT_BIND")
        .unwrap_or_else(|_| DEFAULT_BIND.to_string())
        .parse()?;

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/api/v1/stream", get(ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    tracing::info!("Backend listening on ws://{addr}/api/v1/stream");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index_handler() -> &'static str {
    "streamchat backend: connect a WebSocket client to /api/v1/stream\n"
}

async fn ws_handler(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(handle_socket)
}

async fn handle_socket(socket: WebSocket) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let ws_id = Uuid::new_v4();
    tracing::info!("WebSocket {ws_id} connected");

    // Channel for sending frames to the WebSocket
    let (tx, mut rx) = mpsc::unbounded_channel::<InboundFrame>();

    // Spawn task to forward frames to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let json = match serde_json::to_string(&frame) {
                Ok(j) => j,
                Err(e) => {
                    tracing::error!("Failed to serialize frame: {e}");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut reply_task: Option<tokio::task::JoinHandle<()>> = None;

    // Handle incoming WebSocket messages
    while let Some(msg) = ws_receiver.next().await {
        let text = match msg {
            Ok(Message::Text(t)) => t.as_str().to_owned(),
            Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                Ok(s) => s,
                Err(_) => continue,
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::error!("WebSocket error: {e}");
                break;
            }
        };

        let request: OutboundFrame = match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Invalid client message: {e}");
                continue;
            }
        };
        tracing::info!("WebSocket {ws_id} got message: {}", request.message);

        // One turn at a time: a new message cuts the previous reply short.
        if let Some(task) = reply_task.take() {
            task.abort();
        }
        let tx = tx.clone();
        reply_task = Some(tokio::spawn(async move {
            for frame in reply_frames(&request.message) {
                if tx.send(frame).is_err() {
                    break;
                }
                tokio::time::sleep(CHUNK_DELAY).await;
            }
        }));
    }

    // Cleanup
    if let Some(task) = reply_task {
        task.abort();
    }
    send_task.abort();

    tracing::info!("WebSocket {ws_id} disconnected");
}

/// Frames for one streamed reply: thinking ticks, a tool frame, the text word
/// by word, then the end-of-stream marker.
fn reply_frames(message: &str) -> Vec<InboundFrame> {
    let mut frames = vec![
        InboundFrame::chunk(0, "<thinking>"),
        InboundFrame::chunk(1, "<thinking>"),
        InboundFrame::tool_info(format!(
            "echo: {} characters, {} lines",
            message.chars().count(),
            message.lines().count()
        )),
    ];

    let reply = format!("\nYou said: {message}");
    let mut num = 2;
    for (i, word) in reply.split(' ').enumerate() {
        let chunk = if i == 0 {
            word.to_string()
        } else {
            format!(" {word}")
        };
        frames.push(InboundFrame::chunk(num, chunk));
        num += 1;
    }
    frames.push(InboundFrame::end_of_stream(num));
    frames
}

#[cfg(test)]
mod tests {
    use streamchat_transport::FrameKind;

    use super::*;

    #[test]
    fn test_reply_frames_shape() {
        let frames = reply_frames("hi there");
        let kinds: Vec<FrameKind> = frames.iter().map(InboundFrame::kind).collect();
        assert_eq!(kinds.first(), Some(&FrameKind::FirstChunk));
        assert_eq!(kinds[2], FrameKind::ToolInfo);
        assert_eq!(kinds.last(), Some(&FrameKind::EndOfStream));

        let text: String = frames[3..]
            .iter()
            .filter_map(|f| f.text.as_deref())
            .collect();
        assert_eq!(text, "\nYou said: hi there");
    }
}
