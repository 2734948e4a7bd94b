//! Frame dispatch and outbound send.
//!
//! Inbound frames become render calls on a [`ChatView`]; outbound user text
//! becomes an [`OutboundFrame`] written to the context's connection.

use streamchat_core::{BubbleId, ChatContext, ChatView, Connection, ViewError};
use thiserror::Error;

use crate::protocol::{FrameKind, InboundFrame, OutboundFrame};

/// Bot bubble text shown when the connection closes.
pub const CONNECTION_CLOSED_TEXT: &str = "<connection closed>";

/// Bot bubble text shown when the connection fails.
pub const CONNECTION_ERROR_TEXT: &str = "<connection error>";

/// Marker the backend repeats while the model is thinking.
pub const THINKING_MARKER: &str = "<thinking>";

/// Error handling an inbound frame.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),
    #[error("Continuation frame with no bot bubble in progress")]
    NoBotBubble,
    #[error("Render error: {0}")]
    View(#[from] ViewError),
}

/// Applies the dispatch policy for inbound frames.
///
/// Holds the handle of the bot bubble currently being streamed into. At most
/// one bot bubble is in progress; a new first chunk replaces it.
#[derive(Debug, Default)]
pub struct FrameDispatcher {
    current_bot: Option<BubbleId>,
}

impl FrameDispatcher {
    #[must_use]
    pub const fn new() -> Self {
        Self { current_bot: None }
    }

    /// The bot bubble receiving continuation chunks.
    #[must_use]
    pub const fn current_bot_bubble(&self) -> Option<BubbleId> {
        self.current_bot
    }

    /// Parse a JSON payload and dispatch it.
    ///
    /// # Errors
    /// Returns error if the payload is malformed or cannot be rendered.
    pub fn handle_payload<V>(&mut self, view: &mut V, payload: &str) -> Result<(), DispatchError>
    where
        V: ChatView + ?Sized,
    {
        let frame = InboundFrame::parse(payload)?;
        self.handle_message(view, frame)
    }

    /// Dispatch one frame.
    ///
    /// # Errors
    /// Returns error if a continuation arrives before any first chunk, or the
    /// view rejects the append.
    pub fn handle_message<V>(&mut self, view: &mut V, frame: InboundFrame) -> Result<(), DispatchError>
    where
        V: ChatView + ?Sized,
    {
        let kind = frame.kind();
        tracing::debug!(?kind, message_num = ?frame.message_num, "inbound frame");

        match kind {
            FrameKind::ToolInfo => {
                view.add_source_bubble(frame.text.as_deref().unwrap_or_default());
            }
            FrameKind::FirstChunk => {
                let id = view.add_bot_bubble(frame.text.as_deref().unwrap_or_default());
                self.current_bot = Some(id);
            }
            FrameKind::EndOfStream => {
                tracing::debug!(bubble = ?self.current_bot, "turn complete");
            }
            FrameKind::Continuation => {
                let id = self.current_bot.ok_or(DispatchError::NoBotBubble)?;
                let text = frame.text.unwrap_or_default();
                if text == THINKING_MARKER
                    && view
                        .text_content(id)
                        .is_some_and(|content| content.ends_with(THINKING_MARKER))
                {
                    tracing::trace!(%id, "repeated thinking marker suppressed");
                    return Ok(());
                }
                view.append_to_bot_bubble(id, &text)?;
            }
        }
        Ok(())
    }

    /// Render the connection-closed notice. The turn in progress ends with it.
    pub fn connection_closed<V>(&mut self, view: &mut V)
    where
        V: ChatView + ?Sized,
    {
        self.current_bot = None;
        view.add_bot_bubble(CONNECTION_CLOSED_TEXT);
    }

    /// Render the connection-error notice. The turn in progress ends with it.
    pub fn connection_failed<V>(&mut self, view: &mut V)
    where
        V: ChatView + ?Sized,
    {
        self.current_bot = None;
        view.add_bot_bubble(CONNECTION_ERROR_TEXT);
    }
}

/// Send user text over the context's connection.
///
/// Without a connection, or once the connection has shut down, the message is
/// dropped silently. Returns whether the frame was handed to a connection.
pub fn send_chat<C: Connection>(context: &ChatContext<C>, text: &str) -> bool {
    let Some(connection) = context.connection() else {
        tracing::debug!(session = %context.session_id(), "no connection, message dropped");
        return false;
    };

    let json = match OutboundFrame::new(text).to_json() {
        Ok(j) => j,
        Err(e) => {
            tracing::error!("Failed to serialize message: {e}");
            return false;
        }
    };

    match connection.send_text(json) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(session = %context.session_id(), "message dropped: {e}");
            false
        }
    }
}
