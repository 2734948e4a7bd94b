//! Core traits for rendering and connection handling.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Handle to a rendered bubble, returned when the bubble is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BubbleId(u64);

impl BubbleId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BubbleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of chat bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BubbleKind {
    /// Message typed by the user.
    User,
    /// Assistant response, possibly still streaming.
    Bot,
    /// Tool or source information attached to a turn.
    Source,
}

impl BubbleKind {
    /// Id of the template a bubble of this kind is cloned from.
    #[must_use]
    pub const fn template_id(self) -> &'static str {
        match self {
            Self::User => "message-user-template",
            Self::Bot => "message-bot-template",
            Self::Source => "message-sources-template",
        }
    }

    /// CSS class that marks a bubble of this kind.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
            Self::Source => "sources",
        }
    }
}

/// Keyboard input the page reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Submit the input.
    Enter,
    /// A printable character typed into the input.
    Char(char),
    /// Delete the last character of the input.
    Backspace,
    /// Any key the page ignores.
    Other,
}

/// Render layer error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("Bubble not found: {0}")]
    NotFound(BubbleId),
    #[error("Bubble {id} is a {actual:?} bubble, expected {expected:?}")]
    WrongKind {
        id: BubbleId,
        expected: BubbleKind,
        actual: BubbleKind,
    },
}

/// Send error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("Connection closed")]
    ConnectionClosed,
}

/// The document a chat page renders into.
///
/// Every text argument is raw text; implementations sanitize it before it
/// becomes markup.
pub trait ChatView {
    /// Append a new user bubble.
    fn add_user_bubble(&mut self, text: &str) -> BubbleId;

    /// Append a new bot bubble.
    fn add_bot_bubble(&mut self, text: &str) -> BubbleId;

    /// Append a new source/tool bubble.
    fn add_source_bubble(&mut self, text: &str) -> BubbleId;

    /// Append text to an existing bot bubble.
    ///
    /// # Errors
    /// Returns error if `id` does not name a bot bubble.
    fn append_to_bot_bubble(&mut self, id: BubbleId, text: &str) -> Result<(), ViewError>;

    /// Text content of a bubble, as a reader of the page would see it.
    fn text_content(&self, id: BubbleId) -> Option<String>;

    /// Collapse or expand a source bubble. Returns whether it is now minimized.
    ///
    /// # Errors
    /// Returns error if `id` does not name a source bubble.
    fn toggle_source_minimized(&mut self, id: BubbleId) -> Result<bool, ViewError>;

    /// Current value of the input field.
    fn input_value(&self) -> &str;

    /// Replace the value of the input field.
    fn set_input_value(&mut self, value: String);

    /// Empty the input field.
    fn clear_input(&mut self) {
        self.set_input_value(String::new());
    }
}

/// Outbound side of a streaming connection.
pub trait Connection {
    /// Queue a text frame for the peer.
    ///
    /// # Errors
    /// Returns error if the connection has already shut down.
    fn send_text(&self, text: String) -> Result<(), SendError>;
}

/// Receiver of connection lifecycle events, one method per event kind.
pub trait ConnectionHandler {
    /// Error produced while handling an inbound message.
    type Error;

    /// The connection was established.
    fn on_open(&mut self);

    /// A text frame arrived.
    ///
    /// # Errors
    /// Returns error if the frame cannot be handled.
    fn on_message(&mut self, payload: &str) -> Result<(), Self::Error>;

    /// The connection closed.
    fn on_close(&mut self);

    /// The connection failed.
    fn on_error(&mut self, reason: &str);
}

/// Connection lifecycle event, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Handshake completed.
    Opened,
    /// A text payload from the server.
    Message(String),
    /// The connection ended. Always the last event.
    Closed,
    /// The connection failed, with a reason for logs.
    Error(String),
}

impl ConnectionEvent {
    /// Route this event to the matching handler method.
    ///
    /// # Errors
    /// Returns the handler's error for a message it could not handle.
    pub fn deliver<H>(self, handler: &mut H) -> Result<(), H::Error>
    where
        H: ConnectionHandler + ?Sized,
    {
        match self {
            Self::Opened => handler.on_open(),
            Self::Message(payload) => return handler.on_message(&payload),
            Self::Closed => handler.on_close(),
            Self::Error(reason) => handler.on_error(&reason),
        }
        Ok(())
    }

    /// Whether this event ends the connection.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl ConnectionHandler for Recorder {
        type Error = String;

        fn on_open(&mut self) {
            self.calls.push("open".into());
        }

        fn on_message(&mut self, payload: &str) -> Result<(), Self::Error> {
            if payload.is_empty() {
                return Err("empty".into());
            }
            self.calls.push(format!("message:{payload}"));
            Ok(())
        }

        fn on_close(&mut self) {
            self.calls.push("close".into());
        }

        fn on_error(&mut self, reason: &str) {
            self.calls.push(format!("error:{reason}"));
        }
    }

    #[test]
    fn test_deliver_routes_each_event_kind() {
        let mut recorder = Recorder::default();
        let events = [
            ConnectionEvent::Opened,
            ConnectionEvent::Message("hi".into()),
            ConnectionEvent::Error("boom".into()),
            ConnectionEvent::Closed,
        ];
        for event in events {
            event.deliver(&mut recorder).unwrap();
        }
        assert_eq!(
            recorder.calls,
            vec!["open", "message:hi", "error:boom", "close"]
        );
    }

    #[test]
    fn test_deliver_propagates_handler_error() {
        let mut recorder = Recorder::default();
        let result = ConnectionEvent::Message(String::new()).deliver(&mut recorder);
        assert_eq!(result, Err("empty".to_string()));
        assert!(recorder.calls.is_empty());
    }

    #[test]
    fn test_terminal_events() {
        assert!(ConnectionEvent::Closed.is_terminal());
        assert!(ConnectionEvent::Error(String::new()).is_terminal());
        assert!(!ConnectionEvent::Opened.is_terminal());
        assert!(!ConnectionEvent::Message(String::new()).is_terminal());
    }

    #[test]
    fn test_kind_templates() {
        assert_eq!(BubbleKind::User.template_id(), "message-user-template");
        assert_eq!(BubbleKind::Bot.template_id(), "message-bot-template");
        assert_eq!(BubbleKind::Source.template_id(), "message-sources-template");
        assert_eq!(
            serde_json::to_string(&BubbleKind::Source).unwrap(),
            "\"source\""
        );
    }
}
