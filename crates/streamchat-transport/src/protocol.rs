//! Wire protocol for client-server communication.

use std::num::FpCategory;

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// `event` value marking a tool/source frame.
pub const TOOL_INFO_EVENT: &str = "ToolInfo";

/// Message from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    /// Text the user typed.
    pub message: String,
}

impl OutboundFrame {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Serialize to the JSON text sent over the wire.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Message from server to client.
///
/// Every field is optional; a `null` counts as absent. Unknown fields are
/// ignored. `message_num` takes any JSON number, so `0.0` opens a turn like `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_num: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// How a frame is treated, in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Tool/source information; gets its own bubble.
    ToolInfo,
    /// First chunk of a new assistant turn.
    FirstChunk,
    /// End of the current turn.
    EndOfStream,
    /// More text for the current turn.
    Continuation,
}

impl InboundFrame {
    /// Parse a frame from JSON text.
    ///
    /// # Errors
    /// Returns error if `payload` is not a JSON object of the expected shape.
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Tool/source frame.
    #[must_use]
    pub fn tool_info(text: impl Into<String>) -> Self {
        Self {
            event: Some(TOOL_INFO_EVENT.to_string()),
            message_num: None,
            text: Some(text.into()),
        }
    }

    /// Text chunk number `message_num` of a turn. Chunk 0 opens the turn.
    #[must_use]
    pub fn chunk(message_num: i64, text: impl Into<String>) -> Self {
        Self {
            event: None,
            message_num: Some(message_num.into()),
            text: Some(text.into()),
        }
    }

    /// End-of-stream marker closing turn chunk `message_num`.
    #[must_use]
    pub fn end_of_stream(message_num: i64) -> Self {
        Self {
            event: None,
            message_num: Some(message_num.into()),
            text: None,
        }
    }

    /// Classify the frame.
    #[must_use]
    pub fn kind(&self) -> FrameKind {
        if self.event.as_deref() == Some(TOOL_INFO_EVENT) {
            FrameKind::ToolInfo
        } else if self.message_num.as_ref().is_some_and(is_zero) {
            FrameKind::FirstChunk
        } else if self.text.is_none() {
            FrameKind::EndOfStream
        } else {
            FrameKind::Continuation
        }
    }
}

fn is_zero(n: &Number) -> bool {
    n.as_f64().is_some_and(|f| f.classify() == FpCategory::Zero)
}
