//! Transport layer for the chat page.
//!
//! Provides:
//! - Wire protocol (JSON frames)
//! - Frame dispatch policy and outbound send
//! - WebSocket client (feature: websocket)
//! - TUI input bridge (feature: tui)

pub mod adapter;
pub mod protocol;

#[cfg(feature = "websocket")]
pub mod websocket;

#[cfg(feature = "tui")]
pub mod tui;

pub use adapter::{DispatchError, FrameDispatcher, send_chat};
pub use protocol::{FrameKind, InboundFrame, OutboundFrame};
