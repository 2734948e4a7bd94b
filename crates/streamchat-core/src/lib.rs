//! Core abstractions for the streaming chat client.
//!
//! This crate provides the vocabulary shared by the other crates:
//! - `ChatContext` - The session object holding the active connection
//! - `ClientConfig` - Endpoint configuration
//! - `ChatView` / `Connection` / `ConnectionHandler` traits
//! - `ConnectionEvent` - Connection lifecycle events

pub mod config;
pub mod context;
pub mod traits;

pub use config::{ClientConfig, ConfigError};
pub use context::ChatContext;
pub use traits::{
    BubbleId, BubbleKind, ChatView, Connection, ConnectionEvent, ConnectionHandler, Key,
    SendError, ViewError,
};
