//! Chat page bootstrap.
//!
//! Provides:
//! - `ChatPage` - Owns the context, the view and the frame dispatcher, and
//!   exposes the page's entry points (send, key down, source click)

pub mod page;

pub use page::ChatPage;

#[cfg(feature = "websocket")]
pub use page::bootstrap;
