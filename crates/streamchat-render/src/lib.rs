//! Render layer for the chat page.
//!
//! Provides:
//! - `sanitize` - Markup escaping with preserved line breaks
//! - `TemplateSet` - The bubble templates a host page supplies
//! - `ChatDocument` - In-memory chat document implementing `ChatView`

pub mod document;
pub mod sanitize;
pub mod template;

pub use document::{Bubble, ChatDocument, MESSAGES_CONTAINER_ID, USER_INPUT_ID};
pub use sanitize::sanitize;
pub use template::{RenderError, Template, TemplateSet};
