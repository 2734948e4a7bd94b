//! Chat session context.

use uuid::Uuid;

use crate::traits::Connection;

/// Session context for one chat page.
///
/// Holds the active connection handle, if any. The page owns the context and
/// passes it to the transport explicitly; there is no process-wide state.
#[derive(Debug)]
pub struct ChatContext<C> {
    session_id: Uuid,
    endpoint: Option<String>,
    connection: Option<C>,
}

impl<C> Default for ChatContext<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ChatContext<C> {
    /// Create a context with no connection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            endpoint: None,
            connection: None,
        }
    }

    /// Identifier of this page session, used in logs.
    #[must_use]
    pub const fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Endpoint of the current (or last) connection.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Whether a connection handle is held.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Drop the connection handle, returning it.
    pub fn detach(&mut self) -> Option<C> {
        self.connection.take()
    }
}

impl<C: Connection> ChatContext<C> {
    /// Store a new connection, replacing any previous one wholesale.
    ///
    /// Returns the replaced handle.
    pub fn attach(&mut self, endpoint: impl Into<String>, connection: C) -> Option<C> {
        let endpoint = endpoint.into();
        tracing::debug!(session = %self.session_id, %endpoint, "attaching connection");
        self.endpoint = Some(endpoint);
        self.connection.replace(connection)
    }

    /// The active connection.
    #[must_use]
    pub const fn connection(&self) -> Option<&C> {
        self.connection.as_ref()
    }
}
