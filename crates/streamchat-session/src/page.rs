//! The chat page: bootstrap and entry points.

use streamchat_core::{
    BubbleId, ChatContext, ChatView, Connection, ConnectionEvent, ConnectionHandler, Key,
    ViewError,
};
use streamchat_transport::{DispatchError, FrameDispatcher, send_chat};

#[cfg(feature = "websocket")]
use streamchat_core::ClientConfig;
#[cfg(feature = "websocket")]
use streamchat_transport::websocket::{self, EventReceiver, WsConnection};

/// A chat page.
///
/// All page state lives here and every handler takes `&mut self`, so the
/// host's event loop serializes them.
pub struct ChatPage<V, C> {
    context: ChatContext<C>,
    view: V,
    dispatcher: FrameDispatcher,
}

impl<V, C> ChatPage<V, C>
where
    V: ChatView,
    C: Connection,
{
    /// Create a page with no connection.
    #[must_use]
    pub fn new(view: V) -> Self {
        Self {
            context: ChatContext::new(),
            view,
            dispatcher: FrameDispatcher::new(),
        }
    }

    /// Store a connection in the page's context, replacing any previous one.
    pub fn attach(&mut self, endpoint: &str, connection: C) {
        if self.context.attach(endpoint, connection).is_some() {
            tracing::debug!(session = %self.context.session_id(), "previous connection replaced");
        }
    }

    #[must_use]
    pub const fn context(&self) -> &ChatContext<C> {
        &self.context
    }

    #[must_use]
    pub const fn view(&self) -> &V {
        &self.view
    }

    pub const fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Bot bubble currently receiving streamed text.
    #[must_use]
    pub const fn current_bot_bubble(&self) -> Option<BubbleId> {
        self.dispatcher.current_bot_bubble()
    }

    /// Send button handler: send the input, show it, clear the input.
    pub fn send_clicked(&mut self) -> BubbleId {
        let text = self.view.input_value().to_owned();
        tracing::debug!(session = %self.context.session_id(), chars = text.chars().count(), "send clicked");

        send_chat(&self.context, &text);
        let id = self.view.add_user_bubble(&text);
        self.view.clear_input();
        id
    }

    /// Key handler for the input field.
    ///
    /// Returns the new user bubble when the key sent a message.
    pub fn key_down(&mut self, key: Key) -> Option<BubbleId> {
        match key {
            Key::Enter => return Some(self.send_clicked()),
            Key::Char(c) => {
                let mut value = self.view.input_value().to_owned();
                value.push(c);
                self.view.set_input_value(value);
            }
            Key::Backspace => {
                let mut value = self.view.input_value().to_owned();
                if value.pop().is_some() {
                    self.view.set_input_value(value);
                }
            }
            Key::Other => {}
        }
        None
    }

    /// Click handler for source bubbles.
    ///
    /// # Errors
    /// Returns error if `id` is not a source bubble.
    pub fn source_clicked(&mut self, id: BubbleId) -> Result<bool, ViewError> {
        self.view.toggle_source_minimized(id)
    }

    /// Route one connection event to its handler.
    ///
    /// # Errors
    /// Returns error if an inbound frame could not be dispatched.
    pub fn handle_event(&mut self, event: ConnectionEvent) -> Result<(), DispatchError> {
        event.deliver(self)
    }
}

impl<V, C> ConnectionHandler for ChatPage<V, C>
where
    V: ChatView,
    C: Connection,
{
    type Error = DispatchError;

    fn on_open(&mut self) {
        tracing::info!(
            session = %self.context.session_id(),
            endpoint = self.context.endpoint().unwrap_or_default(),
            "connected via websocket"
        );
    }

    fn on_message(&mut self, payload: &str) -> Result<(), Self::Error> {
        self.dispatcher.handle_payload(&mut self.view, payload)
    }

    fn on_close(&mut self) {
        // No reconnect: a closed connection stays closed until the page reloads.
        self.context.detach();
        self.dispatcher.connection_closed(&mut self.view);
    }

    fn on_error(&mut self, reason: &str) {
        tracing::warn!(session = %self.context.session_id(), "connection error: {reason}");
        self.context.detach();
        self.dispatcher.connection_failed(&mut self.view);
    }
}

#[cfg(feature = "websocket")]
impl<V: ChatView> ChatPage<V, WsConnection> {
    /// Open the WebSocket connection and store it in the context.
    ///
    /// Returns the receiver the host loop feeds into [`Self::handle_event`].
    /// Must be called from within a Tokio runtime.
    pub fn open(&mut self, config: &ClientConfig) -> EventReceiver {
        let (connection, events) = websocket::open(config);
        self.attach(config.endpoint(), connection);
        events
    }

    /// Handle every event already queued, without waiting.
    ///
    /// Dispatch errors are logged and the offending frame is dropped. Returns
    /// how many events were handled.
    pub fn drain_events(&mut self, events: &mut EventReceiver) -> usize {
        let mut handled = 0;
        while let Ok(event) = events.try_recv() {
            if let Err(e) = self.handle_event(event) {
                tracing::error!(session = %self.context.session_id(), "dropping frame: {e}");
            }
            handled += 1;
        }
        handled
    }
}

/// Page-ready bootstrap: build the page and open its connection.
///
/// Must be called from within a Tokio runtime.
#[cfg(feature = "websocket")]
pub fn bootstrap<V: ChatView>(
    view: V,
    config: &ClientConfig,
) -> (ChatPage<V, WsConnection>, EventReceiver) {
    let mut page = ChatPage::new(view);
    let events = page.open(config);
    (page, events)
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use streamchat_core::{BubbleKind, SendError};
    use streamchat_render::{ChatDocument, TemplateSet};

    use super::*;

    #[derive(Clone, Default)]
    struct FakeConnection {
        sent: Rc<RefCell<Vec<String>>>,
    }

    impl Connection for FakeConnection {
        fn send_text(&self, text: String) -> Result<(), SendError> {
            self.sent.borrow_mut().push(text);
            Ok(())
        }
    }

    fn page() -> (ChatPage<ChatDocument, FakeConnection>, FakeConnection) {
        let mut page = ChatPage::new(ChatDocument::new(TemplateSet::default()).unwrap());
        let connection = FakeConnection::default();
        page.attach("ws://test/api/v1/stream", connection.clone());
        (page, connection)
    }

    fn type_text(page: &mut ChatPage<ChatDocument, FakeConnection>, text: &str) {
        for c in text.chars() {
            assert_eq!(page.key_down(Key::Char(c)), None);
        }
    }

    #[test]
    fn test_send_clicked_sends_renders_and_clears() {
        let (mut page, connection) = page();
        page.view_mut().set_input_value("hello\nworld".into());

        let id = page.send_clicked();

        let bubble = page.view().bubble(id).unwrap();
        assert_eq!(bubble.kind(), BubbleKind::User);
        assert_eq!(bubble.markup(), "hello<br />world");
        assert_eq!(page.view().input_value(), "");
        assert_eq!(
            *connection.sent.borrow(),
            vec![r#"{"message":"hello\nworld"}"#]
        );
    }

    #[test]
    fn test_enter_key_funnels_into_send() {
        let (mut page, connection) = page();
        type_text(&mut page, "hi!");
        page.key_down(Key::Backspace);
        assert_eq!(page.view().input_value(), "hi");
        page.key_down(Key::Other);

        let id = page.key_down(Key::Enter).unwrap();
        assert_eq!(page.view().bubble(id).unwrap().markup(), "hi");
        assert_eq!(page.view().input_value(), "");
        assert_eq!(*connection.sent.borrow(), vec![r#"{"message":"hi"}"#]);
    }

    #[test]
    fn test_send_without_connection_still_renders() {
        let mut page: ChatPage<ChatDocument, FakeConnection> =
            ChatPage::new(ChatDocument::new(TemplateSet::default()).unwrap());
        type_text(&mut page, "<script>");
        let id = page.key_down(Key::Enter).unwrap();
        assert_eq!(page.view().bubble(id).unwrap().markup(), "&lt;script&gt;");
        assert!(!page.context().is_connected());
    }

    #[test]
    fn test_streamed_reply_through_events() {
        let (mut page, _connection) = page();
        let events = [
            ConnectionEvent::Opened,
            ConnectionEvent::Message(r#"{"message_num":0,"text":"Hi"}"#.into()),
            ConnectionEvent::Message(r#"{"event":"ToolInfo","text":"docs.rs"}"#.into()),
            ConnectionEvent::Message(r#"{"message_num":1,"text":" there"}"#.into()),
            ConnectionEvent::Message(r#"{"message_num":2}"#.into()),
        ];
        for event in events {
            page.handle_event(event).unwrap();
        }

        let bubbles: Vec<(BubbleKind, String)> = page
            .view()
            .bubbles()
            .map(|b| (b.kind(), b.text_content()))
            .collect();
        assert_eq!(
            bubbles,
            vec![
                (BubbleKind::Bot, "Hi there".to_string()),
                (BubbleKind::Source, "docs.rs".to_string()),
            ]
        );
    }

    #[test]
    fn test_source_click_toggles() {
        let (mut page, _connection) = page();
        page.handle_event(ConnectionEvent::Message(
            r#"{"event":"ToolInfo","text":"source"}"#.into(),
        ))
        .unwrap();
        let id = page.view().bubbles().next().unwrap().id();

        assert!(page.source_clicked(id).unwrap());
        assert!(!page.source_clicked(id).unwrap());
    }

    #[test]
    fn test_close_renders_notice_and_detaches() {
        let (mut page, connection) = page();
        page.handle_event(ConnectionEvent::Closed).unwrap();

        let last = page.view().bubbles().last().unwrap();
        assert_eq!(last.kind(), BubbleKind::Bot);
        assert_eq!(last.text_content(), "<connection closed>");
        assert!(!page.context().is_connected());

        page.view_mut().set_input_value("anyone?".into());
        page.send_clicked();
        assert!(connection.sent.borrow().is_empty());
    }

    #[test]
    fn test_error_renders_notice() {
        let (mut page, _connection) = page();
        page.handle_event(ConnectionEvent::Error("reset".into()))
            .unwrap();
        let texts: Vec<String> = page.view().bubbles().map(|b| b.text_content()).collect();
        assert_eq!(texts, vec!["<connection error>"]);
        assert!(page.current_bot_bubble().is_none());
    }

    #[test]
    fn test_malformed_frame_is_reported() {
        let (mut page, _connection) = page();
        let err = page
            .handle_event(ConnectionEvent::Message("not json".into()))
            .unwrap_err();
        assert!(matches!(err, DispatchError::MalformedFrame(_)));
        assert!(page.view().is_empty());
    }

    #[cfg(feature = "websocket")]
    #[test]
    fn test_bootstrap_against_unreachable_backend() {
        tokio_test::block_on(async {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            drop(listener);

            let config = ClientConfig::with_endpoint(&format!("ws://{addr}/api/v1/stream")).unwrap();
            let view = ChatDocument::new(TemplateSet::default()).unwrap();
            let (mut page, mut events) = bootstrap(view, &config);
            assert!(page.context().is_connected());

            while let Some(event) = events.recv().await {
                page.handle_event(event).unwrap();
            }

            let texts: Vec<String> = page.view().bubbles().map(|b| b.text_content()).collect();
            assert_eq!(texts, vec!["<connection error>", "<connection closed>"]);
            assert!(!page.context().is_connected());
            assert_eq!(page.drain_events(&mut events), 0);
        });
    }
}
