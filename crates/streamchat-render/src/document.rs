//! In-memory chat document.

use std::fmt::Write as _;

use streamchat_core::{BubbleId, BubbleKind, ChatView, ViewError};

use crate::{
    sanitize::{self, sanitize},
    template::{RenderError, Template, TemplateSet},
};

/// Id of the element bubbles are appended to.
pub const MESSAGES_CONTAINER_ID: &str = "chat-messages";

/// Id of the text input element.
pub const USER_INPUT_ID: &str = "user-input";

/// Class toggled on collapsed source bubbles.
const MINIMIZED_CLASS: &str = "minimized";

/// A rendered bubble: a clone of its template with a filled content slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    id: BubbleId,
    kind: BubbleKind,
    root_tag: String,
    classes: Vec<String>,
    slot_tag: String,
    markup: String,
}

impl Bubble {
    fn from_template(id: BubbleId, kind: BubbleKind, template: &Template, markup: String) -> Self {
        Self {
            id,
            kind,
            root_tag: template.root_tag.clone(),
            classes: template.root_classes.clone(),
            slot_tag: template.slot_tag.clone(),
            markup,
        }
    }

    #[must_use]
    pub const fn id(&self) -> BubbleId {
        self.id
    }

    #[must_use]
    pub const fn kind(&self) -> BubbleKind {
        self.kind
    }

    /// Classes on the root element.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Inner markup of the content slot.
    #[must_use]
    pub fn markup(&self) -> &str {
        &self.markup
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    #[must_use]
    pub fn is_minimized(&self) -> bool {
        self.has_class(MINIMIZED_CLASS)
    }

    /// Text as `textContent` reads it: line breaks dropped, entities decoded.
    #[must_use]
    pub fn text_content(&self) -> String {
        sanitize::text_content(&self.markup)
    }

    /// Text for display outside a browser: line breaks become newlines.
    #[must_use]
    pub fn display_text(&self) -> String {
        sanitize::display_text(&self.markup)
    }

    fn toggle_class(&mut self, class: &str) -> bool {
        if let Some(pos) = self.classes.iter().position(|c| c == class) {
            self.classes.remove(pos);
            false
        } else {
            self.classes.push(class.to_string());
            true
        }
    }

    fn write_html(&self, out: &mut String) {
        let classes = self.classes.join(" ");
        let _ = write!(
            out,
            "<{root} class=\"{classes}\" data-bubble=\"{id}\"><{slot}>{markup}</{slot}></{root}>",
            root = self.root_tag,
            classes = html_escape::encode_double_quoted_attribute(&classes),
            id = self.id.get(),
            slot = self.slot_tag,
            markup = self.markup,
        );
    }
}

/// The chat page's document: templates, the messages container and the input.
#[derive(Debug, Clone)]
pub struct ChatDocument {
    templates: [Template; 3],
    bubbles: Vec<Bubble>,
    input: String,
    next_id: u64,
}

impl ChatDocument {
    /// Create an empty document.
    ///
    /// # Errors
    /// Returns error if a template is missing or malformed.
    pub fn new(templates: TemplateSet) -> Result<Self, RenderError> {
        templates.validate()?;
        Ok(Self {
            templates: [
                templates.get(BubbleKind::User)?.clone(),
                templates.get(BubbleKind::Bot)?.clone(),
                templates.get(BubbleKind::Source)?.clone(),
            ],
            bubbles: Vec::new(),
            input: String::new(),
            next_id: 0,
        })
    }

    /// Bubbles in document order.
    pub fn bubbles(&self) -> impl Iterator<Item = &Bubble> {
        self.bubbles.iter()
    }

    #[must_use]
    pub fn bubble(&self, id: BubbleId) -> Option<&Bubble> {
        self.index_of(id).map(|i| &self.bubbles[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    /// Serialize the messages container.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = format!("<div id=\"{MESSAGES_CONTAINER_ID}\">");
        for bubble in &self.bubbles {
            bubble.write_html(&mut out);
        }
        out.push_str("</div>");
        out
    }

    const fn template(&self, kind: BubbleKind) -> &Template {
        match kind {
            BubbleKind::User => &self.templates[0],
            BubbleKind::Bot => &self.templates[1],
            BubbleKind::Source => &self.templates[2],
        }
    }

    // Ids are handed out in increasing order, so `bubbles` stays sorted by id.
    fn index_of(&self, id: BubbleId) -> Option<usize> {
        self.bubbles.binary_search_by_key(&id, Bubble::id).ok()
    }

    fn bubble_of_kind(&mut self, id: BubbleId, kind: BubbleKind) -> Result<&mut Bubble, ViewError> {
        let index = self.index_of(id).ok_or(ViewError::NotFound(id))?;
        let bubble = &mut self.bubbles[index];
        if bubble.kind != kind {
            return Err(ViewError::WrongKind {
                id,
                expected: kind,
                actual: bubble.kind,
            });
        }
        Ok(bubble)
    }

    fn add_bubble(&mut self, kind: BubbleKind, text: &str) -> BubbleId {
        let id = BubbleId::new(self.next_id);
        self.next_id += 1;

        let bubble = Bubble::from_template(id, kind, self.template(kind), sanitize(text));
        tracing::trace!(%id, ?kind, "bubble added");
        self.bubbles.push(bubble);
        id
    }
}

impl ChatView for ChatDocument {
    fn add_user_bubble(&mut self, text: &str) -> BubbleId {
        self.add_bubble(BubbleKind::User, text)
    }

    fn add_bot_bubble(&mut self, text: &str) -> BubbleId {
        self.add_bubble(BubbleKind::Bot, text)
    }

    fn add_source_bubble(&mut self, text: &str) -> BubbleId {
        self.add_bubble(BubbleKind::Source, text)
    }

    fn append_to_bot_bubble(&mut self, id: BubbleId, text: &str) -> Result<(), ViewError> {
        let bubble = self.bubble_of_kind(id, BubbleKind::Bot)?;
        bubble.markup.push_str(&sanitize(text));
        Ok(())
    }

    fn text_content(&self, id: BubbleId) -> Option<String> {
        self.bubble(id).map(Bubble::text_content)
    }

    fn toggle_source_minimized(&mut self, id: BubbleId) -> Result<bool, ViewError> {
        let bubble = self.bubble_of_kind(id, BubbleKind::Source)?;
        let minimized = bubble.toggle_class(MINIMIZED_CLASS);
        tracing::debug!(%id, minimized, "source bubble toggled");
        Ok(minimized)
    }

    fn input_value(&self) -> &str {
        &self.input
    }

    fn set_input_value(&mut self, value: String) {
        self.input = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> ChatDocument {
        ChatDocument::new(TemplateSet::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_incomplete_templates() {
        let err = ChatDocument::new(TemplateSet::new(Vec::new())).unwrap_err();
        assert_eq!(err, RenderError::MissingTemplate("message-user-template"));
    }

    #[test]
    fn test_bubbles_clone_templates() {
        let mut doc = document();
        let user = doc.add_user_bubble("hello\nworld");
        let bot = doc.add_bot_bubble("Hi");
        let source = doc.add_source_bubble("wiki");

        let user = doc.bubble(user).unwrap();
        assert_eq!(user.kind(), BubbleKind::User);
        assert_eq!(user.classes(), ["message", "user"]);
        assert_eq!(user.markup(), "hello<br />world");

        assert!(doc.bubble(bot).unwrap().has_class("bot"));
        assert!(doc.bubble(source).unwrap().has_class("sources"));
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_append_concatenates_sanitized_text() {
        let mut doc = document();
        let id = doc.add_bot_bubble("a < b");
        doc.append_to_bot_bubble(id, "\nc & d").unwrap();
        assert_eq!(doc.bubble(id).unwrap().markup(), "a &lt; b<br />c &amp; d");
        assert_eq!(doc.text_content(id).unwrap(), "a < bc & d");
        assert_eq!(doc.bubble(id).unwrap().display_text(), "a < b\nc & d");
    }

    #[test]
    fn test_append_requires_bot_bubble() {
        let mut doc = document();
        let user = doc.add_user_bubble("me");
        assert_eq!(
            doc.append_to_bot_bubble(user, "x"),
            Err(ViewError::WrongKind {
                id: user,
                expected: BubbleKind::Bot,
                actual: BubbleKind::User,
            })
        );
        let missing = BubbleId::new(42);
        assert_eq!(
            doc.append_to_bot_bubble(missing, "x"),
            Err(ViewError::NotFound(missing))
        );
        assert_eq!(doc.bubble(user).unwrap().markup(), "me");
    }

    #[test]
    fn test_toggle_source_minimized() {
        let mut doc = document();
        let source = doc.add_source_bubble("tool output");
        assert!(doc.toggle_source_minimized(source).unwrap());
        assert!(doc.bubble(source).unwrap().is_minimized());
        assert!(!doc.toggle_source_minimized(source).unwrap());
        assert!(!doc.bubble(source).unwrap().is_minimized());

        let bot = doc.add_bot_bubble("x");
        assert!(doc.toggle_source_minimized(bot).is_err());
    }

    #[test]
    fn test_input_field() {
        let mut doc = document();
        doc.set_input_value("draft".into());
        assert_eq!(doc.input_value(), "draft");
        doc.clear_input();
        assert_eq!(doc.input_value(), "");
    }

    #[test]
    fn test_to_html() {
        let mut doc = document();
        doc.add_user_bubble("<script>x</script>");
        let source = doc.add_source_bubble("src");
        doc.toggle_source_minimized(source).unwrap();

        assert_eq!(
            doc.to_html(),
            "<div id=\"chat-messages\">\
             <div class=\"message user\" data-bubble=\"0\"><div>&lt;script&gt;x&lt;/script&gt;</div></div>\
             <div class=\"message sources minimized\" data-bubble=\"1\"><span>src</span></div>\
             </div>"
        );
    }
}
