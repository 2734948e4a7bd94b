//! Bubble templates supplied by the host page.

use serde::{Deserialize, Serialize};
use streamchat_core::BubbleKind;
use thiserror::Error;

/// Render layer setup error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Template not found: {0}")]
    MissingTemplate(&'static str),
    #[error("Template {id} has a <{found}> content slot, expected <{expected}>")]
    InvalidSlot {
        id: String,
        expected: &'static str,
        found: String,
    },
}

/// A bubble template: one root element with a nested content slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Template element id.
    pub id: String,
    /// Tag of the root element.
    pub root_tag: String,
    /// Classes on the root element.
    #[serde(default)]
    pub root_classes: Vec<String>,
    /// Tag of the content slot.
    pub slot_tag: String,
}

impl Template {
    fn new(kind: BubbleKind, slot_tag: &str) -> Self {
        Self {
            id: kind.template_id().to_string(),
            root_tag: "div".to_string(),
            root_classes: vec!["message".to_string(), kind.css_class().to_string()],
            slot_tag: slot_tag.to_string(),
        }
    }

    /// Slot tag required for bubbles of `kind`.
    #[must_use]
    pub const fn expected_slot(kind: BubbleKind) -> &'static str {
        match kind {
            BubbleKind::User | BubbleKind::Bot => "div",
            BubbleKind::Source => "span",
        }
    }
}

/// The three templates a chat page needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSet {
    templates: Vec<Template>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self {
            templates: vec![
                Template::new(BubbleKind::User, "div"),
                Template::new(BubbleKind::Bot, "div"),
                Template::new(BubbleKind::Source, "span"),
            ],
        }
    }
}

impl TemplateSet {
    /// Build a set from arbitrary templates.
    #[must_use]
    pub const fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    /// Look up the template for a bubble kind.
    ///
    /// # Errors
    /// Returns error if the template is absent.
    pub fn get(&self, kind: BubbleKind) -> Result<&Template, RenderError> {
        let id = kind.template_id();
        self.templates
            .iter()
            .find(|t| t.id == id)
            .ok_or(RenderError::MissingTemplate(id))
    }

    /// Check that every bubble kind has a usable template.
    ///
    /// # Errors
    /// Returns the first missing or malformed template.
    pub fn validate(&self) -> Result<(), RenderError> {
        for kind in [BubbleKind::User, BubbleKind::Bot, BubbleKind::Source] {
            let template = self.get(kind)?;
            let expected = Template::expected_slot(kind);
            if template.slot_tag != expected {
                return Err(RenderError::InvalidSlot {
                    id: template.id.clone(),
                    expected,
                    found: template.slot_tag.clone(),
                });
            }
        }
        Ok(())
    }
}
