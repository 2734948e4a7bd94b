//! Markup escaping for untrusted text.

/// Markup inserted for every newline.
pub const LINE_BREAK: &str = "<br />";

/// Escape `text` so it renders literally, then turn newlines into line breaks.
///
/// This is the only markup the render layer ever produces from inbound or
/// user-typed text: escaped characters and `<br />` tags.
#[must_use]
pub fn sanitize(text: &str) -> String {
    html_escape::encode_text(text).replace('\n', LINE_BREAK)
}

/// Text content of sanitized markup, as `textContent` would read it.
#[must_use]
pub fn text_content(markup: &str) -> String {
    html_escape::decode_html_entities(&markup.replace(LINE_BREAK, "")).into_owned()
}

/// Like [`text_content`], but line breaks come back as newlines.
#[must_use]
pub fn display_text(markup: &str) -> String {
    html_escape::decode_html_entities(&markup.replace(LINE_BREAK, "\n")).into_owned()
}
