//! Container and placeholder markers.
//!
//! Both are raw HTML that CommonMark renderers pass through verbatim: a line
//! starting with `<pre` opens an HTML block that runs to the line containing
//! `</pre>`, and `<code ...>` inside a paragraph is inline HTML.

use std::sync::LazyLock;

use regex::Regex;

use crate::hooks::InlineElement;

/// Class attribute shared by every marker.
pub const CLASS: &str = "--markdown-math-escape";

/// Prefix of the first line of an escaped math block.
pub const BLOCK_OPEN: &str = r#"<pre class="--markdown-math-escape">"#;

/// Suffix of the last line of an escaped math block.
pub const BLOCK_CLOSE: &str = "</pre>";

/// Element name of the inline placeholder.
pub const INLINE_TAG: &str = "code";

static INLINE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<code class="--markdown-math-escape">(?P<payload>[A-Za-z0-9+/=]*)</code>"#)
        .expect("Invalid inline placeholder regex")
});

/// Pattern matching a rendered inline placeholder; the payload is captured as `payload`.
pub fn inline_placeholder() -> &'static Regex {
    &INLINE_PLACEHOLDER
}

/// Builds the inline placeholder node for an encoded payload.
pub fn placeholder(payload: String) -> InlineElement {
    InlineElement {
        tag: INLINE_TAG,
        class: Some(CLASS),
        text: payload,
    }
}
