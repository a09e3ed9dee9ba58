//! Hook points offered by a Markdown host.
//!
//! A host calls [`Preprocessor`]s on the raw lines before block parsing,
//! [`InlineProcessor`]s while resolving inline content, and [`Postprocessor`]s
//! on the serialized HTML. Hooks carry their own configuration; the host
//! passes nothing but text.

use std::ops::Range;

use crate::error::MathEscapeError;

/// One candidate found by an [`InlineProcessor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMatch<'a> {
    /// Byte range of the whole span, delimiters included.
    pub full: Range<usize>,
    /// The expression between the delimiters.
    pub expr: &'a str,
}

/// A node returned by an inline hook, spliced into the output as raw HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineElement {
    pub tag: &'static str,
    pub class: Option<&'static str>,
    pub text: String,
}

impl InlineElement {
    pub fn to_html(&self) -> String {
        let text = html_escape::encode_text(&self.text);
        match self.class {
            Some(class) => format!(r#"<{tag} class="{class}">{text}</{tag}>"#, tag = self.tag),
            None => format!("<{tag}>{text}</{tag}>", tag = self.tag),
        }
    }
}

/// Runs on the raw source lines before any block parsing.
///
/// Lines are edited in place; the slice guarantees the line count is kept,
/// which the host relies on for its line-indexed block analysis.
pub trait Preprocessor {
    fn run(&self, lines: &mut [String]);
}

/// Claims inline spans before the host's own inline rules see them.
pub trait InlineProcessor {
    /// Finds the next candidate in `data` starting at byte `from`.
    fn find<'a>(&self, data: &'a str, from: usize) -> Option<InlineMatch<'a>>;

    /// Builds the replacement node and the byte range it replaces.
    fn handle_match(&self, m: &InlineMatch<'_>, data: &str) -> (InlineElement, Range<usize>);
}

/// Runs on the fully serialized output.
pub trait Postprocessor {
    fn run(&self, text: &str) -> Result<String, MathEscapeError>;
}
