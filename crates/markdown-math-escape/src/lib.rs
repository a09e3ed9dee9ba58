//! # markdown-math-escape
//!
//! Keeps LaTeX math intact through a Markdown renderer.
//!
//! Math blocks are wrapped in inert `<pre>` containers before block parsing,
//! inline math is swapped for inert `<code>` placeholders before inline
//! parsing, and once the HTML is rendered both are decoded back into math the
//! typesetting engine (MathJax, KaTeX) can pick up.
//!
//! ```
//! use markdown_math_escape::{DelimiterProfile, MarkdownOptions, MathEscape, render};
//!
//! let html = render(
//!     r"foo $2*\pi*r$",
//!     &MathEscape::new(DelimiterProfile::Dollar),
//!     MarkdownOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(html, r"<p>foo \(2*\pi*r\)</p>");
//! ```

pub mod codec;
pub mod error;
pub mod extension;
pub mod hooks;
pub mod host;
pub mod inline;
pub mod markers;
pub mod prepass;
pub mod profile;
pub mod restore;

// Re-export key types for easier usage
pub use error::{MathEscapeError, PayloadError};
pub use extension::MathEscape;
pub use host::{Extension, Markdown, MarkdownOptions};
pub use profile::{DelimiterProfile, Fence, InlineNotation};

/// Renders `source` to HTML with `escape` registered on a fresh host.
pub fn render(
    source: &str,
    escape: &MathEscape,
    options: MarkdownOptions,
) -> Result<String, MathEscapeError> {
    Markdown::new(options).with_extension(escape).convert(source)
}
