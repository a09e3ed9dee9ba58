//! Opaque payload codec.
//!
//! Math text is first HTML-neutralized (`&`, `<`, `>`) and then base64 encoded,
//! so the payload only ever contains `[A-Za-z0-9+/=]` and cannot be mistaken
//! for markup by the host renderer.

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::PayloadError;

/// Encodes `text` into an inert payload.
pub fn encode(text: &str) -> String {
    let neutral = html_escape::encode_text(text);
    STANDARD.encode(neutral.as_bytes())
}

/// Decodes a payload produced by [`encode`].
///
/// The HTML neutralization is not undone: decoding happens on rendered HTML,
/// where the escaped form is the correct output.
pub fn decode(payload: &str) -> Result<String, PayloadError> {
    let bytes = STANDARD.decode(payload)?;
    Ok(String::from_utf8(bytes)?)
}
