use thiserror::Error;

/// Why an opaque payload could not be turned back into text.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("decoded bytes are not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Error)]
pub enum MathEscapeError {
    #[error("Unknown delimiter profile `{0}` (expected `dollar` or `fenced`)")]
    UnknownProfile(String),

    #[error("Unknown inline notation `{0}` (expected `latex` or `source`)")]
    UnknownNotation(String),

    /// A container or placeholder survived rendering but its payload did not.
    #[error("Corrupt math payload on rendered line {line} ({payload:?}): {source}")]
    CorruptPayload {
        line: usize,
        payload: String,
        source: PayloadError,
    },
}
