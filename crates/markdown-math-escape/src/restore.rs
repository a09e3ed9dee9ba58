//! Final-pass restorer.
//!
//! Walks the rendered output line by line with two states. Outside a block
//! container every inline placeholder is decoded and re-emitted through the
//! profile's formatter. Inside a container each line is a payload and is
//! decoded verbatim.

use crate::codec;
use crate::error::MathEscapeError;
use crate::hooks::Postprocessor;
use crate::markers::{self, BLOCK_CLOSE, BLOCK_OPEN};
use crate::profile::{DelimiterProfile, InlineNotation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    InBlockContainer,
}

#[derive(Debug, Clone, Copy)]
pub struct Restorer {
    profile: DelimiterProfile,
    notation: InlineNotation,
}

impl Restorer {
    pub fn new(profile: DelimiterProfile, notation: InlineNotation) -> Self {
        Self { profile, notation }
    }

    fn restore_inline(&self, line: &str, number: usize) -> Result<String, MathEscapeError> {
        let mut out = String::with_capacity(line.len());
        let mut last = 0;
        for caps in markers::inline_placeholder().captures_iter(line) {
            let (Some(full), Some(payload)) = (caps.get(0), caps.name("payload")) else {
                continue;
            };
            let expr = decode(payload.as_str(), number)?;
            out.push_str(&line[last..full.start()]);
            out.push_str(&self.profile.format_inline(self.notation, &expr));
            last = full.end();
        }
        out.push_str(&line[last..]);
        Ok(out)
    }
}

impl Postprocessor for Restorer {
    fn run(&self, text: &str) -> Result<String, MathEscapeError> {
        let newline = line_ending(text);
        let mut state = State::Outside;
        let mut lines = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let number = index + 1;
            let restored = match state {
                State::Outside if line.contains(BLOCK_OPEN) => {
                    state = State::InBlockContainer;
                    line.replace(BLOCK_OPEN, "")
                }
                State::Outside => self.restore_inline(line, number)?,
                State::InBlockContainer if line.contains(BLOCK_CLOSE) => {
                    state = State::Outside;
                    line.replacen(BLOCK_CLOSE, "", 1)
                }
                State::InBlockContainer => {
                    let payload = line.trim();
                    let indent = &line[..line.len() - line.trim_start().len()];
                    format!("{indent}{}", decode(payload, number)?)
                }
            };
            lines.push(restored);
        }

        if state == State::InBlockContainer {
            log::warn!("rendered output ended inside a math block container");
        }
        Ok(lines.join(newline))
    }
}

/// The line terminator of the first line, `\n` when there is none.
fn line_ending(text: &str) -> &'static str {
    match text.find('\n') {
        Some(i) if text[..i].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

fn decode(payload: &str, line: usize) -> Result<String, MathEscapeError> {
    codec::decode(payload).map_err(|source| MathEscapeError::CorruptPayload {
        line,
        payload: payload.to_string(),
        source,
    })
}
