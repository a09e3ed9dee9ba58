//! # Delimiter profiles
//!
//! A profile names the textual convention used to write math in the source:
//!
//! - **`dollar`**: inline `$expr$`, blocks fenced by `$$` lines.
//! - **`fenced`**: inline `` $`expr`$ ``, blocks opened by ```` ```math ```` or
//!   `~~~math` and closed by the same fence, optionally labelled `(N)`.
//!
//! The `regex` crate has no look-around, so the "not escaped, not doubled"
//! rules of the inline patterns are checked by hand around each candidate.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::MathEscapeError;
use crate::hooks::InlineMatch;

static DOLLAR_INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?P<expr>[^$]*)\$").expect("Invalid dollar inline regex")
});

static DOLLAR_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<indent>\s*)(?P<fence>\$\$)").expect("Invalid dollar block regex")
});

static FENCED_INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$`(?P<expr>[^`]*)`\$").expect("Invalid fenced inline regex")
});

static FENCED_BLOCK_BEGIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<indent>\s*)(?P<fence>`{3,}|~{3,})math").expect("Invalid fenced begin regex")
});

static FENCED_BLOCK_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<indent>\s*)(?P<fence>`{3,}|~{3,})(?:\s*\((?P<eqno>\d+)\))?$")
        .expect("Invalid fenced end regex")
});

/// The source convention used to recognize math.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelimiterProfile {
    #[default]
    Dollar,
    Fenced,
}

/// How a restored inline expression is written into the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InlineNotation {
    /// `\(expr\)`, whatever the source profile.
    #[default]
    Latex,
    /// The profile's own inline delimiters.
    Source,
}

/// A block fence: leading indentation plus a run of one fence character.
///
/// A block only closes on a fence that is structurally equal to the one that
/// opened it, so inner fences of another length or character pass through.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fence {
    pub indent: String,
    pub marker: char,
    pub len: usize,
}

impl Fence {
    fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        let indent = caps.name("indent")?.as_str();
        let fence = caps.name("fence")?.as_str();
        let marker = fence.chars().next()?;
        Some(Self {
            indent: indent.to_string(),
            marker,
            len: fence.chars().count(),
        })
    }
}

impl DelimiterProfile {
    pub const ALL: [DelimiterProfile; 2] = [DelimiterProfile::Dollar, DelimiterProfile::Fenced];

    pub fn name(self) -> &'static str {
        match self {
            DelimiterProfile::Dollar => "dollar",
            DelimiterProfile::Fenced => "fenced",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, MathEscapeError> {
        Self::ALL
            .into_iter()
            .find(|profile| profile.name() == name)
            .ok_or_else(|| MathEscapeError::UnknownProfile(name.to_string()))
    }

    /// The fence opening a math block on `line`, if any.
    pub fn block_begin(self, line: &str) -> Option<Fence> {
        let re = match self {
            DelimiterProfile::Dollar => &DOLLAR_BLOCK,
            DelimiterProfile::Fenced => &FENCED_BLOCK_BEGIN,
        };
        re.captures(line).and_then(|caps| Fence::from_captures(&caps))
    }

    /// The fence `line` would close a math block with, if any.
    pub fn block_end(self, line: &str) -> Option<Fence> {
        let re = match self {
            DelimiterProfile::Dollar => &DOLLAR_BLOCK,
            DelimiterProfile::Fenced => &FENCED_BLOCK_END,
        };
        re.captures(line).and_then(|caps| Fence::from_captures(&caps))
    }

    /// Finds the next inline math span in `data` at or after byte `from`.
    ///
    /// A candidate rejected by the escape/doubling rules is retried one byte
    /// further on, the way a look-around regex would scan. Expressions may
    /// wrap across lines; keeping them inside one block is up to the caller.
    pub fn find_inline<'a>(self, data: &'a str, from: usize) -> Option<InlineMatch<'a>> {
        let re = match self {
            DelimiterProfile::Dollar => &DOLLAR_INLINE,
            DelimiterProfile::Fenced => &FENCED_INLINE,
        };
        let mut at = from;
        loop {
            let caps = re.captures_at(data, at)?;
            let full = caps.get(0)?;
            let expr = caps.name("expr")?;
            if self.accepts(data.as_bytes(), full.start(), full.end()) {
                return Some(InlineMatch {
                    full: full.range(),
                    expr: expr.as_str(),
                });
            }
            // Delimiters are ASCII, so start + 1 is a char boundary.
            at = full.start() + 1;
        }
    }

    fn accepts(self, bytes: &[u8], start: usize, end: usize) -> bool {
        let before = start.checked_sub(1).map(|i| bytes[i]);
        match self {
            DelimiterProfile::Dollar => {
                let after_open = bytes.get(start + 1).copied();
                let before_close = bytes[end - 2];
                let after = bytes.get(end).copied();
                !matches!(before, Some(b'\\' | b'$'))
                    && after_open != Some(b'$')
                    && before_close != b'\\'
                    && after != Some(b'$')
            }
            DelimiterProfile::Fenced => before != Some(b'\\'),
        }
    }

    /// Renders a decoded expression for the output.
    pub fn format_inline(self, notation: InlineNotation, expr: &str) -> String {
        match (notation, self) {
            (InlineNotation::Latex, _) => format!(r"\({expr}\)"),
            (InlineNotation::Source, DelimiterProfile::Dollar) => format!("${expr}$"),
            (InlineNotation::Source, DelimiterProfile::Fenced) => format!("$`{expr}`$"),
        }
    }
}

impl fmt::Display for DelimiterProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DelimiterProfile {
    type Err = MathEscapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl InlineNotation {
    pub fn name(self) -> &'static str {
        match self {
            InlineNotation::Latex => "latex",
            InlineNotation::Source => "source",
        }
    }
}

impl fmt::Display for InlineNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InlineNotation {
    type Err = MathEscapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [InlineNotation::Latex, InlineNotation::Source]
            .into_iter()
            .find(|notation| notation.name() == s)
            .ok_or_else(|| MathEscapeError::UnknownNotation(s.to_string()))
    }
}
