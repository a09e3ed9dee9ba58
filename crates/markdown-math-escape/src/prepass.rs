//! Block pre-pass.
//!
//! Rewrites every terminated math block into an inert container before the
//! host sees any block structure:
//!
//! ```text
//! $$            <pre class="--markdown-math-escape">$$
//! x < y    =>   eCAmbHQ7IHk=
//! $$            $$</pre>
//! ```
//!
//! A begin fence with no matching close is left alone, and so is anything
//! inside an ordinary fenced code block.

use std::sync::LazyLock;

use regex::Regex;

use crate::codec;
use crate::hooks::Preprocessor;
use crate::markers::{BLOCK_CLOSE, BLOCK_OPEN};
use crate::profile::{DelimiterProfile, Fence};

static CODE_FENCE_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*(?P<fence>`{3,}|~{3,})(?P<info>.*)$").expect("Invalid code fence regex")
});

static CODE_FENCE_CLOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*(?P<fence>`{3,}|~{3,})[ \t]*$").expect("Invalid code fence close regex")
});

#[derive(Debug, Clone, Copy)]
pub struct BlockScanner {
    profile: DelimiterProfile,
}

impl BlockScanner {
    pub fn new(profile: DelimiterProfile) -> Self {
        Self { profile }
    }

    /// Index of the first line after `begin` closing `open`.
    fn find_closing_fence(&self, lines: &[String], begin: usize, open: &Fence) -> Option<usize> {
        lines
            .iter()
            .enumerate()
            .skip(begin + 1)
            .find(|(_, line)| self.profile.block_end(line).as_ref() == Some(open))
            .map(|(index, _)| index)
    }
}

impl Preprocessor for BlockScanner {
    fn run(&self, lines: &mut [String]) {
        let mut i = 0;
        while i < lines.len() {
            if let Some(open) = self.profile.block_begin(&lines[i]) {
                match self.find_closing_fence(lines, i, &open) {
                    Some(j) => {
                        log::debug!("math block on lines {}..={}", i + 1, j + 1);
                        wrap_region(lines, i, j, &open.indent);
                        i = j;
                    }
                    None => log::debug!("unterminated math block at line {}, left as text", i + 1),
                }
            } else if let Some((marker, len)) = code_fence_open(&lines[i]) {
                let j = code_fence_end(lines, i, marker, len);
                log::trace!("code block on lines {}..={} skipped", i + 1, j + 1);
                i = j;
            }
            i += 1;
        }
    }
}

/// Marker and run length of an ordinary code fence opened on `line`.
fn code_fence_open(line: &str) -> Option<(char, usize)> {
    let caps = CODE_FENCE_OPEN.captures(line)?;
    let fence = caps.name("fence")?.as_str();
    let marker = fence.chars().next()?;
    // A backtick fence's info string cannot contain a backtick.
    if marker == '`' && caps.name("info")?.as_str().contains('`') {
        return None;
    }
    Some((marker, fence.len()))
}

/// Index of the line closing a code fence opened at `begin`. An unclosed
/// fence runs to the last line.
fn code_fence_end(lines: &[String], begin: usize, marker: char, len: usize) -> usize {
    lines
        .iter()
        .enumerate()
        .skip(begin + 1)
        .find(|(_, line)| {
            CODE_FENCE_CLOSE
                .captures(line)
                .and_then(|caps| caps.name("fence"))
                .is_some_and(|fence| fence.as_str().starts_with(marker) && fence.len() >= len)
        })
        .map_or(lines.len() - 1, |(index, _)| index)
}

/// Wraps `lines[begin..=end]` in a container and encodes the interior.
///
/// Interior lines keep the fence indentation in front of their payload so the
/// lines still belong to whatever container the fence sits in.
fn wrap_region(lines: &mut [String], begin: usize, end: usize, indent: &str) {
    lines[begin].insert_str(0, BLOCK_OPEN);
    for line in &mut lines[begin + 1..end] {
        *line = match line.strip_prefix(indent) {
            Some(body) => format!("{indent}{}", codec::encode(body)),
            None => codec::encode(line),
        };
    }
    lines[end].push_str(BLOCK_CLOSE);
}
