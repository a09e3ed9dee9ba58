use std::ops::Range;

use crate::codec;
use crate::hooks::{InlineElement, InlineMatch, InlineProcessor};
use crate::markers;
use crate::profile::DelimiterProfile;

/// Replaces inline math spans with inert placeholder nodes.
#[derive(Debug, Clone, Copy)]
pub struct InlineMatcher {
    profile: DelimiterProfile,
}

impl InlineMatcher {
    pub fn new(profile: DelimiterProfile) -> Self {
        Self { profile }
    }
}

impl InlineProcessor for InlineMatcher {
    fn find<'a>(&self, data: &'a str, from: usize) -> Option<InlineMatch<'a>> {
        self.profile.find_inline(data, from)
    }

    fn handle_match(&self, m: &InlineMatch<'_>, _data: &str) -> (InlineElement, Range<usize>) {
        log::trace!("inline math at {:?}: {:?}", m.full, m.expr);
        let node = markers::placeholder(codec::encode(m.expr));
        (node, m.full.clone())
    }
}
