use crate::error::MathEscapeError;
use crate::host::{Extension, Markdown};
use crate::inline::InlineMatcher;
use crate::prepass::BlockScanner;
use crate::profile::{DelimiterProfile, InlineNotation};
use crate::restore::Restorer;

/// Name every math-escape hook is registered under.
pub const HOOK_NAME: &str = "math_escape";

/// Runs before the host's own preprocessors.
pub const PREPROCESSOR_PRIORITY: u32 = 1000;
/// Claims spans before emphasis, code spans and escapes.
pub const INLINE_PRIORITY: u32 = 1000;
/// Runs after every other postprocessor.
pub const POSTPROCESSOR_PRIORITY: u32 = 0;

/// The math-escape extension: one delimiter profile and one output notation,
/// fixed for every hook it registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MathEscape {
    profile: DelimiterProfile,
    notation: InlineNotation,
}

impl MathEscape {
    pub fn new(profile: DelimiterProfile) -> Self {
        Self {
            profile,
            notation: InlineNotation::default(),
        }
    }

    /// Selects a profile by name, failing on anything but `dollar` or `fenced`.
    pub fn from_name(name: &str) -> Result<Self, MathEscapeError> {
        Ok(Self::new(DelimiterProfile::from_name(name)?))
    }

    pub fn with_notation(mut self, notation: InlineNotation) -> Self {
        self.notation = notation;
        self
    }

    pub fn profile(&self) -> DelimiterProfile {
        self.profile
    }

    pub fn notation(&self) -> InlineNotation {
        self.notation
    }
}

impl Extension for MathEscape {
    fn extend(&self, md: &mut Markdown) {
        log::debug!(
            "registering math escape with {} delimiters, {} notation",
            self.profile,
            self.notation
        );
        md.register_preprocessor(
            HOOK_NAME,
            PREPROCESSOR_PRIORITY,
            BlockScanner::new(self.profile),
        );
        md.register_inline(HOOK_NAME, INLINE_PRIORITY, InlineMatcher::new(self.profile));
        md.register_postprocessor(
            HOOK_NAME,
            POSTPROCESSOR_PRIORITY,
            Restorer::new(self.profile, self.notation),
        );
    }
}
