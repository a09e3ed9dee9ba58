//! # Reference host
//!
//! A small Markdown → HTML pipeline over `pulldown-cmark` that exposes the
//! three hook points from [`crate::hooks`].
//!
//! ## Phases
//!
//! 1. **Pre-pass**: line endings are normalized to `\n`, the source is split
//!    into lines and every [`Preprocessor`] edits them in place.
//! 2. **Inline resolution**: the source is parsed once to find the inline
//!    content of each leaf block (paragraph, heading, table cell, tight list
//!    item). Raw blocks (code, HTML, metadata) have none. Within each block
//!    every [`InlineProcessor`] claims its spans, which are swapped for stash tokens
//!    so no `pulldown-cmark` inline rule (emphasis, code spans, escapes) ever
//!    sees them.
//! 3. **Render**: `pulldown-cmark` renders HTML and stash tokens are replaced
//!    by the stashed nodes.
//! 4. **Final pass**: every [`Postprocessor`] runs on the HTML.
//!
//! Hooks of each kind run in descending priority; registering a name twice
//! replaces the earlier hook.

use std::ops::Range;
use std::sync::LazyLock;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::MathEscapeError;
use crate::hooks::{InlineElement, InlineProcessor, Postprocessor, Preprocessor};

const STASH_START: char = '\u{2}';
const STASH_END: char = '\u{3}';

static STASH_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x02(?P<index>\d+)\x03").expect("Invalid stash token regex"));

/// `pulldown-cmark` extensions the host enables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownOptions {
    pub tables: bool,
    pub footnotes: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub smart_punctuation: bool,
    pub heading_attributes: bool,
}

impl MarkdownOptions {
    /// The equivalent parser options. `pulldown-cmark`'s own math support is
    /// never enabled, it would compete with the inline hooks.
    pub fn to_parser_options(self) -> Options {
        let mut options = Options::empty();
        options.set(Options::ENABLE_TABLES, self.tables);
        options.set(Options::ENABLE_FOOTNOTES, self.footnotes);
        options.set(Options::ENABLE_STRIKETHROUGH, self.strikethrough);
        options.set(Options::ENABLE_TASKLISTS, self.tasklists);
        options.set(Options::ENABLE_SMART_PUNCTUATION, self.smart_punctuation);
        options.set(Options::ENABLE_HEADING_ATTRIBUTES, self.heading_attributes);
        options
    }
}

/// Something that registers hooks on a [`Markdown`] host.
pub trait Extension {
    fn extend(&self, md: &mut Markdown);
}

struct Registered<T: ?Sized> {
    name: &'static str,
    priority: u32,
    hook: Box<T>,
}

/// Keeps `hooks` sorted by descending priority, later registrations after
/// earlier ones of equal priority.
fn register<T: ?Sized>(
    hooks: &mut Vec<Registered<T>>,
    name: &'static str,
    priority: u32,
    hook: Box<T>,
) {
    hooks.retain(|registered| registered.name != name);
    let at = hooks.partition_point(|registered| registered.priority >= priority);
    hooks.insert(at, Registered { name, priority, hook });
}

#[derive(Default)]
pub struct Markdown {
    options: MarkdownOptions,
    preprocessors: Vec<Registered<dyn Preprocessor>>,
    inline_processors: Vec<Registered<dyn InlineProcessor>>,
    postprocessors: Vec<Registered<dyn Postprocessor>>,
}

impl Markdown {
    pub fn new(options: MarkdownOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn with_extension(mut self, extension: &impl Extension) -> Self {
        extension.extend(&mut self);
        self
    }

    pub fn register_preprocessor(
        &mut self,
        name: &'static str,
        priority: u32,
        hook: impl Preprocessor + 'static,
    ) {
        let hook: Box<dyn Preprocessor> = Box::new(hook);
        register(&mut self.preprocessors, name, priority, hook);
    }

    pub fn register_inline(
        &mut self,
        name: &'static str,
        priority: u32,
        hook: impl InlineProcessor + 'static,
    ) {
        let hook: Box<dyn InlineProcessor> = Box::new(hook);
        register(&mut self.inline_processors, name, priority, hook);
    }

    pub fn register_postprocessor(
        &mut self,
        name: &'static str,
        priority: u32,
        hook: impl Postprocessor + 'static,
    ) {
        let hook: Box<dyn Postprocessor> = Box::new(hook);
        register(&mut self.postprocessors, name, priority, hook);
    }

    /// Converts Markdown `source` to HTML, running every registered hook.
    pub fn convert(&self, source: &str) -> Result<String, MathEscapeError> {
        let mut lines: Vec<String> = normalize(source).split('\n').map(str::to_owned).collect();
        for registered in &self.preprocessors {
            log::trace!("preprocessor {}", registered.name);
            registered.hook.run(&mut lines);
        }
        let text = lines.join("\n");

        let mut stash = Stash::default();
        let text = self.resolve_inline(&text, &mut stash);

        let mut rendered = String::with_capacity(text.len() * 3 / 2);
        html::push_html(
            &mut rendered,
            Parser::new_ext(&text, self.options.to_parser_options()),
        );
        let mut output = stash.restore(&rendered);

        for registered in &self.postprocessors {
            log::trace!("postprocessor {}", registered.name);
            output = registered.hook.run(&output)?;
        }
        Ok(output)
    }

    /// Runs the inline hooks on the inline content of every leaf block.
    fn resolve_inline(&self, text: &str, stash: &mut Stash) -> String {
        if self.inline_processors.is_empty() {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for region in inline_regions(text, self.options.to_parser_options()) {
            if region.start < last {
                continue;
            }
            out.push_str(&text[last..region.start]);
            out.push_str(&self.apply_inline(&text[region.clone()], stash));
            last = region.end;
        }
        out.push_str(&text[last..]);
        out
    }

    fn apply_inline(&self, region: &str, stash: &mut Stash) -> String {
        let mut data = region.to_string();
        for registered in &self.inline_processors {
            let processor = &registered.hook;
            let mut from = 0;
            while let Some(m) = processor.find(&data, from) {
                let (node, span) = processor.handle_match(&m, &data);
                let token = stash.push(node);
                from = span.start + token.len();
                data.replace_range(span, &token);
            }
        }
        data
    }
}

/// Byte ranges of `text` holding the inline content of one leaf block each.
///
/// A region runs from the first to the last inline event between two block
/// boundaries, so a span can wrap across soft breaks but never leave its
/// paragraph, heading or table cell.
fn inline_regions(text: &str, options: Options) -> Vec<Range<usize>> {
    let mut regions = vec![];
    let mut current: Option<Range<usize>> = None;
    let mut raw = false;
    for (event, range) in Parser::new_ext(text, options).into_offset_iter() {
        match &event {
            Event::Start(Tag::CodeBlock(_) | Tag::HtmlBlock | Tag::MetadataBlock(_)) => raw = true,
            Event::End(TagEnd::CodeBlock | TagEnd::HtmlBlock | TagEnd::MetadataBlock(_)) => {
                raw = false
            }
            _ => {}
        }
        if !raw && is_inline(&event) {
            current = Some(match current {
                Some(open) => open.start.min(range.start)..open.end.max(range.end),
                None => range,
            });
        } else if let Some(region) = current.take() {
            regions.push(region);
        }
    }
    regions.extend(current);
    regions
}

fn is_inline(event: &Event<'_>) -> bool {
    match event {
        Event::Start(tag) => matches!(
            tag,
            Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. } | Tag::Image { .. }
        ),
        Event::End(tag) => matches!(
            tag,
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link | TagEnd::Image
        ),
        Event::Text(_)
        | Event::Code(_)
        | Event::InlineHtml(_)
        | Event::SoftBreak
        | Event::HardBreak
        | Event::FootnoteReference(_) => true,
        _ => false,
    }
}

/// `\r\n` and lone `\r` become `\n`; stash delimiters are dropped.
fn normalize(source: &str) -> String {
    source
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace([STASH_START, STASH_END], "")
}

/// Inline nodes waiting for the HTML to be serialized.
#[derive(Debug, Default)]
struct Stash {
    nodes: Vec<InlineElement>,
}

impl Stash {
    fn push(&mut self, node: InlineElement) -> String {
        let token = format!("{STASH_START}{}{STASH_END}", self.nodes.len());
        self.nodes.push(node);
        token
    }

    fn restore(&self, html: &str) -> String {
        if self.nodes.is_empty() {
            return html.to_string();
        }
        STASH_TOKEN
            .replace_all(html, |caps: &Captures<'_>| {
                caps["index"]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| self.nodes.get(index))
                    .map(InlineElement::to_html)
                    .unwrap_or_default()
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::InlineMatch;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Upper;

    impl Preprocessor for Upper {
        fn run(&self, lines: &mut [String]) {
            for line in lines {
                *line = line.to_uppercase();
            }
        }
    }

    struct Record(&'static str, Rc<RefCell<Vec<&'static str>>>);

    impl Postprocessor for Record {
        fn run(&self, text: &str) -> Result<String, MathEscapeError> {
            self.1.borrow_mut().push(self.0);
            Ok(text.to_string())
        }
    }

    /// Claims `@word@` spans as `<kbd>` nodes.
    struct Kbd;

    impl InlineProcessor for Kbd {
        fn find<'a>(&self, data: &'a str, from: usize) -> Option<InlineMatch<'a>> {
            let start = from + data[from..].find('@')?;
            let len = data[start + 1..].find('@')?;
            Some(InlineMatch {
                full: start..start + len + 2,
                expr: &data[start + 1..start + 1 + len],
            })
        }

        fn handle_match(&self, m: &InlineMatch<'_>, _data: &str) -> (InlineElement, Range<usize>) {
            let node = InlineElement {
                tag: "kbd",
                class: None,
                text: m.expr.to_string(),
            };
            (node, m.full.clone())
        }
    }

    #[test]
    fn plain_markdown_renders() {
        let md = Markdown::default();
        assert_eq!(md.convert("*a*").unwrap(), "<p><em>a</em></p>\n");
    }

    #[test]
    fn preprocessors_see_lines() {
        let mut md = Markdown::default();
        md.register_preprocessor("upper", 10, Upper);
        assert_eq!(md.convert("a\r\nb").unwrap(), "<p>A\nB</p>\n");
    }

    #[test]
    fn postprocessors_run_in_priority_order() {
        let seen = Rc::new(RefCell::new(vec![]));
        let mut md = Markdown::default();
        md.register_postprocessor("low", 0, Record("low", seen.clone()));
        md.register_postprocessor("high", 100, Record("high", seen.clone()));
        md.register_postprocessor("mid", 50, Record("mid", seen.clone()));
        md.convert("x").unwrap();
        assert_eq!(*seen.borrow(), vec!["high", "mid", "low"]);
    }

    #[test]
    fn registering_a_name_twice_replaces_the_hook() {
        let seen = Rc::new(RefCell::new(vec![]));
        let mut md = Markdown::default();
        md.register_postprocessor("rec", 0, Record("first", seen.clone()));
        md.register_postprocessor("rec", 0, Record("second", seen.clone()));
        md.convert("x").unwrap();
        assert_eq!(*seen.borrow(), vec!["second"]);
    }

    #[test]
    fn inline_hook_wins_over_emphasis_and_code_spans() {
        let mut md = Markdown::default();
        md.register_inline("kbd", 10, Kbd);
        assert_eq!(
            md.convert("a @*b*@ and `@c@`").unwrap(),
            "<p>a <kbd>*b*</kbd> and <code><kbd>c</kbd></code></p>\n"
        );
    }

    #[test]
    fn inline_hook_skips_raw_blocks() {
        let mut md = Markdown::default();
        md.register_inline("kbd", 10, Kbd);
        let html = md.convert("```\n@a@\n```\n\n<div>@b@</div>\n\n@c@").unwrap();
        assert_eq!(
            html,
            "<pre><code>@a@\n</code></pre>\n<div>@b@</div>\n<p><kbd>c</kbd></p>\n"
        );
    }

    #[test]
    fn inline_regions_exclude_code_blocks() {
        let text = "a\n\n```\nb\n```\n\nc";
        let regions = inline_regions(text, Options::empty());
        assert_eq!(regions.first().map(|r| r.start), Some(0));
        let covered: String = regions.iter().map(|r| &text[r.clone()]).collect();
        assert!(!covered.contains('b'));
        assert!(covered.contains('a') && covered.contains('c'));
    }

    #[test]
    fn inline_regions_follow_leaf_blocks() {
        let text = "one\ntwo\n\nthree\n\n# four\n\n- five\n- six";
        let regions: Vec<&str> = inline_regions(text, Options::empty())
            .into_iter()
            .map(|r| &text[r])
            .collect();
        assert_eq!(regions, vec!["one\ntwo", "three", "four", "five", "six"]);
    }

    #[test]
    fn inline_hook_spans_soft_breaks_but_not_paragraphs() {
        let mut md = Markdown::default();
        md.register_inline("kbd", 10, Kbd);
        assert_eq!(
            md.convert("a @b\nc@ d").unwrap(),
            "<p>a <kbd>b\nc</kbd> d</p>\n"
        );
        assert_eq!(
            md.convert("a @b\n\nc@ d").unwrap(),
            "<p>a @b</p>\n<p>c@ d</p>\n"
        );
    }

    #[test]
    fn stray_stash_characters_in_source_are_dropped() {
        let md = Markdown::default();
        assert_eq!(md.convert("a\u{2}0\u{3}b").unwrap(), "<p>a0b</p>\n");
    }

    #[test]
    fn options_map_to_parser_flags() {
        let options = MarkdownOptions {
            tables: true,
            strikethrough: true,
            ..MarkdownOptions::default()
        }
        .to_parser_options();
        assert!(options.contains(Options::ENABLE_TABLES));
        assert!(options.contains(Options::ENABLE_STRIKETHROUGH));
        assert!(!options.contains(Options::ENABLE_FOOTNOTES));
        assert!(!options.contains(Options::ENABLE_MATH));
    }
}
