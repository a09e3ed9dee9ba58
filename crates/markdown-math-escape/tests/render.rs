//! End-to-end rendering through the `pulldown-cmark` host.

use markdown_math_escape::hooks::Postprocessor;
use markdown_math_escape::{
    DelimiterProfile, InlineNotation, Markdown, MarkdownOptions, MathEscape, MathEscapeError,
    render,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn convert(profile: DelimiterProfile, source: &str) -> String {
    render(source, &MathEscape::new(profile), MarkdownOptions::default()).unwrap()
}

#[rstest]
#[case::dollar_basic(DelimiterProfile::Dollar, r"foo $2*\pi*r$ x$y$z", r"<p>foo \(2*\pi*r\) x\(y\)z</p>")]
#[case::dollar_metacharacters(
    DelimiterProfile::Dollar,
    r"$x+y for x<0, y>0$ bar",
    r"<p>\(x+y for x&lt;0, y&gt;0\) bar</p>"
)]
#[case::dollar_inside_html_block(DelimiterProfile::Dollar, r"<p>$2*\pi*r$</p>", r"<p>$2*\pi*r$</p>")]
#[case::dollar_inside_inline_html(
    DelimiterProfile::Dollar,
    r"<s>$2*\pi*r$</s>",
    r"<p><s>\(2*\pi*r\)</s></p>"
)]
#[case::fenced_basic(
    DelimiterProfile::Fenced,
    r"foo $`2*\pi*r`$ x$`y`$z",
    r"<p>foo \(2*\pi*r\) x\(y\)z</p>"
)]
#[case::fenced_metacharacters(
    DelimiterProfile::Fenced,
    r"$`x+y for x<0, y>0`$ bar",
    r"<p>\(x+y for x&lt;0, y&gt;0\) bar</p>"
)]
#[case::fenced_inside_html_block(DelimiterProfile::Fenced, r"<p>$`2*\pi*r`$</p>", r"<p>$`2*\pi*r`$</p>")]
#[case::fenced_inside_inline_html(
    DelimiterProfile::Fenced,
    r"<s>$`2*\pi*r`$</s>",
    r"<p><s>\(2*\pi*r\)</s></p>"
)]
fn inline_math(#[case] profile: DelimiterProfile, #[case] source: &str, #[case] expected: &str) {
    assert_eq!(convert(profile, source), expected);
}

#[rstest]
#[case::dollar_basic(DelimiterProfile::Dollar, "$$\n2*\\pi*r\n$$(47)")]
#[case::dollar_indent(DelimiterProfile::Dollar, "    $$\n    2*\\pi*r\n    $$")]
#[case::fenced_backticks(DelimiterProfile::Fenced, "```math\n2*\\pi*r\n```(32)")]
#[case::fenced_cascaded_backticks(DelimiterProfile::Fenced, "````math\n```math\n2*\\pi*r\n```\n````")]
#[case::fenced_tildes(DelimiterProfile::Fenced, "```math\n~~~math\n2*\\pi*r\n~~~\n```")]
#[case::fenced_indent(DelimiterProfile::Fenced, "    ```math\n    2*\\pi*r\n    ```")]
fn block_math_is_returned_verbatim(#[case] profile: DelimiterProfile, #[case] source: &str) {
    assert_eq!(convert(profile, source), source);
}

#[test]
fn inline_math_beats_emphasis_and_escapes() {
    assert_eq!(
        convert(DelimiterProfile::Dollar, r"$a_1 * b_2 * \{c\}$"),
        r"<p>\(a_1 * b_2 * \{c\}\)</p>"
    );
}

#[test]
fn escaped_dollar_is_not_math() {
    assert_eq!(
        convert(DelimiterProfile::Dollar, r"costs \$5 or \$6"),
        "<p>costs $5 or $6</p>"
    );
}

#[test]
fn unterminated_block_renders_as_text() {
    assert_eq!(convert(DelimiterProfile::Dollar, "$$\nx"), "<p>$$\nx</p>");
}

#[test]
fn math_inside_code_block_is_left_alone() {
    assert_eq!(
        convert(DelimiterProfile::Dollar, "```\n$x$\n```"),
        "<pre><code>$x$\n</code></pre>"
    );
}

#[rstest]
#[case::dollar(
    DelimiterProfile::Dollar,
    "Area $a_1 * b_1 +\nc_1 * d_1$ here.",
    "<p>Area \\(a_1 * b_1 +\nc_1 * d_1\\) here.</p>"
)]
#[case::fenced(
    DelimiterProfile::Fenced,
    "Area $`a_1 * b_1 +\nc_1 * d_1`$ here.",
    "<p>Area \\(a_1 * b_1 +\nc_1 * d_1\\) here.</p>"
)]
fn inline_math_wraps_across_soft_breaks(
    #[case] profile: DelimiterProfile,
    #[case] source: &str,
    #[case] expected: &str,
) {
    assert_eq!(convert(profile, source), expected);
}

#[test]
fn dollars_in_separate_paragraphs_do_not_pair() {
    assert_eq!(
        convert(DelimiterProfile::Dollar, "a $x\n\ny$ b"),
        "<p>a $x</p>\n<p>y$ b</p>"
    );
}

#[test]
fn math_block_inside_code_block_is_left_alone() {
    assert_eq!(
        convert(DelimiterProfile::Dollar, "```\n$$\nx < y\n$$\n```"),
        "<pre><code>$$\nx &lt; y\n$$\n</code></pre>"
    );
}

#[test]
fn block_metacharacters_come_back_escaped() {
    assert_eq!(
        convert(DelimiterProfile::Dollar, "$$\na < b & c\n$$"),
        "$$\na &lt; b &amp; c\n$$"
    );
}

#[test]
fn source_notation_keeps_input_delimiters() {
    let escape = MathEscape::new(DelimiterProfile::Fenced).with_notation(InlineNotation::Source);
    let html = render(r"foo $`a_1`$", &escape, MarkdownOptions::default()).unwrap();
    assert_eq!(html, r"<p>foo $`a_1`$</p>");
}

#[test]
fn math_in_table_cells() {
    let options = MarkdownOptions {
        tables: true,
        ..MarkdownOptions::default()
    };
    let escape = MathEscape::new(DelimiterProfile::Dollar);
    let html = render("| a | b |\n|---|---|\n| $x$ | $y_1$ |", &escape, options).unwrap();
    assert!(html.contains(r"<td>\(x\)</td>"));
    assert!(html.contains(r"<td>\(y_1\)</td>"));
}

#[test]
fn mixed_document() {
    let source = r"# Area $A$

Circle: $A = \pi r^2$, not \$5.

$$
\int_0^1 x^2 \, dx
$$

`$code$` and *$a*b$*
";
    let html = convert(DelimiterProfile::Dollar, source);
    insta::assert_snapshot!(html, @r"
    <h1>Area \(A\)</h1>
    <p>Circle: \(A = \pi r^2\), not $5.</p>
    $$
    \int_0^1 x^2 \, dx
    $$
    <p><code>\(code\)</code> and <em>\(a*b\)</em></p>
    ");
}

/// Stands in for an intermediate stage that rewrites text it should not touch.
struct Mangle;

impl Postprocessor for Mangle {
    fn run(&self, text: &str) -> Result<String, MathEscapeError> {
        Ok(text.replace("MipccGkqcg==", "<b>mangled</b>"))
    }
}

#[test]
fn mangled_block_payload_is_a_fatal_error() {
    let mut md = Markdown::default().with_extension(&MathEscape::new(DelimiterProfile::Dollar));
    md.register_postprocessor("mangle", 10, Mangle);

    let err = md.convert("$$\n2*\\pi*r\n$$").unwrap_err();
    assert!(matches!(err, MathEscapeError::CorruptPayload { line: 2, .. }));
}
