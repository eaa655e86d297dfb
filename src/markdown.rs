//! Renders project descriptions. A description is markdown, optionally
//! preceded by a frontmatter header:
//!
//! ```md
//! ---
//! title: ignored
//! ---
//! # Hello
//!
//! World
//! ```
//!
//! The header is split off and discarded ([`split_frontmatter`]), literal
//! `\n` sequences left over from upstream encoding are turned into line
//! breaks ([`normalize_newlines`]), and the body is converted to HTML by a
//! [`Markup`] engine. Rendering never fails: malformed markdown renders
//! best-effort.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use std::borrow::Cow;

const FENCE: &str = "---";

/// A markdown engine producing sanitized, block-level HTML.
pub trait Markup: Send + Sync {
    fn render(&self, body: &str) -> String;
}

/// A CommonMark [`Markup`] engine. Raw HTML in the source is escaped rather
/// than passed through, and links and images using a scheme other than
/// `http`, `https` or `mailto` are neutralized.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommonMark;

impl Markup for CommonMark {
    fn render(&self, body: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);

        let mut output = String::with_capacity(body.len() * 2);
        html::push_html(
            &mut output,
            Parser::new_ext(body, options).map(sanitize_event),
        );
        output
    }
}

/// Renders a raw description: splits off the frontmatter, normalizes escaped
/// newlines and renders the remaining body with `markup`.
pub fn render_description<M: Markup + ?Sized>(markup: &M, raw: &str) -> String {
    let (_, body) = split_frontmatter(raw);
    markup.render(&normalize_newlines(body))
}

/// Splits `input` into its frontmatter header (without fences) and body. The
/// header must open on the first line with `---` and close with a line
/// containing only `---`. Input without a complete header is all body.
pub fn split_frontmatter(input: &str) -> (Option<&str>, &str) {
    let text = input.strip_prefix('\u{feff}').unwrap_or(input);
    let rest = match text.strip_prefix(FENCE).and_then(strip_line_break) {
        Some(rest) => rest,
        None => return (None, input),
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(|c: char| c == '\r' || c == '\n') == FENCE {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, input)
}

/// Replaces literal backslash-n sequences with real line breaks.
pub fn normalize_newlines(body: &str) -> Cow<'_, str> {
    if body.contains("\\n") {
        Cow::Owned(body.replace("\\n", "\n"))
    } else {
        Cow::Borrowed(body)
    }
}

fn strip_line_break(s: &str) -> Option<&str> {
    s.strip_prefix("\r\n").or_else(|| s.strip_prefix('\n'))
}

fn sanitize_event(ev: Event) -> Event {
    match ev {
        // `push_html` escapes text events, so raw HTML is displayed rather
        // than interpreted.
        Event::Html(raw) => Event::Text(raw),
        Event::Start(tag) => Event::Start(sanitize_tag(tag)),
        Event::End(tag) => Event::End(sanitize_tag(tag)),
        _ => ev,
    }
}

fn sanitize_tag(tag: Tag) -> Tag {
    match tag {
        Tag::Link(link_type, dest, title) if !is_safe_destination(&dest) => {
            Tag::Link(link_type, CowStr::Borrowed("#"), title)
        }
        Tag::Image(link_type, dest, title) if !is_safe_destination(&dest) => {
            Tag::Image(link_type, CowStr::Borrowed(""), title)
        }
        _ => tag,
    }
}

fn is_safe_destination(dest: &str) -> bool {
    let scheme = match dest.find(':') {
        None => return true,
        Some(i) => &dest[..i],
    };

    // A colon after a path, query or fragment delimiter doesn't end a scheme.
    if scheme.contains(|c: char| c == '/' || c == '?' || c == '#') {
        return true;
    }

    let scheme = scheme.trim().to_ascii_lowercase();
    scheme == "http" || scheme == "https" || scheme == "mailto"
}

#[cfg(test)]
mod test {
    use super::*;

    fn render(raw: &str) -> String {
        render_description(&CommonMark, raw)
    }

    #[test]
    fn test_frontmatter_is_discarded() {
        let html = render("---\ntitle: x\n---\n# Hello\nWorld");
        assert_eq!("<h1>Hello</h1>\n<p>World</p>\n", html);
        assert!(!html.contains("title"));
    }

    #[test]
    fn test_split_frontmatter() {
        assert_eq!(
            (Some("title: x\n"), "body"),
            split_frontmatter("---\ntitle: x\n---\nbody")
        );
        assert_eq!((Some(""), "body"), split_frontmatter("---\n---\nbody"));
        assert_eq!(
            (Some("a: b\r\n"), "body"),
            split_frontmatter("---\r\na: b\r\n---\r\nbody")
        );
    }

    #[test]
    fn test_no_frontmatter() {
        assert_eq!((None, "# Title"), split_frontmatter("# Title"));
        assert_eq!((None, "----\nx"), split_frontmatter("----\nx"));
    }

    #[test]
    fn test_unterminated_frontmatter_is_body() {
        let input = "---\ntitle: x\nno closing fence";
        assert_eq!((None, input), split_frontmatter(input));
    }

    #[test]
    fn test_escaped_newlines() {
        let html = render("# Hello\\n\\nWorld");
        assert_eq!("<h1>Hello</h1>\n<p>World</p>\n", html);
    }

    #[test]
    fn test_block_elements() {
        let html = render("Some *emphasis* and a [link](https://example.org).\n\n- one\n- two\n");
        assert!(html.contains("<em>emphasis</em>"));
        assert!(html.contains(r#"<a href="https://example.org">link</a>"#));
        assert!(html.contains("<ul>\n<li>one</li>\n<li>two</li>\n</ul>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render("<script>alert(1)</script>\n\nText with <b>bold</b>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_unsafe_links_are_neutralized() {
        let html = render("[click](javascript:alert(1)) [mail](mailto:a@example.org) [rel](docs/a:b)");
        assert!(!html.contains("javascript:"));
        assert!(html.contains(r##"<a href="#">click</a>"##));
        assert!(html.contains("mailto:a@example.org"));
        assert!(html.contains(r#"href="docs/a:b""#));
    }

    #[test]
    fn test_malformed_markdown_renders() {
        let html = render("**unclosed [link](\n```\nunterminated fence");
        assert!(!html.is_empty());
    }

    #[test]
    fn test_empty_description() {
        assert_eq!("", render(""));
    }
}
