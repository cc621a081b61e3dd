//! Inline parsing for bold, links and escapes.

use crate::attributes::MarkdownAttributes;
use crate::element::{RunStyle, StyledText};
use crate::escape::{find_unescaped, is_control_character, unescape};

/// Parses `**bold**`, `[text](contents)` and backslash escapes into styled runs.
///
/// Escapes are resolved in body text, bold text, link text and link contents.
/// Never fails: anything that doesn't form a construct is kept as body text.
/// The scan is a single pass over byte offsets; a failed `**` falls back by
/// exactly one character and a failed `[` stays in the surrounding body text.
pub fn parse_markdown<S: Clone>(text: &str, attributes: &MarkdownAttributes<S>) -> StyledText<S> {
    let bytes = text.as_bytes();
    let mut result = StyledText::new(attributes.alignment);

    // Body text is accumulated here so escapes can drop their backslash.
    let mut body = String::new();
    let mut plain_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if bytes.get(i + 1).is_some_and(|b| is_control_character(*b)) => {
                body.push_str(&text[plain_start..i]);
                body.push(bytes[i + 1] as char);
                i += 2;
                plain_start = i;
            }

            b'*' if bytes.get(i + 1) == Some(&b'*') => {
                body.push_str(&text[plain_start..i]);
                flush_body(&mut result, &mut body, attributes);

                let content_start = i + 2;
                if let Some(end) = find_unescaped(text, content_start, b"**") {
                    result.push(
                        unescape(&text[content_start..end]),
                        RunStyle::Bold,
                        attributes.bold.clone(),
                    );
                    i = end + 2;
                } else {
                    // No closing marker: the first `*` is literal, rescan from the second
                    result.push("*", RunStyle::Body, attributes.body.clone());
                    i += 1;
                }
                plain_start = i;
            }

            b'[' => {
                if let Some(link) = parse_link(text, i) {
                    body.push_str(&text[plain_start..i]);
                    flush_body(&mut result, &mut body, attributes);

                    let contents = unescape(link.contents);
                    let attribute = attributes.resolve_link(&contents);
                    result.push(
                        unescape(link.text),
                        RunStyle::Link {
                            contents,
                            attribute,
                        },
                        attributes.link.clone(),
                    );
                    i = link.end;
                    plain_start = i;
                } else {
                    // Not a valid link, `[` stays in the body text
                    i += 1;
                }
            }

            _ => {
                i += 1;
            }
        }
    }

    body.push_str(&text[plain_start..]);
    flush_body(&mut result, &mut body, attributes);

    result
}

fn flush_body<S: Clone>(
    result: &mut StyledText<S>,
    body: &mut String,
    attributes: &MarkdownAttributes<S>,
) {
    if body.is_empty() {
        return;
    }
    result.push(std::mem::take(body), RunStyle::Body, attributes.body.clone());
}

struct ParsedLink<'a> {
    text: &'a str,
    contents: &'a str,
    /// Byte offset just past the closing `)`
    end: usize,
}

/// Parse a link whose `[` sits at `open`.
///
/// Needs a `]`, a `(` right after it and a `)` somewhere later.
fn parse_link(text: &str, open: usize) -> Option<ParsedLink<'_>> {
    let bytes = text.as_bytes();
    let close_bracket = find_unescaped(text, open + 1, b"]")?;

    let open_paren = close_bracket + 1;
    if bytes.get(open_paren) != Some(&b'(') {
        return None;
    }

    let close_paren = find_unescaped(text, open_paren + 1, b")")?;

    Some(ParsedLink {
        text: &text[open + 1..close_bracket],
        contents: &text[open_paren + 1..close_paren],
        end: close_paren + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::LinkAttribute;

    fn spans(text: &str) -> Vec<(String, RunStyle)> {
        parse_markdown(text, &MarkdownAttributes::plain())
            .into_runs()
            .into_iter()
            .map(|run| (run.text, run.style))
            .collect()
    }

    #[test]
    fn test_bold() {
        assert_eq!(spans("**bold**"), vec![("bold".into(), RunStyle::Bold)]);
    }

    #[test]
    fn test_bold_in_text() {
        assert_eq!(
            spans("some **bold** text"),
            vec![
                ("some ".into(), RunStyle::Body),
                ("bold".into(), RunStyle::Bold),
                (" text".into(), RunStyle::Body),
            ]
        );
    }

    #[test]
    fn test_link() {
        assert_eq!(
            spans("check [this](https://example.com) out"),
            vec![
                ("check ".into(), RunStyle::Body),
                ("this".into(), RunStyle::link("https://example.com")),
                (" out".into(), RunStyle::Body),
            ]
        );
    }

    #[test]
    fn test_link_needs_paren_right_after_bracket() {
        assert_eq!(
            spans("[text] (http://x)"),
            vec![("[text] (http://x)".into(), RunStyle::Body)]
        );
    }

    #[test]
    fn test_link_without_closing_bracket() {
        assert_eq!(spans("[text"), vec![("[text".into(), RunStyle::Body)]);
    }

    #[test]
    fn test_link_text_runs_to_first_bracket() {
        assert_eq!(spans("[a [b](c)"), vec![("a [b".into(), RunStyle::link("c"))]);
    }

    #[test]
    fn test_failed_link_then_real_link() {
        assert_eq!(
            spans("[a] [b](c)"),
            vec![
                ("[a] ".into(), RunStyle::Body),
                ("b".into(), RunStyle::link("c")),
            ]
        );
    }

    #[test]
    fn test_link_attribute_resolver() {
        let attributes = MarkdownAttributes::plain().with_link_attribute(|contents| {
            contents
                .strip_prefix("user:")
                .map(|id| LinkAttribute::new("mention", id))
        });

        let parsed = parse_markdown("[bob](user:42) and [x](http://x)", &attributes);
        let styles: Vec<_> = parsed.runs().iter().map(|run| run.style.clone()).collect();
        assert_eq!(
            styles,
            vec![
                RunStyle::Link {
                    contents: "user:42".into(),
                    attribute: Some(LinkAttribute::new("mention", "42")),
                },
                RunStyle::Body,
                RunStyle::link("http://x"),
            ]
        );
    }

    #[test]
    fn test_link_contents_are_unescaped() {
        assert_eq!(spans("[a](x\\))"), vec![("a".into(), RunStyle::link("x)"))]);

        let attributes = MarkdownAttributes::plain()
            .with_link_attribute(|contents| Some(LinkAttribute::new("url", contents)));
        let parsed = parse_markdown("[a](p\\(q\\))", &attributes);
        assert_eq!(
            parsed.runs()[0].style,
            RunStyle::Link {
                contents: "p(q)".into(),
                attribute: Some(LinkAttribute::new("url", "p(q)")),
            }
        );
    }

    #[test]
    fn test_lone_star_stays_in_body() {
        assert_eq!(spans("a*b"), vec![("a*b".into(), RunStyle::Body)]);
        assert_eq!(spans("trailing*"), vec![("trailing*".into(), RunStyle::Body)]);
    }

    #[test]
    fn test_escaped_star_drops_backslash() {
        assert_eq!(spans("a\\*b"), vec![("a*b".into(), RunStyle::Body)]);
    }

    #[test]
    fn test_escaped_bold_markers() {
        assert_eq!(spans("\\*\\*x\\*\\*"), vec![("**x**".into(), RunStyle::Body)]);
    }

    #[test]
    fn test_escape_inside_bold() {
        assert_eq!(spans("**a\\*\\*b**"), vec![("a**b".into(), RunStyle::Bold)]);
    }

    #[test]
    fn test_backslash_before_plain_char_is_kept() {
        assert_eq!(spans("a\\b\\"), vec![("a\\b\\".into(), RunStyle::Body)]);
    }

    #[test]
    fn test_multibyte_text() {
        assert_eq!(
            spans("привет **мир** 👋"),
            vec![
                ("привет ".into(), RunStyle::Body),
                ("мир".into(), RunStyle::Bold),
                (" 👋".into(), RunStyle::Body),
            ]
        );
    }

    #[test]
    fn test_empty_bold_is_dropped() {
        assert_eq!(
            spans("a****b"),
            vec![("a".into(), RunStyle::Body), ("b".into(), RunStyle::Body)]
        );
    }
}
