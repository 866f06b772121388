//! Pure message renderer: splits a raw chat message into display segments.
//!
//! Two passes over the text: first fenced code regions are extracted, then
//! the remaining spans are scanned for emoji shortcodes. Both passes are
//! plain character scanners so the splitting behavior does not depend on a
//! pattern engine.

const FENCE: &str = "```";

/// One displayable piece of a rendered chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplaySegment {
    PlainText(String),
    Emoji {
        shortcode: String,
        image: &'static str,
    },
    CodeBlock {
        language: String,
        code: String,
    },
}

/// Fixed shortcode-to-asset table, known at build time. Not user-extensible.
pub const EMOJI_TABLE: &[(&str, &str)] = &[
    (":monshroom:", "assets/monshroom.webp"),
    (":pepesunglasses:", "assets/pepewithsunglasses.webp"),
    (":molandak:", "assets/molandak.webp"),
    (":alarm_purple:", "assets/alarm_purple.webp"),
    (":pepe_monad:", "assets/pepe_monad.webp"),
];

/// Look up the image asset for a shortcode (colons included).
pub fn emoji_image(shortcode: &str) -> Option<&'static str> {
    EMOJI_TABLE
        .iter()
        .find(|(code, _)| *code == shortcode)
        .map(|(_, image)| *image)
}

/// Render a raw message into an ordered list of display segments.
///
/// Pure function of the input and the static emoji table. Concatenating the
/// textual content of the produced segments reproduces the input exactly,
/// except that fence delimiters and the language-tag line are consumed into
/// the `CodeBlock` structure.
pub fn render_message(text: &str) -> Vec<DisplaySegment> {
    let mut segments = Vec::new();
    let mut rest = text;

    loop {
        let Some(open) = rest.find(FENCE) else {
            scan_emojis(rest, &mut segments);
            break;
        };
        let after_open = &rest[open + FENCE.len()..];
        let Some(close) = after_open.find(FENCE) else {
            // Unterminated fence: the delimiter and everything after it stay
            // plain text. Fences do not nest.
            scan_emojis(rest, &mut segments);
            break;
        };
        scan_emojis(&rest[..open], &mut segments);
        segments.push(parse_fence(&after_open[..close]));
        rest = &after_open[close + FENCE.len()..];
    }

    segments
}

/// Interpret the interior of a fenced region.
///
/// The first line, when the interior contains a newline, is the language tag;
/// the remainder is the payload. An interior with no newline has no tag and
/// is payload in its entirety.
fn parse_fence(inner: &str) -> DisplaySegment {
    let (tag, code) = match inner.find('\n') {
        Some(nl) => (inner[..nl].trim(), inner[nl + 1..].trim()),
        None => ("", inner.trim()),
    };
    let language = match tag {
        "" => "plaintext",
        // highlighters know javascript, not jsx
        "jsx" => "javascript",
        other => other,
    };
    DisplaySegment::CodeBlock {
        language: language.to_string(),
        code: code.to_string(),
    }
}

/// Byte length of a `:word:` shortcode at the start of `s`, if one is there.
/// Shortcode characters are ASCII alphanumerics and underscore.
fn shortcode_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b':') {
        return None;
    }
    let mut i = 1;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    if i > 1 && bytes.get(i) == Some(&b':') {
        Some(i + 1)
    } else {
        None
    }
}

/// Scan a non-code span for shortcodes, appending the resulting segments.
/// Shortcodes are matched left to right without overlap; tokens that look
/// like a shortcode but are not in the table stay literal text. Empty spans
/// produce no segments.
fn scan_emojis(text: &str, out: &mut Vec<DisplaySegment>) {
    let mut plain = String::new();
    let mut i = 0;

    while i < text.len() {
        if let Some(len) = shortcode_len(&text[i..]) {
            let token = &text[i..i + len];
            if let Some(image) = emoji_image(token) {
                if !plain.is_empty() {
                    out.push(DisplaySegment::PlainText(std::mem::take(&mut plain)));
                }
                out.push(DisplaySegment::Emoji {
                    shortcode: token.to_string(),
                    image,
                });
            } else {
                plain.push_str(token);
            }
            i += len;
        } else {
            let step = text[i..].chars().next().map_or(1, char::len_utf8);
            plain.push_str(&text[i..i + step]);
            i += step;
        }
    }

    if !plain.is_empty() {
        out.push(DisplaySegment::PlainText(plain));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> DisplaySegment {
        DisplaySegment::PlainText(text.to_string())
    }

    fn concat_text(segments: &[DisplaySegment]) -> String {
        segments
            .iter()
            .map(|segment| match segment {
                DisplaySegment::PlainText(text) => text.as_str(),
                DisplaySegment::Emoji { shortcode, .. } => shortcode.as_str(),
                DisplaySegment::CodeBlock { code, .. } => code.as_str(),
            })
            .collect()
    }

    #[test]
    fn plain_text_round_trips() {
        let input = "no fences here, just text\nwith a second line and a : colon";
        assert_eq!(concat_text(&render_message(input)), input);
    }

    #[test]
    fn extracts_code_fence_with_language() {
        let segments = render_message("```python\nprint(1)\n```");
        assert_eq!(
            segments,
            vec![DisplaySegment::CodeBlock {
                language: "python".to_string(),
                code: "print(1)".to_string(),
            }]
        );
    }

    #[test]
    fn jsx_normalizes_to_javascript() {
        let segments = render_message("```jsx\n<App />\n```");
        assert_eq!(
            segments,
            vec![DisplaySegment::CodeBlock {
                language: "javascript".to_string(),
                code: "<App />".to_string(),
            }]
        );
    }

    #[test]
    fn missing_language_tag_defaults_to_plaintext() {
        let segments = render_message("```\nfoo bar\n```");
        assert_eq!(
            segments,
            vec![DisplaySegment::CodeBlock {
                language: "plaintext".to_string(),
                code: "foo bar".to_string(),
            }]
        );
    }

    #[test]
    fn fence_without_newline_is_all_payload() {
        let segments = render_message("```let x = 1;```");
        assert_eq!(
            segments,
            vec![DisplaySegment::CodeBlock {
                language: "plaintext".to_string(),
                code: "let x = 1;".to_string(),
            }]
        );
    }

    #[test]
    fn fence_with_only_language_line_has_empty_payload() {
        let segments = render_message("```python\n```");
        assert_eq!(
            segments,
            vec![DisplaySegment::CodeBlock {
                language: "python".to_string(),
                code: String::new(),
            }]
        );
    }

    #[test]
    fn unterminated_fence_stays_plain_text() {
        let input = "look at ```this";
        assert_eq!(render_message(input), vec![plain(input)]);
    }

    #[test]
    fn substitutes_known_emoji() {
        let segments = render_message("hi :monshroom: there");
        assert_eq!(
            segments,
            vec![
                plain("hi "),
                DisplaySegment::Emoji {
                    shortcode: ":monshroom:".to_string(),
                    image: "assets/monshroom.webp",
                },
                plain(" there"),
            ]
        );
    }

    #[test]
    fn unknown_shortcode_passes_through_literally() {
        assert_eq!(render_message(":not_real:"), vec![plain(":not_real:")]);
    }

    #[test]
    fn lone_colons_are_not_shortcodes() {
        let input = "ratio 1:2 and :: and trailing:";
        assert_eq!(render_message(input), vec![plain(input)]);
    }

    #[test]
    fn interleaves_text_emoji_and_code_in_order() {
        let segments = render_message("intro :molandak:\n```rust\nfn main() {}\n```\noutro");
        assert_eq!(
            segments,
            vec![
                plain("intro "),
                DisplaySegment::Emoji {
                    shortcode: ":molandak:".to_string(),
                    image: "assets/molandak.webp",
                },
                plain("\n"),
                DisplaySegment::CodeBlock {
                    language: "rust".to_string(),
                    code: "fn main() {}".to_string(),
                },
                plain("\noutro"),
            ]
        );
    }

    #[test]
    fn shortcodes_inside_code_are_not_substituted() {
        let segments = render_message("```\n:monshroom:\n```");
        assert_eq!(
            segments,
            vec![DisplaySegment::CodeBlock {
                language: "plaintext".to_string(),
                code: ":monshroom:".to_string(),
            }]
        );
    }

    #[test]
    fn empty_input_yields_no_segments() {
        assert!(render_message("").is_empty());
    }

    #[test]
    fn adjacent_fences_each_become_blocks() {
        let segments = render_message("```a\nx\n``````b\ny\n```");
        assert_eq!(
            segments,
            vec![
                DisplaySegment::CodeBlock {
                    language: "a".to_string(),
                    code: "x".to_string(),
                },
                DisplaySegment::CodeBlock {
                    language: "b".to_string(),
                    code: "y".to_string(),
                },
            ]
        );
    }

    #[test]
    fn multibyte_text_scans_cleanly() {
        let input = "héllo ✨ :pepe_monad: wörld";
        let segments = render_message(input);
        assert_eq!(concat_text(&segments), input);
        assert!(segments.iter().any(|s| matches!(
            s,
            DisplaySegment::Emoji { shortcode, .. } if shortcode == ":pepe_monad:"
        )));
    }
}
