//! Minimal HTML helpers for the assistant and upload pipelines.
//!
//! The editor content is opaque markup; the assistant only needs a
//! plain-text rendition of it, and the upload converters only need to
//! escape extracted text before wrapping it in spans.

/// Strip tags from editor markup and collapse whitespace.
///
/// Decodes the handful of entities the editor emits. Block-level
/// closing tags become single spaces so adjacent paragraphs do not run
/// together.
pub fn strip_markup(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '<' => {
                for t in chars.by_ref() {
                    if t == '>' {
                        break;
                    }
                }
                text.push(' ');
            }
            '&' => {
                let mut entity = String::new();
                let mut terminated = false;
                while let Some(&n) = chars.peek() {
                    if n == ';' {
                        chars.next();
                        terminated = true;
                        break;
                    }
                    if !n.is_ascii_alphanumeric() && n != '#' {
                        break;
                    }
                    entity.push(n);
                    chars.next();
                }
                match entity.as_str() {
                    "amp" => text.push('&'),
                    "lt" => text.push('<'),
                    "gt" => text.push('>'),
                    "quot" => text.push('"'),
                    "#39" | "apos" => text.push('\''),
                    "nbsp" => text.push(' '),
                    other => {
                        // Unknown entity: keep it verbatim.
                        text.push('&');
                        text.push_str(other);
                        if terminated {
                            text.push(';');
                        }
                    }
                }
            }
            _ => text.push(c),
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape text for embedding in generated HTML.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        let html = "<h1>Title</h1><p>First  paragraph.</p>\n<p>Second.</p>";
        assert_eq!(strip_markup(html), "Title First paragraph. Second.");
    }

    #[test]
    fn decodes_common_entities() {
        assert_eq!(strip_markup("<p>a &amp; b &lt;c&gt;</p>"), "a & b <c>");
        assert_eq!(strip_markup("one&nbsp;two"), "one two");
    }

    #[test]
    fn unknown_entities_pass_through_unchanged() {
        assert_eq!(strip_markup("a &copy; b"), "a &copy; b");
        assert_eq!(strip_markup("AT&T"), "AT&T");
    }

    #[test]
    fn empty_markup_strips_to_empty() {
        assert_eq!(strip_markup("<p></p><div><br/></div>"), "");
    }

    #[test]
    fn escape_round_trips_through_strip() {
        let raw = "5 < 6 & \"quotes\"";
        assert_eq!(strip_markup(&escape_html(raw)), raw);
    }
}
