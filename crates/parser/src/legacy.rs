//! Normalization of legacy (tag-soup) HTML into well-formed markup.
//!
//! Templates in the legacy mode are first run through this rewriter so the
//! standard tree builder can parse them: void elements get self-closed,
//! unquoted attribute values get quoted, bare ampersands get escaped, and
//! the common named HTML entities are turned into numeric character
//! references. This is deliberately a *normalizer*, not a full HTML5
//! parser: structurally broken nesting is left for the non-validating
//! builder's recovery to deal with.

/// HTML void elements: no content model, never a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "br", "col", "embed", "frame", "hr", "img", "input", "isindex",
    "link", "meta", "param", "source", "track", "wbr",
];

/// The named HTML entities worth knowing outside a DTD, mapped to their
/// code points. Everything else is left for the builder to deal with.
const NAMED_ENTITIES: &[(&str, u32)] = &[
    ("nbsp", 160),
    ("iexcl", 161),
    ("copy", 169),
    ("laquo", 171),
    ("reg", 174),
    ("deg", 176),
    ("middot", 183),
    ("raquo", 187),
    ("times", 215),
    ("ndash", 8211),
    ("mdash", 8212),
    ("lsquo", 8216),
    ("rsquo", 8217),
    ("ldquo", 8220),
    ("rdquo", 8221),
    ("hellip", 8230),
    ("euro", 8364),
];

/// Rewrites tag-soup HTML into well-formed markup. Instances keep a scratch
/// buffer and are pooled like tree builders.
#[derive(Debug, Default)]
pub struct LegacyMarkupNormalizer {
    out: String,
}

impl LegacyMarkupNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(&mut self, source: &str) -> String {
        self.out.clear();
        self.out.reserve(source.len() + source.len() / 8);

        let bytes = source.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let rest = &source[i..];
            if rest.starts_with("<!--") {
                i += self.copy_through(rest, "-->");
            } else if rest.starts_with("<![CDATA[") {
                i += self.copy_through(rest, "]]>");
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                i += self.copy_through(rest, ">");
            } else if rest.starts_with('<') {
                match self.rewrite_tag(rest) {
                    Some(consumed) => i += consumed,
                    None => {
                        // A '<' that opens nothing parseable is content.
                        self.out.push_str("&lt;");
                        i += 1;
                    }
                }
            } else if rest.starts_with('&') {
                i += self.rewrite_reference(rest);
            } else {
                let c = rest.chars().next().expect("non-empty remainder");
                self.out.push(c);
                i += c.len_utf8();
            }
        }

        std::mem::take(&mut self.out)
    }

    /// Copies `rest` up to and including `terminator` (or to the end when
    /// unterminated). Returns the number of bytes consumed.
    fn copy_through(&mut self, rest: &str, terminator: &str) -> usize {
        let end = rest
            .find(terminator)
            .map(|pos| pos + terminator.len())
            .unwrap_or(rest.len());
        self.out.push_str(&rest[..end]);
        end
    }

    /// Rewrites one tag starting at `rest` (which begins with `<`).
    /// Returns the consumed byte count, or `None` when this is not a tag.
    fn rewrite_tag(&mut self, rest: &str) -> Option<usize> {
        let mut chars = rest.char_indices().skip(1).peekable();
        let closing = matches!(chars.peek(), Some((_, '/')));
        if closing {
            chars.next();
        }

        // Tag names start with a letter; anything else is stray content.
        match chars.peek() {
            Some((_, c)) if c.is_ascii_alphabetic() => {}
            _ => return None,
        }

        let name_start = chars.peek().map(|(i, _)| *i)?;
        let mut name_end = name_start;
        while let Some(&(i, c)) = chars.peek() {
            if c.is_ascii_alphanumeric() || c == ':' || c == '-' || c == '_' {
                name_end = i + c.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        let name = rest[name_start..name_end].to_lowercase();

        // Scan the rest of the tag, quoting unquoted attribute values.
        let mut body = String::new();
        let mut self_closed = false;
        let mut end = None;
        while let Some((i, c)) = chars.next() {
            match c {
                '>' => {
                    end = Some(i + 1);
                    break;
                }
                '"' | '\'' => {
                    body.push(c);
                    for (_, q) in chars.by_ref() {
                        body.push(q);
                        if q == c {
                            break;
                        }
                    }
                }
                '=' => {
                    body.push('=');
                    // Skip whitespace after '='.
                    while matches!(chars.peek(), Some((_, w)) if w.is_whitespace()) {
                        chars.next();
                    }
                    match chars.peek() {
                        Some(&(_, q)) if q == '"' || q == '\'' => {} // quoted, handled above
                        Some(&(_, '>')) | None => {}
                        Some(_) => {
                            // Unquoted value: wrap it.
                            body.push('"');
                            while let Some(&(_, v)) = chars.peek() {
                                if v.is_whitespace() || v == '>' || v == '/' {
                                    break;
                                }
                                body.push(v);
                                chars.next();
                            }
                            body.push('"');
                        }
                    }
                }
                '/' if matches!(chars.peek(), Some((_, '>'))) => {
                    self_closed = true;
                }
                _ => body.push(c),
            }
        }
        let end = end?;

        if closing {
            if VOID_ELEMENTS.contains(&name.as_str()) {
                // Closing tags for void elements are dropped entirely.
                return Some(end);
            }
            self.out.push_str("</");
            self.out.push_str(&rest[name_start..name_end]);
            self.out.push('>');
            return Some(end);
        }

        self.out.push('<');
        self.out.push_str(&rest[name_start..name_end]);
        self.out.push_str(body.trim_end());
        if self_closed || VOID_ELEMENTS.contains(&name.as_str()) {
            self.out.push_str("/>");
        } else {
            self.out.push('>');
        }
        Some(end)
    }

    /// Rewrites one `&` reference: known named entities become numeric
    /// references, malformed ones become `&amp;`. Returns bytes consumed.
    fn rewrite_reference(&mut self, rest: &str) -> usize {
        let body: String = rest
            .chars()
            .skip(1)
            .take(32)
            .take_while(|c| *c != ';' && !c.is_whitespace() && *c != '&' && *c != '<')
            .collect();
        let terminated = rest[1..]
            .chars()
            .nth(body.chars().count())
            .is_some_and(|c| c == ';');

        if terminated && !body.is_empty() {
            if matches!(body.as_str(), "lt" | "gt" | "amp" | "apos" | "quot")
                || body.starts_with('#')
            {
                self.out.push('&');
                return 1;
            }
            if let Some(&(_, code)) = NAMED_ENTITIES.iter().find(|(n, _)| *n == body) {
                self.out.push_str(&format!("&#{code};"));
                return 1 + body.len() + 1;
            }
        }

        self.out.push_str("&amp;");
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(source: &str) -> String {
        LegacyMarkupNormalizer::new().normalize(source)
    }

    #[test]
    fn test_void_elements_are_self_closed() {
        assert_eq!(normalize("<p>a<br>b</p>"), "<p>a<br/>b</p>");
        assert_eq!(
            normalize("<img src=\"x.png\" alt=\"y\">"),
            "<img src=\"x.png\" alt=\"y\"/>"
        );
        assert_eq!(normalize("<meta charset=\"utf-8\">"), "<meta charset=\"utf-8\"/>");
    }

    #[test]
    fn test_already_closed_void_elements_are_untouched() {
        assert_eq!(normalize("<br/>"), "<br/>");
        assert_eq!(normalize("<br />"), "<br/>");
    }

    #[test]
    fn test_closing_void_tags_are_dropped() {
        assert_eq!(normalize("<p>a<br></br>b</p>"), "<p>a<br/>b</p>");
    }

    #[test]
    fn test_unquoted_attribute_values_are_quoted() {
        assert_eq!(
            normalize("<input type=text name=q>"),
            "<input type=\"text\" name=\"q\"/>"
        );
    }

    #[test]
    fn test_bare_ampersands_are_escaped() {
        assert_eq!(normalize("<p>fish & chips</p>"), "<p>fish &amp; chips</p>");
        assert_eq!(normalize("<p>a &lt; b</p>"), "<p>a &lt; b</p>");
    }

    #[test]
    fn test_named_html_entities_become_numeric() {
        assert_eq!(normalize("<p>a&nbsp;b</p>"), "<p>a&#160;b</p>");
        assert_eq!(normalize("<p>&copy; 2016</p>"), "<p>&#169; 2016</p>");
    }

    #[test]
    fn test_stray_angle_bracket_is_escaped() {
        assert_eq!(normalize("<p>1 < 2</p>"), "<p>1 &lt; 2</p>");
    }

    #[test]
    fn test_comments_and_cdata_pass_through() {
        assert_eq!(
            normalize("<div><!-- a & b --><![CDATA[x < y]]></div>"),
            "<div><!-- a & b --><![CDATA[x < y]]></div>"
        );
    }

    #[test]
    fn test_doctype_passes_through() {
        assert_eq!(
            normalize("<!DOCTYPE html><html></html>"),
            "<!DOCTYPE html><html></html>"
        );
    }
}
