//! Event-driven construction of a [`Document`] from markup source.

use crate::ParseError;
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::Reader;
use weft_dom::{Attribute, Comment, DocType, Document, Element, Node, Text};

/// Builds an owned markup tree from template source.
///
/// A builder is meant to be checked out of the [`crate::ParserPool`] and
/// used by one thread at a time; its scratch buffer is reused across
/// parses. The validating configuration enforces strict well-formedness
/// (matching end tags, everything closed); the non-validating one recovers
/// from mismatched or missing end tags.
#[derive(Debug)]
pub struct TreeBuilder {
    validating: bool,
    buf: Vec<u8>,
}

impl TreeBuilder {
    pub fn new(validating: bool) -> Self {
        TreeBuilder {
            validating,
            buf: Vec::with_capacity(8 * 1024),
        }
    }

    /// Decodes and parses raw template bytes. Only UTF-8 (and its ASCII
    /// subset) is supported; any other declared encoding is a parse fault
    /// rather than a silent mis-decode.
    pub fn parse_bytes(
        &mut self,
        bytes: &[u8],
        declared_encoding: Option<&str>,
    ) -> Result<Document, ParseError> {
        if let Some(encoding) = declared_encoding {
            let normalized = encoding.trim().to_ascii_lowercase();
            if !matches!(normalized.as_str(), "utf-8" | "utf8" | "us-ascii" | "ascii") {
                return Err(ParseError::UnsupportedEncoding(encoding.to_string()));
            }
        }
        let source = std::str::from_utf8(bytes)?;
        self.parse(source)
    }

    /// Parses template source into a document with exactly one root
    /// element (plus optional doctype and top-level comments).
    pub fn parse(&mut self, source: &str) -> Result<Document, ParseError> {
        let mut reader = Reader::from_str(source);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = self.validating;

        let mut doc_type: Option<DocType> = None;
        let mut top_level: Vec<Node> = Vec::new();
        let mut stack: Vec<Element> = Vec::new();

        loop {
            let position = reader.buffer_position();
            self.buf.clear();
            let event = match reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => return Err(classify_markup_error(e, position)),
            };

            match event {
                Event::Start(e) => {
                    let element = element_from_start(e.name().as_ref(), e.attributes())?;
                    stack.push(element);
                }
                Event::Empty(e) => {
                    let element = element_from_start(e.name().as_ref(), e.attributes())?;
                    attach(&mut stack, &mut top_level, Node::Element(element))?;
                }
                Event::End(e) => {
                    let Some(element) = stack.pop() else {
                        if self.validating {
                            return Err(ParseError::Markup(format!(
                                "unexpected closing tag </{}> at position {}",
                                String::from_utf8_lossy(e.name().as_ref()),
                                position
                            )));
                        }
                        continue;
                    };
                    if !self.validating {
                        let end_name = std::str::from_utf8(e.name().as_ref())?.to_lowercase();
                        if end_name != element.normalized_name {
                            log::warn!(
                                "closing tag </{}> does not match open <{}>, recovering",
                                end_name,
                                element.name
                            );
                        }
                    }
                    attach(&mut stack, &mut top_level, Node::Element(element))?;
                }
                Event::Text(e) => {
                    let raw = std::str::from_utf8(e.as_ref())?;
                    let content = unescape(raw)
                        .map_err(|_| ParseError::BadElementContent)?
                        .into_owned();
                    if stack.is_empty() && content.trim().is_empty() {
                        continue;
                    }
                    attach(&mut stack, &mut top_level, Node::Text(Text::new(content)))?;
                }
                Event::CData(e) => {
                    let content = std::str::from_utf8(e.as_ref())?.to_string();
                    attach(&mut stack, &mut top_level, Node::CData(Text::new(content)))?;
                }
                Event::Comment(e) => {
                    let content = std::str::from_utf8(e.as_ref())?.to_string();
                    attach(
                        &mut stack,
                        &mut top_level,
                        Node::Comment(Comment::new(content)),
                    )?;
                }
                Event::GeneralRef(e) => {
                    // Entity references inside character data arrive as
                    // separate events; resolve them and merge into the
                    // surrounding text.
                    let name = std::str::from_utf8(e.as_ref())?;
                    match resolve_entity(name) {
                        Some(resolved) => {
                            attach(&mut stack, &mut top_level, Node::Text(Text::new(resolved)))?;
                        }
                        None if self.validating => {
                            return Err(ParseError::Markup(format!(
                                "undefined entity reference '&{name};' at position {position}"
                            )));
                        }
                        None => {
                            log::warn!("undefined entity reference '&{name};', kept literally");
                            attach(
                                &mut stack,
                                &mut top_level,
                                Node::Text(Text::new(format!("&{name};"))),
                            )?;
                        }
                    }
                }
                Event::DocType(e) => {
                    let content = std::str::from_utf8(e.as_ref())?.trim().to_string();
                    doc_type = Some(parse_doc_type(&content));
                }
                Event::Eof => break,
                // XML declarations and processing instructions carry nothing
                // the engine acts on.
                _ => {}
            }
        }

        if !stack.is_empty() {
            if self.validating {
                return Err(ParseError::Markup(format!(
                    "unexpected end of source: <{}> is never closed",
                    stack[stack.len() - 1].name
                )));
            }
            // Recovery: close everything still open, innermost first.
            while let Some(element) = stack.pop() {
                attach(&mut stack, &mut top_level, Node::Element(element))?;
            }
        }

        let element_count = top_level
            .iter()
            .filter(|node| matches!(node, Node::Element(_)))
            .count();
        match element_count {
            0 => Err(ParseError::InvalidStructure(
                "no root element found".to_string(),
            )),
            1 => Ok(Document {
                doc_type,
                children: top_level,
            }),
            _ => Err(ParseError::InvalidStructure(
                "more than one root element found".to_string(),
            )),
        }
    }
}

fn element_from_start(
    name: &[u8],
    attributes: quick_xml::events::attributes::Attributes<'_>,
) -> Result<Element, ParseError> {
    let name = std::str::from_utf8(name)?;
    let mut element = Element::new(name);
    for attribute in attributes {
        let attribute =
            attribute.map_err(|e| ParseError::Markup(format!("malformed attribute: {e}")))?;
        let key = std::str::from_utf8(attribute.key.as_ref())?;
        let raw_value = std::str::from_utf8(&attribute.value)?;
        let value = unescape(raw_value)
            .map_err(|e| ParseError::Markup(format!("malformed attribute value: {e}")))?;
        element
            .attributes
            .push(Attribute::new(key, value.into_owned()));
    }
    Ok(element)
}

fn attach(
    stack: &mut Vec<Element>,
    top_level: &mut Vec<Node>,
    node: Node,
) -> Result<(), ParseError> {
    if let Some(parent) = stack.last_mut() {
        // Adjacent text runs (as produced around entity references) fold
        // into a single node.
        if let (Some(Node::Text(last)), Node::Text(text)) = (parent.children.last_mut(), &node) {
            last.content.push_str(&text.content);
            return Ok(());
        }
        parent.children.push(node);
        return Ok(());
    }
    match &node {
        Node::Text(text) if !text.content.trim().is_empty() => {
            return Err(ParseError::InvalidStructure(
                "text content is not allowed outside the root element".to_string(),
            ));
        }
        Node::Text(_) => return Ok(()), // whitespace between top-level nodes
        _ => {}
    }
    top_level.push(node);
    Ok(())
}

fn classify_markup_error(error: quick_xml::Error, position: u64) -> ParseError {
    let message = error.to_string();
    // quick-xml reports a raw '<' or '&' inside character data as a syntax,
    // escape or reference failure; all of them get the actionable
    // diagnostic.
    let lowered = message.to_lowercase();
    if lowered.contains("escape") || lowered.contains("entity") || lowered.contains("reference") {
        return ParseError::BadElementContent;
    }
    ParseError::Markup(format!("{message} (at position {position})"))
}

/// Resolves the predefined XML entities and numeric character references.
fn resolve_entity(name: &str) -> Option<String> {
    match name {
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        _ => {}
    }
    let code = name.strip_prefix('#')?;
    let value = match code.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => code.parse::<u32>().ok()?,
    };
    char::from_u32(value).map(|c| c.to_string())
}

/// Parses the body of a `<!DOCTYPE ...>` declaration.
fn parse_doc_type(content: &str) -> DocType {
    let mut scanner = content.char_indices().peekable();
    let mut tokens: Vec<String> = Vec::new();

    while let Some(&(start, c)) = scanner.peek() {
        if c.is_whitespace() {
            scanner.next();
        } else if c == '"' || c == '\'' {
            let quote = c;
            scanner.next();
            let mut token = String::new();
            for (_, inner) in scanner.by_ref() {
                if inner == quote {
                    break;
                }
                token.push(inner);
            }
            tokens.push(token);
        } else {
            let mut end = start;
            while let Some(&(i, inner)) = scanner.peek() {
                if inner.is_whitespace() {
                    break;
                }
                end = i + inner.len_utf8();
                scanner.next();
            }
            tokens.push(content[start..end].to_string());
        }
    }

    let root_element_name = tokens.first().cloned().unwrap_or_default();
    let mut public_id = None;
    let mut system_id = None;
    match tokens.get(1).map(|k| k.to_ascii_uppercase()) {
        Some(keyword) if keyword == "PUBLIC" => {
            public_id = tokens.get(2).cloned();
            system_id = tokens.get(3).cloned();
        }
        Some(keyword) if keyword == "SYSTEM" => {
            system_id = tokens.get(2).cloned();
        }
        _ => {}
    }

    DocType {
        root_element_name,
        public_id,
        system_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_dom::NodeKind;

    fn parse(source: &str) -> Document {
        TreeBuilder::new(false).parse(source).unwrap()
    }

    #[test]
    fn test_parse_simple_tree() {
        let document = parse("<html><body><p class=\"a\">hi</p></body></html>");
        let root = document.root_element().unwrap();
        assert_eq!(root.normalized_name, "html");

        let Node::Element(body) = &root.children[0] else {
            panic!("expected body element");
        };
        let Node::Element(p) = &body.children[0] else {
            panic!("expected p element");
        };
        assert_eq!(p.attribute_value("class"), Some("a"));
        assert_eq!(p.children[0], Node::Text(Text::new("hi")));
    }

    #[test]
    fn test_parse_doctype() {
        let document = parse(
            "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" \
             \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\">\n<html><body/></html>",
        );
        let doc_type = document.doc_type.unwrap();
        assert_eq!(doc_type.root_element_name, "html");
        assert_eq!(
            doc_type.public_id.as_deref(),
            Some("-//W3C//DTD XHTML 1.0 Strict//EN")
        );
        assert!(doc_type.system_id.is_some());
    }

    #[test]
    fn test_parse_html5_doctype() {
        let document = parse("<!DOCTYPE html><html><body/></html>");
        let doc_type = document.doc_type.unwrap();
        assert_eq!(doc_type.root_element_name, "html");
        assert_eq!(doc_type.public_id, None);
        assert_eq!(doc_type.system_id, None);
    }

    #[test]
    fn test_entities_are_unescaped() {
        let document = parse("<p>a &lt; b &amp; c</p>");
        let root = document.root_element().unwrap();
        assert_eq!(root.children[0], Node::Text(Text::new("a < b & c")));
    }

    #[test]
    fn test_cdata_and_comments() {
        let document = parse("<div><![CDATA[x < y]]><!-- note --></div>");
        let root = document.root_element().unwrap();
        assert_eq!(root.children[0].kind(), NodeKind::CData);
        assert_eq!(root.children[1].kind(), NodeKind::Comment);
    }

    #[test]
    fn test_fresh_nodes_are_executable() {
        let document = parse("<div><p>x</p></div>");
        let root = document.root_element().unwrap();
        assert!(root.executable);
        assert!(root.subtree_executable);
    }

    #[test]
    fn test_no_root_element_is_an_error() {
        let result = TreeBuilder::new(false).parse("<!-- only a comment -->");
        assert!(matches!(result, Err(ParseError::InvalidStructure(_))));
    }

    #[test]
    fn test_multiple_root_elements_are_an_error() {
        let result = TreeBuilder::new(false).parse("<a/><b/>");
        assert!(matches!(result, Err(ParseError::InvalidStructure(_))));
    }

    #[test]
    fn test_bad_element_content_gets_actionable_message() {
        let result = TreeBuilder::new(false).parse("<script>if (a && b) f();</script>");
        match result {
            Err(ParseError::BadElementContent) => {
                assert!(ParseError::BadElementContent
                    .to_string()
                    .contains("CDATA"));
            }
            other => panic!("expected BadElementContent, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_validating_rejects_unclosed_elements() {
        let result = TreeBuilder::new(true).parse("<div><p>x</div>");
        assert!(result.is_err());
    }

    #[test]
    fn test_non_validating_recovers_unclosed_elements() {
        let document = TreeBuilder::new(false)
            .parse("<div><p>x</div>")
            .unwrap();
        let root = document.root_element().unwrap();
        assert_eq!(root.normalized_name, "div");
    }

    #[test]
    fn test_unsupported_encoding() {
        let result = TreeBuilder::new(false).parse_bytes(b"<a/>", Some("ISO-8859-1"));
        assert!(matches!(result, Err(ParseError::UnsupportedEncoding(_))));
    }

    #[test]
    fn test_utf8_bytes_with_declared_utf8() {
        let document = TreeBuilder::new(false)
            .parse_bytes("<p>h\u{e9}llo</p>".as_bytes(), Some("UTF-8"))
            .unwrap();
        assert!(document.root_element().is_some());
    }
}
