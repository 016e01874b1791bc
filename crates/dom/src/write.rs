//! Serialization of a markup tree back to text.
//!
//! Writing is mode-aware: in the web modes, empty elements outside the
//! minimizable set are always written with an explicit end tag. The
//! non-minimization sentinel ([`NON_MINIMIZABLE_SENTINEL`]) that the engine
//! appends to protected elements is stripped from the output string as the
//! final step.

use crate::node::{Document, Node, NON_MINIMIZABLE_SENTINEL};
use crate::{DomError, TemplateMode};
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Serializes a document, doctype included, into markup text.
pub fn write_document(document: &Document, mode: TemplateMode) -> Result<String, DomError> {
    let mut writer = Writer::new(Vec::new());

    if let Some(doc_type) = &document.doc_type {
        let mut declaration = doc_type.root_element_name.clone();
        match (&doc_type.public_id, &doc_type.system_id) {
            (Some(public_id), Some(system_id)) => {
                declaration.push_str(&format!(" PUBLIC \"{}\" \"{}\"", public_id, system_id));
            }
            (Some(public_id), None) => {
                declaration.push_str(&format!(" PUBLIC \"{}\"", public_id));
            }
            (None, Some(system_id)) => {
                declaration.push_str(&format!(" SYSTEM \"{}\"", system_id));
            }
            (None, None) => {}
        }
        writer.write_event(Event::DocType(BytesText::from_escaped(declaration)))?;
        writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
    }

    for node in &document.children {
        write_node(&mut writer, node, mode)?;
    }

    finish(writer)
}

/// Serializes a list of nodes without any document prologue. Used for
/// fragment output and by tests.
pub fn write_nodes(nodes: &[Node], mode: TemplateMode) -> Result<String, DomError> {
    let mut writer = Writer::new(Vec::new());
    for node in nodes {
        write_node(&mut writer, node, mode)?;
    }
    finish(writer)
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String, DomError> {
    let rendered = String::from_utf8(writer.into_inner())
        .map_err(|e| DomError::InvalidStructure(format!("serialized markup is not UTF-8: {e}")))?;
    // The sentinel has done its job (the elements carrying it were written
    // with explicit end tags); it must not survive into the output.
    if rendered.contains(NON_MINIMIZABLE_SENTINEL) {
        Ok(rendered.replace(NON_MINIMIZABLE_SENTINEL, ""))
    } else {
        Ok(rendered)
    }
}

fn write_node(
    writer: &mut Writer<Vec<u8>>,
    node: &Node,
    mode: TemplateMode,
) -> Result<(), DomError> {
    match node {
        Node::Element(element) => {
            let mut start = BytesStart::new(element.name.as_str());
            for attribute in &element.attributes {
                start.push_attribute((attribute.name.as_str(), attribute.value.as_str()));
            }

            let minimize = element.children.is_empty()
                && (!mode.is_web() || element.is_minimizable_in_web_modes());

            if minimize {
                writer.write_event(Event::Empty(start))?;
            } else {
                writer.write_event(Event::Start(start))?;
                for child in &element.children {
                    write_node(writer, child, mode)?;
                }
                writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
            }
        }
        Node::Text(text) => {
            writer.write_event(Event::Text(BytesText::new(&text.content)))?;
        }
        Node::CData(text) => {
            writer.write_event(Event::CData(BytesCData::new(text.content.as_str())))?;
        }
        Node::Comment(comment) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(
                comment.content.as_str(),
            )))?;
        }
    }
    Ok(())
}
