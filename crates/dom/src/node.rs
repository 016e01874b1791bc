//! Node types for the markup tree.
//!
//! The tree is fully owned: elements own their attributes and children,
//! documents own their root nodes. Checking a template out of the cache is
//! therefore an explicit deep clone, and all structural rewriting during
//! transformation happens on a tree the caller exclusively owns.

/// Sentinel appended as a text child to empty elements that must not be
/// minimized in web output. Stripped from the serialized string as the very
/// last step of writing.
pub const NON_MINIMIZABLE_SENTINEL: char = '\u{FFFC}';

/// Normalizes an element or attribute name for matching purposes.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}

/// Returns the namespace prefix of a normalized name, if it has one.
///
/// `"wf:text"` yields `Some("wf")`; `"div"` yields `None`.
pub fn name_prefix(normalized_name: &str) -> Option<&str> {
    normalized_name.split_once(':').map(|(prefix, _)| prefix)
}

/// Coarse node classification used by non-specific processor matchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Text,
    CData,
    Comment,
}

/// An element attribute. The original name casing is preserved for output;
/// `normalized_name` is what processor matching operates on.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub normalized_name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let normalized_name = normalize_name(&name);
        Attribute {
            name,
            normalized_name,
            value: value.into(),
        }
    }
}

/// An element node: name, ordered attributes, ordered children, and the
/// executability flags maintained by the annotation pass.
///
/// Both flags start `true` on freshly built nodes; the annotator clears
/// them where no processor can apply, and clones made for generated markup
/// clear them transitively.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub normalized_name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
    pub executable: bool,
    pub subtree_executable: bool,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let normalized_name = normalize_name(&name);
        Element {
            name,
            normalized_name,
            attributes: Vec::new(),
            children: Vec::new(),
            executable: true,
            subtree_executable: true,
        }
    }

    /// The namespace prefix of this element's normalized name, if any.
    pub fn prefix(&self) -> Option<&str> {
        name_prefix(&self.normalized_name)
    }

    /// Looks up an attribute by its normalized name.
    pub fn attribute(&self, normalized_name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.normalized_name == normalized_name)
    }

    /// Looks up an attribute value by normalized name.
    pub fn attribute_value(&self, normalized_name: &str) -> Option<&str> {
        self.attribute(normalized_name).map(|a| a.value.as_str())
    }

    pub fn has_attribute(&self, normalized_name: &str) -> bool {
        self.attribute(normalized_name).is_some()
    }

    /// Sets an attribute, replacing any existing attribute with the same
    /// normalized name (original casing of the replaced attribute is lost).
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let attribute = Attribute::new(name, value);
        if let Some(existing) = self
            .attributes
            .iter_mut()
            .find(|a| a.normalized_name == attribute.normalized_name)
        {
            *existing = attribute;
        } else {
            self.attributes.push(attribute);
        }
    }

    /// Removes an attribute by normalized name. Returns whether an
    /// attribute was actually present.
    pub fn remove_attribute(&mut self, normalized_name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|a| a.normalized_name != normalized_name);
        self.attributes.len() != before
    }

    /// True when the element has no content that would prevent the
    /// serializer from minimizing it: no children, or a single empty text
    /// child.
    pub fn is_content_empty(&self) -> bool {
        match self.children.as_slice() {
            [] => true,
            [Node::Text(text)] => text.content.is_empty(),
            _ => false,
        }
    }

    /// Whether this element, when empty, may be minimized in web output.
    pub fn is_minimizable_in_web_modes(&self) -> bool {
        crate::mode::is_minimizable_web_element(&self.normalized_name)
    }
}

/// A text or CDATA payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub content: String,
    pub executable: bool,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Text {
            content: content.into(),
            executable: true,
        }
    }

    /// A text node that is permanently excluded from inlining, used for
    /// content produced by evaluating expressions.
    pub fn non_executable(content: impl Into<String>) -> Self {
        Text {
            content: content.into(),
            executable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub content: String,
}

impl Comment {
    pub fn new(content: impl Into<String>) -> Self {
        Comment {
            content: content.into(),
        }
    }
}

/// A node of the markup tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(Text),
    CData(Text),
    Comment(Comment),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Element(_) => NodeKind::Element,
            Node::Text(_) => NodeKind::Text,
            Node::CData(_) => NodeKind::CData,
            Node::Comment(_) => NodeKind::Comment,
        }
    }

    /// Whether this node itself may be acted on by a processor or inliner.
    /// Comments are never executable.
    pub fn is_executable(&self) -> bool {
        match self {
            Node::Element(element) => element.executable,
            Node::Text(text) | Node::CData(text) => text.executable,
            Node::Comment(_) => false,
        }
    }

    /// Whether this node or any descendant may be acted on. For non-element
    /// nodes this is the node's own flag.
    pub fn is_subtree_executable(&self) -> bool {
        match self {
            Node::Element(element) => element.subtree_executable,
            _ => self.is_executable(),
        }
    }

    pub fn set_executable(&mut self, executable: bool) {
        match self {
            Node::Element(element) => element.executable = executable,
            Node::Text(text) | Node::CData(text) => text.executable = executable,
            Node::Comment(_) => {}
        }
    }

    /// Clears executability on this node and every descendant.
    ///
    /// Markup that was generated by evaluating an expression must never be
    /// re-interpreted as processable template content, so anything cloned
    /// or built for injection goes through this before entering the tree.
    pub fn clear_executability(&mut self) {
        match self {
            Node::Element(element) => {
                element.executable = false;
                element.subtree_executable = false;
                for child in &mut element.children {
                    child.clear_executability();
                }
            }
            Node::Text(text) | Node::CData(text) => text.executable = false,
            Node::Comment(_) => {}
        }
    }

    /// Deep copy preserving executability flags. Used when checking a
    /// parsed template out of the cache.
    pub fn deep_clone(&self) -> Node {
        self.clone()
    }

    /// Deep copy with executability cleared throughout, for content that
    /// re-enters the tree as generated markup.
    pub fn deep_clone_non_executable(&self) -> Node {
        let mut clone = self.clone();
        clone.clear_executability();
        clone
    }
}

/// A document type declaration. `root_element_name` is the name the
/// declaration was attached to (`html` in `<!DOCTYPE html>`).
#[derive(Debug, Clone, PartialEq)]
pub struct DocType {
    pub root_element_name: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

/// A parsed template document: an optional doctype followed by the root
/// nodes. A freshly parsed document holds exactly one root element
/// (enforced by the tree builder); transformation may temporarily splice
/// several nodes into the top level.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub doc_type: Option<DocType>,
    pub children: Vec<Node>,
}

impl Document {
    pub fn new(doc_type: Option<DocType>, root: Element) -> Self {
        Document {
            doc_type,
            children: vec![Node::Element(root)],
        }
    }

    /// The first element among the document's top-level nodes.
    pub fn root_element(&self) -> Option<&Element> {
        self.children.iter().find_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn root_element_mut(&mut self) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Deep copy preserving executability flags.
    pub fn deep_clone(&self) -> Document {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_normalization() {
        let element = Element::new("DIV");
        assert_eq!(element.name, "DIV");
        assert_eq!(element.normalized_name, "div");

        let attribute = Attribute::new("WF:Text", "${x}");
        assert_eq!(attribute.normalized_name, "wf:text");
    }

    #[test]
    fn test_name_prefix() {
        assert_eq!(name_prefix("wf:text"), Some("wf"));
        assert_eq!(name_prefix("div"), None);
        assert_eq!(Element::new("wf:block").prefix(), Some("wf"));
    }

    #[test]
    fn test_attribute_set_and_remove() {
        let mut element = Element::new("div");
        element.set_attribute("class", "a");
        element.set_attribute("CLASS", "b");
        assert_eq!(element.attributes.len(), 1);
        assert_eq!(element.attribute_value("class"), Some("b"));

        assert!(element.remove_attribute("class"));
        assert!(!element.remove_attribute("class"));
        assert!(!element.has_attribute("class"));
    }

    #[test]
    fn test_content_emptiness() {
        let mut element = Element::new("div");
        assert!(element.is_content_empty());

        element.children.push(Node::Text(Text::new("")));
        assert!(element.is_content_empty());

        element.children.clear();
        element.children.push(Node::Text(Text::new("x")));
        assert!(!element.is_content_empty());
    }

    #[test]
    fn test_clear_executability_is_transitive() {
        let mut inner = Element::new("b");
        inner.children.push(Node::Text(Text::new("x")));
        let mut outer = Element::new("div");
        outer.children.push(Node::Element(inner));

        let mut node = Node::Element(outer);
        assert!(node.is_executable());
        node.clear_executability();

        assert!(!node.is_executable());
        assert!(!node.is_subtree_executable());
        if let Node::Element(outer) = &node {
            let Node::Element(inner) = &outer.children[0] else {
                panic!("expected element child");
            };
            assert!(!inner.executable);
            assert!(!inner.children[0].is_executable());
        }
    }

    #[test]
    fn test_non_executable_clone_leaves_original_untouched() {
        let original = Node::Element(Element::new("div"));
        let clone = original.deep_clone_non_executable();
        assert!(original.is_executable());
        assert!(!clone.is_executable());
    }

    #[test]
    fn test_comments_are_never_executable() {
        let mut comment = Node::Comment(Comment::new("c"));
        assert!(!comment.is_executable());
        comment.set_executable(true);
        assert!(!comment.is_executable());
    }

    #[test]
    fn test_document_root_element() {
        let document = Document::new(None, Element::new("html"));
        assert_eq!(document.root_element().unwrap().normalized_name, "html");
    }
}
