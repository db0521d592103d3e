//! Owned XML element tree for the customer impex format.
//!
//! The tree keeps qualified names and attribute order exactly as read, and
//! records the resolved namespace of every element so lookups can match on
//! `(namespace, local name)` independent of the prefix a given export uses.

use crate::utils::error::{EtlError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Qualified name as written, e.g. `custom-attribute` or `i:user`.
    pub name: String,
    /// Resolved namespace URI, `None` for unqualified elements.
    pub namespace: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.local_name() == local && self.namespace.as_deref() == Some(namespace)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// Text that precedes the first child element.
    pub fn text(&self) -> Option<&str> {
        match self.children.first() {
            Some(Node::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn set_text(&mut self, value: impl Into<String>) {
        let value = value.into();
        match self.children.first_mut() {
            Some(Node::Text(text)) => *text = value,
            _ => self.children.insert(0, Node::Text(value)),
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    pub fn child(&self, namespace: &str, local: &str) -> Option<&Element> {
        self.elements().find(|child| child.is(namespace, local))
    }

    pub fn child_mut(&mut self, namespace: &str, local: &str) -> Option<&mut Element> {
        self.elements_mut().find(|child| child.is(namespace, local))
    }

    /// Appends `child`; a whitespace-only text node held so far was
    /// formatting and is dropped.
    pub fn push_child(&mut self, child: Element) {
        strip_whitespace_text(&mut self.children);
        self.children.push(Node::Element(child));
    }

    /// Qualified name for a new child in this element's namespace.
    pub fn child_name(&self, local: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        }
    }

    /// Builds an empty child in this element's namespace.
    pub fn new_child(&self, local: &str) -> Element {
        Element::new(self.child_name(local), self.namespace.clone())
    }

    /// Drops child elements rejected by `keep`, returning how many were removed.
    pub fn retain_elements<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Element) -> bool,
    {
        let before = self.children.len();
        self.children.retain(|node| match node {
            Node::Element(element) => keep(element),
            Node::Text(_) => true,
        });
        before - self.children.len()
    }

    /// First matching descendant in document order, excluding `self`.
    pub fn find_descendant<F>(&self, predicate: &F) -> Option<&Element>
    where
        F: Fn(&Element) -> bool,
    {
        for child in self.elements() {
            if predicate(child) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(predicate) {
                return Some(found);
            }
        }
        None
    }

    /// Calls `f` on every outermost descendant named `local`; matches are not
    /// searched for further nested matches.
    pub fn for_each_descendant_mut<F>(&mut self, namespace: &str, local: &str, f: &mut F)
    where
        F: FnMut(&mut Element),
    {
        for child in self.elements_mut() {
            if child.is(namespace, local) {
                f(child);
            } else {
                child.for_each_descendant_mut(namespace, local, f);
            }
        }
    }

    /// Pre-order walk over `self` and all descendants.
    pub fn walk_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Element),
    {
        f(self);
        for child in self.elements_mut() {
            child.walk_mut(f);
        }
    }

    /// Namespace declarations (`xmlns` / `xmlns:p`) carried on this element.
    pub fn namespace_declarations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .filter(|(key, _)| key == "xmlns" || key.starts_with("xmlns:"))
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Prefix bound to `uri` on this element: `Some(None)` for the default
    /// namespace, `Some(Some(p))` for `xmlns:p`, `None` when not declared here.
    pub fn prefix_for_namespace(&self, uri: &str) -> Option<Option<&str>> {
        self.namespace_declarations()
            .find(|(_, value)| *value == uri)
            .map(|(key, _)| key.strip_prefix("xmlns:"))
    }

    /// Value of the attribute `local` qualified with `namespace`, resolving
    /// prefixes against the declarations on this element.
    pub fn attribute_ns(&self, namespace: &str, local: &str) -> Option<(&str, &str)> {
        let prefix = self.prefix_for_namespace(namespace)??;
        let qualified = format!("{}:{}", prefix, local);
        self.attributes
            .iter()
            .find(|(key, _)| *key == qualified)
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(bytes)
            .map_err(|e| EtlError::document(format!("document is not valid UTF-8: {}", e)))?;
        Self::parse(xml)
    }

    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut scopes = NamespaceScopes::default();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    let element = scopes.open(&start)?;
                    stack.push(element);
                }
                Event::Empty(start) => {
                    let element = scopes.open(&start)?;
                    scopes.close();
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| EtlError::document("unbalanced closing tag"))?;
                    scopes.close();
                    attach(&mut stack, &mut root, strip_formatting(element))?;
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(xml_error)?;
                    push_text(&mut stack, &text);
                }
                Event::CData(data) => {
                    let text = String::from_utf8(data.into_inner().into_owned())
                        .map_err(|e| EtlError::document(format!("invalid CDATA: {}", e)))?;
                    push_text(&mut stack, &text);
                }
                Event::Eof => break,
                // 宣告、註解、處理指令不保留
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(EtlError::document("unexpected end of document"));
        }
        root.map(Document::new)
            .ok_or_else(|| EtlError::document("document has no root element"))
    }

    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        write_element(&mut writer, &self.root)?;
        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }
}

fn xml_error(e: impl std::fmt::Display) -> EtlError {
    EtlError::document(e.to_string())
}

fn decode_name(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| EtlError::document(format!("invalid name: {}", e)))
}

fn push_text(stack: &mut [Element], text: &str) {
    if let Some(parent) = stack.last_mut() {
        match parent.children.last_mut() {
            Some(Node::Text(existing)) => existing.push_str(text),
            _ => parent.children.push(Node::Text(text.to_string())),
        }
    }
}

/// Drops whitespace-only text between child elements; output is re-indented.
/// A leaf keeps its text even when it is only whitespace.
fn strip_formatting(mut element: Element) -> Element {
    let has_elements = element
        .children
        .iter()
        .any(|child| matches!(child, Node::Element(_)));
    if has_elements {
        strip_whitespace_text(&mut element.children);
    }
    element
}

fn strip_whitespace_text(children: &mut Vec<Node>) {
    children.retain(|child| match child {
        Node::Text(text) => !text.trim().is_empty(),
        Node::Element(_) => true,
    });
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.push_child(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(EtlError::document("multiple root elements")),
    }
    Ok(())
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

#[derive(Default)]
struct NamespaceScopes {
    frames: Vec<Vec<(Option<String>, String)>>,
}

impl NamespaceScopes {
    /// Reads an opening tag, pushing its namespace declarations as a new scope.
    fn open(&mut self, start: &BytesStart) -> Result<Element> {
        let name = decode_name(start.name().as_ref())?;
        let mut element = Element::new(name, None);
        let mut frame = Vec::new();

        for attr in start.attributes() {
            let attr = attr.map_err(xml_error)?;
            let key = decode_name(attr.key.as_ref())?;
            let value = attr.unescape_value().map_err(xml_error)?.into_owned();
            if key == "xmlns" {
                frame.push((None, value.clone()));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                frame.push((Some(prefix.to_string()), value.clone()));
            }
            element.attributes.push((key, value));
        }

        self.frames.push(frame);
        element.namespace = self.resolve(element.prefix())?;
        Ok(element)
    }

    fn close(&mut self) {
        self.frames.pop();
    }

    fn resolve(&self, prefix: Option<&str>) -> Result<Option<String>> {
        if prefix == Some("xml") {
            return Ok(Some(XML_NS.to_string()));
        }
        let bound = self
            .frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter())
            .find(|(candidate, _)| candidate.as_deref() == prefix)
            .map(|(_, uri)| uri.clone());

        match (prefix, bound) {
            (_, Some(uri)) if uri.is_empty() => Ok(None),
            (_, Some(uri)) => Ok(Some(uri)),
            (None, None) => Ok(None),
            (Some(prefix), None) => Err(EtlError::document(format!(
                "undeclared namespace prefix '{}'",
                prefix
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORE: &str = "urn:core";

    #[test]
    fn test_parse_resolves_default_and_prefixed_namespaces() {
        let xml = r#"<?xml version="1.0"?>
<enfinity xmlns="urn:core" xmlns:dt="urn:dt" major="6">
  <customer id="1">
    <dt:note>hi</dt:note>
  </customer>
</enfinity>"#;

        let doc = Document::parse(xml).unwrap();
        assert!(doc.root.is(CORE, "enfinity"));
        assert_eq!(doc.root.attribute("major"), Some("6"));

        let customer = doc.root.child(CORE, "customer").unwrap();
        assert_eq!(customer.attribute("id"), Some("1"));
        let note = customer.elements().next().unwrap();
        assert_eq!(note.local_name(), "note");
        assert_eq!(note.namespace.as_deref(), Some("urn:dt"));
        assert_eq!(note.text(), Some("hi"));
    }

    #[test]
    fn test_undeclared_prefix_is_rejected() {
        let err = Document::parse("<a><x:b/></a>").unwrap_err();
        assert!(err.to_string().contains("undeclared namespace prefix 'x'"));
    }

    #[test]
    fn test_unbalanced_document_is_rejected() {
        assert!(Document::parse("<a><b></b>").is_err());
        assert!(Document::parse("").is_err());
    }

    #[test]
    fn test_serialization_escapes_and_reparses() {
        let mut root = Element::new("root", Some(CORE.to_string()));
        root.set_attribute("xmlns", CORE);
        let mut child = root.new_child("name");
        child.set_text("Bil & Deler <AS>");
        root.push_child(child);

        let bytes = Document::new(root.clone()).to_xml().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains("Bil &amp; Deler &lt;AS&gt;"));

        let reparsed = Document::from_bytes(&bytes).unwrap();
        assert_eq!(reparsed.root, root);
    }

    #[test]
    fn test_whitespace_only_leaf_text_survives() {
        let xml = "<r xmlns=\"urn:x\">\n  <line2> </line2>\n  <v>&#10;</v>\n</r>";
        let document = Document::parse(xml).unwrap();

        // 兄弟元素之間的排版空白不保留
        assert_eq!(document.root.children.len(), 2);
        assert_eq!(document.root.text(), None);

        let reparsed = Document::from_bytes(&document.to_xml().unwrap()).unwrap();
        assert_eq!(reparsed.root.child("urn:x", "line2").unwrap().text(), Some(" "));
        assert_eq!(reparsed.root.child("urn:x", "v").unwrap().text(), Some("\n"));
        assert_eq!(reparsed, document);
    }

    #[test]
    fn test_child_replaces_formatting_whitespace() {
        let mut document = Document::parse("<r xmlns=\"urn:x\"><groups>\n  </groups></r>").unwrap();
        let groups = document.root.elements_mut().next().unwrap();
        assert_eq!(groups.text(), Some("\n  "));

        let group = groups.new_child("group");
        groups.push_child(group);
        assert_eq!(groups.children.len(), 1);
        assert_eq!(groups.text(), None);
    }

    #[test]
    fn test_retain_and_descendant_helpers() {
        let xml = r#"<r xmlns="urn:core"><a><u id="1"><u id="nested"/></u></a><u id="2"/><k/><k/></r>"#;
        let mut doc = Document::parse(xml).unwrap();

        let mut seen = Vec::new();
        doc.root.for_each_descendant_mut(CORE, "u", &mut |u| {
            seen.push(u.attribute("id").unwrap_or_default().to_string())
        });
        assert_eq!(seen, vec!["1", "2"]);

        let removed = doc.root.retain_elements(|e| !e.is(CORE, "k"));
        assert_eq!(removed, 2);

        let found = doc
            .root
            .find_descendant(&|e| e.attribute("id") == Some("nested"))
            .unwrap();
        assert_eq!(found.local_name(), "u");
    }

    #[test]
    fn test_attribute_ns_uses_declared_prefix() {
        let xml = r#"<r xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="urn:core core.xsd"/>"#;
        let doc = Document::parse(xml).unwrap();
        assert_eq!(
            doc.root.attribute_ns(XSI_NS, "schemaLocation"),
            Some(("xsi:schemaLocation", "urn:core core.xsd"))
        );
        assert_eq!(doc.root.prefix_for_namespace(XSI_NS), Some(Some("xsi")));
    }
}
