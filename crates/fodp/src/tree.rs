//! Generic XML element tree built from quick-xml events.
//!
//! Every element keeps its children as an ordered list, so constructs the
//! format allows either once or many times (pages, frames, custom shapes,
//! paragraphs, spans) are always read as sequences, and document order (the
//! paint order of a slide) is preserved.

use deck_core::{Error, LogConfig, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// An XML element with its attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlNode {
    /// Qualified name, e.g. `draw:frame`.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlChild>,
}

/// A child of an element: a nested element or a run of character data.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlChild {
    Element(XmlNode),
    Text(String),
}

/// Inline elements whose whitespace-only character data is significant.
const WHITESPACE_PRESERVING: &[&str] = &["text:span", "text:a"];

/// Paragraph elements keep whitespace-only runs unless they span a line
/// break, which only pretty-printing produces.
const PARAGRAPHS: &[&str] = &["text:p", "text:h"];

/// Deepest element nesting kept in the tree. Tree walks recurse, so anything
/// below this depth is dropped while parsing.
pub const MAX_DEPTH: usize = 512;

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    fn from_start(e: &BytesStart<'_>, log: &LogConfig) -> Self {
        let mut node = Self::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
        for attr in e.attributes() {
            match attr {
                Ok(attr) => {
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = match attr.unescape_value() {
                        Ok(v) => v.into_owned(),
                        Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
                    };
                    node.attributes.push((key, value));
                }
                Err(e) => {
                    log.warn(format_args!("Skipping malformed attribute on <{}>: {}", node.name, e));
                }
            }
        }
        node
    }

    /// The element name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Whether this element has the given qualified name.
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Attribute value by qualified name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First non-empty value among several attribute names.
    pub fn first_attr(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|name| self.attr(name))
            .map(str::trim)
            .find(|v| !v.is_empty())
    }

    /// Child elements, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlNode> {
        self.children.iter().filter_map(|child| match child {
            XmlChild::Element(node) => Some(node),
            XmlChild::Text(_) => None,
        })
    }

    /// Child elements with the given qualified name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.elements().filter(move |node| node.is(name))
    }

    /// First child element with the given qualified name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.elements().find(|node| node.is(name))
    }

    /// Follow a chain of child names.
    pub fn path(&self, names: &[&str]) -> Option<&XmlNode> {
        names.iter().try_fold(self, |node, name| node.child(name))
    }

    /// First descendant (depth-first, document order) with the given name.
    pub fn descendant(&self, name: &str) -> Option<&XmlNode> {
        for child in self.elements() {
            if child.is(name) {
                return Some(child);
            }
            if let Some(found) = child.descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with the given name, depth-first in document order.
    pub fn descendants<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlNode>) {
        for child in self.elements() {
            if child.is(name) {
                out.push(child);
            }
            child.descendants(name, out);
        }
    }

    /// Concatenation of all character data below this element.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlChild::Text(text) => out.push_str(text),
                XmlChild::Element(node) => node.collect_text(out),
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if text.trim().is_empty() {
            let name = self.name.as_str();
            let keep = WHITESPACE_PRESERVING.contains(&name)
                || (PARAGRAPHS.contains(&name) && !text.contains('\n'));
            if !keep {
                return;
            }
        }
        match self.children.last_mut() {
            Some(XmlChild::Text(existing)) => existing.push_str(text),
            _ => self.children.push(XmlChild::Text(text.to_string())),
        }
    }
}

/// Extract the local name from a potentially namespaced XML element name.
pub fn local_name(name: &str) -> &str {
    match name.split_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

/// Parse XML text into an element tree.
///
/// A document without any root element is an [`Error::XmlStructureInvalid`].
/// A syntax error after the root has opened ends parsing; the elements read
/// so far are kept and a warning is logged. Elements nested deeper than
/// [`MAX_DEPTH`] are skipped together with their content.
pub fn parse(xml: &str, log: &LogConfig) -> Result<XmlNode> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;
    // Open elements inside a subtree that is being skipped.
    let mut skipped = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if skipped > 0 || stack.len() >= MAX_DEPTH {
                    if skipped == 0 {
                        log.warn(format_args!(
                            "Skipping <{}> nested deeper than {} elements",
                            String::from_utf8_lossy(e.name().as_ref()),
                            MAX_DEPTH
                        ));
                    }
                    skipped += 1;
                } else {
                    stack.push(XmlNode::from_start(e, log));
                }
            }
            Ok(Event::Empty(ref e)) => {
                if skipped == 0 && stack.len() < MAX_DEPTH {
                    let node = XmlNode::from_start(e, log);
                    attach(&mut stack, &mut root, node);
                }
            }
            Ok(Event::End(_)) => {
                if skipped > 0 {
                    skipped -= 1;
                } else if let Some(node) = stack.pop() {
                    attach(&mut stack, &mut root, node);
                }
            }
            Ok(Event::Text(ref e)) if skipped == 0 => {
                if let Some(parent) = stack.last_mut() {
                    match e.unescape() {
                        Ok(text) => parent.push_text(&text),
                        Err(err) => {
                            log.warn(format_args!("Keeping undecodable text in <{}>: {}", parent.name, err));
                            parent.push_text(&String::from_utf8_lossy(e));
                        }
                    }
                }
            }
            Ok(Event::CData(e)) if skipped == 0 => {
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                if root.is_none() && stack.is_empty() {
                    return Err(Error::XmlStructureInvalid(format!(
                        "XML error before the document root at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                log.warn(format_args!(
                    "XML parsing error at position {} (keeping partial tree): {}",
                    reader.buffer_position(),
                    e
                ));
                break;
            }
            _ => {}
        }
    }

    // Close anything left open by a truncated document.
    while let Some(node) = stack.pop() {
        attach(&mut stack, &mut root, node);
    }

    root.ok_or_else(|| Error::XmlStructureInvalid("document has no root element".to_string()))
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlChild::Element(node));
    } else if root.is_none() {
        *root = Some(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(xml: &str) -> XmlNode {
        parse(xml, &LogConfig::silent()).unwrap()
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("draw:frame"), "frame");
        assert_eq!(local_name("frame"), "frame");
    }

    #[test]
    fn test_single_child_is_still_a_sequence() {
        let root = parse_ok(r#"<a:root><draw:page draw:name="one"/></a:root>"#);
        let pages: Vec<_> = root.children_named("draw:page").collect();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].attr("draw:name"), Some("one"));
    }

    #[test]
    fn test_document_order_is_kept() {
        let root = parse_ok("<p><b/><a/><b/></p>");
        let names: Vec<_> = root.elements().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "b"]);
    }

    #[test]
    fn test_entities_are_unescaped() {
        let root = parse_ok(r#"<t x="a &amp; b">1 &lt; 2 &#233;</t>"#);
        assert_eq!(root.attr("x"), Some("a & b"));
        assert_eq!(root.text(), "1 < 2 é");
    }

    #[test]
    fn test_formatting_whitespace_is_dropped() {
        let root = parse_ok("<text:p>\n  <text:span> </text:span>\n</text:p>");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.text(), " ");

        let root = parse_ok("<text:p><text:span>a</text:span> <text:span>b</text:span></text:p>");
        assert_eq!(root.text(), "a b");
    }

    #[test]
    fn test_no_root_is_invalid() {
        let err = parse("", &LogConfig::silent()).unwrap_err();
        assert!(matches!(err, Error::XmlStructureInvalid(_)));

        let err = parse("<?xml version=\"1.0\"?>\n<!-- nothing -->", &LogConfig::silent()).unwrap_err();
        assert!(matches!(err, Error::XmlStructureInvalid(_)));
    }

    #[test]
    fn test_truncated_document_keeps_partial_tree() {
        let root = parse_ok("<doc><page><frame/>");
        assert_eq!(root.name, "doc");
        assert!(root.path(&["page", "frame"]).is_some());
    }

    #[test]
    fn test_path_and_descendant() {
        let root = parse_ok("<a><b><c id=\"1\"/></b><c id=\"2\"/></a>");
        assert_eq!(root.path(&["b", "c"]).and_then(|c| c.attr("id")), Some("1"));
        assert_eq!(root.descendant("c").and_then(|c| c.attr("id")), Some("1"));
        let mut all = Vec::new();
        root.descendants("c", &mut all);
        assert_eq!(all.len(), 2);
        assert!(root.path(&["x"]).is_none());
    }

    fn depth(root: &XmlNode) -> usize {
        let mut depth = 1;
        let mut node = root;
        while let Some(child) = node.elements().next() {
            depth += 1;
            node = child;
        }
        depth
    }

    #[test]
    fn test_deep_nesting_is_cut_at_max_depth() {
        let levels = 20_000;
        let xml = format!(
            "<root>{}<leaf/>{}<after/></root>",
            "<a>".repeat(levels),
            "</a>".repeat(levels)
        );
        let root = parse_ok(&xml);

        assert_eq!(depth(&root), MAX_DEPTH);
        let names: Vec<_> = root.elements().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["a", "after"]);
        assert!(root.descendant("leaf").is_none());
    }

    #[test]
    fn test_nesting_at_max_depth_is_kept() {
        let xml = format!(
            "<root>{}<leaf/>{}</root>",
            "<a>".repeat(MAX_DEPTH - 2),
            "</a>".repeat(MAX_DEPTH - 2)
        );
        let root = parse_ok(&xml);
        assert!(root.descendant("leaf").is_some());
        assert_eq!(depth(&root), MAX_DEPTH);
    }
}
