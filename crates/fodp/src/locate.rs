//! Locating the slide pages in a parsed document.
//!
//! Producers nest `draw:page` differently, so the decoder tries an ordered
//! list of named strategies and takes the first that matches.

use crate::tree::XmlNode;

const PAGE: &str = "draw:page";

/// Pages found by a strategy, plus the node that contains them.
#[derive(Debug)]
pub struct PageMatch<'a> {
    pub container: &'a XmlNode,
    pub pages: Vec<&'a XmlNode>,
}

impl<'a> PageMatch<'a> {
    fn from_container(container: &'a XmlNode) -> Option<Self> {
        let pages: Vec<_> = container.children_named(PAGE).collect();
        if pages.is_empty() {
            None
        } else {
            Some(Self { container, pages })
        }
    }
}

/// A named way of finding the pages.
pub struct Strategy {
    pub name: &'static str,
    pub locate: for<'a> fn(&'a XmlNode) -> Option<PageMatch<'a>>,
}

/// Strategies in priority order.
pub const STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "office-document",
        locate: office_document,
    },
    Strategy {
        name: "document-content",
        locate: document_content,
    },
    Strategy {
        name: "deep-search",
        locate: deep_search,
    },
];

/// Run the strategies in order. Returns the winning strategy's name too.
pub fn locate_pages(root: &XmlNode) -> Option<(&'static str, PageMatch<'_>)> {
    STRATEGIES
        .iter()
        .find_map(|strategy| (strategy.locate)(root).map(|found| (strategy.name, found)))
}

/// Flat single-file document: `office:document/office:body/office:presentation`.
fn office_document(root: &XmlNode) -> Option<PageMatch<'_>> {
    nested_under(root, "office:document")
}

/// Content part of a packaged document:
/// `office:document-content/office:body/office:presentation`.
fn document_content(root: &XmlNode) -> Option<PageMatch<'_>> {
    nested_under(root, "office:document-content")
}

fn nested_under<'a>(root: &'a XmlNode, root_name: &str) -> Option<PageMatch<'a>> {
    if !root.is(root_name) {
        return None;
    }
    let presentation = root.path(&["office:body", "office:presentation"])?;
    PageMatch::from_container(presentation)
}

/// Anywhere in the tree. A node with pages of its own stops the search
/// before any of its children are visited; otherwise children are searched
/// in document order and the first subtree with a match wins.
fn deep_search(node: &XmlNode) -> Option<PageMatch<'_>> {
    PageMatch::from_container(node).or_else(|| node.elements().find_map(deep_search))
}
