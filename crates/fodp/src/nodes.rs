//! Typed views over the page-level constructs of a flat presentation.

use crate::tree::XmlNode;

/// Geometric primitives drawn directly on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlainShape {
    Rect,
    Ellipse,
    Circle,
    RegularPolygon,
    Polygon,
    Path,
    Line,
}

impl PlainShape {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "draw:rect" => Some(Self::Rect),
            "draw:ellipse" => Some(Self::Ellipse),
            "draw:circle" => Some(Self::Circle),
            "draw:regular-polygon" => Some(Self::RegularPolygon),
            "draw:polygon" => Some(Self::Polygon),
            "draw:path" => Some(Self::Path),
            "draw:line" => Some(Self::Line),
            _ => None,
        }
    }

    /// Shape type recorded in the document model.
    pub fn shape_type(&self, node: &XmlNode) -> &'static str {
        match self {
            Self::Rect => "rectangle",
            Self::Ellipse => "ellipse",
            Self::Circle => "circle",
            Self::RegularPolygon => match node.attr("draw:corners").map(str::trim) {
                Some("3") => "triangle",
                _ => "polygon",
            },
            Self::Polygon => "polygon",
            Self::Path => "path",
            Self::Line => "line",
        }
    }
}

/// A direct child of a `draw:page`.
#[derive(Debug, Clone, Copy)]
pub enum PageChild<'a> {
    Frame(&'a XmlNode),
    Shape(PlainShape, &'a XmlNode),
    CustomShape(&'a XmlNode),
    Group(&'a XmlNode),
    Notes(&'a XmlNode),
    Style(&'a XmlNode),
    Other(&'a XmlNode),
}

impl<'a> PageChild<'a> {
    pub fn classify(node: &'a XmlNode) -> Self {
        if let Some(shape) = PlainShape::from_name(&node.name) {
            return Self::Shape(shape, node);
        }
        match node.name.as_str() {
            "draw:frame" => Self::Frame(node),
            "draw:custom-shape" => Self::CustomShape(node),
            "draw:g" => Self::Group(node),
            "presentation:notes" => Self::Notes(node),
            "style:style" => Self::Style(node),
            _ => Self::Other(node),
        }
    }

    /// Children of a page, classified, in document order.
    pub fn of_page(page: &'a XmlNode) -> impl Iterator<Item = PageChild<'a>> + 'a {
        page.elements().map(PageChild::classify)
    }
}

/// What a `draw:frame` holds.
#[derive(Debug, Clone, Copy)]
pub enum FrameContent<'a> {
    TextBox(&'a XmlNode),
    Image(&'a XmlNode),
    Empty,
}

impl<'a> FrameContent<'a> {
    /// The first recognized content child wins.
    pub fn of(frame: &'a XmlNode) -> Self {
        for child in frame.elements() {
            match child.name.as_str() {
                "draw:text-box" => return Self::TextBox(child),
                "draw:image" => return Self::Image(child),
                _ => {}
            }
        }
        Self::Empty
    }
}

/// Whether a frame is the page's title placeholder.
pub fn is_title_placeholder(frame: &XmlNode) -> bool {
    frame.attr("presentation:class") == Some("title")
}
