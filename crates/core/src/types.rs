//! The canonical JSON document model.
//!
//! Positions live directly on each element (`x`, `y`, `width`, `height`, in
//! pixels). The editor's nested `position` schema is only spoken through
//! [`crate::adapter`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title used when a document does not provide one.
pub const DEFAULT_TITLE: &str = "Untitled Presentation";

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

/// An entire presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    /// Document title.
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Creation timestamp as found in the source document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,

    /// Open metadata mapping (qualified element name to value).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,

    /// Slide size in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SlideSize>,

    /// Slides in presentation order.
    #[serde(default)]
    pub slides: Vec<Slide>,
}

impl Presentation {
    /// Create an empty presentation with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: None,
            creation_date: None,
            metadata: None,
            theme: None,
            size: None,
            slides: Vec::new(),
        }
    }

    /// Add a slide to the presentation.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Total number of elements across all slides.
    pub fn element_count(&self) -> usize {
        self.slides.iter().map(|s| s.elements.len()).sum()
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE)
    }
}

/// Colour palette and fonts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fonts: Option<ThemeFonts>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeFonts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Slide dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlideSize {
    pub width: f64,
    pub height: f64,
}

/// A single slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    /// Unique within the presentation.
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Speaker notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,

    /// Elements in paint order (first is painted first).
    #[serde(default)]
    pub elements: Vec<SlideElement>,
}

impl Slide {
    /// Create a new slide with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            notes: None,
            background: None,
            elements: Vec::new(),
        }
    }

    /// Add an element on top of the existing ones.
    pub fn add_element(&mut self, element: SlideElement) {
        self.elements.push(element);
    }
}

/// Slide background.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_base64: bool,
}

impl Background {
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.image.is_none()
    }
}

/// Geometry and decoration shared by every element variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementFrame {
    /// Unique within the slide.
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,

    /// Clockwise rotation in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ElementStyle>,
}

impl ElementFrame {
    pub fn new(id: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
            rotation: None,
            style: None,
        }
    }
}

/// Open colour/border/opacity mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,

    /// Border width in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_style: Option<String>,

    /// 0.0 (transparent) to 1.0 (opaque).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,

    /// Any further keys, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ElementStyle {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A drawable item on a slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SlideElement {
    Text(TextElement),
    Image(ImageElement),
    Shape(ShapeElement),
    /// A source construct with no dedicated variant; only its geometry is kept.
    Unknown(ElementFrame),
}

impl SlideElement {
    /// The geometry shared by all variants.
    pub fn frame(&self) -> &ElementFrame {
        match self {
            Self::Text(e) => &e.frame,
            Self::Image(e) => &e.frame,
            Self::Shape(e) => &e.frame,
            Self::Unknown(frame) => frame,
        }
    }

    pub fn frame_mut(&mut self) -> &mut ElementFrame {
        match self {
            Self::Text(e) => &mut e.frame,
            Self::Image(e) => &mut e.frame,
            Self::Shape(e) => &mut e.frame,
            Self::Unknown(frame) => frame,
        }
    }

    pub fn id(&self) -> &str {
        &self.frame().id
    }

    /// The serialized `type` tag of this variant.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Shape(_) => "shape",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// A text box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    #[serde(flatten)]
    pub frame: ElementFrame,

    /// Paragraphs joined with `\n`.
    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_style: Option<TextStyle>,
}

/// Character and paragraph formatting of a text element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,

    /// Font size in points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_decoration: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<HorizontalAlign>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_alignment: Option<VerticalAlign>,

    /// Line height as a multiple of the font size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
}

impl TextStyle {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
    Justify,
}

impl HorizontalAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
}

impl VerticalAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Middle => "middle",
            Self::Bottom => "bottom",
        }
    }
}

/// An image, referenced by URI or embedded as a data URI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ImageElementRepr")]
pub struct ImageElement {
    #[serde(flatten)]
    pub frame: ElementFrame,

    #[serde(default)]
    pub src: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    /// True when `src` is a `data:` URI. Recomputed from `src` on deserialize.
    #[serde(default)]
    pub is_base64: bool,
}

/// Wire shape of [`ImageElement`]; an incoming `isBase64` is ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageElementRepr {
    #[serde(flatten)]
    frame: ElementFrame,

    #[serde(default)]
    src: String,

    #[serde(default)]
    alt: Option<String>,
}

impl From<ImageElementRepr> for ImageElement {
    fn from(repr: ImageElementRepr) -> Self {
        let mut image = ImageElement::new(repr.frame, repr.src);
        image.alt = repr.alt;
        image
    }
}

impl ImageElement {
    /// Create an image element, deriving `is_base64` from `src`.
    pub fn new(frame: ElementFrame, src: impl Into<String>) -> Self {
        let src = src.into();
        Self {
            frame,
            is_base64: is_data_uri(&src),
            src,
            alt: None,
        }
    }
}

/// Whether a reference is an inline `data:` URI.
pub fn is_data_uri(src: &str) -> bool {
    src.starts_with("data:")
}

/// A geometric shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeElement {
    #[serde(flatten)]
    pub frame: ElementFrame,

    /// Free-form shape type, e.g. `rectangle`, `ellipse`, `triangle`.
    #[serde(default)]
    pub shape_type: String,

    /// Geometry path, carried through opaquely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ShapeElement {
    pub fn kind(&self) -> ShapeKind {
        ShapeKind::from_type(&self.shape_type)
    }
}

/// The shape types the encoder draws natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Triangle,
}

impl ShapeKind {
    /// Resolve a free-form shape type; anything unrecognized is a rectangle.
    pub fn from_type(shape_type: &str) -> Self {
        match shape_type.trim().to_lowercase().as_str() {
            "ellipse" | "circle" => Self::Ellipse,
            "triangle" => Self::Triangle,
            _ => Self::Rectangle,
        }
    }
}
