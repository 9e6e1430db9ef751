//! Flat XML to document model.

use crate::locate::locate_pages;
use crate::nodes::{is_title_placeholder, FrameContent, PageChild};
use crate::styles::StyleIndex;
use crate::tree::{self, XmlChild, XmlNode};
use deck_core::types::DEFAULT_TITLE;
use deck_core::units::{parse_leading_number, to_pixels};
use deck_core::{
    Background, ElementFrame, Error, ImageElement, LogConfig, Presentation, Result, ShapeElement,
    Slide, SlideElement, SlideSize, TextElement,
};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::io::Read;
use std::sync::LazyLock;

/// Title of the slide substituted when a document has no pages at all.
pub const MISSING_SLIDES_TITLE: &str = "Slide not found";

/// Longest run of spaces a single `text:s` expands to.
pub const MAX_SPACE_RUN: usize = 1024;

/// Style name the encoder gives its full-bleed background rectangle.
pub(crate) const BACKGROUND_STYLE: &str = "background";

static ROTATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rotate\s*\(\s*([^\s)]+)\s*\)").unwrap());

static TRANSLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"translate\s*\(\s*([^\s,)]+)(?:\s*,?\s*([^\s,)]+))?\s*\)").unwrap()
});

/// Decoder for flat OpenDocument presentations.
#[derive(Debug, Clone, Default)]
pub struct FodpDecoder {
    log: LogConfig,
}

impl FodpDecoder {
    pub fn new(log: LogConfig) -> Self {
        Self { log }
    }

    /// Decode a flat XML document read from `reader`.
    pub fn decode_reader<R: Read>(&self, mut reader: R) -> Result<Presentation> {
        let mut xml = String::new();
        reader.read_to_string(&mut xml)?;
        self.decode(&xml)
    }

    /// Decode flat XML text.
    ///
    /// Only a document without a recognizable root element is an error; every
    /// other defect is logged and decoded as a missing or defaulted value.
    pub fn decode(&self, xml: &str) -> Result<Presentation> {
        let root = tree::parse(xml, &self.log)?;
        if !tree::local_name(&root.name).starts_with("document") {
            return Err(Error::XmlStructureInvalid(format!(
                "unexpected root element <{}>",
                root.name
            )));
        }

        let styles = StyleIndex::build(&root);
        self.log.debug(format_args!("Indexed {} named styles", styles.len()));

        let meta = root.child("office:meta").or_else(|| root.descendant("office:meta"));
        let located = locate_pages(&root);

        let title = meta
            .and_then(|m| child_text(m, "dc:title"))
            .or_else(|| {
                located
                    .as_ref()
                    .and_then(|(_, found)| found.container.first_attr(&["draw:name"]))
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let mut presentation = Presentation::new(title);
        if let Some(meta) = meta {
            presentation.author =
                child_text(meta, "dc:creator").or_else(|| child_text(meta, "meta:initial-creator"));
            presentation.creation_date = child_text(meta, "meta:creation-date");
            let metadata = read_metadata(meta);
            if !metadata.is_empty() {
                presentation.metadata = Some(metadata);
            }
        }
        presentation.size = page_size(&root);

        match located {
            Some((strategy, found)) => {
                self.log.debug(format_args!(
                    "Found {} pages using the {} strategy",
                    found.pages.len(),
                    strategy
                ));
                let mut slide_ids = IdAllocator::default();
                for (index, page) in found.pages.iter().enumerate() {
                    let slide = self.decode_slide(page, index, &styles, &mut slide_ids);
                    presentation.add_slide(slide);
                }
            }
            None => {
                self.log.warn(format_args!(
                    "No slide pages found in <{}>; substituting a placeholder slide",
                    root.name
                ));
                let mut placeholder = Slide::new("slide-1");
                placeholder.title = Some(MISSING_SLIDES_TITLE.to_string());
                presentation.add_slide(placeholder);
            }
        }

        self.log.info(format_args!(
            "Decoded \"{}\": {} slides, {} elements",
            presentation.title,
            presentation.slides.len(),
            presentation.element_count()
        ));
        Ok(presentation)
    }

    fn decode_slide(
        &self,
        page: &XmlNode,
        index: usize,
        styles: &StyleIndex,
        slide_ids: &mut IdAllocator,
    ) -> Slide {
        let id = slide_ids.claim(
            page.first_attr(&["draw:id", "xml:id", "draw:name"]),
            || format!("slide-{}", index + 1),
        );
        let mut slide = Slide::new(id);

        slide.title = page
            .first_attr(&["draw:name"])
            .map(str::to_string)
            .or_else(|| {
                page.children_named("draw:frame")
                    .find(|frame| is_title_placeholder(frame))
                    .and_then(|frame| joined_paragraphs(frame, &self.log))
            });

        let mut background = Background {
            color: page
                .first_attr(&["draw:style-name"])
                .and_then(|name| styles.fill_color(name)),
            ..Background::default()
        };

        let mut element_ids = IdAllocator::default();
        for child in PageChild::of_page(page) {
            let (node, element) = match child {
                PageChild::Frame(node) => (node, self.decode_frame(node, styles)),
                PageChild::Shape(_, node) if is_background_rect(node) => {
                    if let Some(color) = node
                        .descendant("draw:fill-color")
                        .and_then(|fill| fill.first_attr(&["svg:color"]))
                    {
                        background.color = Some(color.to_string());
                    }
                    continue;
                }
                PageChild::Shape(kind, node) => {
                    let shape_type = node
                        .first_attr(&["draw:shape-type"])
                        .unwrap_or_else(|| kind.shape_type(node));
                    (node, self.decode_shape(node, shape_type, None, styles))
                }
                PageChild::CustomShape(node) => (node, self.decode_custom_shape(node, styles)),
                PageChild::Group(node) => {
                    match node
                        .child("draw:image")
                        .and_then(|image| image.first_attr(&["xlink:href"]))
                    {
                        Some(href) => {
                            background.is_base64 = deck_core::types::is_data_uri(href);
                            background.image = Some(href.to_string());
                        }
                        None => self.log.debug(format_args!(
                            "Skipping group without a background image on slide {}",
                            slide.id
                        )),
                    }
                    continue;
                }
                PageChild::Notes(node) => {
                    slide.notes = joined_paragraphs(node, &self.log);
                    continue;
                }
                PageChild::Style(_) => continue,
                PageChild::Other(node) => {
                    self.log.debug(format_args!(
                        "Ignoring <{}> on slide {}",
                        node.name, slide.id
                    ));
                    continue;
                }
            };
            self.push_element(&mut slide, &mut element_ids, node, element);
        }

        if !background.is_empty() {
            slide.background = Some(background);
        }

        self.log.trace(format_args!(
            "Slide {} has {} elements",
            slide.id,
            slide.elements.len()
        ));
        slide
    }

    fn push_element(
        &self,
        slide: &mut Slide,
        ids: &mut IdAllocator,
        node: &XmlNode,
        mut element: SlideElement,
    ) {
        let index = slide.elements.len();
        let kind = element.kind_name();
        element.frame_mut().id = ids.claim(
            node.first_attr(&["xml:id", "draw:id", "draw:name"]),
            || format!("{}-{}", kind, index),
        );
        slide.add_element(element);
    }

    fn decode_frame(&self, frame: &XmlNode, styles: &StyleIndex) -> SlideElement {
        let mut geometry = self.geometry(frame);
        let frame_styles = style_names(frame);

        match FrameContent::of(frame) {
            FrameContent::TextBox(text_box) => {
                let mut names = frame_styles;
                if let Some(paragraph) = text_box.descendant("text:p") {
                    names.extend(paragraph.first_attr(&["text:style-name"]));
                    if let Some(span) = paragraph.descendant("text:span") {
                        names.extend(span.first_attr(&["text:style-name"]));
                    }
                }
                geometry.style = styles.element_style(&names);

                SlideElement::Text(TextElement {
                    frame: geometry,
                    text: paragraphs(text_box, &self.log).join("\n"),
                    text_style: styles.text_style(&names),
                })
            }
            FrameContent::Image(image) => {
                geometry.style = styles.element_style(&frame_styles);
                let src = self.image_source(image).unwrap_or_else(|| {
                    self.log.warn(format_args!("Image without a source at ({}, {})", geometry.x, geometry.y));
                    String::new()
                });
                let mut element = ImageElement::new(geometry, src);
                element.alt = ["svg:title", "svg:desc"]
                    .iter()
                    .find_map(|name| child_text(frame, name).or_else(|| child_text(image, name)));
                SlideElement::Image(element)
            }
            FrameContent::Empty => {
                geometry.style = styles.element_style(&frame_styles);
                SlideElement::Unknown(geometry)
            }
        }
    }

    fn decode_custom_shape(&self, node: &XmlNode, styles: &StyleIndex) -> SlideElement {
        let geometry = node.child("draw:enhanced-geometry");
        let shape_type = node
            .first_attr(&["draw:shape-type"])
            .or_else(|| geometry.and_then(|g| g.first_attr(&["draw:type"])))
            .unwrap_or("rectangle");
        let path = geometry
            .and_then(|g| g.first_attr(&["draw:enhanced-path"]))
            .map(str::to_string);
        self.decode_shape(node, shape_type, path, styles)
    }

    fn decode_shape(
        &self,
        node: &XmlNode,
        shape_type: &str,
        path: Option<String>,
        styles: &StyleIndex,
    ) -> SlideElement {
        let mut frame = self.geometry(node);
        frame.style = styles.element_style(&style_names(node));
        SlideElement::Shape(ShapeElement {
            frame,
            shape_type: shape_type.to_string(),
            path,
            text: joined_paragraphs(node, &self.log),
        })
    }

    /// Position and size in pixels, plus rotation from `draw:transform`.
    fn geometry(&self, node: &XmlNode) -> ElementFrame {
        let length = |name: &str| to_pixels(node.attr(name)).max(0.0);
        let mut frame = ElementFrame::new(
            String::new(),
            length("svg:x"),
            length("svg:y"),
            length("svg:width"),
            length("svg:height"),
        );

        if let Some(transform) = node.first_attr(&["draw:transform"]) {
            match parse_transform(transform) {
                Some(parsed) => {
                    frame.rotation = parsed.rotation;
                    if let (Some((x, y)), None, None) =
                        (parsed.translate, node.attr("svg:x"), node.attr("svg:y"))
                    {
                        frame.x = x.max(0.0);
                        frame.y = y.max(0.0);
                    }
                }
                None => self.log.warn(format_args!(
                    "Ignoring unreadable draw:transform \"{}\" on <{}>",
                    transform, node.name
                )),
            }
        }
        frame
    }

    fn image_source(&self, image: &XmlNode) -> Option<String> {
        if let Some(href) = image.first_attr(&["xlink:href"]) {
            return Some(href.to_string());
        }
        let data: String = image
            .child("office:binary-data")?
            .text()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if data.is_empty() {
            return None;
        }
        Some(format!("data:{};base64,{}", sniff_mime(&data), data))
    }
}

/// Parsed `draw:transform`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Transform {
    /// Clockwise degrees.
    rotation: Option<f64>,
    /// Pixels.
    translate: Option<(f64, f64)>,
}

fn parse_transform(value: &str) -> Option<Transform> {
    // The document rotates counter-clockwise in radians.
    let rotation = ROTATE_REGEX
        .captures(value)
        .and_then(|caps| parse_leading_number(&caps[1]))
        .map(|radians| -radians.to_degrees())
        .filter(|degrees| *degrees != 0.0);

    let translate = TRANSLATE_REGEX.captures(value).map(|caps| {
        let x = to_pixels(caps.get(1).map(|m| m.as_str()));
        let y = to_pixels(caps.get(2).map(|m| m.as_str()));
        (x, y)
    });

    if rotation.is_none() && translate.is_none() && !ROTATE_REGEX.is_match(value) {
        return None;
    }
    Some(Transform { rotation, translate })
}

fn is_background_rect(node: &XmlNode) -> bool {
    node.attr("draw:style-name") == Some(BACKGROUND_STYLE)
}

fn style_names(node: &XmlNode) -> Vec<&str> {
    ["presentation:style-name", "draw:style-name"]
        .iter()
        .filter_map(|name| node.first_attr(&[*name]))
        .collect()
}

/// Trimmed text of the first child with the given name, if non-empty.
fn child_text(node: &XmlNode, name: &str) -> Option<String> {
    let text = node.child(name)?.text();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Text of every paragraph below `node`, in document order.
fn paragraphs(node: &XmlNode, log: &LogConfig) -> Vec<String> {
    let mut out = Vec::new();
    collect_paragraphs(node, log, &mut out);
    out
}

fn joined_paragraphs(node: &XmlNode, log: &LogConfig) -> Option<String> {
    let text = paragraphs(node, log).join("\n");
    (!text.trim().is_empty()).then_some(text)
}

fn collect_paragraphs(node: &XmlNode, log: &LogConfig, out: &mut Vec<String>) {
    for child in node.elements() {
        if child.is("text:p") || child.is("text:h") {
            let mut text = String::new();
            inline_text(child, log, &mut text);
            out.push(text);
        } else {
            collect_paragraphs(child, log, out);
        }
    }
}

fn inline_text(node: &XmlNode, log: &LogConfig, out: &mut String) {
    for child in &node.children {
        match child {
            XmlChild::Text(text) => out.push_str(text),
            XmlChild::Element(element) => match element.name.as_str() {
                "text:s" => {
                    out.extend(std::iter::repeat(' ').take(space_count(element, log)));
                }
                "text:tab" => out.push('\t'),
                "text:line-break" => out.push('\n'),
                "office:annotation" | "text:note" => {}
                _ => inline_text(element, log, out),
            },
        }
    }
}

/// Number of spaces a `text:s` stands for, capped at [`MAX_SPACE_RUN`].
fn space_count(node: &XmlNode, log: &LogConfig) -> usize {
    let Some(raw) = node.attr("text:c").map(str::trim) else {
        return 1;
    };
    let oversized = match raw.parse::<u64>() {
        Ok(count) => count > MAX_SPACE_RUN as u64,
        // Too many digits for u64.
        Err(_) => !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()),
    };
    if oversized {
        log.warn(format_args!(
            "Clamping space run of {} to {}",
            raw, MAX_SPACE_RUN
        ));
        return MAX_SPACE_RUN;
    }
    raw.parse::<usize>().unwrap_or(1)
}

/// Every child of `office:meta`, keyed by qualified name.
fn read_metadata(meta: &XmlNode) -> Map<String, Value> {
    let mut metadata = Map::new();
    for child in meta.elements() {
        let key = match (child.is("meta:user-defined"), child.attr("meta:name")) {
            (true, Some(name)) => format!("meta:user-defined:{}", name),
            _ => child.name.clone(),
        };

        let text = child.text();
        let text = text.trim();
        let value = if !text.is_empty() || child.attributes.is_empty() {
            Value::String(text.to_string())
        } else {
            Value::Object(
                child
                    .attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            )
        };

        match metadata.get_mut(&key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                metadata.insert(key, value);
            }
        }
    }
    metadata
}

fn page_size(root: &XmlNode) -> Option<SlideSize> {
    let mut layouts = Vec::new();
    root.descendants("style:page-layout-properties", &mut layouts);
    layouts.into_iter().find_map(|props| {
        let width = props.first_attr(&["fo:page-width"])?;
        let height = props.first_attr(&["fo:page-height"])?;
        Some(SlideSize {
            width: to_pixels(Some(width)),
            height: to_pixels(Some(height)),
        })
    })
}

/// MIME type of base64 image data, from its leading signature.
fn sniff_mime(data: &str) -> &'static str {
    const SIGNATURES: &[(&str, &str)] = &[
        ("iVBORw0KGgo", "image/png"),
        ("/9j/", "image/jpeg"),
        ("R0lGOD", "image/gif"),
        ("Qk", "image/bmp"),
        ("UklGR", "image/webp"),
        ("PHN2Zy", "image/svg+xml"),
        ("PD94bWw", "image/svg+xml"),
    ];
    SIGNATURES
        .iter()
        .find(|(prefix, _)| data.starts_with(prefix))
        .map_or("application/octet-stream", |(_, mime)| *mime)
}

/// Hands out ids unique within one scope, suffixing repeats with `-2`, `-3`...
#[derive(Debug, Default)]
struct IdAllocator {
    used: HashSet<String>,
}

impl IdAllocator {
    fn claim(&mut self, preferred: Option<&str>, fallback: impl FnOnce() -> String) -> String {
        let base = preferred.map_or_else(fallback, str::to_string);
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
