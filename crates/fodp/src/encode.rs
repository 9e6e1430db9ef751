//! Document model to flat XML.
//!
//! Every element becomes one drawable node followed by its own named style
//! nodes. Style names carry the slide number and the element's index within
//! the slide (`ShapeBox2_0`), so they are unique across the document.

use crate::decode::BACKGROUND_STYLE;
use crate::template::{self, PAGE_HEIGHT, PAGE_WIDTH, SKELETON};
use deck_core::units::to_centimeters;
use deck_core::{
    ElementFrame, ElementStyle, ImageElement, LogConfig, Presentation, Result, ShapeElement,
    ShapeKind, Slide, SlideElement, TextElement,
};
use std::io::Write;

pub const DEFAULT_AUTHOR: &str = "Unknown";
pub const DEFAULT_BACKGROUND: &str = "#FFFFFF";
pub const DEFAULT_FONT: &str = "Arial";
pub const DEFAULT_FONT_SIZE: f64 = 18.0;
pub const DEFAULT_TEXT_COLOR: &str = "#000000";
pub const DEFAULT_SHAPE_FILL: &str = "#e6e6e6";
pub const DEFAULT_SHAPE_STROKE: &str = "#000000";
/// Shape border width in pixels when none is given.
pub const DEFAULT_STROKE_WIDTH: f64 = 1.0;

/// Escape the five XML metacharacters and drop characters XML 1.0 cannot
/// carry at all.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if is_xml_char(c) => out.push(c),
            _ => {}
        }
    }
    out
}

/// Escaped paragraph content with whitespace spelled out as `text:s` and
/// `text:tab`, since readers collapse literal runs of spaces and drop them
/// at either end of a paragraph.
fn paragraph_content(line: &str) -> String {
    let escaped = escape_xml(line);
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars().peekable();
    let mut at_start = true;
    while let Some(c) = chars.next() {
        match c {
            ' ' => {
                let mut run = 1;
                while chars.next_if_eq(&' ').is_some() {
                    run += 1;
                }
                let at_end = chars.peek().is_none();
                let mut literal = 0;
                if !at_start && !at_end {
                    out.push(' ');
                    literal = 1;
                }
                match run - literal {
                    0 => {}
                    1 => out.push_str("<text:s/>"),
                    n => out.push_str(&format!("<text:s text:c=\"{}\"/>", n)),
                }
            }
            '\t' => out.push_str("<text:tab/>"),
            c => out.push(c),
        }
        at_start = false;
    }
    out
}

/// [`escape_xml`] for attribute values, where raw line breaks and tabs
/// would be normalized to spaces by the reader.
fn escape_attr(text: &str) -> String {
    escape_xml(text)
        .replace('\t', "&#9;")
        .replace('\n', "&#10;")
        .replace('\r', "&#13;")
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r')
        || ('\u{20}'..='\u{D7FF}').contains(&c)
        || ('\u{E000}'..='\u{FFFD}').contains(&c)
        || c >= '\u{10000}'
}

/// Encoder for flat OpenDocument presentations.
#[derive(Debug, Clone, Default)]
pub struct FodpEncoder {
    log: LogConfig,
}

impl FodpEncoder {
    pub fn new(log: LogConfig) -> Self {
        Self { log }
    }

    /// Write the encoded document to `writer`.
    pub fn encode_to_writer<W: Write>(&self, presentation: &Presentation, mut writer: W) -> Result<()> {
        writer.write_all(self.encode(presentation).as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Encode a presentation as a complete flat XML document.
    pub fn encode(&self, presentation: &Presentation) -> String {
        let font = presentation
            .theme
            .as_ref()
            .and_then(|theme| theme.fonts.as_ref())
            .and_then(|fonts| fonts.body.as_deref())
            .unwrap_or(DEFAULT_FONT);

        let mut slides = String::new();
        for (index, slide) in presentation.slides.iter().enumerate() {
            self.encode_slide(slide, index + 1, font, &mut slides);
        }

        let author = presentation
            .author
            .as_deref()
            .or_else(|| metadata_str(presentation, "author"))
            .unwrap_or(DEFAULT_AUTHOR);
        let creation_date = presentation
            .creation_date
            .clone()
            .or_else(|| metadata_str(presentation, "created").map(str::to_string))
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());

        let title = escape_xml(&presentation.title);
        let creation_date = escape_xml(&creation_date);
        let author = escape_xml(author);
        let document = template::fill(
            SKELETON,
            &[
                (template::TITLE, title.as_str()),
                (template::CREATION_DATE, creation_date.as_str()),
                (template::AUTHOR, author.as_str()),
                (template::SLIDES, slides.as_str()),
            ],
        );

        self.log.info(format_args!(
            "Encoded \"{}\": {} slides, {} elements",
            presentation.title,
            presentation.slides.len(),
            presentation.element_count()
        ));
        document
    }

    fn encode_slide(&self, slide: &Slide, number: usize, font: &str, out: &mut String) {
        let id = if slide.id.is_empty() {
            format!("slide-{}", number)
        } else {
            slide.id.clone()
        };
        let title = slide
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("Slide {}", number));
        let background = slide.background.as_ref();
        let color = background
            .and_then(|b| b.color.as_deref())
            .unwrap_or(DEFAULT_BACKGROUND);

        out.push_str(&format!(
            "      <draw:page draw:name=\"{}\" draw:style-name=\"dp1\" draw:master-page-name=\"Default\" draw:id=\"{}\">\n",
            escape_attr(&title),
            escape_attr(&id)
        ));
        out.push_str(&format!(
            "        <draw:rect draw:style-name=\"{}\" draw:layer=\"layout\" svg:width=\"{}\" svg:height=\"{}\" svg:x=\"0cm\" svg:y=\"0cm\">\
             <svg:title>Background</svg:title><draw:fill><draw:fill-color svg:color=\"{}\"/></draw:fill></draw:rect>\n",
            BACKGROUND_STYLE,
            PAGE_WIDTH,
            PAGE_HEIGHT,
            escape_attr(color)
        ));
        if let Some(image) = background.and_then(|b| b.image.as_deref()) {
            out.push_str(&format!(
                "        <draw:g><draw:image xlink:href=\"{}\" xlink:type=\"simple\" xlink:show=\"embed\" xlink:actuate=\"onLoad\"/></draw:g>\n",
                escape_attr(image)
            ));
        }

        for (index, element) in slide.elements.iter().enumerate() {
            let names = StyleNames { slide: number, element: index };
            let id = match element.id() {
                "" => format!("{}-{}", element.kind_name(), index),
                id => id.to_string(),
            };
            match element {
                SlideElement::Text(text) => encode_text(text, &id, &names, font, out),
                SlideElement::Image(image) => encode_image(image, &id, &names, out),
                SlideElement::Shape(shape) => encode_shape(shape, &id, &names, out),
                SlideElement::Unknown(frame) => encode_unknown(frame, &id, &names, out),
            }
        }

        if let Some(notes) = slide.notes.as_deref() {
            out.push_str(
                "        <presentation:notes draw:style-name=\"dp1\"><draw:frame presentation:class=\"notes\" draw:layer=\"layout\" \
                 svg:width=\"16cm\" svg:height=\"12cm\" svg:x=\"2cm\" svg:y=\"14cm\"><draw:text-box>",
            );
            for line in lines(notes) {
                out.push_str(&format!("<text:p>{}</text:p>", paragraph_content(line)));
            }
            out.push_str("</draw:text-box></draw:frame></presentation:notes>\n");
        }

        out.push_str("      </draw:page>\n");
        self.log.trace(format_args!(
            "Encoded slide {} with {} elements",
            id,
            slide.elements.len()
        ));
    }
}

/// Per-element style names.
struct StyleNames {
    slide: usize,
    element: usize,
}

impl StyleNames {
    fn name(&self, kind: &str) -> String {
        format!("{}{}_{}", kind, self.slide, self.element)
    }
}

fn metadata_str<'a>(presentation: &'a Presentation, key: &str) -> Option<&'a str> {
    presentation.metadata.as_ref()?.get(key)?.as_str()
}

/// Lines of multi-line text; a trailing `\r` from CRLF input is dropped.
fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Size and position attributes. A rotated element is placed with
/// `draw:transform` instead of `svg:x`/`svg:y`.
fn placement(frame: &ElementFrame) -> String {
    let size = format!(
        "svg:width=\"{}\" svg:height=\"{}\"",
        to_centimeters(frame.width),
        to_centimeters(frame.height)
    );
    match frame.rotation.filter(|r| *r != 0.0 && r.is_finite()) {
        Some(degrees) => format!(
            "{} draw:transform=\"rotate ({}) translate ({} {})\"",
            size,
            -degrees.to_radians(),
            to_centimeters(frame.x),
            to_centimeters(frame.y)
        ),
        None => format!(
            "{} svg:x=\"{}\" svg:y=\"{}\"",
            size,
            to_centimeters(frame.x),
            to_centimeters(frame.y)
        ),
    }
}

fn opacity_attr(style: Option<&ElementStyle>) -> String {
    style
        .and_then(|s| s.opacity)
        .map(|o| format!(" draw:opacity=\"{}%\"", (o.clamp(0.0, 1.0) * 100.0).round()))
        .unwrap_or_default()
}

/// Fill and stroke for frames that are transparent unless styled.
fn frame_graphic_attrs(style: Option<&ElementStyle>) -> String {
    let fill = match style.and_then(|s| s.background_color.as_deref()) {
        Some(color) => format!("draw:fill=\"solid\" draw:fill-color=\"{}\"", escape_attr(color)),
        None => "draw:fill=\"none\"".to_string(),
    };
    let stroke = match style.and_then(|s| s.border_color.as_deref()) {
        Some(color) => format!(
            " draw:stroke=\"solid\" svg:stroke-color=\"{}\" svg:stroke-width=\"{}\"",
            escape_attr(color),
            to_centimeters(style.and_then(|s| s.border_width).unwrap_or(DEFAULT_STROKE_WIDTH))
        ),
        None => " draw:stroke=\"none\"".to_string(),
    };
    format!("{}{}{}", fill, stroke, opacity_attr(style))
}

fn encode_text(text: &TextElement, id: &str, names: &StyleNames, font: &str, out: &mut String) {
    let frame_style = names.name("TextBox");
    let paragraph_style = names.name("TextStyle");
    let span_style = names.name("TextSpanStyle");
    let style = text.frame.style.as_ref();
    let text_style = text.text_style.clone().unwrap_or_default();

    out.push_str(&format!(
        "        <draw:frame draw:style-name=\"{}\" draw:layer=\"layout\" {} draw:id=\"{}\">\n          <draw:text-box>",
        frame_style,
        placement(&text.frame),
        escape_attr(id)
    ));
    for line in lines(&text.text) {
        out.push_str(&format!(
            "<text:p text:style-name=\"{}\"><text:span text:style-name=\"{}\">{}</text:span></text:p>",
            paragraph_style,
            span_style,
            paragraph_content(line)
        ));
    }
    out.push_str("</draw:text-box>\n        </draw:frame>\n");

    let vertical = text_style
        .vertical_alignment
        .map(|v| format!(" draw:textarea-vertical-align=\"{}\"", v.as_str()))
        .unwrap_or_default();
    out.push_str(&format!(
        "        <style:style style:name=\"{}\" style:family=\"graphic\"><style:graphic-properties {}{}/></style:style>\n",
        frame_style,
        frame_graphic_attrs(style),
        vertical
    ));

    let line_height = text_style
        .line_height
        .map(|h| format!(" fo:line-height=\"{}%\"", (h * 100.0).round()))
        .unwrap_or_default();
    out.push_str(&format!(
        "        <style:style style:name=\"{}\" style:family=\"paragraph\"><style:paragraph-properties fo:text-align=\"{}\"{}/></style:style>\n",
        paragraph_style,
        text_style.alignment.map_or("left", |a| a.as_str()),
        line_height
    ));

    let underline = if text_style.text_decoration.as_deref() == Some("underline") {
        "solid"
    } else {
        "none"
    };
    out.push_str(&format!(
        "        <style:style style:name=\"{}\" style:family=\"text\"><style:text-properties fo:font-family=\"{}\" fo:font-size=\"{}pt\" \
         fo:color=\"{}\" fo:font-weight=\"{}\" fo:font-style=\"{}\" style:text-underline-style=\"{}\" style:text-underline-width=\"auto\" \
         style:text-underline-color=\"font-color\"/></style:style>\n",
        span_style,
        escape_attr(text_style.font_family.as_deref().unwrap_or(font)),
        text_style.font_size.unwrap_or(DEFAULT_FONT_SIZE),
        escape_attr(style.and_then(|s| s.color.as_deref()).unwrap_or(DEFAULT_TEXT_COLOR)),
        escape_attr(text_style.font_weight.as_deref().unwrap_or("normal")),
        escape_attr(text_style.font_style.as_deref().unwrap_or("normal")),
        underline
    ));
}

fn encode_image(image: &ImageElement, id: &str, names: &StyleNames, out: &mut String) {
    let frame_style = names.name("ImageFrame");
    let title = image
        .alt
        .as_deref()
        .map(|alt| format!("<svg:title>{}</svg:title>", escape_xml(alt)))
        .unwrap_or_default();

    out.push_str(&format!(
        "        <draw:frame draw:style-name=\"{}\" draw:layer=\"layout\" {} draw:id=\"{}\">\
         <draw:image xlink:href=\"{}\" xlink:type=\"simple\" xlink:show=\"embed\" xlink:actuate=\"onLoad\"/>{}</draw:frame>\n",
        frame_style,
        placement(&image.frame),
        escape_attr(id),
        escape_attr(&image.src),
        title
    ));
    out.push_str(&format!(
        "        <style:style style:name=\"{}\" style:family=\"graphic\"><style:graphic-properties {}/></style:style>\n",
        frame_style,
        frame_graphic_attrs(image.frame.style.as_ref())
    ));
}

fn encode_shape(shape: &ShapeElement, id: &str, names: &StyleNames, out: &mut String) {
    let shape_style = names.name("ShapeBox");
    let (tag, extra) = match shape.kind() {
        ShapeKind::Rectangle => ("draw:rect", ""),
        ShapeKind::Ellipse => ("draw:ellipse", ""),
        ShapeKind::Triangle => ("draw:regular-polygon", " draw:corners=\"3\" draw:concave=\"false\""),
    };

    out.push_str(&format!(
        "        <{} draw:style-name=\"{}\" draw:layer=\"layout\" {} draw:id=\"{}\"{}>",
        tag,
        shape_style,
        placement(&shape.frame),
        escape_attr(id),
        extra
    ));
    if let Some(text) = shape.text.as_deref() {
        for line in lines(text) {
            out.push_str(&format!("<text:p>{}</text:p>", paragraph_content(line)));
        }
    }
    out.push_str(&format!("</{}>\n", tag));

    let style = shape.frame.style.as_ref();
    out.push_str(&format!(
        "        <style:style style:name=\"{}\" style:family=\"graphic\"><style:graphic-properties draw:fill=\"solid\" \
         draw:fill-color=\"{}\" draw:stroke=\"solid\" svg:stroke-color=\"{}\" svg:stroke-width=\"{}\"{}/></style:style>\n",
        shape_style,
        escape_attr(style.and_then(|s| s.background_color.as_deref()).unwrap_or(DEFAULT_SHAPE_FILL)),
        escape_attr(style.and_then(|s| s.border_color.as_deref()).unwrap_or(DEFAULT_SHAPE_STROKE)),
        to_centimeters(style.and_then(|s| s.border_width).unwrap_or(DEFAULT_STROKE_WIDTH)),
        opacity_attr(style)
    ));
}

/// Only the geometry survives; an empty frame decodes back to `unknown`.
fn encode_unknown(frame: &ElementFrame, id: &str, names: &StyleNames, out: &mut String) {
    let frame_style = names.name("Frame");
    out.push_str(&format!(
        "        <draw:frame draw:style-name=\"{}\" draw:layer=\"layout\" {} draw:id=\"{}\"/>\n",
        frame_style,
        placement(frame),
        escape_attr(id)
    ));
    out.push_str(&format!(
        "        <style:style style:name=\"{}\" style:family=\"graphic\"><style:graphic-properties {}/></style:style>\n",
        frame_style,
        frame_graphic_attrs(frame.style.as_ref())
    ));
}
