//! Index of named styles, resolved into the document model's style types.

use crate::tree::XmlNode;
use deck_core::units::{parse_leading_number, to_pixels, PX_PER_PT};
use deck_core::{ElementStyle, HorizontalAlign, TextStyle, VerticalAlign};
use std::collections::HashMap;

/// Parent chains deeper than this are treated as cyclic.
const MAX_PARENT_DEPTH: usize = 8;

/// Properties read from one `style:style`, before inheritance.
#[derive(Debug, Clone, Default, PartialEq)]
struct StyleProps {
    parent: Option<String>,

    fill_color: Option<String>,
    stroke_color: Option<String>,
    stroke_width: Option<f64>,
    opacity: Option<f64>,
    vertical_alignment: Option<VerticalAlign>,

    color: Option<String>,
    font_family: Option<String>,
    font_size: Option<f64>,
    font_weight: Option<String>,
    font_style: Option<String>,
    text_decoration: Option<String>,
    alignment: Option<HorizontalAlign>,
    line_height: Option<f64>,
}

impl StyleProps {
    fn read(style: &XmlNode) -> Self {
        let mut props = Self {
            parent: style.attr("style:parent-style-name").map(str::to_string),
            ..Self::default()
        };

        for child in style.elements() {
            match child.name.as_str() {
                "style:graphic-properties" | "style:drawing-page-properties" => {
                    props.read_graphic(child)
                }
                "style:text-properties" => props.read_text(child),
                "style:paragraph-properties" => props.read_paragraph(child),
                _ => {}
            }
        }
        props
    }

    fn read_graphic(&mut self, node: &XmlNode) {
        if node.attr("draw:fill") != Some("none") {
            self.fill_color = node.first_attr(&["draw:fill-color"]).map(str::to_string);
        }
        if node.attr("draw:stroke") != Some("none") {
            self.stroke_color = node
                .first_attr(&["svg:stroke-color", "draw:stroke-color"])
                .map(str::to_string);
            self.stroke_width = node
                .first_attr(&["svg:stroke-width", "draw:stroke-width"])
                .map(|w| to_pixels(Some(w)));
        }
        self.opacity = node
            .first_attr(&["draw:opacity", "style:opacity"])
            .and_then(parse_percent);
        self.vertical_alignment = node
            .first_attr(&["draw:textarea-vertical-align"])
            .and_then(parse_vertical_align);
    }

    fn read_text(&mut self, node: &XmlNode) {
        self.color = node.first_attr(&["fo:color"]).map(str::to_string);
        self.font_family = node
            .first_attr(&["fo:font-family", "style:font-name"])
            .map(|f| f.trim_matches(|c| c == '\'' || c == '"').to_string());
        self.font_size = node.first_attr(&["fo:font-size"]).and_then(parse_font_size);
        self.font_weight = node.first_attr(&["fo:font-weight"]).map(str::to_string);
        self.font_style = node.first_attr(&["fo:font-style"]).map(str::to_string);
        self.text_decoration = node
            .first_attr(&["style:text-underline-style"])
            .map(|u| (if u == "none" { "none" } else { "underline" }).to_string());
    }

    fn read_paragraph(&mut self, node: &XmlNode) {
        self.alignment = node
            .first_attr(&["fo:text-align"])
            .and_then(parse_horizontal_align);
        self.line_height = node.first_attr(&["fo:line-height"]).and_then(parse_percent);
    }

    /// Fill the gaps in `self` from a less specific style.
    fn inherit(&mut self, base: &StyleProps) {
        fn fill<T: Clone>(slot: &mut Option<T>, base: &Option<T>) {
            if slot.is_none() {
                *slot = base.clone();
            }
        }
        fill(&mut self.fill_color, &base.fill_color);
        fill(&mut self.stroke_color, &base.stroke_color);
        fill(&mut self.stroke_width, &base.stroke_width);
        fill(&mut self.opacity, &base.opacity);
        fill(&mut self.vertical_alignment, &base.vertical_alignment);
        fill(&mut self.color, &base.color);
        fill(&mut self.font_family, &base.font_family);
        fill(&mut self.font_size, &base.font_size);
        fill(&mut self.font_weight, &base.font_weight);
        fill(&mut self.font_style, &base.font_style);
        fill(&mut self.text_decoration, &base.text_decoration);
        fill(&mut self.alignment, &base.alignment);
        fill(&mut self.line_height, &base.line_height);
    }
}

fn parse_percent(value: &str) -> Option<f64> {
    let value = value.trim();
    match value.strip_suffix('%') {
        Some(pct) => parse_leading_number(pct).map(|n| n / 100.0),
        None => parse_leading_number(value),
    }
}

/// Font sizes are kept in points.
fn parse_font_size(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.ends_with("pt") || value.chars().last().is_some_and(|c| c.is_ascii_digit()) {
        parse_leading_number(value)
    } else if value.ends_with('%') {
        None
    } else {
        Some(to_pixels(Some(value)) / PX_PER_PT)
    }
}

fn parse_horizontal_align(value: &str) -> Option<HorizontalAlign> {
    match value {
        "start" | "left" => Some(HorizontalAlign::Left),
        "center" => Some(HorizontalAlign::Center),
        "end" | "right" => Some(HorizontalAlign::Right),
        "justify" => Some(HorizontalAlign::Justify),
        _ => None,
    }
}

fn parse_vertical_align(value: &str) -> Option<VerticalAlign> {
    match value {
        "top" => Some(VerticalAlign::Top),
        "middle" => Some(VerticalAlign::Middle),
        "bottom" => Some(VerticalAlign::Bottom),
        _ => None,
    }
}

/// Every `style:style` in a document, by name.
#[derive(Debug, Default)]
pub struct StyleIndex {
    styles: HashMap<String, StyleProps>,
}

impl StyleIndex {
    pub fn build(root: &XmlNode) -> Self {
        let mut nodes = Vec::new();
        root.descendants("style:style", &mut nodes);
        if root.is("style:style") {
            nodes.push(root);
        }

        let mut styles = HashMap::new();
        for node in nodes {
            if let Some(name) = node.first_attr(&["style:name"]) {
                // Later definitions replace earlier ones.
                styles.insert(name.to_string(), StyleProps::read(node));
            }
        }
        Self { styles }
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// A named style with its parent chain folded in.
    fn resolve(&self, name: &str) -> Option<StyleProps> {
        let mut resolved = self.styles.get(name)?.clone();
        let mut next = resolved.parent.clone();
        let mut depth = 0;
        while let Some(parent_name) = next {
            depth += 1;
            if depth > MAX_PARENT_DEPTH {
                break;
            }
            let Some(parent) = self.styles.get(&parent_name) else {
                break;
            };
            resolved.inherit(parent);
            next = parent.parent.clone();
        }
        Some(resolved)
    }

    /// Several styles merged, later names taking precedence.
    fn resolve_all(&self, names: &[&str]) -> Option<StyleProps> {
        names
            .iter()
            .rev()
            .filter_map(|name| self.resolve(name))
            .reduce(|mut specific, general| {
                specific.inherit(&general);
                specific
            })
    }

    /// Colour, border and opacity for an element.
    pub fn element_style(&self, names: &[&str]) -> Option<ElementStyle> {
        let props = self.resolve_all(names)?;
        let style = ElementStyle {
            background_color: props.fill_color,
            color: props.color,
            border_color: props.stroke_color,
            border_width: props.stroke_width,
            opacity: props.opacity,
            ..ElementStyle::default()
        };
        (!style.is_empty()).then_some(style)
    }

    /// Character and paragraph formatting for a text element.
    pub fn text_style(&self, names: &[&str]) -> Option<TextStyle> {
        let props = self.resolve_all(names)?;
        let style = TextStyle {
            font_family: props.font_family,
            font_size: props.font_size,
            font_weight: props.font_weight,
            font_style: props.font_style,
            text_decoration: props.text_decoration,
            alignment: props.alignment,
            vertical_alignment: props.vertical_alignment,
            line_height: props.line_height,
        };
        (!style.is_empty()).then_some(style)
    }

    /// Fill colour of a drawing-page style.
    pub fn fill_color(&self, name: &str) -> Option<String> {
        self.resolve(name)?.fill_color
    }
}
