//! Adapter for the editor's nested-position schema.
//!
//! The editor front-end stores element geometry under a `position` object and
//! uses boolean font flags. Conversion code only ever works on the canonical
//! model in [`crate::types`]; this module translates at the boundary.

use crate::types::{
    ElementFrame, ElementStyle, HorizontalAlign, ImageElement, Presentation, ShapeElement, Slide,
    SlideElement, TextElement, TextStyle,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedPresentation {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub slides: Vec<NestedSlide>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NestedMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedSlide {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub elements: Vec<NestedElement>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<crate::types::Background>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NestedElement {
    #[serde(rename_all = "camelCase")]
    Text {
        id: String,
        text: String,
        position: Position,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<NestedTextStyle>,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        id: String,
        src: String,
        position: Position,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Shape {
        id: String,
        shape_type: String,
        position: Position,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<NestedShapeStyle>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedTextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<HorizontalAlign>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedShapeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

/// Translate the canonical model into the editor's nested schema.
///
/// `unknown` elements have no nested counterpart and are left out.
pub fn to_nested(presentation: &Presentation) -> NestedPresentation {
    let metadata = if presentation.author.is_some()
        || presentation.creation_date.is_some()
        || presentation.metadata.is_some()
    {
        Some(NestedMetadata {
            author: presentation.author.clone(),
            created: presentation.creation_date.clone(),
            extra: presentation.metadata.clone().unwrap_or_default(),
        })
    } else {
        None
    };

    NestedPresentation {
        title: presentation.title.clone(),
        metadata,
        slides: presentation
            .slides
            .iter()
            .map(|slide| NestedSlide {
                id: slide.id.clone(),
                title: slide.title.clone(),
                background: slide.background.clone(),
                elements: slide.elements.iter().filter_map(nest_element).collect(),
            })
            .collect(),
    }
}

/// Translate the editor's nested schema into the canonical model.
pub fn from_nested(nested: NestedPresentation) -> Presentation {
    let mut presentation = Presentation::new(if nested.title.is_empty() {
        crate::types::DEFAULT_TITLE.to_string()
    } else {
        nested.title
    });

    if let Some(metadata) = nested.metadata {
        presentation.author = metadata.author;
        presentation.creation_date = metadata.created;
        if !metadata.extra.is_empty() {
            presentation.metadata = Some(metadata.extra);
        }
    }

    for slide in nested.slides {
        let mut flat = Slide::new(slide.id);
        flat.title = slide.title;
        flat.background = slide.background;
        flat.elements = slide.elements.into_iter().map(flatten_element).collect();
        presentation.add_slide(flat);
    }

    presentation
}

fn position_of(frame: &ElementFrame) -> Position {
    Position {
        x: frame.x,
        y: frame.y,
        width: frame.width,
        height: frame.height,
    }
}

fn frame_from(id: String, position: Position) -> ElementFrame {
    ElementFrame::new(id, position.x, position.y, position.width, position.height)
}

fn nest_element(element: &SlideElement) -> Option<NestedElement> {
    match element {
        SlideElement::Text(text) => {
            let style = nest_text_style(text.text_style.as_ref(), text.frame.style.as_ref());
            Some(NestedElement::Text {
                id: text.frame.id.clone(),
                text: text.text.clone(),
                position: position_of(&text.frame),
                style,
            })
        }
        SlideElement::Image(image) => Some(NestedElement::Image {
            id: image.frame.id.clone(),
            src: image.src.clone(),
            position: position_of(&image.frame),
            alt: image.alt.clone(),
        }),
        SlideElement::Shape(shape) => Some(NestedElement::Shape {
            id: shape.frame.id.clone(),
            shape_type: shape.shape_type.clone(),
            position: position_of(&shape.frame),
            style: shape.frame.style.as_ref().map(|s| NestedShapeStyle {
                fill: s.background_color.clone(),
                stroke: s.border_color.clone(),
                stroke_width: s.border_width,
            }),
            text: shape.text.clone(),
        }),
        SlideElement::Unknown(_) => None,
    }
}

fn nest_text_style(
    text_style: Option<&TextStyle>,
    style: Option<&ElementStyle>,
) -> Option<NestedTextStyle> {
    let color = style.and_then(|s| s.color.clone());
    if text_style.is_none() && color.is_none() {
        return None;
    }

    let ts = text_style.cloned().unwrap_or_default();
    Some(NestedTextStyle {
        font_family: ts.font_family,
        font_size: ts.font_size,
        color,
        bold: ts.font_weight.map(|w| w == "bold"),
        italic: ts.font_style.map(|s| s == "italic"),
        underline: ts.text_decoration.map(|d| d == "underline"),
        align: ts.alignment,
    })
}

fn flatten_element(element: NestedElement) -> SlideElement {
    match element {
        NestedElement::Text {
            id,
            text,
            position,
            style,
        } => {
            let mut frame = frame_from(id, position);
            let text_style = style.map(|s| {
                if let Some(color) = s.color {
                    frame.style = Some(ElementStyle {
                        color: Some(color),
                        ..ElementStyle::default()
                    });
                }
                TextStyle {
                    font_family: s.font_family,
                    font_size: s.font_size,
                    font_weight: s.bold.map(|b| (if b { "bold" } else { "normal" }).to_string()),
                    font_style: s.italic.map(|i| (if i { "italic" } else { "normal" }).to_string()),
                    text_decoration: s
                        .underline
                        .map(|u| (if u { "underline" } else { "none" }).to_string()),
                    alignment: s.align,
                    ..TextStyle::default()
                }
            });
            SlideElement::Text(TextElement {
                frame,
                text,
                text_style: text_style.filter(|ts| !ts.is_empty()),
            })
        }
        NestedElement::Image {
            id,
            src,
            position,
            alt,
        } => {
            let mut image = ImageElement::new(frame_from(id, position), src);
            image.alt = alt;
            SlideElement::Image(image)
        }
        NestedElement::Shape {
            id,
            shape_type,
            position,
            style,
            text,
        } => {
            let mut frame = frame_from(id, position);
            frame.style = style.map(|s| ElementStyle {
                background_color: s.fill,
                border_color: s.stroke,
                border_width: s.stroke_width,
                ..ElementStyle::default()
            });
            SlideElement::Shape(ShapeElement {
                frame,
                shape_type,
                path: None,
                text,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn editor_sample() -> NestedPresentation {
        serde_json::from_value(json!({
            "title": "Demo",
            "metadata": {"author": "Ana", "created": "2024-01-01", "description": "sample"},
            "slides": [{
                "id": "slide-1",
                "title": "Welcome",
                "elements": [
                    {
                        "type": "text",
                        "id": "text-1",
                        "text": "Welcome to the editor",
                        "position": {"x": 100, "y": 50, "width": 400, "height": 50},
                        "style": {"fontFamily": "Arial", "fontSize": 24, "color": "#333333", "bold": true}
                    },
                    {
                        "type": "shape",
                        "id": "shape-1",
                        "shapeType": "ellipse",
                        "position": {"x": 10, "y": 10, "width": 20, "height": 20},
                        "style": {"fill": "#ff0000", "stroke": "#000000", "strokeWidth": 2}
                    },
                    {
                        "type": "image",
                        "id": "image-1",
                        "src": "data:image/png;base64,AAAA",
                        "position": {"x": 0, "y": 0, "width": 5, "height": 5}
                    }
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_from_nested_flattens_positions() {
        let presentation = from_nested(editor_sample());

        assert_eq!(presentation.title, "Demo");
        assert_eq!(presentation.author.as_deref(), Some("Ana"));
        assert_eq!(presentation.creation_date.as_deref(), Some("2024-01-01"));
        assert_eq!(
            presentation.metadata.as_ref().and_then(|m| m.get("description")),
            Some(&json!("sample"))
        );

        let elements = &presentation.slides[0].elements;
        assert_eq!(elements.len(), 3);

        let SlideElement::Text(text) = &elements[0] else {
            panic!("expected text element");
        };
        assert_eq!(text.frame.x, 100.0);
        assert_eq!(text.frame.width, 400.0);
        let ts = text.text_style.as_ref().unwrap();
        assert_eq!(ts.font_weight.as_deref(), Some("bold"));
        assert_eq!(ts.font_size, Some(24.0));
        assert_eq!(text.frame.style.as_ref().unwrap().color.as_deref(), Some("#333333"));

        let SlideElement::Shape(shape) = &elements[1] else {
            panic!("expected shape element");
        };
        let style = shape.frame.style.as_ref().unwrap();
        assert_eq!(style.background_color.as_deref(), Some("#ff0000"));
        assert_eq!(style.border_width, Some(2.0));

        let SlideElement::Image(image) = &elements[2] else {
            panic!("expected image element");
        };
        assert!(image.is_base64);
    }

    #[test]
    fn test_nested_round_trip() {
        let nested = editor_sample();
        let back = to_nested(&from_nested(nested.clone()));
        assert_eq!(back, nested);
    }

    #[test]
    fn test_to_nested_skips_unknown() {
        let mut presentation = Presentation::default();
        let mut slide = Slide::new("s");
        slide.add_element(SlideElement::Unknown(ElementFrame::default()));
        presentation.add_slide(slide);

        let nested = to_nested(&presentation);
        assert!(nested.slides[0].elements.is_empty());
        assert!(nested.metadata.is_none());
    }
}
