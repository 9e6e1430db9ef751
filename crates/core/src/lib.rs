//! Core domain types for presentation conversion: the canonical JSON
//! document model, error taxonomy, unit conversion and shared configuration.

pub mod adapter;
pub mod error;
pub mod format;
pub mod logging;
pub mod options;
pub mod types;
pub mod units;

pub use error::{Error, ErrorKind, Result};
pub use format::{InputFormat, TargetFormat};
pub use logging::LogConfig;
pub use options::ConversionOptions;
pub use types::{
    Background, ElementFrame, ElementStyle, HorizontalAlign, ImageElement, Presentation,
    ShapeElement, ShapeKind, Slide, SlideElement, SlideSize, TextElement, TextStyle, Theme,
    ThemeFonts, VerticalAlign,
};
