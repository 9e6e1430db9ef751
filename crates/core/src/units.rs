//! Length conversion between document units and the pixel domain.
//!
//! Decoding and encoding deliberately use different scales: [`to_pixels`]
//! treats `cm` as a physical centimetre (37.795 px), while [`to_centimeters`]
//! writes hundredths of a pixel with a `cm` suffix. The two are not inverses
//! of each other and must stay that way until the unit choice is confirmed.

use regex::Regex;
use std::sync::LazyLock;

/// Pixels per centimetre.
pub const PX_PER_CM: f64 = 37.795;

/// Pixels per millimetre.
pub const PX_PER_MM: f64 = 3.7795;

/// Pixels per point (approximation).
pub const PX_PER_PT: f64 = 1.33;

/// Leading decimal number, the way lenient length parsers read one.
static LEADING_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").unwrap()
});

/// Convert a length attribute (e.g. `"10.5cm"`) to pixels.
///
/// Absent or empty input is 0. Recognized suffixes are `cm`, `mm`, `pt` and
/// `px`; any other value is read as a bare number. Unparsable input is 0.
pub fn to_pixels(value: Option<&str>) -> f64 {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return 0.0;
    };

    let (number, factor) = if let Some(n) = value.strip_suffix("cm") {
        (n, PX_PER_CM)
    } else if let Some(n) = value.strip_suffix("mm") {
        (n, PX_PER_MM)
    } else if let Some(n) = value.strip_suffix("pt") {
        (n, PX_PER_PT)
    } else if let Some(n) = value.strip_suffix("px") {
        (n, 1.0)
    } else {
        (value, 1.0)
    };

    parse_leading_number(number).map_or(0.0, |n| n * factor)
}

/// Convert pixels to the encoder's centimetre notation (`px / 100` + `cm`).
pub fn to_centimeters(pixels: f64) -> String {
    format!("{}cm", pixels / 100.0)
}

/// Read the leading number of a string, ignoring any trailing text.
pub fn parse_leading_number(value: &str) -> Option<f64> {
    let found = LEADING_NUMBER_REGEX.find(value.trim_start())?;
    found.as_str().parse::<f64>().ok().filter(|n| n.is_finite())
}
