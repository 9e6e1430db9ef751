//! Source and target document formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The format of a source document handed to the rendering engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
    /// Legacy PPT (OLE/CFB binary).
    Ppt,
    /// Packaged OpenDocument presentation.
    Odp,
    /// Flat (single-file XML) OpenDocument presentation.
    Fodp,
}

impl InputFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "ppt" => Some(Self::Ppt),
            "odp" => Some(Self::Odp),
            "fodp" => Some(Self::Fodp),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    ///
    /// ZIP containers are ambiguous (PPTX and ODP share them), so only the
    /// OLE and XML signatures are conclusive.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]) {
            return Some(Self::Ppt);
        }

        let text = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
        if text.starts_with(b"<?xml") || text.starts_with(b"<office:document") {
            return Some(Self::Fodp);
        }

        None
    }

    /// The file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pptx => "pptx",
            Self::Ppt => "ppt",
            Self::Odp => "odp",
            Self::Fodp => "fodp",
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// The format the rendering engine is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    /// Web markup; packaged with its resources into a ZIP archive.
    Html,
    Pdf,
    Fodp,
    Pptx,
    Odp,
}

impl TargetFormat {
    /// The extension (and `--convert-to` value) for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::Fodp => "fodp",
            Self::Pptx => "pptx",
            Self::Odp => "odp",
        }
    }

    /// Historical extension also accepted when discovering output.
    pub fn alternate_extension(&self) -> Option<&'static str> {
        match self {
            Self::Html => Some("htm"),
            _ => None,
        }
    }

    /// Export filter used on the first attempt, if any.
    pub fn primary_filter(&self) -> Option<&'static str> {
        match self {
            Self::Pptx => Some("Impress MS PowerPoint 2007 XML"),
            Self::Pdf => Some("impress_pdf_Export"),
            _ => None,
        }
    }

    /// Export filter for the single retry when the first attempt produced
    /// no output.
    pub fn fallback_filter(&self) -> Option<&'static str> {
        match self {
            Self::Html => Some("HTML (StarWriter)"),
            _ => None,
        }
    }

    /// Whether the output is bundled with its resources into an archive.
    pub fn is_packaged(&self) -> bool {
        matches!(self, Self::Html)
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TargetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "html" | "htm" => Ok(Self::Html),
            "pdf" => Ok(Self::Pdf),
            "fodp" => Ok(Self::Fodp),
            "pptx" => Ok(Self::Pptx),
            "odp" => Ok(Self::Odp),
            other => Err(format!("unsupported target format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_from_extension() {
        assert_eq!(InputFormat::from_extension("PPTX"), Some(InputFormat::Pptx));
        assert_eq!(InputFormat::from_extension("fodp"), Some(InputFormat::Fodp));
        assert_eq!(InputFormat::from_extension("docx"), None);
    }

    #[test]
    fn test_input_from_magic() {
        let ole = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
        assert_eq!(InputFormat::from_magic(&ole), Some(InputFormat::Ppt));
        assert_eq!(
            InputFormat::from_magic(b"<?xml version=\"1.0\"?>"),
            Some(InputFormat::Fodp)
        );
        assert_eq!(
            InputFormat::from_magic(b"\xEF\xBB\xBF<office:document"),
            Some(InputFormat::Fodp)
        );
        assert_eq!(InputFormat::from_magic(b"PK\x03\x04rest"), None);
    }

    #[test]
    fn test_target_parse() {
        assert_eq!("HTML".parse::<TargetFormat>(), Ok(TargetFormat::Html));
        assert_eq!("htm".parse::<TargetFormat>(), Ok(TargetFormat::Html));
        assert_eq!(".pdf".parse::<TargetFormat>(), Ok(TargetFormat::Pdf));
        assert!("docx".parse::<TargetFormat>().is_err());
    }

    #[test]
    fn test_only_html_has_fallback() {
        assert_eq!(TargetFormat::Html.fallback_filter(), Some("HTML (StarWriter)"));
        for format in [TargetFormat::Pdf, TargetFormat::Fodp, TargetFormat::Pptx, TargetFormat::Odp] {
            assert_eq!(format.fallback_filter(), None);
            assert_eq!(format.alternate_extension(), None);
        }
    }
}
