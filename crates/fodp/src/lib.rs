//! Flat OpenDocument presentation (FODP) transcoder.
//!
//! Decodes single-file XML presentations into the canonical document model
//! and encodes the model back into a flat document the rendering engine can
//! read.

pub mod decode;
pub mod encode;
pub mod locate;
pub mod nodes;
pub mod styles;
pub mod template;
pub mod tree;

pub use decode::FodpDecoder;
pub use encode::{escape_xml, FodpEncoder};

use deck_core::{Error, LogConfig, Presentation, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Read and decode a `.fodp` file.
pub fn read_presentation(path: &Path, log: LogConfig) -> Result<Presentation> {
    let file = File::open(path).map_err(|e| Error::invalid_input(path, e.to_string()))?;
    log.debug(format_args!("Decoding {}", path.display()));
    FodpDecoder::new(log).decode_reader(BufReader::new(file))
}

/// Encode a presentation and write it to `path`.
pub fn write_presentation(presentation: &Presentation, path: &Path, log: LogConfig) -> Result<()> {
    let file = File::create(path)?;
    log.debug(format_args!("Encoding to {}", path.display()));
    FodpEncoder::new(log).encode_to_writer(presentation, BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::{ErrorKind, Slide};

    #[test]
    fn test_write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.fodp");

        let mut presentation = Presentation::new("On disk");
        presentation.add_slide(Slide::new("first"));
        presentation.add_slide(Slide::new("second"));
        write_presentation(&presentation, &path, LogConfig::silent()).unwrap();

        let read = read_presentation(&path, LogConfig::silent()).unwrap();
        assert_eq!(read.title, "On disk");
        let ids: Vec<_> = read.slides.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn test_read_missing_file_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_presentation(&dir.path().join("absent.fodp"), LogConfig::silent()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
