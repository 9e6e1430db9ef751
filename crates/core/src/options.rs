//! Conversion options.

use crate::logging::LogConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options for a single conversion request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionOptions {
    /// Directory for the final output. Defaults to the input's directory.
    pub output_dir: Option<PathBuf>,

    /// Output file name without extension. Defaults to
    /// `<input stem>_converted_<unix millis>`.
    pub output_name: Option<String>,

    /// Keep the temporary workspace after the run (for debugging).
    pub keep_temp_files: bool,

    pub log: LogConfig,
}

impl ConversionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    pub fn with_keep_temp_files(mut self, keep: bool) -> Self {
        self.keep_temp_files = keep;
        self
    }

    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }
}
