//! Conversion pipeline around a headless office engine.
//!
//! The engine (LibreOffice's `soffice` by default) does the binary format
//! work; this crate stages input in per-run workspaces, drives the engine,
//! finds and packages its output, and bridges to the canonical JSON model
//! through the flat XML transcoder.

pub mod invoker;
pub mod locator;
pub mod package;
pub mod pipeline;
pub mod runner;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use invoker::{EngineInvoker, Invocation};
pub use locator::{EngineConfig, EngineLocator};
pub use package::PackageBuilder;
pub use pipeline::{ConversionInfo, ConversionPipeline, ConversionResult, Stage};
pub use runner::{EngineRunner, ProcessOutput, ProcessRunner};
pub use workspace::WorkspaceManager;
