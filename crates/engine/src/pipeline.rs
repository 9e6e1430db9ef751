//! The conversion pipeline.
//!
//! One run moves through [`Stage`]s in order:
//!
//! 1. **Validating**: the input exists, is non-empty and has a known format.
//! 2. **WorkspacePrepared**: a fresh workspace holds `input.<ext>`.
//! 3. **EngineInvoked**: the engine wrote its output to `<workspace>/output`.
//! 4. **PostProcessed**: the output was packaged or copied to its final path.
//! 5. **CleanedUp**: the workspace is gone, unless retention was requested.
//!
//! A failure after the workspace exists removes it before the error is
//! returned, again unless retention was requested.

use crate::invoker::{EngineInvoker, Invocation};
use crate::locator::{EngineConfig, EngineLocator};
use crate::package::{partial_path, PackageBuilder};
use crate::runner::{EngineRunner, ProcessRunner};
use crate::workspace::WorkspaceManager;
use chrono::{DateTime, Utc};
use deck_core::{
    ConversionOptions, Error, InputFormat, LogConfig, Presentation, Result, TargetFormat,
};
use deck_fodp::{FodpDecoder, FodpEncoder};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncReadExt;

/// Subdirectory of the workspace the engine writes into.
pub const OUTPUT_SUBDIR: &str = "output";

/// File name of an encoded presentation staged for the engine.
const ENCODED_NAME: &str = "presentation.fodp";

/// Bytes read from the input when its extension is not recognized.
const MAGIC_LEN: usize = 8;

/// Pipeline stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    WorkspacePrepared,
    EngineInvoked,
    PostProcessed,
    CleanedUp,
    Completed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::WorkspacePrepared => "workspace prepared",
            Self::EngineInvoked => "engine invoked",
            Self::PostProcessed => "post-processed",
            Self::CleanedUp => "cleaned up",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Timing of one run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionInfo {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
}

/// What a successful run produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub output_path: PathBuf,
    /// Archive entry names of bundled resources (web markup only).
    pub additional_files: Vec<String>,
    pub format: TargetFormat,
    pub info: ConversionInfo,
}

pub struct ConversionPipeline {
    locator: EngineLocator,
    invoker: EngineInvoker,
    workspaces: WorkspaceManager,
    packager: PackageBuilder,
    log: LogConfig,
}

impl ConversionPipeline {
    /// A pipeline that spawns real engine processes.
    pub fn new(config: EngineConfig, log: LogConfig) -> Self {
        Self::with_runner(config, Arc::new(ProcessRunner), log)
    }

    pub fn with_runner(config: EngineConfig, runner: Arc<dyn EngineRunner>, log: LogConfig) -> Self {
        Self {
            locator: EngineLocator::new(config, runner.clone(), log),
            invoker: EngineInvoker::new(runner, log),
            workspaces: WorkspaceManager::new(log),
            packager: PackageBuilder::new(log),
            log,
        }
    }

    /// Create workspaces under `root` instead of the platform temp directory.
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspaces = WorkspaceManager::with_root(root, self.log);
        self
    }

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    /// Check that a rendering engine is available. The probe runs once per
    /// pipeline; later calls return the cached binary.
    pub async fn ensure_engine(&self) -> Result<String> {
        self.locator.resolve().await.map(str::to_string)
    }

    /// Convert `input` to `format`.
    pub async fn convert(
        &self,
        input: &Path,
        format: TargetFormat,
        options: &ConversionOptions,
    ) -> Result<ConversionResult> {
        let log = &options.log;
        let start_time = Utc::now();
        let started = Instant::now();
        log.info(format_args!("Converting {} to {}", input.display(), format));

        let input_format = self.validate(input).await.map_err(|e| fail(log, Stage::Validating, e))?;
        let engine = self.ensure_engine().await.map_err(|e| fail(log, Stage::Validating, e))?;
        log.debug(format_args!("Stage: {} ({})", Stage::Validating, input_format));

        let workspace = self
            .workspaces
            .create()
            .await
            .map_err(|e| fail(log, Stage::WorkspacePrepared, e))?;
        let outcome = self
            .run_in_workspace(&workspace, &engine, input, input_format, format, options)
            .await;
        self.release_workspace(&workspace, options, outcome.is_ok()).await;

        let (output_path, additional_files) = outcome?;
        let end_time = Utc::now();
        let duration_ms = started.elapsed().as_millis() as u64;
        log.debug(format_args!("Stage: {}", Stage::Completed));
        log.info(format_args!(
            "Wrote {} in {} ms",
            output_path.display(),
            duration_ms
        ));

        Ok(ConversionResult {
            output_path,
            additional_files,
            format,
            info: ConversionInfo {
                start_time,
                end_time,
                duration_ms,
            },
        })
    }

    /// Convert a binary presentation into the canonical model.
    ///
    /// Flat `.fodp` input is decoded directly; anything else goes through the
    /// engine in a private workspace first.
    pub async fn binary_to_json(&self, input: &Path) -> Result<Presentation> {
        let input_format = self.validate(input).await?;
        let decoder = FodpDecoder::new(self.log);
        if input_format == InputFormat::Fodp {
            let xml = tokio::fs::read_to_string(input).await?;
            return decoder.decode(&xml);
        }

        let engine = self.ensure_engine().await?;
        let workspace = self.workspaces.create().await?;
        let decoded = self
            .decode_in_workspace(&workspace, &engine, input, input_format, &decoder)
            .await;

        if let Err(e) = self.workspaces.destroy(&workspace).await {
            self.log.warn(format_args!("Workspace cleanup failed: {}", e));
        }
        decoded
    }

    async fn decode_in_workspace(
        &self,
        workspace: &Path,
        engine: &str,
        input: &Path,
        input_format: InputFormat,
        decoder: &FodpDecoder,
    ) -> Result<Presentation> {
        let staged = self
            .workspaces
            .copy_into(workspace, input, input_format)
            .await?;
        let invocation = self
            .invoke_into(workspace, engine, &staged, TargetFormat::Fodp)
            .await?;
        let xml = tokio::fs::read_to_string(&invocation.output_path).await?;
        decoder.decode(&xml)
    }

    /// Encode `presentation` and convert it to `format`.
    ///
    /// Without an explicit output directory the result lands in the current
    /// directory, as `presentation_<millis>` unless a name is given.
    pub async fn json_to_binary(
        &self,
        presentation: &Presentation,
        format: TargetFormat,
        options: &ConversionOptions,
    ) -> Result<ConversionResult> {
        let mut options = options.clone();
        if options.output_dir.is_none() {
            options.output_dir = Some(std::env::current_dir()?);
        }
        if options.output_name.is_none() {
            options.output_name = Some(format!("presentation_{}", Utc::now().timestamp_millis()));
        }

        let workspace = self.workspaces.create().await?;
        let encoded = workspace.join(ENCODED_NAME);
        let xml = FodpEncoder::new(self.log).encode(presentation);
        let result = match tokio::fs::write(&encoded, xml).await {
            Ok(()) => self.convert(&encoded, format, &options).await,
            Err(e) => Err(Error::Workspace(format!(
                "cannot write {}: {}",
                encoded.display(),
                e
            ))),
        };

        if options.keep_temp_files {
            self.log
                .info(format_args!("Keeping workspace {}", workspace.display()));
        } else if let Err(e) = self.workspaces.destroy(&workspace).await {
            self.log.warn(format_args!("Workspace cleanup failed: {}", e));
        }
        result
    }

    async fn validate(&self, input: &Path) -> Result<InputFormat> {
        let metadata = tokio::fs::metadata(input)
            .await
            .map_err(|e| Error::invalid_input(input, format!("cannot read: {}", e)))?;
        if !metadata.is_file() {
            return Err(Error::invalid_input(input, "not a regular file"));
        }
        if metadata.len() == 0 {
            return Err(Error::invalid_input(input, "file is empty"));
        }

        let by_extension = input
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(InputFormat::from_extension);
        if let Some(format) = by_extension {
            return Ok(format);
        }

        let mut header = [0u8; MAGIC_LEN];
        let mut file = tokio::fs::File::open(input).await?;
        let read = file.read(&mut header).await?;
        InputFormat::from_magic(&header[..read])
            .ok_or_else(|| Error::invalid_input(input, "unsupported input format"))
    }

    async fn run_in_workspace(
        &self,
        workspace: &Path,
        engine: &str,
        input: &Path,
        input_format: InputFormat,
        format: TargetFormat,
        options: &ConversionOptions,
    ) -> Result<(PathBuf, Vec<String>)> {
        let log = &options.log;

        let staged = self
            .workspaces
            .copy_into(workspace, input, input_format)
            .await
            .map_err(|e| fail(log, Stage::WorkspacePrepared, e))?;
        log.debug(format_args!("Stage: {} ({})", Stage::WorkspacePrepared, workspace.display()));

        let invocation = self
            .invoke_into(workspace, engine, &staged, format)
            .await
            .map_err(|e| fail(log, Stage::EngineInvoked, e))?;
        log.debug(format_args!("Stage: {}", Stage::EngineInvoked));

        let produced = self
            .post_process(&invocation, input, format, options)
            .await
            .map_err(|e| fail(log, Stage::PostProcessed, e))?;
        log.debug(format_args!("Stage: {}", Stage::PostProcessed));
        Ok(produced)
    }

    async fn invoke_into(
        &self,
        workspace: &Path,
        engine: &str,
        staged: &Path,
        format: TargetFormat,
    ) -> Result<Invocation> {
        let output_dir = workspace.join(OUTPUT_SUBDIR);
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| Error::Workspace(format!("cannot create {}: {}", output_dir.display(), e)))?;
        self.invoker.invoke(engine, staged, &output_dir, format).await
    }

    async fn post_process(
        &self,
        invocation: &Invocation,
        input: &Path,
        format: TargetFormat,
        options: &ConversionOptions,
    ) -> Result<(PathBuf, Vec<String>)> {
        let output_dir = match &options.output_dir {
            Some(dir) => dir.clone(),
            None => input
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        tokio::fs::create_dir_all(&output_dir).await.map_err(|e| {
            Error::OutputGeneration(format!("cannot create {}: {}", output_dir.display(), e))
        })?;

        let name = options
            .output_name
            .clone()
            .unwrap_or_else(|| default_output_name(input));

        if format.is_packaged() {
            let archive = output_dir.join(format!("{}.zip", name));
            let primary_name = format!("{}.{}", name, format.extension());
            let additional = self
                .packager
                .package(&invocation.output_path, &archive, &primary_name)
                .await?;
            return Ok((archive, additional));
        }

        let target = output_dir.join(format!("{}.{}", name, format.extension()));
        let partial = partial_path(&target);
        if let Err(e) = copy_then_rename(&invocation.output_path, &partial, &target).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(Error::OutputGeneration(format!(
                "cannot write {}: {}",
                target.display(),
                e
            )));
        }
        Ok((target, Vec::new()))
    }

    /// Remove the workspace unless retention was requested. Cleanup failures
    /// are logged and never change the run's result.
    async fn release_workspace(&self, workspace: &Path, options: &ConversionOptions, succeeded: bool) {
        let log = &options.log;
        if options.keep_temp_files {
            log.info(format_args!("Keeping workspace {}", workspace.display()));
            return;
        }
        match self.workspaces.destroy(workspace).await {
            Ok(()) if succeeded => log.debug(format_args!("Stage: {}", Stage::CleanedUp)),
            Ok(()) => {}
            Err(e) => log.warn(format_args!("Workspace cleanup failed: {}", e)),
        }
    }
}

/// `<input stem>_converted_<unix millis>`
pub fn default_output_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "presentation".to_string());
    format!("{}_converted_{}", stem, Utc::now().timestamp_millis())
}

async fn copy_then_rename(source: &Path, partial: &Path, target: &Path) -> std::io::Result<()> {
    tokio::fs::copy(source, partial).await?;
    tokio::fs::rename(partial, target).await
}

fn fail(log: &LogConfig, stage: Stage, err: Error) -> Error {
    log.error(format_args!("Conversion failed at stage '{}': {}", stage, err));
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Behavior, ScriptedRunner};
    use deck_core::{ElementFrame, ErrorKind, Slide, SlideElement, TextElement};
    use std::io::Read;

    struct Harness {
        _dir: tempfile::TempDir,
        root: PathBuf,
        inputs: PathBuf,
        out: PathBuf,
        runner: Arc<ScriptedRunner>,
        pipeline: ConversionPipeline,
    }

    impl Harness {
        fn new(behavior: Behavior) -> Self {
            Self::with_runner(ScriptedRunner::new().with_behavior(behavior))
        }

        fn with_runner(runner: ScriptedRunner) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().join("workspaces");
            let inputs = dir.path().join("inputs");
            let out = dir.path().join("out");
            std::fs::create_dir_all(&inputs).unwrap();

            let runner = Arc::new(runner);
            let pipeline =
                ConversionPipeline::with_runner(EngineConfig::default(), runner.clone(), LogConfig::silent())
                    .with_workspace_root(&root);
            Self {
                _dir: dir,
                root,
                inputs,
                out,
                runner,
                pipeline,
            }
        }

        fn input(&self, name: &str, content: &[u8]) -> PathBuf {
            let path = self.inputs.join(name);
            std::fs::write(&path, content).unwrap();
            path
        }

        fn options(&self) -> ConversionOptions {
            ConversionOptions::new()
                .with_output_dir(&self.out)
                .with_log(LogConfig::silent())
        }

        fn workspaces_left(&self) -> usize {
            match std::fs::read_dir(&self.root) {
                Ok(entries) => entries.count(),
                Err(_) => 0,
            }
        }
    }

    const FLAT_DECK: &str = r#"<?xml version="1.0"?>
<office:document xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0"
    xmlns:draw="urn:oasis:names:tc:opendocument:xmlns:drawing:1.0"
    xmlns:svg="urn:oasis:names:tc:opendocument:xmlns:svg-compatible:1.0"
    xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0"
    xmlns:dc="http://purl.org/dc/elements/1.1/">
  <office:meta><dc:title>Engine deck</dc:title></office:meta>
  <office:body><office:presentation>
    <draw:page draw:name="intro">
      <draw:frame svg:x="1cm" svg:y="1cm" svg:width="5cm" svg:height="2cm">
        <draw:text-box><text:p>Hello</text:p></draw:text-box>
      </draw:frame>
    </draw:page>
  </office:presentation></office:body>
</office:document>"#;

    #[tokio::test]
    async fn test_convert_to_pdf_copies_output() {
        let h = Harness::new(Behavior::Produce);
        let input = h.input("Quarterly Review.pptx", b"PK\x03\x04pptx");
        let options = h.options().with_output_name("review");

        let result = h.pipeline.convert(&input, TargetFormat::Pdf, &options).await.unwrap();

        assert_eq!(result.output_path, h.out.join("review.pdf"));
        assert_eq!(std::fs::read(&result.output_path).unwrap(), b"PK\x03\x04pptx");
        assert!(result.additional_files.is_empty());
        assert_eq!(result.format, TargetFormat::Pdf);
        assert!(result.info.end_time >= result.info.start_time);
        assert!(!partial_path(&result.output_path).exists());
        assert_eq!(h.workspaces_left(), 0);

        let staged = h.runner.conversions()[0].input().unwrap();
        assert_eq!(staged.file_name().unwrap(), "input.pptx");
    }

    #[tokio::test]
    async fn test_result_serializes_camel_case() {
        let h = Harness::new(Behavior::Produce);
        let input = h.input("deck.pptx", b"PK\x03\x04");
        let result = h.pipeline.convert(&input, TargetFormat::Odp, &h.options()).await.unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["format"], "odp");
        assert!(json["outputPath"].as_str().unwrap().ends_with(".odp"));
        assert!(json["additionalFiles"].as_array().unwrap().is_empty());
        assert!(json["info"]["durationMs"].is_u64());
        assert!(json["info"]["startTime"].is_string());
    }

    #[tokio::test]
    async fn test_default_output_location() {
        let h = Harness::new(Behavior::Produce);
        let input = h.input("talk.odp", b"PK\x03\x04odp");
        let options = ConversionOptions::new().with_log(LogConfig::silent());

        let result = h.pipeline.convert(&input, TargetFormat::Pptx, &options).await.unwrap();

        assert_eq!(result.output_path.parent().unwrap(), h.inputs);
        let name = result.output_path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("talk_converted_"));
        assert!(name.ends_with(".pptx"));
    }

    #[tokio::test]
    async fn test_convert_to_html_packages_resources() {
        let h = Harness::new(Behavior::ProduceWithResources(vec![
            ("img0.png", "png"),
            ("img1.jpg", "jpg"),
        ]));
        let input = h.input("deck.pptx", b"PK\x03\x04");
        let options = h.options().with_output_name("web");

        let result = h.pipeline.convert(&input, TargetFormat::Html, &options).await.unwrap();

        assert_eq!(result.output_path, h.out.join("web.zip"));
        assert_eq!(result.additional_files, vec!["html_files/img0.png", "html_files/img1.jpg"]);

        let mut zip = zip::ZipArchive::new(std::fs::File::open(&result.output_path).unwrap()).unwrap();
        let mut body = String::new();
        zip.by_name("web.html").unwrap().read_to_string(&mut body).unwrap();
        assert!(body.contains("img0.png"));
        assert_eq!(h.workspaces_left(), 0);
    }

    #[tokio::test]
    async fn test_html_accepts_htm_output() {
        let h = Harness::new(Behavior::ProduceAlternate);
        let input = h.input("deck.odp", b"PK\x03\x04");
        let options = h.options().with_output_name("legacy");

        let result = h.pipeline.convert(&input, TargetFormat::Html, &options).await.unwrap();

        assert_eq!(result.output_path, h.out.join("legacy.zip"));
        assert!(result.additional_files.is_empty());
        assert_eq!(h.runner.conversions().len(), 1);
        let zip = zip::ZipArchive::new(std::fs::File::open(&result.output_path).unwrap()).unwrap();
        assert_eq!(zip.file_names().collect::<Vec<_>>(), vec!["legacy.html"]);
    }

    #[tokio::test]
    async fn test_html_without_output_is_output_missing_and_cleans_up() {
        let h = Harness::new(Behavior::NoOutput);
        let input = h.input("deck.pptx", b"PK\x03\x04");

        let err = h
            .pipeline
            .convert(&input, TargetFormat::Html, &h.options())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::OutputMissing);
        assert_eq!(h.runner.conversions().len(), 2);
        assert_eq!(h.workspaces_left(), 0);
        assert!(!h.out.exists() || std::fs::read_dir(&h.out).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_nonzero_exit_fails_once_without_retry() {
        let h = Harness::new(Behavior::Exit(1, "general error"));
        let input = h.input("deck.pptx", b"PK\x03\x04");

        let err = h
            .pipeline
            .convert(&input, TargetFormat::Html, &h.options())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::EngineInvocationFailed);
        assert!(err.to_string().contains("general error"));
        assert_eq!(h.runner.conversions().len(), 1);
        assert_eq!(h.workspaces_left(), 0);
    }

    #[tokio::test]
    async fn test_missing_input_creates_no_workspace() {
        let h = Harness::new(Behavior::Produce);
        let err = h
            .pipeline
            .convert(&h.inputs.join("absent.pptx"), TargetFormat::Pdf, &h.options())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(!h.root.exists());
        assert!(h.runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_input_is_invalid() {
        let h = Harness::new(Behavior::Produce);
        let input = h.input("empty.pptx", b"");
        let err = h
            .pipeline
            .convert(&input, TargetFormat::Pdf, &h.options())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("empty"));
    }

    #[tokio::test]
    async fn test_unknown_extension_falls_back_to_magic() {
        let h = Harness::new(Behavior::Produce);
        let legacy = h.input("deck.bin", b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1rest");
        let result = h
            .pipeline
            .convert(&legacy, TargetFormat::Pdf, &h.options())
            .await
            .unwrap();
        assert!(result.output_path.exists());
        let staged = h.runner.conversions()[0].input().unwrap();
        assert_eq!(staged.file_name().unwrap(), "input.ppt");

        let text = h.input("notes.txt", b"just some text");
        let err = h
            .pipeline
            .convert(&text, TargetFormat::Pdf, &h.options())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_missing_engine_creates_no_workspace() {
        let h = Harness::with_runner(ScriptedRunner::new().with_installed(&[]));
        let input = h.input("deck.pptx", b"PK\x03\x04");

        let err = h
            .pipeline
            .convert(&input, TargetFormat::Pdf, &h.options())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EngineNotFound);
        assert!(!h.root.exists());
    }

    #[tokio::test]
    async fn test_engine_probe_runs_once_across_runs() {
        let h = Harness::new(Behavior::Produce);
        let input = h.input("deck.pptx", b"PK\x03\x04");

        h.pipeline.convert(&input, TargetFormat::Pdf, &h.options()).await.unwrap();
        h.pipeline.convert(&input, TargetFormat::Odp, &h.options()).await.unwrap();

        let probes = h.runner.calls().iter().filter(|c| c.is_probe()).count();
        assert_eq!(probes, 1);
    }

    #[tokio::test]
    async fn test_keep_temp_files_on_success_and_failure() {
        let h = Harness::new(Behavior::Produce);
        let input = h.input("deck.pptx", b"PK\x03\x04");
        let options = h.options().with_keep_temp_files(true);
        h.pipeline.convert(&input, TargetFormat::Pdf, &options).await.unwrap();
        assert_eq!(h.workspaces_left(), 1);

        let failing = Harness::new(Behavior::NoOutput);
        let input = failing.input("deck.pptx", b"PK\x03\x04");
        let options = failing.options().with_keep_temp_files(true);
        failing
            .pipeline
            .convert(&input, TargetFormat::Pdf, &options)
            .await
            .unwrap_err();
        assert_eq!(failing.workspaces_left(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_failure_is_only_logged() {
        let dir = tempfile::tempdir().unwrap();
        let occupied = dir.path().join("occupied");
        std::fs::write(&occupied, b"not a directory").unwrap();

        let pipeline = ConversionPipeline::with_runner(
            EngineConfig::default(),
            Arc::new(ScriptedRunner::new()),
            LogConfig::silent(),
        );
        let options = ConversionOptions::new().with_log(LogConfig::silent());
        pipeline.release_workspace(&occupied, &options, true).await;
        assert!(occupied.exists());
    }

    #[tokio::test]
    async fn test_concurrent_runs_use_distinct_workspaces() {
        let h = Harness::new(Behavior::Produce);
        let first = h.input("first.pptx", b"PK first deck");
        let second = h.input("second.pptx", b"PK second deck");
        let first_options = h.options().with_output_name("first");
        let second_options = h.options().with_output_name("second");

        let (a, b) = tokio::join!(
            h.pipeline.convert(&first, TargetFormat::Pdf, &first_options),
            h.pipeline.convert(&second, TargetFormat::Pdf, &second_options),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(std::fs::read(&a.output_path).unwrap(), b"PK first deck");
        assert_eq!(std::fs::read(&b.output_path).unwrap(), b"PK second deck");

        let dirs: Vec<_> = h
            .runner
            .conversions()
            .iter()
            .map(|c| c.outdir().unwrap().parent().unwrap().to_path_buf())
            .collect();
        assert_eq!(dirs.len(), 2);
        assert_ne!(dirs[0], dirs[1]);
        assert_eq!(h.workspaces_left(), 0);
    }

    #[tokio::test]
    async fn test_binary_to_json_decodes_engine_output() {
        let h = Harness::new(Behavior::Write(FLAT_DECK.to_string()));
        let input = h.input("deck.pptx", b"PK\x03\x04");

        let presentation = h.pipeline.binary_to_json(&input).await.unwrap();
        assert_eq!(presentation.title, "Engine deck");
        assert_eq!(presentation.slides.len(), 1);
        match &presentation.slides[0].elements[0] {
            SlideElement::Text(text) => assert_eq!(text.text, "Hello"),
            other => panic!("unexpected {other:?}"),
        }

        let conversion = &h.runner.conversions()[0];
        assert_eq!(conversion.convert_to(), Some("fodp"));
        assert_eq!(h.workspaces_left(), 0);
    }

    #[tokio::test]
    async fn test_binary_to_json_reads_flat_input_directly() {
        let h = Harness::new(Behavior::Produce);
        let input = h.input("deck.fodp", FLAT_DECK.as_bytes());

        let presentation = h.pipeline.binary_to_json(&input).await.unwrap();
        assert_eq!(presentation.slides[0].id, "intro");
        assert!(h.runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_json_to_binary_stages_encoded_document() {
        let h = Harness::new(Behavior::Produce);
        let mut presentation = Presentation::new("From JSON");
        let mut slide = Slide::new("s1");
        slide.add_element(SlideElement::Text(TextElement {
            frame: ElementFrame::new("t1", 10.0, 20.0, 100.0, 50.0),
            text: "Hi & bye".to_string(),
            text_style: None,
        }));
        presentation.add_slide(slide);

        let options = h.options().with_output_name("built");
        let result = h
            .pipeline
            .json_to_binary(&presentation, TargetFormat::Pptx, &options)
            .await
            .unwrap();

        assert_eq!(result.output_path, h.out.join("built.pptx"));
        let staged = std::fs::read_to_string(&result.output_path).unwrap();
        assert!(staged.contains("<dc:title>From JSON</dc:title>"));
        assert!(staged.contains("Hi &amp; bye"));

        let conversion = &h.runner.conversions()[0];
        assert_eq!(conversion.input().unwrap().file_name().unwrap(), "input.fodp");
        assert_eq!(h.workspaces_left(), 0);
    }
}
