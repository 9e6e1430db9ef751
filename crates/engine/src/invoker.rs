//! Headless engine invocation and output discovery.

use crate::runner::EngineRunner;
use deck_core::{Error, LogConfig, Result, TargetFormat};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The produced file inside the output directory.
    pub output_path: PathBuf,
    pub stdout: String,
    pub exit_code: i32,
    /// Export filter of the attempt that produced the output.
    pub filter: Option<&'static str>,
}

pub struct EngineInvoker {
    runner: Arc<dyn EngineRunner>,
    log: LogConfig,
}

impl EngineInvoker {
    pub fn new(runner: Arc<dyn EngineRunner>, log: LogConfig) -> Self {
        Self { runner, log }
    }

    /// Convert `input` into `output_dir` with the engine binary `engine`.
    ///
    /// Tries the format's primary filter, then its fallback filter once if
    /// the first attempt exited cleanly but left no output. Engine failures
    /// are never retried.
    pub async fn invoke(
        &self,
        engine: &str,
        input: &Path,
        output_dir: &Path,
        format: TargetFormat,
    ) -> Result<Invocation> {
        let mut attempts = vec![format.primary_filter()];
        if let Some(fallback) = format.fallback_filter() {
            attempts.push(Some(fallback));
        }

        for filter in attempts {
            let args = build_args(input, output_dir, format, filter);
            self.log
                .debug(format_args!("Running {} {}", engine, args.join(" ")));

            let output = self
                .runner
                .run(engine, &args)
                .await
                .map_err(|e| Error::EngineNotFound(format!("{}: {}", engine, e)))?;

            if !output.success() {
                return Err(Error::EngineInvocationFailed {
                    exit_code: output.exit_code,
                    stderr: output.stderr.trim().to_string(),
                });
            }

            if let Some(output_path) = find_output(output_dir, input, format).await? {
                self.log
                    .info(format_args!("Engine produced {}", output_path.display()));
                return Ok(Invocation {
                    output_path,
                    stdout: output.stdout,
                    exit_code: 0,
                    filter,
                });
            }

            self.log.warn(format_args!(
                "No {} output with filter {}",
                format,
                filter.unwrap_or("(default)")
            ));
        }

        Err(Error::OutputMissing {
            format: format.extension().to_string(),
            dir: output_dir.to_path_buf(),
            listing: list_dir(output_dir).await?,
        })
    }
}

/// `--headless --convert-to <ext>[:<filter>] --outdir <dir> <input>`
pub fn build_args(
    input: &Path,
    output_dir: &Path,
    format: TargetFormat,
    filter: Option<&str>,
) -> Vec<String> {
    let convert_to = match filter {
        Some(filter) => format!("{}:{}", format.extension(), filter),
        None => format.extension().to_string(),
    };
    vec![
        "--headless".to_string(),
        "--convert-to".to_string(),
        convert_to,
        "--outdir".to_string(),
        output_dir.display().to_string(),
        input.display().to_string(),
    ]
}

/// Find the engine's output for `input` in `dir`.
///
/// `<stem>.<ext>` is preferred, then any other file with that extension;
/// the alternate extension (if the format has one) is searched the same way
/// only when the primary extension finds nothing.
pub async fn find_output(
    dir: &Path,
    input: &Path,
    format: TargetFormat,
) -> Result<Option<PathBuf>> {
    let listing = list_dir(dir).await?;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let input_name = input.file_name().map(|n| n.to_string_lossy().into_owned());

    let extensions = std::iter::once(format.extension()).chain(format.alternate_extension());
    for ext in extensions {
        let exact = format!("{}.{}", stem, ext);
        if listing.contains(&exact) && Some(&exact) != input_name.as_ref() {
            return Ok(Some(dir.join(exact)));
        }

        let suffix = format!(".{}", ext);
        let other = listing.iter().find(|name| {
            name.to_ascii_lowercase().ends_with(&suffix) && Some(*name) != input_name.as_ref()
        });
        if let Some(name) = other {
            return Ok(Some(dir.join(name)));
        }
    }
    Ok(None)
}

/// Sorted file names in `dir`; a missing directory lists as empty.
async fn list_dir(dir: &Path) -> Result<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
