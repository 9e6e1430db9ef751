//! CLI for converting presentations with a headless office engine.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deck_core::adapter::{self, NestedPresentation};
use deck_core::{ConversionOptions, LogConfig, Presentation, TargetFormat};
use deck_engine::{ConversionPipeline, EngineConfig};
use log::LevelFilter;
use std::fs;
use std::path::{Path, PathBuf};

/// Convert presentations between binary formats and a JSON document model.
#[derive(Parser, Debug)]
#[command(name = "deck-convert")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine binary to try before soffice and libreoffice
    #[arg(long, global = true)]
    engine: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a presentation to another format
    Convert {
        /// Input presentation (.pptx, .ppt, .odp or .fodp)
        input: PathBuf,

        /// Target format: html, pdf, fodp, pptx or odp
        #[arg(long = "to")]
        to: TargetFormat,

        #[command(flatten)]
        output: OutputArgs,

        /// Keep the temporary workspace for debugging
        #[arg(long)]
        keep_temp: bool,
    },

    /// Decode a presentation into JSON
    ToJson {
        /// Input presentation (.pptx, .ppt, .odp or .fodp)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit the editor's nested-position schema
        #[arg(long)]
        nested: bool,
    },

    /// Build a presentation from JSON
    FromJson {
        /// JSON document
        input: PathBuf,

        /// Target format: html, pdf, fodp, pptx or odp
        #[arg(long = "to")]
        to: TargetFormat,

        #[command(flatten)]
        output: OutputArgs,

        /// Read the editor's nested-position schema
        #[arg(long)]
        nested: bool,
    },

    /// Check that a rendering engine is available
    Probe,
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output file name without extension
    #[arg(long)]
    name: Option<String>,
}

impl OutputArgs {
    fn options(&self, log: LogConfig) -> ConversionOptions {
        let mut options = ConversionOptions::new().with_log(log);
        if let Some(dir) = &self.output {
            options = options.with_output_dir(dir);
        }
        if let Some(name) = &self.name {
            options = options.with_output_name(name);
        }
        options
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .init();
    let log = LogConfig::new(level);

    let mut config = EngineConfig::default();
    if let Some(engine) = &args.engine {
        config = config.with_binary(engine);
    }
    let pipeline = ConversionPipeline::new(config, log);

    match &args.command {
        Command::Convert {
            input,
            to,
            output,
            keep_temp,
        } => {
            let options = output.options(log).with_keep_temp_files(*keep_temp);
            let result = pipeline
                .convert(input, *to, &options)
                .await
                .with_context(|| format!("Failed to convert {}", input.display()))?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::ToJson {
            input,
            output,
            nested,
        } => {
            let presentation = pipeline
                .binary_to_json(input)
                .await
                .with_context(|| format!("Failed to decode {}", input.display()))?;
            let json = render_json(&presentation, *nested)?;
            match output {
                Some(path) => fs::write(path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{}", json),
            }
        }
        Command::FromJson {
            input,
            to,
            output,
            nested,
        } => {
            let presentation = read_json(input, *nested)?;
            if *to == TargetFormat::Fodp {
                let path = flat_output_path(input, output)?;
                deck_fodp::write_presentation(&presentation, &path, log)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("{}", path.display());
            } else {
                let mut options = output.options(log);
                if options.output_dir.is_none() {
                    options = options.with_output_dir(parent_dir(input));
                }
                let result = pipeline
                    .json_to_binary(&presentation, *to, &options)
                    .await
                    .with_context(|| format!("Failed to build {} from {}", to, input.display()))?;
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        }
        Command::Probe => {
            let engine = pipeline
                .ensure_engine()
                .await
                .context("No rendering engine available")?;
            println!("{}", engine);
        }
    }

    Ok(())
}

fn render_json(presentation: &Presentation, nested: bool) -> Result<String> {
    let json = if nested {
        serde_json::to_string_pretty(&adapter::to_nested(presentation))?
    } else {
        serde_json::to_string_pretty(presentation)?
    };
    Ok(json)
}

fn read_json(path: &Path, nested: bool) -> Result<Presentation> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let presentation = if nested {
        let nested: NestedPresentation = serde_json::from_str(&text)
            .with_context(|| format!("Invalid nested presentation JSON in {}", path.display()))?;
        adapter::from_nested(nested)
    } else {
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid presentation JSON in {}", path.display()))?
    };
    Ok(presentation)
}

/// Where `from-json --to fodp` writes, without going through the engine.
fn flat_output_path(input: &Path, output: &OutputArgs) -> Result<PathBuf> {
    let dir = match &output.output {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.clone()
        }
        None => parent_dir(input),
    };
    let stem = match &output.name {
        Some(name) => name.clone(),
        None => input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("presentation")
            .to_string(),
    };
    Ok(dir.join(format!("{}.fodp", stem)))
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
