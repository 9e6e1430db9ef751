//! Scripted stand-in for the rendering engine.

use crate::runner::{EngineRunner, ProcessOutput};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// What the fake engine does when asked to convert.
#[derive(Debug, Clone)]
pub(crate) enum Behavior {
    /// Write `<stem>.<ext>` holding the input's bytes.
    Produce,
    /// Write `<stem>.<ext>` with fixed content.
    Write(String),
    /// Produce only when the `--convert-to` filter equals this one.
    ProduceWithFilter(&'static str),
    /// Write `<stem>.htm` instead of `<stem>.html`.
    ProduceAlternate,
    /// Write the markup plus a `<stem>_html_files` resource directory.
    ProduceWithResources(Vec<(&'static str, &'static str)>),
    /// Exit cleanly without writing anything.
    NoOutput,
    Exit(i32, &'static str),
    SpawnFailure,
}

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub program: String,
    pub args: Vec<String>,
}

impl Call {
    pub fn is_probe(&self) -> bool {
        self.args.iter().any(|a| a == "--version")
    }

    fn value_after(&self, flag: &str) -> Option<&str> {
        let at = self.args.iter().position(|a| a == flag)?;
        self.args.get(at + 1).map(String::as_str)
    }

    pub fn convert_to(&self) -> Option<&str> {
        self.value_after("--convert-to")
    }

    pub fn outdir(&self) -> Option<PathBuf> {
        self.value_after("--outdir").map(PathBuf::from)
    }

    pub fn input(&self) -> Option<PathBuf> {
        self.args.last().map(PathBuf::from)
    }
}

pub(crate) struct ScriptedRunner {
    installed: Option<Vec<String>>,
    behavior: Behavior,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedRunner {
    /// Every binary answers `--version`; conversions produce output.
    pub fn new() -> Self {
        Self {
            installed: None,
            behavior: Behavior::Produce,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_installed(mut self, binaries: &[&str]) -> Self {
        self.installed = Some(binaries.iter().map(|b| b.to_string()).collect());
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn conversions(&self) -> Vec<Call> {
        self.calls().into_iter().filter(|c| !c.is_probe()).collect()
    }

    fn is_installed(&self, program: &str) -> bool {
        match &self.installed {
            Some(list) => list.iter().any(|b| b == program),
            None => true,
        }
    }

    fn convert(&self, call: &Call) -> io::Result<ProcessOutput> {
        let convert_to = call.convert_to().unwrap_or_default().to_string();
        let (ext, filter) = match convert_to.split_once(':') {
            Some((ext, filter)) => (ext.to_string(), Some(filter.to_string())),
            None => (convert_to.clone(), None),
        };
        let outdir = call.outdir().unwrap();
        let input = call.input().unwrap();
        let stem = input.file_stem().unwrap().to_string_lossy().into_owned();
        let target = outdir.join(format!("{}.{}", stem, ext));

        match &self.behavior {
            Behavior::Produce => {
                std::fs::copy(&input, &target)?;
            }
            Behavior::Write(content) => {
                std::fs::write(&target, content)?;
            }
            Behavior::ProduceWithFilter(wanted) => {
                if filter.as_deref() == Some(*wanted) {
                    std::fs::copy(&input, &target)?;
                }
            }
            Behavior::ProduceAlternate => {
                std::fs::write(outdir.join(format!("{}.htm", stem)), "<html></html>")?;
            }
            Behavior::ProduceWithResources(resources) => {
                std::fs::write(&target, "<html><img src=\"img0.png\"></html>")?;
                write_resources(&outdir.join(format!("{}_html_files", stem)), resources)?;
            }
            Behavior::NoOutput => {}
            Behavior::Exit(code, stderr) => {
                return Ok(ProcessOutput {
                    exit_code: Some(*code),
                    stdout: String::new(),
                    stderr: stderr.to_string(),
                });
            }
            Behavior::SpawnFailure => {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such file"));
            }
        }

        Ok(ProcessOutput {
            exit_code: Some(0),
            stdout: format!("convert {} -> {}", input.display(), target.display()),
            stderr: String::new(),
        })
    }
}

fn write_resources(dir: &Path, resources: &[(&str, &str)]) -> io::Result<()> {
    for (name, content) in resources {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
    }
    Ok(())
}

#[async_trait]
impl EngineRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> io::Result<ProcessOutput> {
        let call = Call {
            program: program.to_string(),
            args: args.to_vec(),
        };
        self.calls.lock().unwrap().push(call.clone());

        if call.is_probe() {
            return if self.is_installed(program) {
                Ok(ProcessOutput {
                    exit_code: Some(0),
                    stdout: format!("{} 7.6.4.1", program),
                    stderr: String::new(),
                })
            } else {
                Err(io::Error::new(io::ErrorKind::NotFound, "not installed"))
            };
        }
        self.convert(&call)
    }
}
