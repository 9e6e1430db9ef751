//! Engine capability probe.
//!
//! Candidates are probed once, in order, with `--version`; the first that
//! starts and exits cleanly is cached for the locator's lifetime.

use crate::runner::EngineRunner;
use deck_core::{Error, LogConfig, Result};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Binary names tried when none are configured.
pub const DEFAULT_CANDIDATES: &[&str] = &["soffice", "libreoffice"];

/// Which engine binaries to try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub candidates: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_CANDIDATES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl EngineConfig {
    /// Try `binary` before the default candidates.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        let binary = binary.into();
        self.candidates.retain(|c| *c != binary);
        self.candidates.insert(0, binary);
        self
    }
}

pub struct EngineLocator {
    config: EngineConfig,
    runner: Arc<dyn EngineRunner>,
    resolved: OnceCell<String>,
    log: LogConfig,
}

impl EngineLocator {
    pub fn new(config: EngineConfig, runner: Arc<dyn EngineRunner>, log: LogConfig) -> Self {
        Self {
            config,
            runner,
            resolved: OnceCell::new(),
            log,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The usable engine binary. Probes on first call only; a failed probe
    /// is not cached, so a later call probes again.
    pub async fn resolve(&self) -> Result<&str> {
        let binary = self.resolved.get_or_try_init(|| self.probe()).await?;
        Ok(binary.as_str())
    }

    async fn probe(&self) -> Result<String> {
        let version = vec!["--version".to_string()];
        for candidate in &self.config.candidates {
            match self.runner.run(candidate, &version).await {
                Ok(output) if output.success() => {
                    self.log.info(format_args!(
                        "Using rendering engine {} ({})",
                        candidate,
                        output.stdout.trim()
                    ));
                    return Ok(candidate.clone());
                }
                Ok(output) => {
                    self.log.debug(format_args!(
                        "{} --version exited with {:?}",
                        candidate, output.exit_code
                    ));
                }
                Err(e) => {
                    self.log
                        .debug(format_args!("{} is not runnable: {}", candidate, e));
                }
            }
        }

        Err(Error::EngineNotFound(format!(
            "none of [{}] could be started",
            self.config.candidates.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;
    use deck_core::ErrorKind;

    #[test]
    fn test_with_binary_moves_to_front() {
        let config = EngineConfig::default().with_binary("libreoffice");
        assert_eq!(config.candidates, vec!["libreoffice", "soffice"]);

        let config = EngineConfig::default().with_binary("/opt/office/soffice");
        assert_eq!(config.candidates[0], "/opt/office/soffice");
        assert_eq!(config.candidates.len(), 3);
    }

    #[tokio::test]
    async fn test_first_runnable_candidate_wins() {
        let runner = Arc::new(ScriptedRunner::new().with_installed(&["libreoffice"]));
        let locator = EngineLocator::new(EngineConfig::default(), runner.clone(), LogConfig::silent());

        assert_eq!(locator.resolve().await.unwrap(), "libreoffice");
        let probed: Vec<_> = runner.calls().into_iter().map(|c| c.program).collect();
        assert_eq!(probed, vec!["soffice", "libreoffice"]);
    }

    #[tokio::test]
    async fn test_result_is_cached() {
        let runner = Arc::new(ScriptedRunner::new());
        let locator = EngineLocator::new(EngineConfig::default(), runner.clone(), LogConfig::silent());

        locator.resolve().await.unwrap();
        locator.resolve().await.unwrap();
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_no_candidate_is_engine_not_found() {
        let runner = Arc::new(ScriptedRunner::new().with_installed(&[]));
        let locator = EngineLocator::new(EngineConfig::default(), runner.clone(), LogConfig::silent());

        let err = locator.resolve().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EngineNotFound);
        assert!(err.to_string().contains("soffice, libreoffice"));
    }
}
