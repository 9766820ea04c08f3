use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use depot_constants::{
    CONFIG_FILE, DEFAULT_INSTALL_DIR, MAX_CONCURRENCY, MIN_CONCURRENCY, REGISTRY_ENV,
    REGISTRY_URL, REQUEST_TIMEOUT_SECS,
};
use depot_error::{DepotError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig {
    pub registry: String,
    pub install_dir: PathBuf,
    /// Upper bound on in-flight registry requests, per stage.
    pub concurrency: usize,
    pub timeout: Duration,
    /// Remove an already installed package directory instead of failing.
    pub force: bool,
    /// Fetch the root package itself, not just what it depends on.
    pub include_root: bool,
}

/// Shape of `.depotrc`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigFile {
    registry: Option<String>,
    install_dir: Option<PathBuf>,
    concurrency: Option<usize>,
    timeout_secs: Option<u64>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            registry: REGISTRY_URL.to_string(),
            install_dir: PathBuf::from(DEFAULT_INSTALL_DIR),
            concurrency: default_concurrency(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            force: false,
            include_root: true,
        }
    }
}

impl InstallConfig {
    /// Defaults, then `<project_dir>/.depotrc`, then the environment.
    /// CLI flags are applied by the caller on top of this.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let mut config = Self::default();

        let rc_path = project_dir.join(CONFIG_FILE);
        if rc_path.is_file() {
            config.apply_file(&rc_path)?;
        }
        config.apply_registry_override(std::env::var(REGISTRY_ENV).ok());

        config.validate()?;
        Ok(config)
    }

    pub fn apply_file(&mut self, path: &Path) -> Result<()> {
        let raw = fs::read_to_string(path).map_err(|e| DepotError::io(path, e))?;
        let file: ConfigFile = serde_json::from_str(&raw)
            .map_err(|e| DepotError::Config(format!("{}: {e}", path.display())))?;

        if let Some(registry) = file.registry {
            self.registry = registry;
        }
        if let Some(install_dir) = file.install_dir {
            self.install_dir = install_dir;
        }
        if let Some(concurrency) = file.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        Ok(())
    }

    pub fn apply_registry_override(&mut self, registry: Option<String>) {
        if let Some(registry) = registry.filter(|r| !r.trim().is_empty()) {
            self.registry = registry.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.registry.starts_with("http://") || self.registry.starts_with("https://")) {
            return Err(DepotError::Config(format!(
                "registry must be an http(s) URL, got '{}'",
                self.registry
            )));
        }
        if !(1..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(DepotError::Config(format!(
                "concurrency must be between 1 and {MAX_CONCURRENCY}, got {}",
                self.concurrency
            )));
        }
        if self.timeout.is_zero() {
            return Err(DepotError::Config("timeout must be at least 1 second".into()));
        }
        Ok(())
    }
}

/// Four requests per logical core, clamped to a sane range.
#[must_use]
pub fn default_concurrency() -> usize {
    (num_cpus::get() * 4).clamp(MIN_CONCURRENCY, MAX_CONCURRENCY)
}
