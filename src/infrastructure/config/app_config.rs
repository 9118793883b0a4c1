//! Application configuration.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::args::CliArgs;
use crate::domain::entities::{ApiKey, BannerSettings, ProviderKind};

pub(crate) const APP_NAME: &str = "notebanner";
pub(crate) const APP_QUALIFIER: &str = "com";
pub(crate) const APP_ORGANIZATION: &str = "notebanner";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Provider order and credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Providers in the order they are tried.
    #[serde(default = "default_priority")]
    pub priority: Vec<ProviderKind>,

    /// Pexels API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pexels: Option<String>,

    /// Pixabay API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixabay: Option<String>,

    /// Flickr API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flickr: Option<String>,

    /// Unsplash access key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsplash: Option<String>,
}

fn default_priority() -> Vec<ProviderKind> {
    ProviderKind::ALL.to_vec()
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            priority: default_priority(),
            pexels: None,
            pixabay: None,
            flickr: None,
            unsplash: None,
        }
    }
}

impl ProvidersConfig {
    fn slot(&mut self, kind: ProviderKind) -> &mut Option<String> {
        match kind {
            ProviderKind::Pexels => &mut self.pexels,
            ProviderKind::Pixabay => &mut self.pixabay,
            ProviderKind::Flickr => &mut self.flickr,
            ProviderKind::Unsplash => &mut self.unsplash,
        }
    }

    /// Returns the configured key for a provider. Blank keys count as missing.
    #[must_use]
    pub fn api_key(&self, kind: ProviderKind) -> Option<ApiKey> {
        let raw = match kind {
            ProviderKind::Pexels => &self.pexels,
            ProviderKind::Pixabay => &self.pixabay,
            ProviderKind::Flickr => &self.flickr,
            ProviderKind::Unsplash => &self.unsplash,
        };
        raw.as_deref().and_then(ApiKey::new)
    }

    /// Replaces keys with non-blank values from `lookup`, keyed by each
    /// provider's environment variable name.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for kind in ProviderKind::ALL {
            if let Some(value) = lookup(kind.env_var()).filter(|v| !v.trim().is_empty()) {
                debug!(provider = %kind, var = kind.env_var(), "API key taken from environment");
                *self.slot(kind) = Some(value);
            }
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Provider order and credentials.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Banner resolution and caching.
    #[serde(default)]
    pub banner: BannerSettings,
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(priority) = &args.providers {
            self.providers.priority.clone_from(priority);
        }
        if let Some(rate_limit_ms) = args.rate_limit_ms {
            self.banner.rate_limit_ms = rate_limit_ms;
        }
        if let Some(verify) = args.verify_images {
            self.banner.verify_images = verify;
        }
    }

    /// Applies provider keys from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.providers.apply_env(|name| std::env::var(name).ok());
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns the project data directory.
    #[must_use]
    pub fn default_data_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }

    /// Returns the log file path, if logging to a file was configured.
    /// Relative paths are placed under the project data directory.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        let path = self.log_path.as_ref()?;
        if path.is_absolute() {
            return Some(path.clone());
        }
        Some(Self::default_data_dir().map_or_else(|| path.clone(), |dir| dir.join(path)))
    }
}
