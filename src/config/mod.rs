//! Configuration management for `manview.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                        |
//! |-------------|------------------------------------------------|
//! | `[base]`    | Library title                                  |
//! | `[library]` | Manual directory and explicit document entries |
//! | `[viewer]`  | Scroll offsets and timing                      |
//! | `[serve]`   | Document server (port, interface, watch)       |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "Fleet Manuals"
//!
//! [library]
//! dir = "manuals"
//!
//! [[library.documents]]
//! id = "ops"
//! name = "Operations Manual"
//! path = "manuals/ops.html"
//!
//! [serve]
//! port = 5280
//! ```

mod base;
pub mod defaults;
mod error;
mod handle;
mod library;
mod serve;
mod viewer;

pub use base::BaseConfig;
pub use error::ConfigError;
pub use handle::{cfg, init_config, reload_config};
pub use library::{DocumentEntry, LibraryConfig};
pub use serve::ServeConfig;
pub use viewer::ViewerConfig;

use crate::cli::{Cli, Commands};
use crate::document::DocumentSource;
use anyhow::{Result, bail};
use educe::Educe;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    net::IpAddr,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing manview.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ManviewConfig {
    /// CLI arguments reference
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Absolute project root (set after loading)
    #[serde(skip)]
    pub root: Option<PathBuf>,

    #[serde(default)]
    pub base: BaseConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub viewer: ViewerConfig,

    #[serde(default)]
    pub serve: ServeConfig,
}

impl ManviewConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Read, apply CLI overrides and validate.
    ///
    /// A missing config file is only an error for `serve`; the single-document
    /// commands fall back to defaults.
    pub fn load(cli: &'static Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else if cli.is_serve() {
            bail!("Config file not found: {}", config_path.display());
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Resolve a `[[library.documents]]` path: URLs stay as they are,
    /// relative file paths are taken from the root.
    pub fn resolve_source(&self, path: &str) -> DocumentSource {
        match DocumentSource::parse(path) {
            DocumentSource::File(file) if file.is_relative() => {
                DocumentSource::File(self.get_root().join(file))
            }
            source => source,
        }
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &'static Cli) {
        self.cli = Some(cli);

        let root = Self::normalize_path(cli.root.as_deref().unwrap_or(Path::new("./")));
        self.config_path = Self::normalize_path(&root.join(&cli.config));
        self.library.dir = Self::normalize_path(&root.join(&self.library.dir));
        if let Some(dir) = &self.serve.static_dir {
            self.serve.static_dir = Some(Self::normalize_path(&root.join(dir)));
        }
        self.root = Some(root);

        if let Commands::Serve {
            interface,
            port,
            watch,
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.serve.watch, watch.as_ref());
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serve.interface.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "[serve.interface] `{}` is not an IP address",
                self.serve.interface
            )));
        }

        let mut seen = FxHashSet::default();
        for entry in &self.library.documents {
            if entry.id.is_empty() || entry.id.contains(['/', '?', '#']) {
                return Err(ConfigError::Validation(format!(
                    "[[library.documents]] id `{}` must be non-empty and contain no `/`, `?` or `#`",
                    entry.id
                )));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "[[library.documents]] duplicate id `{}`",
                    entry.id
                )));
            }
        }

        if let Some(dir) = &self.serve.static_dir
            && self.cli.is_some_and(Cli::is_serve)
            && !dir.is_dir()
        {
            return Err(ConfigError::Validation(format!(
                "[serve.static_dir] `{}` is not a directory",
                dir.display()
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
