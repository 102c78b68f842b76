//! Configuration management for `tikzpress.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [paths], [tools], [build]
//! ├── error.rs       # ConfigError, ConfigDiagnostics
//! ├── util.rs        # config file discovery
//! └── mod.rs         # Config (this file)
//! ```
//!
//! All paths are resolved against the directory holding the config file, or
//! against the working directory when no config file exists.

mod error;
mod section;
mod util;

pub use error::{ConfigDiagnostics, ConfigError};
pub use section::{BuildConfig, PathsConfig, ToolsConfig};

use crate::{diagram::CompilerSettings, log, utils::path::normalize_path};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use util::find_config_file;

/// Default config file name.
pub const CONFIG_FILE: &str = "tikzpress.toml";

/// Root configuration structure representing `tikzpress.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Absolute path to the config file, if one was found
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Project root directory - parent of config file
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub build: BuildConfig,
}

impl Config {
    /// Load configuration, searching upward from the current directory.
    pub fn load(config_name: &Path) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        Self::load_from(config_name, &cwd)
    }

    /// Load configuration, searching upward from `start`.
    ///
    /// Without a config file the defaults apply and `start` becomes the root.
    pub fn load_from(config_name: &Path, start: &Path) -> Result<Self> {
        let (mut config, root) = match find_config_file(config_name, start) {
            Some(path) => {
                let config = Self::from_path(&path)?;
                let path = normalize_path(&path);
                let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
                (
                    Self {
                        config_path: Some(path),
                        ..config
                    },
                    root,
                )
            }
            None => {
                crate::debug!("config"; "{} not found, using defaults", config_name.display());
                (Self::default(), start.to_path_buf())
            }
        };

        if let Some(path) = &config.config_path {
            crate::debug!("config"; "using {}", path.display());
        }
        config.validate()?;
        config.finalize(&root);
        config.check_tools();
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Resolve all paths against `root`.
    ///
    /// The public base is fixed first because its default comes from the
    /// relative `paths.output` as written.
    fn finalize(&mut self, root: &Path) {
        let root = normalize_path(root);

        self.paths.public = Some(self.paths.public_base());
        self.paths.tmp = root.join(&self.paths.tmp);
        self.paths.output = root.join(&self.paths.output);
        self.build.content = root.join(&self.build.content);
        self.build.dest = root.join(&self.build.dest);
        self.tools.normalize(&root);

        self.root = root;
    }

    /// Validate paths as written, returning all errors at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.paths.validate(&mut diag);
        self.build.validate(&mut diag);

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    /// Warn about tools missing from `PATH`. Runs after `finalize` so
    /// relative tool paths are already resolved.
    fn check_tools(&self) {
        let mut diag = ConfigDiagnostics::new();
        self.tools.validate(&mut diag);
        diag.print_warnings();
    }

    /// Settings handed to the diagram compiler.
    pub fn compiler_settings(&self) -> CompilerSettings {
        CompilerSettings {
            tmp_root: self.paths.tmp.clone(),
            output_root: self.paths.output.clone(),
            public_base: self.paths.public_base(),
            pdflatex: self.tools.pdflatex.clone(),
            pdf2svg: self.tools.pdf2svg.clone(),
        }
    }

    /// Get path relative to the project root, for display.
    pub fn root_relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Parse config, panicking on unknown fields (to catch typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> Config {
    let (parsed, ignored) = Config::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
