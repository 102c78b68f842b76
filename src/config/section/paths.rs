//! `[paths]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! tmp = "_tikz_tmp"   # .tex/.pdf intermediates and the cache index
//! output = "svg"      # generated .svg artifacts
//! public = "/svg"     # URL prefix used in <embed src="...">
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Component, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root for intermediate `.tex`/`.pdf` files.
    pub tmp: PathBuf,

    /// Root for `.svg` artifacts.
    pub output: PathBuf,

    /// Public URL prefix of the artifact root.
    /// Defaults to `/` + the configured `output` path.
    pub public: Option<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            tmp: PathBuf::from("_tikz_tmp"),
            output: PathBuf::from("svg"),
            public: None,
        }
    }
}

impl PathsConfig {
    /// Public base URL with a leading slash and no trailing slash.
    ///
    /// Must be called before `output` is made absolute: the default is
    /// derived from the path as written in the config.
    pub fn public_base(&self) -> String {
        let raw = match &self.public {
            Some(public) => public.clone(),
            None if self.output.is_absolute() => self
                .output
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            None => self
                .output
                .components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("/"),
        };

        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }

    /// Validate path settings.
    pub fn validate(&self, diag: &mut crate::config::ConfigDiagnostics) {
        if self.output.as_os_str().is_empty() {
            diag.error("paths.output", "artifact directory must not be empty");
        }
        if self.tmp.as_os_str().is_empty() {
            diag.error("paths.tmp", "intermediate directory must not be empty");
        }
        if !self.output.as_os_str().is_empty() && self.output == self.tmp {
            diag.error("paths.tmp", "must differ from `paths.output`");
        }
    }
}
