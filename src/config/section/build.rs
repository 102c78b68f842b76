//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! content = "content"      # pages scanned for diagram tags
//! dest = "_site"           # expanded pages are written here
//! page_id = "basename"     # basename | path
//! fail_on_error = false    # exit non-zero when a diagram fails to build
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::diagram::PageIdStyle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory of source pages.
    pub content: PathBuf,

    /// Directory receiving expanded pages.
    pub dest: PathBuf,

    /// How a page URL maps to its diagram directory.
    pub page_id: PageIdStyle,

    /// Treat a failed diagram as a build failure.
    /// With `false` the page still references the (missing) SVG.
    pub fail_on_error: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content: PathBuf::from("content"),
            dest: PathBuf::from("_site"),
            page_id: PageIdStyle::Basename,
            fail_on_error: false,
        }
    }
}

impl BuildConfig {
    pub fn validate(&self, diag: &mut crate::config::ConfigDiagnostics) {
        if self.content == self.dest {
            diag.error("build.dest", "must differ from `build.content`");
        }
    }
}
