//! `[tools]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [tools]
//! pdflatex = "pdflatex"
//! pdf2svg = "~/bin/pdf2svg"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// LaTeX compiler producing the intermediate PDF.
    pub pdflatex: PathBuf,

    /// PDF to SVG converter, invoked as `pdf2svg <in.pdf> <out.svg>`.
    pub pdf2svg: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            pdflatex: PathBuf::from("pdflatex"),
            pdf2svg: PathBuf::from("pdf2svg"),
        }
    }
}

impl ToolsConfig {
    /// Expand `~` and resolve paths containing a separator against `root`.
    ///
    /// Bare program names are left alone so they are looked up on `PATH`.
    pub fn normalize(&mut self, root: &Path) {
        self.pdflatex = resolve_tool(&self.pdflatex, root);
        self.pdf2svg = resolve_tool(&self.pdf2svg, root);
    }

    /// Missing tools only warn: the build still runs and reports each
    /// failing diagram.
    pub fn validate(&self, diag: &mut crate::config::ConfigDiagnostics) {
        if which::which(&self.pdflatex).is_err() {
            diag.warn_with_hint(
                "tools.pdflatex",
                format!("`{}` not found", self.pdflatex.display()),
                "install a TeX distribution (e.g. TeX Live) or set tools.pdflatex",
            );
        }
        if which::which(&self.pdf2svg).is_err() {
            diag.warn_with_hint(
                "tools.pdf2svg",
                format!("`{}` not found", self.pdf2svg.display()),
                "install pdf2svg or set tools.pdf2svg to its path",
            );
        }
    }
}

fn resolve_tool(tool: &Path, root: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(&tool.to_string_lossy()).into_owned();
    let path = PathBuf::from(expanded);
    if path.is_relative() && path.components().count() > 1 {
        root.join(path)
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.tools.pdflatex, PathBuf::from("pdflatex"));
        assert_eq!(config.tools.pdf2svg, PathBuf::from("pdf2svg"));
    }

    #[test]
    fn test_bare_name_kept() {
        assert_eq!(
            resolve_tool(Path::new("pdf2svg"), Path::new("/site")),
            PathBuf::from("pdf2svg")
        );
    }

    #[test]
    fn test_relative_path_joined_to_root() {
        assert_eq!(
            resolve_tool(Path::new("bin/pdf2svg"), Path::new("/site")),
            PathBuf::from("/site/bin/pdf2svg")
        );
    }

    #[test]
    fn test_missing_tool_warns() {
        let tools = ToolsConfig {
            pdflatex: PathBuf::from("tikzpress-missing-latex"),
            pdf2svg: PathBuf::from("tikzpress-missing-pdf2svg"),
        };
        let mut diag = crate::config::ConfigDiagnostics::new();
        tools.validate(&mut diag);
        assert_eq!(diag.warnings().len(), 2);
        assert!(diag.into_result().is_ok());
    }
}
