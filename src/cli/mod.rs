//! Command-line interface module.

mod args;
pub mod build;
pub mod clean;
pub mod render;

pub use args::{Cli, Commands, RenderArgs};

use std::path::Path;

use jwalk::WalkDir;

use crate::config::Config;
use crate::diagram::{RenderOutcome, RenderStatus, page_id_from_url};
use crate::utils::path::to_url_path;

const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Collect all files from a directory recursively, sorted for stable output.
pub fn collect_all_files(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut files: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(|e| e.path())
        .collect();
    files.sort();
    files
}

/// Page id for `file`: from `url` when given, else from the file's path
/// relative to the content directory.
pub fn page_id_for(config: &Config, file: &Path, url: Option<&str>) -> String {
    let url = match url {
        Some(url) => url.to_string(),
        None => {
            let relative = file
                .strip_prefix(&config.build.content)
                .ok()
                .or_else(|| file.file_name().map(Path::new))
                .unwrap_or(file);
            to_url_path(relative)
        }
    };
    page_id_from_url(&url, config.build.page_id)
}

/// Per-status diagram counts of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub built: usize,
    pub cached: usize,
    pub failed: usize,
}

impl Summary {
    pub fn add(&mut self, outcomes: &[RenderOutcome]) {
        for outcome in outcomes {
            match outcome.status {
                RenderStatus::Cached => self.cached += 1,
                RenderStatus::Built { .. } => self.built += 1,
                RenderStatus::Failed(_) => self.failed += 1,
            }
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            built: self.built + other.built,
            cached: self.cached + other.cached,
            failed: self.failed + other.failed,
        }
    }

    pub fn total(&self) -> usize {
        self.built + self.cached + self.failed
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} built, {} cached, {} failed",
            self.built, self.cached, self.failed
        )
    }
}

/// Turn failed diagrams into an error when `build.fail_on_error` is set.
pub fn check_failures(config: &Config, summary: &Summary) -> anyhow::Result<()> {
    if summary.failed > 0 && config.build.fail_on_error {
        anyhow::bail!(
            "{} failed to build",
            crate::utils::plural_count(summary.failed, "diagram")
        );
    }
    Ok(())
}
