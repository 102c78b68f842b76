//! `clean`: remove intermediates, and with `--all` the generated SVGs.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cache::clear_dir;
use crate::config::Config;
use crate::log;

pub fn clean(config: &Config, all: bool) -> Result<()> {
    let mut dirs = vec![config.paths.tmp.as_path()];
    if all {
        dirs.push(config.paths.output.as_path());
    }

    let removed = remove_dirs(&dirs)?;
    if removed.is_empty() {
        log!("clean"; "nothing to remove");
    }
    for dir in removed {
        log!("clean"; "removed {}", config.root_relative(dir).display());
    }
    Ok(())
}

/// Remove each existing directory, returning the ones removed.
fn remove_dirs<'a>(dirs: &[&'a Path]) -> Result<Vec<&'a Path>> {
    let mut removed = Vec::new();
    for &dir in dirs {
        if clear_dir(dir).with_context(|| format!("Failed to remove {}", dir.display()))? {
            removed.push(dir);
        }
    }
    Ok(removed)
}
