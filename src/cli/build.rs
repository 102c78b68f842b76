//! `build`: expand every page of the content directory.
//!
//! Pages are processed in parallel. Files with diagram tags are written
//! expanded, all other files are copied unchanged, both to the same relative
//! path under the destination directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use parking_lot::Mutex;
use rayon::prelude::*;

use super::{Summary, check_failures, collect_all_files, page_id_for};
use crate::cache::clear_dir;
use crate::config::Config;
use crate::diagram::{DiagramCompiler, ProcessRunner};
use crate::logger::ProgressLine;
use crate::utils::plural_count;
use crate::{debug, log, tag};

/// Build all pages and print the summary.
pub fn build_pages(config: &Config, clean: bool) -> Result<()> {
    if clean {
        clean_tmp(config)?;
    }

    let compiler = DiagramCompiler::new(config.compiler_settings());
    let summary = build_with(config, &compiler, true)?;

    log!(
        "done";
        "{} ({})",
        plural_count(summary.total(), "diagram"),
        summary
    );
    check_failures(config, &summary)
}

fn clean_tmp(config: &Config) -> Result<()> {
    let tmp = &config.paths.tmp;
    if clear_dir(tmp).with_context(|| format!("Failed to clear {}", tmp.display()))? {
        debug!("build"; "cleared {}", config.root_relative(tmp).display());
    }
    Ok(())
}

/// Expand the content directory into the destination with `compiler`.
///
/// The cache index is saved even when a page fails.
fn build_with<R: ProcessRunner>(
    config: &Config,
    compiler: &DiagramCompiler<R>,
    show_progress: bool,
) -> Result<Summary> {
    let content = &config.build.content;
    if !content.is_dir() {
        return Err(anyhow!(
            "content directory not found: {}",
            content.display()
        ));
    }

    let files = collect_all_files(content);
    let progress = show_progress.then(|| ProgressLine::new(&[("pages", files.len())]));
    let summary = Mutex::new(Summary::default());

    let result = files.par_iter().try_for_each(|file| {
        let page_summary =
            build_file(config, compiler, file).with_context(|| format!("{}", file.display()))?;
        if let Some(p) = &progress {
            p.inc("pages");
        }
        let mut total = summary.lock();
        *total = total.merge(page_summary);
        Ok::<_, anyhow::Error>(())
    });

    if let Some(p) = progress {
        p.finish();
    }
    if let Err(e) = compiler.persist() {
        log!("warning"; "failed to save cache index: {}", e);
    }
    debug!("build"; "{} diagrams indexed", compiler.cache().len());

    result?;
    Ok(summary.into_inner())
}

/// Expand or copy one file. Returns the diagram counts of the page.
fn build_file<R: ProcessRunner>(
    config: &Config,
    compiler: &DiagramCompiler<R>,
    file: &Path,
) -> Result<Summary> {
    let dest = dest_path(config, file);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    // Binary files and pages without tags go through untouched
    let text = match fs::read_to_string(file) {
        Ok(text) if tag::contains_tags(&text) => text,
        _ => {
            fs::copy(file, &dest).with_context(|| format!("Failed to copy to {}", dest.display()))?;
            return Ok(Summary::default());
        }
    };

    let page_id = page_id_for(config, file, None);
    let expansion = tag::expand(&text, &page_id, compiler)?;
    fs::write(&dest, &expansion.text)
        .with_context(|| format!("Failed to write {}", dest.display()))?;

    let mut summary = Summary::default();
    summary.add(&expansion.outcomes);
    debug!("build"; "{} -> {} ({})", page_id, config.root_relative(&dest).display(), summary);
    Ok(summary)
}

fn dest_path(config: &Config, file: &Path) -> PathBuf {
    let relative = file.strip_prefix(&config.build.content).unwrap_or(file);
    config.build.dest.join(relative)
}
