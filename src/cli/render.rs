//! `render`: expand the diagram tags of one page.

use std::fs;
use std::io::Write;

use anyhow::{Context, Result};

use super::{RenderArgs, Summary, check_failures, page_id_for};
use crate::config::Config;
use crate::diagram::{DiagramCompiler, ProcessRunner};
use crate::{debug, log, tag};

/// Expand `args.file`, writing the result to `args.output` or stdout.
///
/// Logging goes to stderr, so stdout holds nothing but the page.
pub fn render_page(config: &Config, args: &RenderArgs) -> Result<()> {
    let compiler = DiagramCompiler::new(config.compiler_settings());
    let (text, summary) = expand_file(config, &compiler, args)?;

    match &args.output {
        Some(out) => {
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(out, &text).with_context(|| format!("Failed to write {}", out.display()))?;
            log!("done"; "{} ({})", out.display(), summary);
        }
        None => write_page(&mut std::io::stdout().lock(), &text)?,
    }

    check_failures(config, &summary)
}

fn write_page(out: &mut impl Write, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Expand one file and persist the cache index.
fn expand_file<R: ProcessRunner>(
    config: &Config,
    compiler: &DiagramCompiler<R>,
    args: &RenderArgs,
) -> Result<(String, Summary)> {
    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let file = crate::utils::path::normalize_path(&args.file);
    let page_id = page_id_for(config, &file, args.url.as_deref());
    debug!("render"; "{} -> page id `{}`", args.file.display(), page_id);

    let expansion = tag::expand(&source, &page_id, compiler)
        .with_context(|| format!("Failed to expand {}", args.file.display()));

    // Keep whatever was built even when a later tag aborted the page
    if let Err(e) = compiler.persist() {
        log!("warning"; "failed to save cache index: {}", e);
    }

    let expansion = expansion?;
    for outcome in &expansion.outcomes {
        debug!("render"; "{} {}: {}", outcome.variant, outcome.key, outcome.status);
    }
    let mut summary = Summary::default();
    summary.add(&expansion.outcomes);
    Ok((expansion.text, summary))
}
