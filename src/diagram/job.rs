//! Diagram job identity and file layout.
//!
//! ```text
//! <tmp-root>/<pageId>/<name>.tex     intermediate source
//! <tmp-root>/<pageId>/<name>.pdf     intermediate binary
//! <output-root>/<pageId>/<name>.svg  artifact
//! <public-base>/<pageId>/<name>.svg  reference embedded in the page
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{CompilerSettings, DiagramError, Variant};
use crate::utils::path::is_descending;

/// Page id used when a URL has no usable segment (e.g. `/`).
pub const INDEX_PAGE_ID: &str = "index";

/// Identity of a diagram: the page it belongs to and its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub page_id: String,
    pub name: String,
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.page_id, self.name)
    }
}

/// All paths of one diagram build, computed fresh for every render.
#[derive(Debug, Clone)]
pub struct DiagramJob {
    pub key: JobKey,
    pub variant: Variant,
    pub tmp_dir: PathBuf,
    pub out_dir: PathBuf,
    pub tex_path: PathBuf,
    pub pdf_path: PathBuf,
    pub svg_path: PathBuf,
    pub public_path: String,
}

impl DiagramJob {
    /// Build the job for `raw_name` on `page_id`.
    ///
    /// Whitespace is removed from the name (`"  fig 1 "` is `fig1`).
    pub fn new(
        settings: &CompilerSettings,
        page_id: &str,
        raw_name: &str,
        variant: Variant,
    ) -> Result<Self, DiagramError> {
        let name = normalize_name(raw_name);
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(DiagramError::InvalidName(raw_name.to_string()));
        }
        if page_id.is_empty() || !is_descending(Path::new(page_id)) {
            return Err(DiagramError::InvalidPageId(page_id.to_string()));
        }

        let tmp_dir = settings.tmp_root.join(page_id);
        let out_dir = settings.output_root.join(page_id);

        Ok(Self {
            tex_path: tmp_dir.join(format!("{name}.tex")),
            pdf_path: tmp_dir.join(format!("{name}.pdf")),
            svg_path: out_dir.join(format!("{name}.svg")),
            public_path: format!("{}/{page_id}/{name}.svg", settings.public_base),
            key: JobKey {
                page_id: page_id.to_string(),
                name,
            },
            variant,
            tmp_dir,
            out_dir,
        })
    }
}

/// Remove every whitespace character from a tag argument.
pub fn normalize_name(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// How a page URL becomes a page id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageIdStyle {
    /// Last URL segment without extension: `/2020/01/my-post.html` -> `my-post`.
    #[default]
    Basename,
    /// Whole URL path without extension: `/posts/my-post.html` -> `posts/my-post`.
    Path,
}

/// Derive the page id from a page URL.
pub fn page_id_from_url(url: &str, style: PageIdStyle) -> String {
    let segments: Vec<&str> = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();

    let Some((last, parents)) = segments.split_last() else {
        return INDEX_PAGE_ID.to_string();
    };
    let last = strip_extension(last);

    match style {
        PageIdStyle::Basename => last.to_string(),
        PageIdStyle::Path => {
            let mut parts: Vec<&str> = parents.to_vec();
            parts.push(last);
            parts.join("/")
        }
    }
}

/// `post.html` -> `post`, `a.b.html` -> `a.b`, `.hidden` stays as-is.
fn strip_extension(segment: &str) -> &str {
    match segment.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => segment,
    }
}
