//! Block-tag scanner.
//!
//! Finds `{% tikz NAME %}BODY{% endtikz %}` and the `latex` equivalent.
//! Liquid whitespace control is honored: `{%-` trims whitespace before a
//! delimiter and `-%}` trims whitespace after it. Everything else in the
//! body is kept verbatim.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::TagError;
use crate::diagram::Variant;

static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{%(-?)[ \t\r\n]*(tikz|latex)(?-u:\b)(.*?)(-?)%\}").expect("valid open tag regex")
});

static END_TIKZ: LazyLock<Regex> = LazyLock::new(|| end_tag("tikz"));
static END_LATEX: LazyLock<Regex> = LazyLock::new(|| end_tag("latex"));

fn end_tag(tag: &str) -> Regex {
    Regex::new(&format!(r"\{{%(-?)[ \t\r\n]*end{tag}[ \t\r\n]*(-?)%\}}"))
        .expect("valid end tag regex")
}

fn end_regex(variant: Variant) -> &'static Regex {
    match variant {
        Variant::Tikz => &END_TIKZ,
        Variant::Latex => &END_LATEX,
    }
}

/// One block tag found in page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatch {
    pub variant: Variant,
    /// Tag argument as written; whitespace is removed later.
    pub name: String,
    pub body: String,
    /// Byte range in the page replaced by the markup, including any
    /// whitespace trimmed by `{%-`/`-%}`.
    pub span: Range<usize>,
    /// 1-based line of the opening tag.
    pub line: usize,
}

/// Whether `text` contains at least one opening tag.
pub fn contains_tags(text: &str) -> bool {
    OPEN_TAG.is_match(text)
}

/// Find every block tag in `text`, in order.
pub fn scan(text: &str) -> Result<Vec<TagMatch>, TagError> {
    let mut tags = Vec::new();
    let mut pos = 0;

    while let Some(open) = OPEN_TAG.captures_at(text, pos) {
        let whole = open.get(0).map_or(pos..pos, |m| m.range());
        let variant = match open.get(2).map(|m| m.as_str()) {
            Some(tag) => Variant::from_tag(tag),
            None => None,
        };
        let Some(variant) = variant else {
            pos = whole.end;
            continue;
        };
        let trim_before = open.get(1).is_some_and(|m| !m.is_empty());
        let trim_body_start = open.get(4).is_some_and(|m| !m.is_empty());
        let name = open.get(3).map_or("", |m| m.as_str()).to_string();
        let line = line_of(text, whole.start);

        let Some(close) = end_regex(variant).captures_at(text, whole.end) else {
            return Err(TagError::Unclosed {
                tag: variant.tag(),
                name: name.trim().to_string(),
                line,
            });
        };
        let close_range = close.get(0).map_or(whole.end..whole.end, |m| m.range());
        let trim_body_end = close.get(1).is_some_and(|m| !m.is_empty());
        let trim_after = close.get(2).is_some_and(|m| !m.is_empty());

        let mut body = &text[whole.end..close_range.start];
        if trim_body_start {
            body = body.trim_start();
        }
        if trim_body_end {
            body = body.trim_end();
        }

        let start = if trim_before {
            text[..whole.start].trim_end().len()
        } else {
            whole.start
        };
        let end = if trim_after {
            text.len() - text[close_range.end..].trim_start().len()
        } else {
            close_range.end
        };

        tags.push(TagMatch {
            variant,
            name,
            body: body.to_string(),
            span: start.max(tags.last().map_or(0, |t: &TagMatch| t.span.end))..end,
            line,
        });
        pos = close_range.end;
    }

    Ok(tags)
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].bytes().filter(|&b| b == b'\n').count() + 1
}
