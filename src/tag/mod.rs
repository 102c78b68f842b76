//! Page expansion: replace `tikz`/`latex` block tags with diagram markup.

mod scanner;

pub use scanner::contains_tags;
use scanner::scan;

use thiserror::Error;

use crate::diagram::{DiagramCompiler, DiagramError, ProcessRunner, RenderOutcome};

#[derive(Debug, Error)]
pub enum TagError {
    #[error("`{{% {tag} {name} %}}` on line {line} has no matching `{{% end{tag} %}}`")]
    Unclosed {
        tag: &'static str,
        name: String,
        line: usize,
    },

    #[error("diagram on line {line}")]
    Diagram {
        line: usize,
        #[source]
        source: DiagramError,
    },
}

/// A page with every tag replaced.
#[derive(Debug)]
pub struct Expansion {
    pub text: String,
    /// One outcome per tag, in page order.
    pub outcomes: Vec<RenderOutcome>,
}

/// Render every tag in `text` for `page_id`.
///
/// Text outside the tags is preserved byte-for-byte. A failed diagram build
/// still yields its markup; only scanning and filesystem errors abort.
pub fn expand<R: ProcessRunner>(
    text: &str,
    page_id: &str,
    compiler: &DiagramCompiler<R>,
) -> Result<Expansion, TagError> {
    let tags = scan(text)?;

    let mut out = String::with_capacity(text.len());
    let mut outcomes = Vec::with_capacity(tags.len());
    let mut last = 0;

    for tag in tags {
        let outcome = compiler
            .render(&tag.name, &tag.body, page_id, tag.variant)
            .map_err(|source| TagError::Diagram {
                line: tag.line,
                source,
            })?;

        out.push_str(&text[last..tag.span.start]);
        out.push_str(&outcome.markup);
        last = tag.span.end;
        outcomes.push(outcome);
    }
    out.push_str(&text[last..]);

    Ok(Expansion {
        text: out,
        outcomes,
    })
}
