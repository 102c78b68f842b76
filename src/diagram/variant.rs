//! The two diagram tags and what differs between them.
//!
//! | Tag     | Body                         | pdflatex flags                | Markup            |
//! |---------|------------------------------|-------------------------------|-------------------|
//! | `tikz`  | wrapped in a standalone doc  | `-output-directory`           | bare `<embed>`    |
//! | `latex` | complete document, verbatim  | `-interaction=nonstopmode` + `-output-directory` | centered `<embed>` |

use std::fmt;

use crate::utils::html::escape_attr;

/// Preamble placed before a `tikz` body.
///
/// Each line carries the 8-space indent the Jekyll plugin wrote, so `.tex`
/// files it left in the tmp root compare equal and are not rebuilt.
pub const TIKZ_PREAMBLE: &str = concat!(
    "        \\documentclass{standalone}\n",
    "        \\usepackage{tikz}\n",
    "        \\begin{document}\n",
    "        \\begin{tikzpicture}\n",
);

/// Postamble placed after a `tikz` body. Indented like [`TIKZ_PREAMBLE`].
pub const TIKZ_POSTAMBLE: &str = concat!(
    "        \\end{tikzpicture}\n",
    "        \\end{document}\n",
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Body is the inside of a `tikzpicture`.
    Tikz,
    /// Body is a complete LaTeX document.
    Latex,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Tikz, Variant::Latex];

    /// Tag name as written in pages.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Tikz => "tikz",
            Self::Latex => "latex",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.tag() == tag)
    }

    /// Whether the body is wrapped in the standalone preamble/postamble.
    pub const fn wraps_body(self) -> bool {
        matches!(self, Self::Tikz)
    }

    /// Whether pdflatex runs with `-interaction=nonstopmode`.
    pub const fn nonstop(self) -> bool {
        matches!(self, Self::Latex)
    }

    /// Whether the embed is wrapped in a centered container.
    pub const fn centered(self) -> bool {
        matches!(self, Self::Latex)
    }

    /// The exact text written to the intermediate `.tex` file.
    pub fn document(self, body: &str) -> String {
        if self.wraps_body() {
            let mut doc =
                String::with_capacity(TIKZ_PREAMBLE.len() + body.len() + TIKZ_POSTAMBLE.len());
            doc.push_str(TIKZ_PREAMBLE);
            doc.push_str(body);
            doc.push_str(TIKZ_POSTAMBLE);
            doc
        } else {
            body.to_string()
        }
    }

    /// Markup referencing the SVG at `public_path`.
    pub fn embed_markup(self, public_path: &str) -> String {
        let src = escape_attr(public_path);
        if self.centered() {
            format!(
                "<div style='text-align: center;'><embed style='max-width: 90%;' src=\"{src}\" type=\"image/svg+xml\" /></div>"
            )
        } else {
            format!("<embed src=\"{src}\" type=\"image/svg+xml\" />")
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
