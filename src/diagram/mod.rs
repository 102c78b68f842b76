//! TikZ and LaTeX diagram rendering.
//!
//! # Module Structure
//!
//! ```text
//! diagram/
//! ├── variant.rs     # tikz vs latex: document wrapping, flags, markup
//! ├── job.rs         # JobKey, DiagramJob paths, page id derivation
//! ├── runner.rs      # ProcessRunner seam over pdflatex/pdf2svg
//! ├── compiler.rs    # DiagramCompiler: cache check + build
//! └── error.rs       # DiagramError
//! ```

mod compiler;
mod error;
mod job;
mod runner;
mod variant;

pub use compiler::{CompilerSettings, DiagramCompiler, RenderOutcome, RenderStatus};
pub use error::DiagramError;
pub use job::{DiagramJob, JobKey, PageIdStyle, page_id_from_url};
pub use runner::{ProcessOutput, ProcessRunner, SystemRunner};
pub use variant::Variant;
