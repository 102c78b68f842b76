//! Configuration section definitions.
//!
//! | Section   | Purpose                                          |
//! |-----------|--------------------------------------------------|
//! | `[paths]` | Intermediate root, artifact root, public base    |
//! | `[tools]` | `pdflatex` and `pdf2svg` executables             |
//! | `[build]` | Content/destination dirs, page ids, failure mode |

mod build;
mod paths;
mod tools;

pub use build::BuildConfig;
pub use paths::PathsConfig;
pub use tools::ToolsConfig;
