//! Diagram errors.
//!
//! Only problems with the job itself or the filesystem are errors. A failing
//! pdflatex or pdf2svg run is a [`RenderStatus::Failed`](super::RenderStatus)
//! value instead, so one broken diagram never aborts a page.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiagramError {
    #[error("invalid diagram name `{0}`")]
    InvalidName(String),

    #[error("invalid page id `{0}`: must be a relative path without `.` or `..`")]
    InvalidPageId(String),

    #[error("IO error at `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

impl DiagramError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |err| Self::Io(path, err)
    }
}
