use std::io;
use std::path::PathBuf;

use gdsp_core::GdspError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("cannot create vector directory {path}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Invalid(#[from] GdspError),
}

pub type ExportResult<T> = Result<T, ExportError>;
