use gdsp_core::GdspError;
use gdsp_vectors::ExportError;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error(transparent)]
    Dsp(#[from] GdspError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
