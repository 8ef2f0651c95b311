use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    /// The remote service rejected the API key. The caller should run the
    /// credential selection flow again.
    #[error("API key issue, please re-select your key: {message}")]
    InvalidCredential { message: String },

    #[error("No image data found in response")]
    NoImageInResponse,

    #[error("Remote generation failed: {message}")]
    Remote { message: String },
}

impl GenerationError {
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    pub fn is_invalid_credential(&self) -> bool {
        matches!(self, Self::InvalidCredential { .. })
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Couldn't decode the generated image: {0}")]
    DecodeFailure(#[source] image::ImageError),

    #[error("Couldn't encode the export: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Export job is {state}, expected {expected}")]
    InvalidState {
        state: crate::export::ExportState,
        expected: crate::export::ExportState,
    },

    #[error("Export task was aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),

    #[error("Couldn't write {}: {source}", path.display())]
    Delivery {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No source image selected")]
    NoSourceImage,

    #[error("A generation is already running")]
    GenerationInFlight,

    #[error("No generation is running")]
    NoGenerationInFlight,

    #[error("No API key available, select one first")]
    MissingCredential,

    #[error("Nothing to export yet")]
    NothingToExport,

    #[error(transparent)]
    Generation(#[from] GenerationError),
}
