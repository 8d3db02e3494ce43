use image::ImageError;
use zip::result::ZipError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The upload is not an image we can read.
    #[error("failed to decode image: {0}")]
    Decode(#[source] ImageError),
    #[error("failed to read image: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to encode {label}: {source}")]
    Encode {
        label: String,
        #[source]
        source: ImageError,
    },
    #[error("failed to write archive: {0}")]
    Archive(#[from] ZipError),
    #[error("invalid size catalog: {0}")]
    Catalog(String),
}

impl Error {
    /// Whether the failure is caused by the caller's input rather than by us.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}
