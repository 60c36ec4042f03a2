#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("content id is required")]
    InvalidIdentifier,

    #[error("{0}")]
    InvalidParameters(String),

    #[error("{0}")]
    NotFoundInCatalog(String),

    #[error("io error: {0:?}")]
    IO(#[from] std::io::Error),

    #[error("unexpected error: {0:?}")]
    Other(#[from] anyhow::Error),
}
