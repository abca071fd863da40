use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("No main person id was given")]
    MissingMainId,

    #[error("Person '{0}' not found in store")]
    NotFound(String),

    #[error("Duplicate person ID: '{0}'")]
    DuplicateId(String),

    #[error("Invalid relationship: {0}")]
    InvalidLink(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TreeError>;
