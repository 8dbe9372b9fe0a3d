use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Malformed event payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("Robot update without model type: {0}")]
    IncompleteUpdate(String),
}

impl RegistryError {
    pub fn to_error_code(&self) -> &'static str {
        match self {
            RegistryError::Request(_) => "REQUEST_FAILED",
            RegistryError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            RegistryError::IncompleteUpdate(_) => "INCOMPLETE_UPDATE",
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
