use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiloomError {
    #[error("Unsupported HTTP method: {0}")]
    InvalidMethod(String),
}
