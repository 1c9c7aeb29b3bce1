#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("registry rejected {id} with status {status}: {body}")]
    Rejected { id: String, status: u16, body: String },

    #[error("invalid category table: {0}")]
    CategoryTable(String),
}
