use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Report source is not authenticated")]
    NotAuthenticated,

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Report request returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Source configuration error: {0}")]
    Config(String),
}

impl SourceError {
    /// Map a non-success HTTP status. Credential rejections count as
    /// authentication failures.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => Self::Authentication(format!("{}: {}", status, body)),
            _ => Self::Status { status, body },
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::Authentication(_))
    }
}

impl From<gcp_auth::Error> for SourceError {
    fn from(e: gcp_auth::Error) -> Self {
        Self::Authentication(e.to_string())
    }
}
