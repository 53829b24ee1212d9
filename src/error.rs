use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("authentication failed: {0}")]
    Authentication(String),
}

impl Error {
    // Cache-facing message; falls back when the remote gave us nothing.
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            Error::Api { message, .. } | Error::Authentication(message)
                if message.trim().is_empty() =>
            {
                fallback.to_string()
            }
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
