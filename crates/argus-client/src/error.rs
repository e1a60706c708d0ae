use market_core::MarketError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArgusError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Backend reported an error: {0}")]
    Backend(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type ArgusResult<T> = Result<T, ArgusError>;

impl From<ArgusError> for MarketError {
    fn from(err: ArgusError) -> Self {
        match err {
            ArgusError::RequestFailed(e) => match e.status() {
                Some(status) => MarketError::Status {
                    status: status.as_u16(),
                    body: e.to_string(),
                },
                None if e.is_decode() => MarketError::InvalidResponse(e.to_string()),
                None => MarketError::Transport(e.to_string()),
            },
            ArgusError::Status { status, body } => MarketError::Status { status, body },
            ArgusError::Backend(msg) => MarketError::Backend(msg),
            ArgusError::InvalidResponse(msg) => MarketError::InvalidResponse(msg),
            ArgusError::InvalidUrl(msg) | ArgusError::Config(msg) => MarketError::InvalidData(msg),
        }
    }
}
