use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type MarketResult<T> = Result<T, MarketError>;
