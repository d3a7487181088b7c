use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid water level reading: {0}")]
    InvalidReading(String),
    #[error("invalid value for parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },
    #[error("malformed request body: {0}")]
    MalformedBody(serde_json::Error),
    #[error("unhandled uri: {0}")]
    UnhandledUri(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Errors caused by what the caller sent rather than by the server
    pub fn is_client_error(&self) -> bool {
        match self {
            Error::InvalidReading(_)
            | Error::InvalidParameter { .. }
            | Error::MalformedBody(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
