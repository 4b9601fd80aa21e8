use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid tag identifier: {0}")]
    InvalidTagId(String),

    #[error("Invalid hex data: {0}")]
    InvalidHex(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
