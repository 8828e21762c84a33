//! Error types for ipconfig.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IpError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task join: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Config: {0}")]
    Config(String),
}

impl From<nix::Error> for IpError {
    fn from(e: nix::Error) -> Self {
        Self::Io(e.into())
    }
}

pub type Result<T> = std::result::Result<T, IpError>;
