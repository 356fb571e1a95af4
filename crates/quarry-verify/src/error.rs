use std::io;

use thiserror::Error;

/// Error types for verification operations.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// I/O error while reading content to digest
    #[error("I/O error during verification: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, VerifyError>;
