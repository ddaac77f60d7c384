use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while validating, generating, encoding or writing keys.
#[derive(Debug, Error)]
pub enum KeygenError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("key generation failed: {0}")]
    Generation(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("failed to write {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} already exists (use -force to overwrite)", .0.display())]
    OverwriteRefused(PathBuf),

    #[error("pipeline out of order: {0}")]
    OutOfOrder(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl KeygenError {
    /// Process exit code for this error in non-interactive mode.
    pub fn exit_code(&self) -> i32 {
        match self {
            KeygenError::OverwriteRefused(_) => 2,
            _ => 1,
        }
    }
}

impl From<ssh_key::Error> for KeygenError {
    fn from(e: ssh_key::Error) -> Self {
        KeygenError::Encoding(e.to_string())
    }
}

impl From<pkcs8::Error> for KeygenError {
    fn from(e: pkcs8::Error) -> Self {
        KeygenError::Encoding(e.to_string())
    }
}

impl From<rsa::pkcs1::Error> for KeygenError {
    fn from(e: rsa::pkcs1::Error) -> Self {
        KeygenError::Encoding(e.to_string())
    }
}

pub type KeygenResult<T> = Result<T, KeygenError>;
