use thiserror::Error;

use crate::remote::RemoteError;
use crate::translate::TranslateError;

/// Unified app errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Translate: {0}")]
    Translate(#[from] TranslateError),

    #[error("Remote: {0}")]
    Remote(#[from] RemoteError),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
