//! Uniform response envelope of the control plane and catalog.

use serde::Deserialize;

use crate::error::ClientError;

/// `code` value that denotes success.
pub const SUCCESS_CODE: i64 = 200;

/// `{ code, msg, data }`
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// `data` on success, the envelope's `msg` otherwise.
    pub fn into_result(self) -> Result<Option<T>, ClientError> {
        if self.code == SUCCESS_CODE {
            Ok(self.data)
        } else {
            Err(ClientError::Api {
                code: self.code,
                msg: self.msg,
            })
        }
    }
}
