// Response envelope normalization
//
// The backend answers with either `{ "success": true, ... }` or
// `{ "status": "success", ... }`. Everything above the client boundary only
// ever sees `ApiResponse<T>`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use crate::error::{AppError, AppResult};

/// Raw wire envelope as returned by the backend
#[derive(Debug, Clone, Deserialize)]
pub struct RawEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl RawEnvelope {
    /// An explicit `success` flag wins; otherwise `status` must say success
    pub fn is_ok(&self) -> bool {
        if let Some(success) = self.success {
            return success;
        }

        match &self.status {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(status)) => status.eq_ignore_ascii_case("success"),
            _ => false,
        }
    }
}

/// Canonical response shape consumed everywhere in the client
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub message: String,
}

impl<T> ApiResponse<T> {
    /// Turn a rejected envelope into an error, keeping the backend message
    pub fn into_result(self) -> AppResult<(Option<T>, String)> {
        if self.ok {
            Ok((self.data, self.message))
        } else {
            Err(AppError::Rejected {
                message: self.message,
            })
        }
    }
}

/// Normalize a decoded JSON body into the canonical shape.
///
/// `data` is decoded into `T` only when the envelope is ok; a rejected
/// envelope keeps its message and drops whatever data came with it.
pub fn normalize<T: DeserializeOwned>(body: Value) -> AppResult<ApiResponse<T>> {
    let raw: RawEnvelope = serde_json::from_value(body)?;
    let ok = raw.is_ok();
    let message = raw.message.unwrap_or_default();

    let data = match (ok, raw.data) {
        (true, Some(Value::Null)) | (true, None) | (false, _) => None,
        (true, Some(value)) => Some(serde_json::from_value::<T>(value).map_err(|e| {
            AppError::Decode(format!("Unexpected data shape: {}", e))
        })?),
    };

    Ok(ApiResponse { ok, data, message })
}
