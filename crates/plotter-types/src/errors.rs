//! Common error types used across the plotter panel crates

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base error type for all panel operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum PanelError {
    /// Local rejection before any network call: target outside the
    /// workspace, malformed endpoint URL. Fully recoverable.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Fetch rejection, non-2xx response, or decode failure.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// A coordinate conversion was attempted before the first successful
    /// metadata fetch populated non-zero scale factors.
    #[error("Device metadata not loaded yet")]
    StaleMetadata,

    /// Malformed body or header from the device.
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// JavaScript interop failure.
    #[error("JS interop error: {message}")]
    JsInterop { message: String },
}

/// Result type alias for panel operations.
pub type PanelResult<T> = Result<T, PanelError>;

impl PanelError {
    pub fn validation(message: impl Into<String>) -> Self {
        PanelError::Validation {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        PanelError::Transport {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for PanelError {
    fn from(err: serde_json::Error) -> Self {
        PanelError::Parse {
            message: err.to_string(),
        }
    }
}

impl From<wasm_bindgen::JsValue> for PanelError {
    fn from(err: wasm_bindgen::JsValue) -> Self {
        PanelError::JsInterop {
            message: format!("{err:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_serialization() {
        let err = PanelError::validation("Out of workspace boundary.");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("Validation"));
        assert!(json.contains("Out of workspace boundary."));
    }

    #[test]
    fn parse_error_conversion() {
        let bad: Result<crate::DeviceMetadata, _> = serde_json::from_str("not json");
        let err: PanelError = bad.unwrap_err().into();
        assert!(matches!(err, PanelError::Parse { .. }));
    }
}
