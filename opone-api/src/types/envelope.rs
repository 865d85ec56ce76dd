//! JSON response envelope.
//!
//! Every successful response carries `"success": true` plus either a `data`
//! payload or a human-readable `message`. The failure half of the envelope
//! is produced by `ApiError` (`"success": false`).

use serde::{Deserialize, Serialize};

/// Success envelope wrapping a payload or a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Wrap a payload: `{"success": true, "data": ...}`.
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

impl Envelope<()> {
    /// Message-only success: `{"success": true, "message": "..."}`.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_envelope_shape() {
        let envelope = Envelope::data(vec![1, 2, 3]);
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"data\":[1,2,3]"));
        assert!(!json.contains("message"));
    }

    #[test]
    fn test_message_envelope_shape() {
        let envelope = Envelope::message("Logged out");
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"message\":\"Logged out\""));
        assert!(!json.contains("data"));
    }
}
