//! Response envelope
//!
//! The shape a request handler returns to its invoker:
//! `{"statusCode": 200, "headers": {...}, "body": "<json text>"}`.

use crate::error::InventoryError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HandlerResponse {
    fn json(status_code: u16, body: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            status_code,
            headers,
            body,
        }
    }

    /// 200 with `payload` as the body
    pub fn ok<T: Serialize>(payload: &T) -> Self {
        match serde_json::to_string(payload) {
            Ok(body) => Self::json(200, body),
            Err(err) => {
                tracing::error!("Failed to encode inventory: {}", err);
                Self::error("Failed to encode inventory", &err.to_string())
            }
        }
    }

    /// 500 for a request-level failure
    pub fn failure(err: &InventoryError) -> Self {
        Self::error(&err.to_string(), &err.details())
    }

    fn error(summary: &str, details: &str) -> Self {
        let body = json!({ "Error": summary, "Details": details });
        Self::json(500, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}
