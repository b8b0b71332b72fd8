//! JSON bodies exchanged over HTTP.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

pub const STATUS_OK: &str = "ok";
pub const STATUS_ERROR: &str = "error";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Pushed fill request. Only documents the envelope; handlers take raw JSON so the
/// payload can be echoed back as received.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FillReq {
    #[schema(value_type = Object)]
    pub data: Value,
}

/// Successful fill: echoes the received payload next to the new document id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FillRes {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(value_type = Object)]
    pub received: Value,
    pub document_id: String,
}

impl FillRes {
    pub fn new(received: Value, document_id: impl Into<String>) -> Self {
        Self {
            status: STATUS_OK.into(),
            received,
            document_id: document_id.into(),
        }
    }
}

/// Failed fill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    #[schema(example = "error")]
    pub status: String,
    pub message: String,
    #[schema(value_type = Object)]
    pub received: Value,
}

impl ErrorRes {
    pub fn new(message: impl Into<String>, received: Value) -> Self {
        Self {
            status: STATUS_ERROR.into(),
            message: message.into(),
            received,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fill_res_shape() {
        let res = FillRes::new(json!({"data": {}}), "1abc");
        assert_eq!(
            serde_json::to_value(res).unwrap(),
            json!({"status": "ok", "received": {"data": {}}, "document_id": "1abc"})
        );
    }

    #[test]
    fn error_res_shape() {
        let res = ErrorRes::new("missing group", json!(null));
        assert_eq!(
            serde_json::to_value(res).unwrap(),
            json!({"status": "error", "message": "missing group", "received": null})
        );
    }
}
