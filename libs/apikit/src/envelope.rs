use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pagination::{PageLinks, PageResult};

/// Message of every successful standard envelope.
pub const OK_MSG: &str = "ok";

/// Standard and error response body: `{"code", "msg", "data"?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub code: i32,
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    /// Success envelope; `null` payloads are dropped so `data` is omitted.
    pub fn ok(data: Value) -> Self {
        Self {
            code: 200,
            msg: OK_MSG.to_string(),
            data: (!data.is_null()).then_some(data),
        }
    }

    /// Error envelope, never carries data.
    pub fn error(code: i32, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Paginated response body: `{"code", "result", "links"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedEnvelope<T> {
    pub code: i32,
    pub result: PageResult<T>,
    pub links: PageLinks,
}

impl<T> PagedEnvelope<T> {
    pub fn ok(result: PageResult<T>, links: PageLinks) -> Self {
        Self {
            code: 200,
            result,
            links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_envelope_omits_null_data() {
        let s = serde_json::to_value(Envelope::ok(Value::Null)).unwrap();
        assert_eq!(s, json!({"code": 200, "msg": "ok"}));
    }

    #[test]
    fn ok_envelope_keeps_payload() {
        let s = serde_json::to_value(Envelope::ok(json!({"id": 7}))).unwrap();
        assert_eq!(s, json!({"code": 200, "msg": "ok", "data": {"id": 7}}));
    }

    #[test]
    fn ok_envelope_keeps_falsy_payloads() {
        let s = serde_json::to_value(Envelope::ok(json!(0))).unwrap();
        assert_eq!(s["data"], json!(0));

        let s = serde_json::to_value(Envelope::ok(json!([]))).unwrap();
        assert_eq!(s["data"], json!([]));
    }

    #[test]
    fn error_envelope_shape() {
        let s = serde_json::to_value(Envelope::error(-1, "boom")).unwrap();
        assert_eq!(s, json!({"code": -1, "msg": "boom"}));
    }
}
