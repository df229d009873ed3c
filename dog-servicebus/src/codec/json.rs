use crate::{codec::JobCodec, JobPayload, QueueResult};

/// JSON codec for job payloads
#[derive(Debug, Clone, Default)]
pub struct JsonCodec;

impl JobCodec for JsonCodec {
    fn encode(&self, payload: &JobPayload) -> QueueResult<String> {
        Ok(serde_json::to_string(payload)?)
    }

    fn decode(&self, body: &str) -> QueueResult<JobPayload> {
        Ok(serde_json::from_str(body)?)
    }

    fn codec_id(&self) -> &'static str {
        "json"
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueueError;
    use serde_json::json;

    #[test]
    fn test_payload_shape() {
        let codec = JsonCodec;
        let body = codec
            .encode(&JobPayload::new("SendEmail", json!({"to": "a@b.c"})))
            .unwrap();

        let raw: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(raw, json!({"job": "SendEmail", "data": {"to": "a@b.c"}}));
    }

    #[test]
    fn test_missing_data_defaults_to_null() {
        let payload = JsonCodec.decode(r#"{"job":"Ping"}"#).unwrap();
        assert_eq!(payload.job, "Ping");
        assert!(payload.data.is_null());
    }

    #[test]
    fn test_garbage_body_is_serialization_error() {
        let err = JsonCodec.decode("not json").unwrap_err();
        assert!(matches!(err, QueueError::Serialization(_)));
    }

    #[test]
    fn test_codec_id() {
        assert_eq!(JsonCodec.codec_id(), "json");
        assert_eq!(JsonCodec.content_type(), "application/json");
    }
}
