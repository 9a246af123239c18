use std::fmt::{Display, Formatter};

use serde::Serialize;
use tickerpair_core::{ProviderId, SourceError, UtcDateTime};
use uuid::Uuid;

pub const SCHEMA_VERSION: &str = "v1.0.0";

/// Request identifier (UUID v4) stamped on every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Standard response envelope for all machine-readable output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub meta: EnvelopeMeta,
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EnvelopeError>,
}

/// Metadata attached to every envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeMeta {
    pub request_id: RequestId,
    pub schema_version: &'static str,
    pub generated_at: UtcDateTime,
    pub provider: ProviderId,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl EnvelopeMeta {
    pub fn new(provider: ProviderId, latency_ms: u64) -> Self {
        Self {
            request_id: RequestId::new_v4(),
            schema_version: SCHEMA_VERSION,
            generated_at: UtcDateTime::now(),
            provider,
            latency_ms,
            warnings: Vec::new(),
        }
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Structured error payload for failed or partial results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl EnvelopeError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            retryable: None,
        }
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }
}

impl From<&SourceError> for EnvelopeError {
    fn from(error: &SourceError) -> Self {
        Self::new(error.code(), error.message()).with_retryable(error.retryable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_is_uuid_v4() {
        let request_id = RequestId::new_v4();
        assert_eq!(request_id.0.get_version_num(), 4);
    }

    #[test]
    fn empty_warnings_and_errors_are_omitted() {
        let envelope = Envelope {
            meta: EnvelopeMeta::new(ProviderId::Memory, 12),
            data: serde_json::json!({ "rows": [] }),
            errors: Vec::new(),
        };

        let json = serde_json::to_value(&envelope).expect("serializes");
        assert_eq!(json["meta"]["provider"], "memory");
        assert_eq!(json["meta"]["latency_ms"], 12);
        assert_eq!(json["meta"]["schema_version"], "v1.0.0");
        assert!(json["meta"].get("warnings").is_none());
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn source_errors_carry_code_and_retryability() {
        let error = EnvelopeError::from(&SourceError::rate_limited("slow down"));
        assert_eq!(error.code, "source.rate_limited");
        assert_eq!(error.retryable, Some(true));
    }
}
