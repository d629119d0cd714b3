use thiserror::Error;

/// Errors from the local key-value persistence medium.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors from the remote agent service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response had no body")]
    MissingBody,

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("stream error: {0}")]
    Stream(String),
}

impl ApiError {
    /// HTTP status code, if the error came from a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Conversation engine error taxonomy.
///
/// Only `AgentProfileUnavailable` and `UnknownPrompt` are ever returned to
/// callers. The remaining variants describe degraded paths that the engine
/// absorbs and logs.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("visitor identity storage unavailable: {0}")]
    IdentityUnavailable(String),

    #[error("stored history is corrupt: {0}")]
    HistoryCorrupt(String),

    #[error("agent profile unavailable for '{slug}': {reason}")]
    AgentProfileUnavailable { slug: String, reason: String },

    #[error("stream failed: {0}")]
    StreamFailure(#[from] ApiError),

    #[error("metadata lookup failed for '{reference_id}': {reason}")]
    MetadataLookupFailure { reference_id: String, reason: String },

    #[error("unknown or inactive prompt '{0}'")]
    UnknownPrompt(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status() {
        let err = ApiError::Status {
            status: 503,
            body: "busy".to_string(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "HTTP 503: busy");
        assert_eq!(ApiError::MissingBody.status(), None);
    }

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::AgentProfileUnavailable {
            slug: "nova".to_string(),
            reason: "HTTP 404: not found".to_string(),
        };
        assert!(err.to_string().contains("nova"));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_stream_failure_from_api_error() {
        let err: ChatError = ApiError::Stream("connection reset".to_string()).into();
        assert!(matches!(err, ChatError::StreamFailure(_)));
        assert_eq!(err.to_string(), "stream failed: stream error: connection reset");
    }
}
