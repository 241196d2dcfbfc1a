use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Shown when the server rejected a request without a usable `detail`.
pub const REQUEST_FAILED: &str = "请求失败";
pub const NETWORK_UNREACHABLE: &str = "网络错误，请检查连接";
pub const BAD_REQUEST_CONFIG: &str = "请求配置错误";

/// Which side of the wire a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Server,
    Network,
    Config,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// A response arrived but it was not usable (non-2xx, or a body that
    /// does not match the expected schema).
    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    /// The request left the client but no response came back.
    #[error("Network error: {reason}")]
    Network { reason: String, timeout: bool },

    /// The request could not be built or sent at all.
    #[error("Request configuration error: {0}")]
    Config(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::Network { .. } => ErrorKind::Network,
            ApiError::Config(_) => ErrorKind::Config,
        }
    }

    /// Text for the transient notification raised when this error surfaces.
    pub fn user_message(&self) -> &str {
        match self {
            ApiError::Server { message, .. } => message,
            ApiError::Network { .. } => NETWORK_UNREACHABLE,
            ApiError::Config(_) => BAD_REQUEST_CONFIG,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Network { timeout: true, .. })
    }

    /// Build a server error from a non-2xx body, preferring its `detail` string.
    pub fn from_error_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| REQUEST_FAILED.to_string());
        ApiError::Server { status, message }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ApiError::Config(err.to_string())
        } else {
            ApiError::Network {
                timeout: err.is_timeout(),
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_field_becomes_message() {
        let err = ApiError::from_error_body(500, r#"{"detail":"db down"}"#);
        assert_eq!(
            err,
            ApiError::Server {
                status: 500,
                message: "db down".into()
            }
        );
        assert_eq!(err.user_message(), "db down");
    }

    #[test]
    fn missing_or_non_string_detail_falls_back() {
        for body in ["", "not json", r#"{"error":"x"}"#, r#"{"detail":[{"loc":"q"}]}"#, r#"{"detail":""}"#] {
            let err = ApiError::from_error_body(422, body);
            assert_eq!(err.user_message(), REQUEST_FAILED, "body: {body}");
            assert_eq!(err.kind(), ErrorKind::Server);
        }
    }

    #[test]
    fn network_and_config_use_fixed_messages() {
        let net = ApiError::Network {
            reason: "connection refused".into(),
            timeout: false,
        };
        assert_eq!(net.user_message(), NETWORK_UNREACHABLE);
        assert!(!net.is_timeout());

        let cfg = ApiError::Config("relative URL without a base".into());
        assert_eq!(cfg.user_message(), BAD_REQUEST_CONFIG);
        assert_eq!(cfg.kind(), ErrorKind::Config);
    }
}
