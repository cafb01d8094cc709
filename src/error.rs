use serde_json::Value;
use thiserror::Error;

pub type Result<T, E = ZentaoError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ZentaoError {
    #[error("login rejected: {message}")]
    AuthFailed {
        message: String,
        payload: Option<Value>,
    },

    #[error("{}", network_message(.message, .status))]
    Network {
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },

    #[error("remote returned {envelope}")]
    Api { envelope: Value },

    #[error("{entity} #{id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("{0}")]
    Config(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("session expired and could not be renewed")]
    SessionExpired,

    #[error("malformed payload ({context}): {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

fn network_message(message: &str, status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {code}: {message}"),
        None => message.to_string(),
    }
}

/// Stable machine-readable error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    AuthFailed,
    NetworkError,
    ApiError,
    NotFound,
    ConfigError,
    InvalidParams,
    SessionExpired,
    DecodeError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthFailed => "AUTH_FAILED",
            Self::NetworkError => "NETWORK_ERROR",
            Self::ApiError => "API_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::ConfigError => "CONFIG_ERROR",
            Self::InvalidParams => "INVALID_PARAMS",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::DecodeError => "DECODE_ERROR",
        }
    }
}

impl ZentaoError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::AuthFailed { .. } => ErrorCode::AuthFailed,
            Self::Network { .. } => ErrorCode::NetworkError,
            Self::Api { .. } => ErrorCode::ApiError,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::InvalidParams(_) => ErrorCode::InvalidParams,
            Self::SessionExpired => ErrorCode::SessionExpired,
            Self::Decode { .. } => ErrorCode::DecodeError,
        }
    }

    /// Short hint for people reading the CLI output.
    pub fn user_message(&self) -> &'static str {
        match self.code() {
            ErrorCode::AuthFailed => "Authentication failed. Check the username and password.",
            ErrorCode::NetworkError => {
                "Could not reach ZenTao. Check the network and the configured URL."
            }
            ErrorCode::ApiError => "ZenTao rejected the request.",
            ErrorCode::NotFound => "The requested record does not exist.",
            ErrorCode::ConfigError => concat!(
                "No credentials configured. Set ZENTAO_URL, ZENTAO_USERNAME and ",
                "ZENTAO_PASSWORD or run `zentao init`."
            ),
            ErrorCode::InvalidParams => "Check the command arguments.",
            ErrorCode::SessionExpired => "The ZenTao session expired. Run the command again.",
            ErrorCode::DecodeError => "ZenTao returned data in an unexpected shape.",
        }
    }

    pub(crate) fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            context: context.into(),
            source,
        }
    }

    #[cfg(test)]
    pub(crate) fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status: None,
            body: None,
        }
    }
}

impl From<reqwest::Error> for ZentaoError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            err.to_string()
        };
        Self::Network {
            message,
            status: err.status().map(|s| s.as_u16()),
            body: None,
        }
    }
}
