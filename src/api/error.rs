use std::fmt;

/// Page fetch failures with user-friendly messages.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Network-level failure (connection, timeout, DNS)
    Network(String),
    /// HTTP error response (4xx, 5xx)
    Status(u16),
    /// Response body did not decode
    Decode(String),
}

impl FetchError {
    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(details) => {
                if details.contains("timed out") {
                    "Request timed out. Please try again.".into()
                } else if details.contains("dns") || details.contains("resolve") {
                    "Network error: Could not reach server.".into()
                } else {
                    format!("Network error: {details}")
                }
            }
            Self::Status(429) => "Rate limited. Please wait a moment.".into(),
            Self::Status(404) => "Catalog not found.".into(),
            Self::Status(500..=599) => "Server error. Please try again later.".into(),
            Self::Status(code) => format!("HTTP error {code}"),
            Self::Decode(details) => format!("Failed to decode response: {details}"),
        }
    }

    /// Transport-class failures; everything except a malformed body.
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Status(_))
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network("request timed out".into())
        } else if err.is_connect() {
            Self::Network("connection failed".into())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            FetchError::Network("request timed out".into()).user_message(),
            "Request timed out. Please try again."
        );
        assert_eq!(
            FetchError::Status(503).user_message(),
            "Server error. Please try again later."
        );
        assert_eq!(FetchError::Status(418).user_message(), "HTTP error 418");
        assert!(
            FetchError::Decode("expected value".into())
                .to_string()
                .starts_with("Failed to decode response")
        );
    }

    #[test]
    fn status_counts_as_network() {
        assert!(FetchError::Status(500).is_network());
        assert!(FetchError::Network("x".into()).is_network());
        assert!(!FetchError::Decode("x".into()).is_network());
    }
}
