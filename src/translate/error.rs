use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// Stable classification of a provider failure. Retry decisions branch on
/// this tag, never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Rate or usage limit hit (HTTP 429, DeepL 456)
    Quota,
    /// Connectivity problems, timeouts, 5xx
    Network,
    /// The provider answered but the body was not what we expected
    Malformed,
    /// Anything else, e.g. rejected credentials
    Other,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProviderErrorKind::Quota => "quota exceeded",
            ProviderErrorKind::Network => "network error",
            ProviderErrorKind::Malformed => "malformed response",
            ProviderErrorKind::Other => "request failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Error)]
#[error("{provider} {kind}: {message}")]
pub struct ProviderError {
    pub provider: &'static str,
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(provider: &'static str, kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            provider,
            kind,
            message: message.into(),
        }
    }

    pub fn malformed(provider: &'static str, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Malformed, message)
    }

    /// Classify a non-success HTTP response.
    pub fn from_status(provider: &'static str, status: StatusCode, body: &str) -> Self {
        let kind = if status == StatusCode::TOO_MANY_REQUESTS
            || status.as_u16() == 456
            || body_signals_quota(body)
        {
            ProviderErrorKind::Quota
        } else if status.is_server_error() {
            ProviderErrorKind::Network
        } else {
            ProviderErrorKind::Other
        };

        Self::new(provider, kind, format!("HTTP {}: {}", status, body.trim()))
    }

    /// Classify a transport-level failure from reqwest.
    pub fn from_transport(provider: &'static str, err: reqwest::Error) -> Self {
        let kind = if err.is_decode() {
            ProviderErrorKind::Malformed
        } else {
            ProviderErrorKind::Network
        };
        Self::new(provider, kind, err.to_string())
    }

    pub fn is_quota(&self) -> bool {
        self.kind == ProviderErrorKind::Quota
    }
}

// Some gateways answer 403/503 with a quota message instead of a 429
fn body_signals_quota(body: &str) -> bool {
    let body = body.to_lowercase();
    body.contains("quota") || body.contains("too many requests")
}

/// Terminal failure of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("all providers failed (primary: {primary}; fallback: {fallback})")]
    AllProvidersFailed {
        primary: ProviderError,
        fallback: ProviderError,
    },
}

impl PipelineError {
    /// True when the primary's final error was a quota rejection, which is
    /// the only failure users are told about. The fallback's error kind does
    /// not matter.
    pub fn is_quota_exhausted(&self) -> bool {
        match self {
            PipelineError::AllProvidersFailed { primary, .. } => primary.is_quota(),
        }
    }
}
