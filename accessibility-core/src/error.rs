//! Error types shared across the accessibility core.

/// Failures raised by the preference store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("malformed record under `{key}`: {source}")]
    Malformed {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize record `{key}`: {source}")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn backend(err: &impl std::error::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Rejected widget configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("maxFontLevel must be at least 1")]
    ZeroMaxLevel,
    #[error("fontScaleStep must be greater than 1.0, got {0}")]
    InvalidStep(f64),
    #[error("readPageMinLength must be below 64, got {0}")]
    InvalidMinLength(usize),
}
