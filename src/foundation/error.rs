/// Convenience result type used across the crate.
pub type ReviewResult<T> = Result<T, ReviewError>;

/// Error taxonomy shared by the timecode, rendering, page and digest layers.
#[derive(thiserror::Error, Debug)]
pub enum ReviewError {
    /// Invalid caller-provided data (annotation sets, digest jobs, settings).
    #[error("validation error: {0}")]
    Validation(String),

    /// Rasterization or compositing failures.
    #[error("render error: {0}")]
    Render(String),

    /// Malformed protocol traffic or commands the page cannot honor.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Asset loading, decoding or seeking failures.
    #[error("asset error: {0}")]
    Asset(String),

    /// A bounded wait expired.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReviewError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for ReviewError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
