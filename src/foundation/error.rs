/// Convenience result type used across screenfx.
pub type ScreenFxResult<T> = Result<T, ScreenFxError>;

/// Top-level error taxonomy used by renderer, sequencer and effect APIs.
///
/// A missing or unsupported filter program is deliberately absent from this list: it is a
/// normal branch that degrades to a plain copy, not an error.
#[derive(thiserror::Error, Debug)]
pub enum ScreenFxError {
    /// Invalid host-provided data (image size mismatch, missing depth texture, bad config).
    #[error("validation error: {0}")]
    Validation(String),

    /// A scratch image could not be acquired. Fatal for the current call.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// A pass failed inside the renderer.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScreenFxError {
    /// Build a [`ScreenFxError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ScreenFxError::ResourceExhausted`] value.
    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::ResourceExhausted(msg.into())
    }

    /// Build a [`ScreenFxError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ScreenFxError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for ScreenFxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
