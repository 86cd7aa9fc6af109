use thiserror::Error;

/// Errors reported by model and texture content loaders.
///
/// They never escape the object factory: a failed load degrades to a
/// fallback shape.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported content format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid content {content}: {reason}")]
    Invalid { content: String, reason: String },
}

/// Errors returned by configuration validation.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },

    #[error("{name} must be a positive duration")]
    ZeroDuration { name: &'static str },

    #[error("{name} must lie in [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f32 },
}
