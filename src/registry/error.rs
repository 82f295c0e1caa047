//! Registry error types.

/// Errors raised by registration and structural validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The probe cannot be registered (e.g. empty component name).
    #[error("invalid probe: {0}")]
    InvalidProbe(String),

    /// A stored key no longer matches the probe's own declared name.
    #[error("registry key '{key}' does not match declared component name '{declared}'")]
    NameMismatch { key: String, declared: String },

    /// Secondary indexes disagree with the ordered entry list.
    #[error("registry index corrupted: {0}")]
    IndexCorrupted(String),
}
