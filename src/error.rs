use thiserror::Error;

/// Errors raised while compiling a format string.
///
/// Rendering itself never fails: missing or malformed request data renders
/// as empty text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The format references a `$name` that is neither a `$header.*` token
    /// nor present in the field table.
    #[error("invalid field {0:?}")]
    InvalidField(String),
}
