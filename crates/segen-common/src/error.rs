//! Error types shared across the segen crates.

use thiserror::Error;

/// Result type for segen operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort code generation.
///
/// Everything here is a configuration-level failure: diagnostics that the
/// generator can recover from (a missing typemap, an unexpected node kind)
/// go through [`crate::DiagnosticSink`] instead and never surface as `Error`.
#[derive(Error, Debug)]
pub enum Error {
    /// A code template was requested that no fragment directive registered.
    #[error("could not find template '{0}'")]
    MissingTemplate(String),

    /// A fragment directive carried an empty name or no code.
    #[error("template code was null, illegal input for template")]
    NullTemplate,

    /// The requested script engine is not supported.
    #[error("unknown engine '{0}', only 'cocos' is supported")]
    UnknownEngine(String),

    /// Failed to read or write a file.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The input declaration tree was not valid JSON.
    #[error("failed to parse declaration tree: {0}")]
    ParseTree(#[from] serde_json::Error),

    /// The declaration tree was structurally invalid.
    #[error("malformed declaration tree: {0}")]
    MalformedTree(String),
}

impl Error {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }
}
