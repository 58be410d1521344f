mod diagnostic;
mod error;
pub mod names;

pub use diagnostic::{Diagnostic, DiagnosticLevel, DiagnosticSink};
pub use error::{Error, Result};
