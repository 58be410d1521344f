//! Diagnostic reporting for the segen backend.
//!
//! Non-fatal conditions (a missing typemap, an unexpected node kind) are
//! reported as compiler-style warning lines tied to the input file and line
//! of the offending declaration. The walk continues past them; only the
//! counts are kept so the driver can report a summary.

use miette::Diagnostic as MietteDiagnostic;
use std::cell::RefCell;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone, Error, MietteDiagnostic)]
#[error("{message}")]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    #[help]
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            message: message.into(),
            file: None,
            line: None,
            help: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            message: message.into(),
            file: None,
            line: None,
            help: None,
        }
    }

    pub fn at(mut self, file: Option<&str>, line: Option<u32>) -> Self {
        self.file = file.map(str::to_owned);
        self.line = line;
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// One compiler-style line: `file:line: Warning: message`.
    fn render(&self) -> String {
        let level = match self.level {
            DiagnosticLevel::Error => "Error",
            DiagnosticLevel::Warning => "Warning",
        };
        match (&self.file, self.line) {
            (Some(file), Some(line)) => format!("{}:{}: {}: {}", file, line, level, self.message),
            (Some(file), None) => format!("{}: {}: {}", file, level, self.message),
            _ => format!("{}: {}", level, self.message),
        }
    }
}

/// Collects diagnostics during a generation run.
///
/// Interior mutability keeps the sink shareable between the visitor and the
/// emitter without threading `&mut` through every handler.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    emitted: RefCell<Vec<Diagnostic>>,
    quiet: bool,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that records but does not print. Used by tests.
    pub fn quiet() -> Self {
        Self {
            emitted: RefCell::new(Vec::new()),
            quiet: true,
        }
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        if !self.quiet {
            eprintln!("{}", diagnostic.render());
        }
        self.emitted.borrow_mut().push(diagnostic);
    }

    pub fn warning_count(&self) -> usize {
        self.emitted
            .borrow()
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.emitted
            .borrow()
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .count()
    }

    pub fn messages(&self) -> Vec<String> {
        self.emitted.borrow().iter().map(|d| d.render()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_compiler_style_lines() {
        let d = Diagnostic::warning("unable to use type 'Foo' as a function argument")
            .at(Some("example.h"), Some(42));
        assert_eq!(
            d.render(),
            "example.h:42: Warning: unable to use type 'Foo' as a function argument"
        );
    }

    #[test]
    fn sink_counts_by_level() {
        let sink = DiagnosticSink::quiet();
        sink.report(Diagnostic::warning("a"));
        sink.report(Diagnostic::warning("b"));
        sink.report(Diagnostic::error("c"));
        assert_eq!(sink.warning_count(), 2);
        assert_eq!(sink.error_count(), 1);
    }
}
