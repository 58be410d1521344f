//! Backend driver: wires the tree loader, the engine, and the visitor.

use segen_ast::load_tree;
use segen_common::{Error, Result};
use segen_emitter::{CocosEmitter, Engine, Visitor};
use std::path::{Path, PathBuf};

/// Result of one generation run.
#[derive(Debug)]
pub struct GeneratedModule {
    /// The assembled C++ implementation file.
    pub implementation: String,
    /// The assembled companion header.
    pub header: String,
    /// Number of non-fatal warnings reported during the walk.
    pub warnings: usize,
}

/// Orchestrates one backend invocation.
#[derive(Debug)]
pub struct Driver {
    engine: Engine,
    debug_templates: bool,
    outfile: Option<PathBuf>,
    outfile_h: Option<PathBuf>,
}

impl Driver {
    pub fn new() -> Self {
        Self {
            engine: Engine::Cocos,
            debug_templates: false,
            outfile: None,
            outfile_h: None,
        }
    }

    /// Select the engine by name. Anything but `cocos` is a fatal error.
    pub fn with_engine_name(name: &str) -> Result<Self> {
        let engine = Engine::from_name(name)?;
        Ok(Self {
            engine,
            ..Self::new()
        })
    }

    pub fn debug_templates(mut self, enabled: bool) -> Self {
        self.debug_templates = enabled;
        self
    }

    /// Override the implementation output path from the tree's `outfile`.
    pub fn outfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.outfile = Some(path.into());
        self
    }

    /// Override the header output path from the tree's `outfile_h`.
    pub fn outfile_h(mut self, path: impl Into<PathBuf>) -> Self {
        self.outfile_h = Some(path.into());
        self
    }

    /// Generate glue for a serialized declaration tree on disk.
    pub fn run_file(&self, path: impl AsRef<Path>) -> Result<GeneratedModule> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("failed to read {}", path.display()), e))?;
        self.run_source(&source)
    }

    /// Generate glue for a serialized declaration tree in memory.
    pub fn run_source(&self, source: &str) -> Result<GeneratedModule> {
        let Engine::Cocos = self.engine;

        let (mut ast, root) = load_tree(source)?;

        let mut emitter = CocosEmitter::new(self.debug_templates);
        emitter.set_output_paths(self.outfile.clone(), self.outfile_h.clone());

        Visitor::new(&mut emitter).top(&mut ast, root)?;

        Ok(GeneratedModule {
            implementation: emitter.implementation().to_string(),
            header: emitter.header_output().to_string(),
            warnings: emitter.sink.warning_count(),
        })
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_engine_is_fatal() {
        let err = Driver::with_engine_name("v8").unwrap_err();
        assert!(matches!(err, Error::UnknownEngine(name) if name == "v8"));
    }

    #[test]
    fn cocos_engine_is_accepted() {
        assert!(Driver::with_engine_name("cocos").is_ok());
    }
}
