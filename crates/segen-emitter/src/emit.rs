//! The Cocos emitter: owns the generation state and the output buffers.
//!
//! The emitter collects code into named buffers during the walk (runtime,
//! header, wrappers, initializer) and assembles the two output files at
//! `dump`. Output file handles are opened in `initialize` and released in
//! `close`, whether or not emission succeeded in between.

use crate::nspace::{NamespaceRegistry, GLOBAL_SCOPE};
use crate::state::{self, EmitterState};
use crate::template::{Template, TemplateStore};
use crate::wrapper::{wrapper_name, Wrapper};
use segen_ast::{types, Ast, NodeId};
use segen_common::names;
use segen_common::{Diagnostic, DiagnosticSink, Error, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Script engines this backend can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Cocos,
}

impl Engine {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "cocos" => Ok(Engine::Cocos),
            other => Err(Error::UnknownEngine(other.to_string())),
        }
    }
}

/// The literal null token used for vetoed constructors and absent finalizers.
pub const NULL_TOKEN: &str = "nullptr";

/// Setter symbol installed for immutable variables.
pub const VETO_SET: &str = "JS_veto_set_variable";

/// Sentinel pair protecting brace-less lists from the pretty-printer.
pub(crate) const SENTINEL_OPEN: &str = "###cc";
pub(crate) const SENTINEL_CLOSE: &str = "cc###";

const BANNER: &str = "\
/* ----------------------------------------------------------------------------
 * This file was automatically generated by segen.
 * Do not make changes to this file unless you know what you are doing -- modify
 * the interface file instead.
 * ---------------------------------------------------------------------------- */\n\n";

struct OutputFiles {
    cpp: BufWriter<File>,
    h: BufWriter<File>,
}

pub struct CocosEmitter {
    pub(crate) templates: TemplateStore,
    pub state: EmitterState,
    pub namespaces: NamespaceRegistry,
    pub sink: DiagnosticSink,
    pub(crate) debug_templates: bool,

    // major code parts, assembled in a fixed order at dump
    pub(crate) runtime: String,
    pub(crate) header: String,
    pub(crate) wrappers: String,
    pub(crate) init: String,

    cpp_override: Option<PathBuf>,
    h_override: Option<PathBuf>,
    files: Option<OutputFiles>,

    final_cpp: String,
    final_h: String,
}

impl CocosEmitter {
    pub fn new(debug_templates: bool) -> Self {
        Self {
            templates: TemplateStore::new(),
            state: EmitterState::new(),
            namespaces: NamespaceRegistry::new(),
            sink: DiagnosticSink::new(),
            debug_templates,
            runtime: String::new(),
            header: String::new(),
            wrappers: String::new(),
            init: String::new(),
            cpp_override: None,
            h_override: None,
            files: None,
            final_cpp: String::new(),
            final_h: String::new(),
        }
    }

    /// Emitter that records diagnostics without printing. Used by tests.
    pub fn quiet(debug_templates: bool) -> Self {
        let mut emitter = Self::new(debug_templates);
        emitter.sink = DiagnosticSink::quiet();
        emitter
    }

    /// Override the output paths taken from the tree's `outfile` /
    /// `outfile_h` attributes. With neither attribute nor override the
    /// emitter stays in-memory, which is what the tests use.
    pub fn set_output_paths(&mut self, cpp: Option<PathBuf>, h: Option<PathBuf>) {
        self.cpp_override = cpp;
        self.h_override = h;
    }

    /// The assembled implementation file, available after `dump`.
    pub fn implementation(&self) -> &str {
        &self.final_cpp
    }

    /// The assembled header file, available after `dump`.
    pub fn header_output(&self) -> &str {
        &self.final_h
    }

    // ------------------------------------------------------------------
    // templates
    // ------------------------------------------------------------------

    pub fn register_template(&mut self, name: &str, code: &str) -> Result<()> {
        if !EmitterState::is_set(self.state.global(state::HAS_TEMPLATES)) {
            self.state.set_global(state::HAS_TEMPLATES, "1");
        }
        self.templates.register(name, code)
    }

    pub fn get_template(&self, name: &str) -> Result<Template> {
        self.templates.acquire(name, self.debug_templates)
    }

    // ------------------------------------------------------------------
    // lifecycle
    // ------------------------------------------------------------------

    /// Open output targets and reset the per-run buffers.
    pub fn initialize(&mut self, ast: &Ast, top: NodeId) -> Result<()> {
        self.namespaces = NamespaceRegistry::new();
        self.runtime.clear();
        self.header.clear();
        self.wrappers.clear();
        self.init.clear();
        self.final_cpp.clear();
        self.final_h.clear();

        let cpp_path = self
            .cpp_override
            .clone()
            .or_else(|| ast.attr(top, "outfile").map(PathBuf::from));
        let h_path = self
            .h_override
            .clone()
            .or_else(|| ast.attr(top, "outfile_h").map(PathBuf::from));

        if let (Some(cpp_path), Some(h_path)) = (cpp_path, h_path) {
            let cpp = File::create(&cpp_path)
                .map_err(|e| Error::io(format!("failed to open {}", cpp_path.display()), e))?;
            let h = File::create(&h_path)
                .map_err(|e| Error::io(format!("failed to open {}", h_path.display()), e))?;
            self.files = Some(OutputFiles {
                cpp: BufWriter::new(cpp),
                h: BufWriter::new(h),
            });
        }

        Ok(())
    }

    /// Assemble and write both output files.
    ///
    /// Assembly order is fixed: runtime, header, wrappers, namespaces,
    /// initializer for the implementation file; module-register declaration
    /// followed by per-class registrations for the header file.
    pub fn dump(&mut self, ast: &Ast, top: NodeId) -> Result<()> {
        let module = ast.attr(top, "name").unwrap_or("module").to_string();

        let mut globals = self.get_template("se_global_variables")?;
        globals
            .replace("$js_module_name", &module)
            .replace("$js_namespace", GLOBAL_SCOPE)
            .pretty_print(&mut self.runtime);

        self.emit_namespaces()?;

        let mut initializer = self.get_template("js_initializer")?;
        initializer
            .replace("$jsname", &module)
            .replace("$js_module_name", &module)
            .replace(
                "$jsregisterclasses",
                self.state.global(state::REGISTER_CLASSES).unwrap_or(""),
            )
            .replace(
                "$jsregisternamespaces",
                self.state.global(state::REGISTER_NAMESPACES).unwrap_or(""),
            );
        let mut init = String::new();
        initializer.pretty_print(&mut init);
        self.init.push_str(&init);

        let mut module_declare = self.get_template("js_register_module_declare")?;
        module_declare.replace("$js_module_name", &module);
        let mut declare = String::new();
        module_declare.pretty_print(&mut declare);
        self.state
            .append_global(state::HEADER_REGISTER_MODULE, &declare);

        self.final_cpp.push_str(BANNER);
        self.final_cpp.push_str(&self.runtime);
        self.final_cpp.push('\n');
        self.final_cpp.push_str(&self.header);
        self.final_cpp.push('\n');
        self.final_cpp.push_str(&self.wrappers);
        self.final_cpp.push('\n');
        self.final_cpp.push_str(&self.init);

        self.final_h.push_str(BANNER);
        self.final_h
            .push_str(self.state.global(state::HEADER_REGISTER_MODULE).unwrap_or(""));
        self.final_h.push('\n');
        self.final_h
            .push_str(self.state.global(state::HEADER_REGISTER_CLASSES).unwrap_or(""));

        if let Some(files) = &mut self.files {
            files
                .cpp
                .write_all(self.final_cpp.as_bytes())
                .map_err(|e| Error::io("failed to write implementation file", e))?;
            files
                .h
                .write_all(self.final_h.as_bytes())
                .map_err(|e| Error::io("failed to write header file", e))?;
        }

        Ok(())
    }

    /// Flush and release the output handles. Safe to call after failures.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut files) = self.files.take() {
            files
                .cpp
                .flush()
                .map_err(|e| Error::io("failed to flush implementation file", e))?;
            files
                .h
                .flush()
                .map_err(|e| Error::io("failed to flush header file", e))?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // namespaces
    // ------------------------------------------------------------------

    pub fn switch_namespace(&mut self, ast: &Ast, node: NodeId) {
        self.namespaces.switch_to(ast, node);
    }

    /// Render one `jsc_global_registration` per registered namespace into
    /// the register-namespaces buffer, in registration order.
    fn emit_namespaces(&mut self) -> Result<()> {
        let mut rendered = String::new();
        for entry in self.namespaces.iter() {
            let mut t = self.get_template("jsc_global_registration")?;
            t.replace("$jsmangledname", &entry.name_mangled)
                .replace("$jsglobalvariables", &entry.values)
                .replace("$jsglobalfunctions", &entry.functions)
                .replace("$jsname", &entry.name)
                .replace("$jsparent", &entry.parent_mangled)
                .pretty_print(&mut rendered);
        }
        self.state
            .append_global(state::REGISTER_NAMESPACES, &rendered);
        Ok(())
    }

    // ------------------------------------------------------------------
    // wrapper dispatch
    // ------------------------------------------------------------------

    /// Route a wrapper-generating node to the matching emit function.
    ///
    /// All state-dependent branching happens here so the emit functions
    /// stay small and single-purpose.
    pub fn emit_wrapper_function(&mut self, ast: &mut Ast, n: NodeId) -> Result<()> {
        let kind = ast.attr(n, "kind").map(str::to_owned);

        match kind.as_deref() {
            Some("function") => {
                let is_member = ast.flag(n, "ismember") || ast.flag(n, "feature:extend");
                let is_static = self.state.function_flag(state::IS_STATIC);
                self.emit_function(ast, n, is_member, is_static)
            }
            // typedef'd global functions surface as variables with a
            // globalfunctionHandler view
            Some("variable") if ast.attr(n, "view") == Some("globalfunctionHandler") => {
                let is_member = ast.flag(n, "ismember") || ast.flag(n, "feature:extend");
                let is_static = self.state.function_flag(state::IS_STATIC);
                self.emit_function(ast, n, is_member, is_static)
            }
            Some("variable") => {
                let mut is_static = self.state.variable_flag(state::IS_STATIC);
                // smartpointer-accessed statics are wrapped as plain members
                if ast.flag(n, "allocate:smartpointeraccess") {
                    is_static = false;
                }
                let is_member = ast.flag(n, "ismember");
                if ast.flag(n, "memberset") || ast.flag(n, "varset") {
                    self.emit_setter(ast, n, is_member, is_static)
                } else if ast.flag(n, "memberget") || ast.flag(n, "varget") {
                    self.emit_getter(ast, n, is_member, is_static)
                } else {
                    Ok(())
                }
            }
            Some(_) => {
                let (file, line) = ast.location(n);
                self.sink.report(
                    Diagnostic::warning("unsupported wrapper function type").at(file, line),
                );
                Ok(())
            }
            None => match ast.attr(n, "view") {
                Some("constructorHandler") => self.emit_ctor(ast, n),
                Some("destructorHandler") => self.emit_dtor(ast, n),
                _ => {
                    let (file, line) = ast.location(n);
                    self.sink.report(
                        Diagnostic::warning("unsupported wrapper function type").at(file, line),
                    );
                    Ok(())
                }
            },
        }
    }

    /// Register a pre-wrapped native function into the current table.
    pub fn emit_native_function(&mut self, ast: &mut Ast, n: NodeId) -> Result<()> {
        let Some(wrap_name) = ast.attr(n, "wrap:name").map(str::to_owned) else {
            let (file, line) = ast.location(n);
            self.sink
                .report(Diagnostic::warning("native declaration without wrap:name").at(file, line));
            return Ok(());
        };
        self.enter_function(ast, n);
        self.state.set_function(state::WRAPPER_NAME, wrap_name);
        self.exit_function(ast, n)
    }

    // ------------------------------------------------------------------
    // constants
    // ------------------------------------------------------------------

    /// Constants are wrapped as read-only variables: a getter plus a veto
    /// setter in the enclosing table.
    pub fn emit_constant(&mut self, ast: &mut Ast, n: NodeId) -> Result<()> {
        // Premature constants turn up before any fragment was processed;
        // without templates there is nothing to render them with.
        if !EmitterState::is_set(self.state.global(state::HAS_TEMPLATES)) {
            let (file, line) = ast.location(n);
            self.sink.report(
                Diagnostic::error("constant emitted before any template was registered")
                    .at(file, line),
            );
            return Ok(());
        }

        let ty = ast.attr(n, "type").unwrap_or("").to_string();
        let name = ast.attr(n, "name").unwrap_or("").to_string();
        let iname = ast.attr(n, "sym:name").unwrap_or("").to_string();
        let wname = wrapper_name(&names::mangle(&name));

        let mut value = ast
            .attr(n, "rawval")
            .or_else(|| ast.attr(n, "value"))
            .unwrap_or("")
            .to_string();
        if EmitterState::is_set(self.state.global(state::FORCE_CPP)) {
            if let Some(cppvalue) = ast.attr(n, "cppvalue") {
                value = cppvalue.to_string();
            }
        }

        let mut t_getter = self.get_template("js_getter")?;

        // constants register through the variable machinery
        self.enter_variable(ast, n);
        self.state.set_variable(state::GETTER, wname.clone());
        ast.set_attr(n, "wrap:name", wname.clone());

        // member pointers need a static storage cell to take an address of
        if types::is_member_pointer(&ty) {
            let mpointer_wname = format!("_wrapConstant_{}", iname);
            ast.set_attr(n, "memberpointer:constant:wrap:name", mpointer_wname.clone());
            self.wrappers.push_str(&format!(
                "static {} {} = {};\n",
                types::cpp_str(&ty),
                mpointer_wname,
                value
            ));
            value = mpointer_wname;
        }

        let mut wrapper = Wrapper::new();
        self.marshal_output(ast, n, false, &mut wrapper, "", Some(&value), false);

        t_getter
            .replace("$jswrapper", &wname)
            .replace("$jslocals", &wrapper.locals)
            .replace("$jscode", &wrapper.code)
            .pretty_print(&mut self.wrappers);

        self.exit_variable(ast, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segen_ast::NodeKind;

    #[test]
    fn engine_selection_rejects_unknown_names() {
        assert!(matches!(Engine::from_name("cocos"), Ok(Engine::Cocos)));
        assert!(matches!(
            Engine::from_name("jsc"),
            Err(Error::UnknownEngine(name)) if name == "jsc"
        ));
    }

    #[test]
    fn constant_before_any_template_is_an_error_and_emits_nothing() {
        let mut ast = Ast::new();
        let top = ast.add_node(NodeKind::Top, None);
        let constant = ast.add_node(NodeKind::Constant, Some(top));
        ast.set_attr(constant, "name", "MAX_ATTACHMENTS");
        ast.set_attr(constant, "sym:name", "MAX_ATTACHMENTS");
        ast.set_attr(constant, "type", "int");
        ast.set_attr(constant, "value", "4");

        let mut emitter = CocosEmitter::quiet(false);
        emitter.emit_constant(&mut ast, constant).unwrap();

        assert_eq!(emitter.sink.error_count(), 1);
        assert!(emitter.wrappers.is_empty());
    }

    #[test]
    fn unexpected_wrapper_kind_warns_and_continues() {
        let mut ast = Ast::new();
        let top = ast.add_node(NodeKind::Top, None);
        let odd = ast.add_node(NodeKind::Function, Some(top));
        ast.set_attr(odd, "kind", "template");

        let mut emitter = CocosEmitter::quiet(false);
        emitter.emit_wrapper_function(&mut ast, odd).unwrap();

        assert_eq!(emitter.sink.warning_count(), 1);
    }

    #[test]
    fn member_pointer_constants_get_a_static_storage_cell() {
        let mut ast = Ast::new();
        let top = ast.add_node(NodeKind::Top, None);
        let constant = ast.add_node(NodeKind::Constant, Some(top));
        ast.set_attr(constant, "name", "MEMBER_FN");
        ast.set_attr(constant, "sym:name", "MEMBER_FN");
        ast.set_attr(constant, "type", "m(Klass).int");
        ast.set_attr(constant, "value", "&Klass::field");
        ast.set_attr(constant, "tmap:out", "$result.set($1);");

        let mut emitter = CocosEmitter::quiet(false);
        emitter
            .register_template("js_getter", "static bool $jswrapper(se::State& s) { $jslocals $jscode }")
            .unwrap();
        emitter
            .register_template("jsc_global_variable_declaration", "ns->defineProperty(\"$jsname\", _SE($jsgetter), _SE($jssetter));\n")
            .unwrap();
        emitter.emit_constant(&mut ast, constant).unwrap();

        assert!(emitter.wrappers.contains("static m(Klass).int _wrapConstant_MEMBER_FN = &Klass::field;"));
        assert!(emitter.wrappers.contains("jsresult.set(_wrapConstant_MEMBER_FN);"));
    }

    #[test]
    fn rawval_wins_over_value_for_constants() {
        let mut ast = Ast::new();
        let top = ast.add_node(NodeKind::Top, None);
        let constant = ast.add_node(NodeKind::Constant, Some(top));
        ast.set_attr(constant, "name", "PI");
        ast.set_attr(constant, "sym:name", "PI");
        ast.set_attr(constant, "type", "double");
        ast.set_attr(constant, "value", "3");
        ast.set_attr(constant, "rawval", "3.14159265358979");
        ast.set_attr(constant, "tmap:out", "$result.setDouble($1);");

        let mut emitter = CocosEmitter::quiet(false);
        emitter
            .register_template("js_getter", "static bool $jswrapper(se::State& s) { $jscode }")
            .unwrap();
        emitter
            .register_template("jsc_global_variable_declaration", "ns->defineProperty(\"$jsname\", _SE($jsgetter), _SE($jssetter));\n")
            .unwrap();
        emitter.emit_constant(&mut ast, constant).unwrap();

        assert!(emitter.wrappers.contains("jsresult.setDouble(3.14159265358979);"));
    }
}
