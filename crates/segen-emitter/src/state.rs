//! Emitter state: a stack of scopes with named sub-maps.
//!
//! One scope is active per class being processed; entering a class pushes a
//! scope and exiting pops it, which is what makes nested classes work. The
//! `globals` sub-map is special: it holds cross-cutting emit buffers that
//! accumulate over the whole run, so reads and writes always resolve against
//! the root scope regardless of stack depth.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

// keywords used for state variables
pub const NAME: &str = "name";
pub const NAME_MANGLED: &str = "name_mangled";
pub const TYPE: &str = "type";
pub const TYPE_MANGLED: &str = "type_mangled";
pub const WRAPPER_NAME: &str = "wrapper";
pub const IS_IMMUTABLE: &str = "is_immutable";
pub const IS_WRITE_ONLY: &str = "is_write_only";
pub const IS_STATIC: &str = "is_static";
pub const IS_ABSTRACT: &str = "is_abstract";
pub const GETTER: &str = "getter";
pub const SETTER: &str = "setter";
pub const CTOR: &str = "ctor";
pub const CTOR_DISPATCHERS: &str = "ctor_dispatchers";
pub const DTOR: &str = "dtor";
pub const NSPACE: &str = "nspace";
pub const NEST_NAMES: &str = "nest_class_names";
pub const ARGCOUNT: &str = "wrap:argc";

// keys for global state variables
pub const HAS_TEMPLATES: &str = "has_templates";
pub const FORCE_CPP: &str = "force_cpp";
pub const REGISTER_CLASSES: &str = "register_classes";
pub const REGISTER_NAMESPACES: &str = "register_namespaces";
pub const INITIALIZER: &str = "initializer";
pub const HEADER_REGISTER_CLASSES: &str = "header_register_classes";
pub const HEADER_REGISTER_MODULE: &str = "header_register_module";

// keys for class scoped state variables
pub const MEMBER_VARIABLES: &str = "member_variables";
pub const MEMBER_FUNCTIONS: &str = "member_functions";
pub const STATIC_FUNCTIONS: &str = "static_functions";
pub const STATIC_VARIABLES: &str = "static_variables";

type SubMap = FxHashMap<SmolStr, String>;

#[derive(Debug, Default)]
struct Scope {
    globals: SubMap,
    class: SubMap,
    function: SubMap,
    variable: SubMap,
}

impl Scope {
    fn new() -> Self {
        let mut scope = Scope::default();
        for key in [
            REGISTER_CLASSES,
            REGISTER_NAMESPACES,
            INITIALIZER,
            HEADER_REGISTER_CLASSES,
            HEADER_REGISTER_MODULE,
        ] {
            scope.globals.insert(SmolStr::new(key), String::new());
        }
        scope
    }
}

#[derive(Debug)]
pub struct EmitterState {
    stack: Vec<Scope>,
}

impl EmitterState {
    pub fn new() -> Self {
        Self {
            stack: vec![Scope::new()],
        }
    }

    pub fn push(&mut self) {
        self.stack.push(Scope::new());
    }

    pub fn pop(&mut self) {
        debug_assert!(self.stack.len() > 1, "cannot pop the root scope");
        self.stack.pop();
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn current(&self) -> &Scope {
        self.stack.last().expect("state stack is never empty")
    }

    fn current_mut(&mut self) -> &mut Scope {
        self.stack.last_mut().expect("state stack is never empty")
    }

    /// Truthy test: the entry exists and its value is not `"0"`.
    pub fn is_set(value: Option<&str>) -> bool {
        matches!(value, Some(v) if v != "0")
    }

    // globals always live on the root scope

    pub fn global(&self, key: &str) -> Option<&str> {
        self.stack[0].globals.get(key).map(String::as_str)
    }

    pub fn set_global(&mut self, key: &str, value: impl Into<String>) {
        self.stack[0]
            .globals
            .insert(SmolStr::new(key), value.into());
    }

    pub fn append_global(&mut self, key: &str, text: &str) {
        self.stack[0]
            .globals
            .entry(SmolStr::new(key))
            .or_default()
            .push_str(text);
    }

    pub fn clear_global(&mut self, key: &str) {
        self.stack[0].globals.insert(SmolStr::new(key), String::new());
    }

    // class state on the current scope

    pub fn clazz(&self, key: &str) -> Option<&str> {
        self.current().class.get(key).map(String::as_str)
    }

    pub fn set_clazz(&mut self, key: &str, value: impl Into<String>) {
        self.current_mut()
            .class
            .insert(SmolStr::new(key), value.into());
    }

    pub fn append_clazz(&mut self, key: &str, text: &str) {
        self.current_mut()
            .class
            .entry(SmolStr::new(key))
            .or_default()
            .push_str(text);
    }

    pub fn reset_clazz(&mut self) {
        self.current_mut().class = SubMap::default();
    }

    pub fn clazz_flag(&self, key: &str) -> bool {
        Self::is_set(self.clazz(key))
    }

    pub fn clear_clazz(&mut self, key: &str) {
        self.current_mut().class.remove(key);
    }

    // function state

    pub fn function(&self, key: &str) -> Option<&str> {
        self.current().function.get(key).map(String::as_str)
    }

    pub fn set_function(&mut self, key: &str, value: impl Into<String>) {
        self.current_mut()
            .function
            .insert(SmolStr::new(key), value.into());
    }

    pub fn reset_function(&mut self) {
        self.current_mut().function = SubMap::default();
    }

    pub fn function_flag(&self, key: &str) -> bool {
        Self::is_set(self.function(key))
    }

    // variable state

    pub fn variable(&self, key: &str) -> Option<&str> {
        self.current().variable.get(key).map(String::as_str)
    }

    pub fn set_variable(&mut self, key: &str, value: impl Into<String>) {
        self.current_mut()
            .variable
            .insert(SmolStr::new(key), value.into());
    }

    pub fn reset_variable(&mut self) {
        self.current_mut().variable = SubMap::default();
    }

    pub fn variable_flag(&self, key: &str) -> bool {
        Self::is_set(self.variable(key))
    }
}

impl Default for EmitterState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globals_survive_scope_pushes() {
        let mut state = EmitterState::new();
        state.append_global(REGISTER_CLASSES, "outer;");
        state.push();
        state.append_global(REGISTER_CLASSES, "inner;");
        state.pop();
        assert_eq!(state.global(REGISTER_CLASSES), Some("outer;inner;"));
    }

    #[test]
    fn class_state_is_per_scope() {
        let mut state = EmitterState::new();
        state.set_clazz(NAME, "Outer");
        state.push();
        state.set_clazz(NAME, "Inner");
        assert_eq!(state.clazz(NAME), Some("Inner"));
        state.pop();
        assert_eq!(state.clazz(NAME), Some("Outer"));
    }

    #[test]
    fn is_set_rejects_zero_and_missing() {
        assert!(!EmitterState::is_set(None));
        assert!(!EmitterState::is_set(Some("0")));
        assert!(EmitterState::is_set(Some("1")));
        assert!(EmitterState::is_set(Some("js_wrap_foo")));
    }

    #[test]
    fn reset_clears_one_submap_only() {
        let mut state = EmitterState::new();
        state.set_function(NAME, "f");
        state.set_variable(NAME, "v");
        state.reset_function();
        assert_eq!(state.function(NAME), None);
        assert_eq!(state.variable(NAME), Some("v"));
    }
}
