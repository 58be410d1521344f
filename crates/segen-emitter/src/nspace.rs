//! Namespace registry.
//!
//! A forest rooted at the global scope `"::"`, which exists from the start
//! and maps to the script-side `exports` object. Entries are created lazily
//! the first time a qualified node is visited; missing ancestors are created
//! recursively. Parents are stored by key, not by reference, so the registry
//! stays a plain map.

use rustc_hash::FxHashMap;
use segen_ast::{Ast, NodeId};
use segen_common::names;

pub const GLOBAL_SCOPE: &str = "::";

#[derive(Debug)]
pub struct NamespaceEntry {
    pub name: String,
    pub name_mangled: String,
    pub parent: Option<String>,
    pub parent_mangled: String,
    /// Per-namespace function registration snippets.
    pub functions: String,
    /// Per-namespace value registration snippets.
    pub values: String,
}

#[derive(Debug)]
pub struct NamespaceRegistry {
    entries: FxHashMap<String, NamespaceEntry>,
    /// Registration order, for deterministic output.
    order: Vec<String>,
    current: String,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            entries: FxHashMap::default(),
            order: Vec::new(),
            current: GLOBAL_SCOPE.to_string(),
        };
        registry.insert(
            GLOBAL_SCOPE.to_string(),
            NamespaceEntry {
                name: "exports".to_string(),
                name_mangled: "exports".to_string(),
                parent: None,
                parent_mangled: String::new(),
                functions: String::new(),
                values: String::new(),
            },
        );
        registry
    }

    fn insert(&mut self, scope: String, entry: NamespaceEntry) {
        self.order.push(scope.clone());
        self.entries.insert(scope, entry);
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.entries.contains_key(scope)
    }

    pub fn current(&self) -> &NamespaceEntry {
        &self.entries[&self.current]
    }

    pub fn current_mut(&mut self) -> &mut NamespaceEntry {
        self.entries.get_mut(&self.current).expect("current namespace exists")
    }

    pub fn current_scope(&self) -> &str {
        &self.current
    }

    /// Iterate entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &NamespaceEntry> {
        self.order.iter().map(|scope| &self.entries[scope])
    }

    /// Switch the active namespace for `node`.
    ///
    /// Class members stay with their class; without `feature:nspace`
    /// everything lands in the global scope. The scope key prefers
    /// `sym:nspace` and falls back to the scope prefix of the node's name.
    pub fn switch_to(&mut self, ast: &Ast, node: NodeId) {
        if ast.flag(node, "ismember") {
            return;
        }

        if !ast.flag(node, "feature:nspace") {
            self.current = GLOBAL_SCOPE.to_string();
            return;
        }

        let nspace = ast
            .attr(node, "sym:nspace")
            .map(str::to_owned)
            .or_else(|| {
                ast.attr(node, "name")
                    .and_then(names::scope_prefix)
                    .map(str::to_owned)
            });

        let Some(nspace) = nspace else {
            self.current = GLOBAL_SCOPE.to_string();
            return;
        };

        // the front-end sometimes hands out '.'-separated scopes
        let scope = nspace.replace('.', "::");

        if !self.contains(&scope) {
            self.create(&scope);
        }
        self.current = scope;
    }

    /// Create `scope` and every missing ancestor.
    fn create(&mut self, scope: &str) {
        let parent_scope = match names::scope_prefix(scope) {
            None => GLOBAL_SCOPE.to_string(),
            Some(parent) => {
                if !self.contains(parent) {
                    self.create(parent);
                }
                parent.to_string()
            }
        };

        let (parent_name, parent_mangled) = {
            let parent = &self.entries[&parent_scope];
            (parent.name.clone(), parent.name_mangled.clone())
        };

        let entry = NamespaceEntry {
            name: names::scope_last(scope).to_string(),
            name_mangled: names::mangle(scope),
            parent: Some(parent_name),
            parent_mangled,
            functions: String::new(),
            values: String::new(),
        };
        self.insert(scope.to_string(), entry);
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
