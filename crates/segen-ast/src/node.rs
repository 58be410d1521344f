//! Arena representation of the annotated declaration tree.

use crate::parm::Parm;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// Index of a node in the [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kinds of declaration nodes the backend dispatches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Module root.
    Top,
    /// Class or struct declaration.
    Class,
    /// Function, member function, or typedef'd function declaration.
    Function,
    /// Constructor declaration (routed via `view == "constructorHandler"`).
    Constructor,
    /// Destructor declaration (routed via `view == "destructorHandler"`).
    Destructor,
    /// Variable or member variable declaration.
    Variable,
    /// Namespace scope.
    Namespace,
    /// Enum declaration.
    Enum,
    /// Single enum item.
    EnumItem,
    /// Compile-time constant.
    Constant,
    /// Pre-wrapped native function.
    Native,
    /// Fragment directive carrying a reusable code snippet.
    Fragment,
    /// Anything the dispatcher does not recognize.
    Unknown(SmolStr),
}

impl NodeKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "top" => NodeKind::Top,
            "class" => NodeKind::Class,
            "function" => NodeKind::Function,
            "constructor" => NodeKind::Constructor,
            "destructor" => NodeKind::Destructor,
            "variable" => NodeKind::Variable,
            "namespace" => NodeKind::Namespace,
            "enum" => NodeKind::Enum,
            "enumitem" => NodeKind::EnumItem,
            "constant" => NodeKind::Constant,
            "native" => NodeKind::Native,
            "fragment" => NodeKind::Fragment,
            other => NodeKind::Unknown(SmolStr::new(other)),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            NodeKind::Top => "top",
            NodeKind::Class => "class",
            NodeKind::Function => "function",
            NodeKind::Constructor => "constructor",
            NodeKind::Destructor => "destructor",
            NodeKind::Variable => "variable",
            NodeKind::Namespace => "namespace",
            NodeKind::Enum => "enum",
            NodeKind::EnumItem => "enumitem",
            NodeKind::Constant => "constant",
            NodeKind::Native => "native",
            NodeKind::Fragment => "fragment",
            NodeKind::Unknown(tag) => tag.as_str(),
        }
    }
}

/// An attribute value: most are strings, a few reference other nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Str(String),
    Node(NodeId),
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    attrs: FxHashMap<SmolStr, AttrValue>,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
    /// Overload chain threaded by the front-end.
    sym_prev: Option<NodeId>,
    sym_next: Option<NodeId>,
    /// Base classes, first-declared first.
    bases: Vec<NodeId>,
    /// Parameter list with attached typemap attributes.
    parms: Vec<Parm>,
}

/// The declaration-tree arena.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<NodeData>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            attrs: FxHashMap::default(),
            parent,
            first_child: None,
            next_sibling: None,
            sym_prev: None,
            sym_next: None,
            bases: Vec::new(),
            parms: Vec::new(),
        });
        if let Some(parent) = parent {
            self.append_child(parent, id);
        }
        id
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        match self.nodes[parent.index()].first_child {
            None => self.nodes[parent.index()].first_child = Some(child),
            Some(first) => {
                let mut cursor = first;
                while let Some(next) = self.nodes[cursor.index()].next_sibling {
                    cursor = next;
                }
                self.nodes[cursor.index()].next_sibling = Some(child);
            }
        }
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].first_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].next_sibling
    }

    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        ChildIter {
            ast: self,
            cursor: self.first_child(id),
        }
    }

    /// String attribute lookup.
    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        match self.nodes[id.index()].attrs.get(key) {
            Some(AttrValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Node-valued attribute lookup.
    pub fn attr_node(&self, id: NodeId, key: &str) -> Option<NodeId> {
        match self.nodes[id.index()].attrs.get(key) {
            Some(AttrValue::Node(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, key: &str, value: impl Into<String>) {
        self.nodes[id.index()]
            .attrs
            .insert(SmolStr::new(key), AttrValue::Str(value.into()));
    }

    pub fn set_attr_node(&mut self, id: NodeId, key: &str, value: NodeId) {
        self.nodes[id.index()]
            .attrs
            .insert(SmolStr::new(key), AttrValue::Node(value));
    }

    /// A flag is an attribute whose string value is present and not `"0"`.
    pub fn flag(&self, id: NodeId, key: &str) -> bool {
        matches!(self.attr(id, key), Some(v) if v != "0")
    }

    pub fn set_flag(&mut self, id: NodeId, key: &str) {
        self.set_attr(id, key, "1");
    }

    pub fn clear_attr(&mut self, id: NodeId, key: &str) {
        self.nodes[id.index()].attrs.remove(key);
    }

    pub fn sym_next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].sym_next
    }

    pub fn sym_prev(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].sym_prev
    }

    /// First node of the overload chain `id` belongs to.
    pub fn sym_first(&self, id: NodeId) -> NodeId {
        let mut cursor = id;
        while let Some(prev) = self.sym_prev(cursor) {
            cursor = prev;
        }
        cursor
    }

    pub fn link_sym_siblings(&mut self, prev: NodeId, next: NodeId) {
        self.nodes[prev.index()].sym_next = Some(next);
        self.nodes[next.index()].sym_prev = Some(prev);
    }

    pub fn bases(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].bases
    }

    pub fn add_base(&mut self, id: NodeId, base: NodeId) {
        self.nodes[id.index()].bases.push(base);
    }

    pub fn parms(&self, id: NodeId) -> &[Parm] {
        &self.nodes[id.index()].parms
    }

    pub fn parms_mut(&mut self, id: NodeId) -> &mut Vec<Parm> {
        &mut self.nodes[id.index()].parms
    }

    pub fn set_parms(&mut self, id: NodeId, parms: Vec<Parm>) {
        self.nodes[id.index()].parms = parms;
    }

    /// Source position for diagnostics, taken from the `file`/`line`
    /// attributes the front-end stamps on each declaration.
    pub fn location(&self, id: NodeId) -> (Option<&str>, Option<u32>) {
        let file = self.attr(id, "file");
        let line = self.attr(id, "line").and_then(|l| l.parse().ok());
        (file, line)
    }

    /// Ancestor namespaces of a node, outermost first.
    pub fn namespace_chain(&self, id: NodeId) -> Vec<String> {
        let mut chain = Vec::new();
        let mut cursor = self.parent(id);
        while let Some(node) = cursor {
            if *self.kind(node) == NodeKind::Namespace {
                if let Some(name) = self.attr(node, "name") {
                    chain.push(name.to_string());
                }
            }
            cursor = self.parent(node);
        }
        chain.reverse();
        chain
    }

    /// First base class that is not `feature:ignore`d, or `None`.
    pub fn base_class(&self, id: NodeId) -> Option<NodeId> {
        self.bases(id)
            .iter()
            .copied()
            .find(|base| !self.flag(*base, "feature:ignore"))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub struct ChildIter<'a> {
    ast: &'a Ast,
    cursor: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.cursor?;
        self.cursor = self.ast.next_sibling(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_preserve_insertion_order() {
        let mut ast = Ast::new();
        let top = ast.add_node(NodeKind::Top, None);
        let a = ast.add_node(NodeKind::Class, Some(top));
        let b = ast.add_node(NodeKind::Function, Some(top));
        let c = ast.add_node(NodeKind::Variable, Some(top));

        let children: Vec<_> = ast.children(top).collect();
        assert_eq!(children, vec![a, b, c]);
        assert_eq!(ast.parent(b), Some(top));
    }

    #[test]
    fn flags_treat_zero_as_unset() {
        let mut ast = Ast::new();
        let top = ast.add_node(NodeKind::Top, None);
        ast.set_attr(top, "feature:nspace", "0");
        assert!(!ast.flag(top, "feature:nspace"));
        ast.set_flag(top, "feature:nspace");
        assert!(ast.flag(top, "feature:nspace"));
    }

    #[test]
    fn namespace_chain_is_outermost_first() {
        let mut ast = Ast::new();
        let top = ast.add_node(NodeKind::Top, None);
        let outer = ast.add_node(NodeKind::Namespace, Some(top));
        ast.set_attr(outer, "name", "cc");
        let inner = ast.add_node(NodeKind::Namespace, Some(outer));
        ast.set_attr(inner, "name", "gfx");
        let func = ast.add_node(NodeKind::Function, Some(inner));

        assert_eq!(ast.namespace_chain(func), vec!["cc", "gfx"]);
    }

    #[test]
    fn base_class_skips_ignored_bases() {
        let mut ast = Ast::new();
        let top = ast.add_node(NodeKind::Top, None);
        let ignored = ast.add_node(NodeKind::Class, Some(top));
        ast.set_flag(ignored, "feature:ignore");
        let base = ast.add_node(NodeKind::Class, Some(top));
        let derived = ast.add_node(NodeKind::Class, Some(top));
        ast.add_base(derived, ignored);
        ast.add_base(derived, base);

        assert_eq!(ast.base_class(derived), Some(base));
    }

    #[test]
    fn sym_first_walks_to_chain_head() {
        let mut ast = Ast::new();
        let top = ast.add_node(NodeKind::Top, None);
        let f0 = ast.add_node(NodeKind::Function, Some(top));
        let f1 = ast.add_node(NodeKind::Function, Some(top));
        let f2 = ast.add_node(NodeKind::Function, Some(top));
        ast.link_sym_siblings(f0, f1);
        ast.link_sym_siblings(f1, f2);

        assert_eq!(ast.sym_first(f2), f0);
        assert_eq!(ast.sym_next(f0), Some(f1));
    }
}
