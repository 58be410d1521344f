//! Loader for serialized declaration trees.
//!
//! The tree arrives as JSON produced by the front-end. The loader interns it
//! into the arena and completes the front-end contract where the serialized
//! form is allowed to be terse: default `kind`/`view` annotations, `sym:name`
//! from `name`, member flags on class children, local parameter names, and
//! the overload sibling chain.

use crate::node::{Ast, NodeId, NodeKind};
use crate::parm::{assign_local_names, Parm};
use rustc_hash::FxHashMap;
use segen_common::names;
use segen_common::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct TreeNode {
    #[serde(rename = "nodeType")]
    node_type: String,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
    #[serde(default)]
    parms: Vec<BTreeMap<String, String>>,
    #[serde(default)]
    bases: Vec<String>,
    #[serde(default)]
    children: Vec<TreeNode>,
}

/// Parse a serialized declaration tree into an [`Ast`], returning the root.
pub fn load_tree(source: &str) -> Result<(Ast, NodeId)> {
    let tree: TreeNode = serde_json::from_str(source)?;

    let mut ast = Ast::new();
    let mut class_names: FxHashMap<String, NodeId> = FxHashMap::default();
    let mut pending_bases: Vec<(NodeId, Vec<String>)> = Vec::new();

    let root = intern(&mut ast, &tree, None, &mut class_names, &mut pending_bases);

    for (node, bases) in pending_bases {
        for base in bases {
            let target = class_names.get(&base).copied().ok_or_else(|| {
                Error::MalformedTree(format!("base class '{}' is not declared in the tree", base))
            })?;
            ast.add_base(node, target);
        }
    }

    annotate(&mut ast, root);
    thread_overloads(&mut ast, root);

    Ok((ast, root))
}

fn intern(
    ast: &mut Ast,
    tree: &TreeNode,
    parent: Option<NodeId>,
    class_names: &mut FxHashMap<String, NodeId>,
    pending_bases: &mut Vec<(NodeId, Vec<String>)>,
) -> NodeId {
    let kind = NodeKind::from_tag(&tree.node_type);
    let id = ast.add_node(kind.clone(), parent);

    for (key, value) in &tree.attributes {
        ast.set_attr(id, key, value.clone());
    }

    if !tree.parms.is_empty() {
        let mut parms: Vec<Parm> = tree
            .parms
            .iter()
            .map(|attrs| {
                let mut parm = Parm::default();
                for (key, value) in attrs {
                    parm.set(key, value.clone());
                }
                parm
            })
            .collect();
        assign_local_names(&mut parms);
        ast.set_parms(id, parms);
    }

    if kind == NodeKind::Class {
        if let Some(classtype) = ast.attr(id, "classtype") {
            class_names.insert(classtype.to_string(), id);
        }
        if let Some(name) = ast.attr(id, "name") {
            class_names.insert(name.to_string(), id);
        }
    }

    if !tree.bases.is_empty() {
        pending_bases.push((id, tree.bases.clone()));
    }

    for child in &tree.children {
        intern(ast, child, Some(id), class_names, pending_bases);
    }

    id
}

/// Fill in the annotations the backend dispatch relies on.
fn annotate(ast: &mut Ast, id: NodeId) {
    let kind = ast.kind(id).clone();

    if ast.attr(id, "sym:name").is_none() {
        if let Some(name) = ast.attr(id, "name") {
            let sym = names::scope_last(name).to_string();
            ast.set_attr(id, "sym:name", sym);
        }
    }

    match kind {
        NodeKind::Function if ast.attr(id, "kind").is_none() => {
            ast.set_attr(id, "kind", "function");
        }
        NodeKind::Variable | NodeKind::EnumItem if ast.attr(id, "kind").is_none() => {
            ast.set_attr(id, "kind", "variable");
        }
        NodeKind::Constructor if ast.attr(id, "view").is_none() => {
            ast.set_attr(id, "view", "constructorHandler");
        }
        NodeKind::Destructor if ast.attr(id, "view").is_none() => {
            ast.set_attr(id, "view", "destructorHandler");
        }
        _ => {}
    }

    if let Some(parent) = ast.parent(id) {
        // enum items sit one level down, under their enum node
        let member_parent = if *ast.kind(id) == NodeKind::EnumItem && *ast.kind(parent) == NodeKind::Enum
        {
            ast.parent(parent)
        } else {
            Some(parent)
        };
        if let Some(member_parent) = member_parent {
            if *ast.kind(member_parent) == NodeKind::Class
                && matches!(
                    ast.kind(id),
                    NodeKind::Function
                        | NodeKind::Variable
                        | NodeKind::Constructor
                        | NodeKind::Destructor
                        | NodeKind::EnumItem
                        | NodeKind::Constant
                )
                && ast.attr(id, "ismember").is_none()
            {
                ast.set_flag(id, "ismember");
            }
        }
    }

    let children: Vec<NodeId> = ast.children(id).collect();
    for child in children {
        annotate(ast, child);
    }
}

/// Thread the doubly-linked overload chain over same-named siblings.
fn thread_overloads(ast: &mut Ast, id: NodeId) {
    let children: Vec<NodeId> = ast.children(id).collect();

    let mut groups: FxHashMap<String, Vec<NodeId>> = FxHashMap::default();
    for child in &children {
        if matches!(ast.kind(*child), NodeKind::Function | NodeKind::Constructor) {
            if let Some(sym) = ast.attr(*child, "sym:name") {
                groups.entry(sym.to_string()).or_default().push(*child);
            }
        }
    }

    for group in groups.values() {
        if group.len() < 2 {
            continue;
        }
        for (i, node) in group.iter().enumerate() {
            ast.set_flag(*node, "sym:overloaded");
            if ast.attr(*node, "sym:overname").is_none() {
                ast.set_attr(*node, "sym:overname", format!("__SWIG_{}", i));
            }
            if i + 1 < group.len() {
                ast.link_sym_siblings(*node, group[i + 1]);
            }
        }
    }

    for child in children {
        thread_overloads(ast, child);
    }
}
