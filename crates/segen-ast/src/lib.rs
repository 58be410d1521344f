//! Annotated C++ declaration tree consumed by the segen backend.
//!
//! The front-end (parser, typemap resolver, symbol table) is an external
//! collaborator: it produces a declaration tree in which every node already
//! carries the attributes the backend needs: typemap snippets on parameter
//! lists, overload sibling links, view annotations, feature flags. This crate
//! is the Rust-side model of that contract: an arena of tagged nodes with
//! string-keyed attribute bags, plus a JSON loader for serialized trees.

mod json;
mod node;
pub mod parm;
pub mod types;

pub use json::load_tree;
pub use node::{Ast, AttrValue, NodeId, NodeKind};
pub use parm::Parm;
