//! Top-level visitor: walks the declaration tree and drives the emitter.
//!
//! The walk is the Rust concretization of the host front-end's handler
//! dispatch: each node kind gets its handler, handlers bracket the emitter
//! hooks with enter/exit calls, and the wrapper dispatch routes on the
//! node's `kind`/`view` annotations. Unknown kinds warn and the walk
//! continues.

use crate::emit::CocosEmitter;
use segen_ast::{Ast, NodeId, NodeKind};
use segen_common::{Diagnostic, Result};

pub struct Visitor<'a> {
    emitter: &'a mut CocosEmitter,
}

impl<'a> Visitor<'a> {
    pub fn new(emitter: &'a mut CocosEmitter) -> Self {
        Self { emitter }
    }

    /// Process the module root: initialize, walk, dump, close.
    ///
    /// `close` runs whether or not the walk succeeded, so output handles
    /// never leak past a failed run.
    pub fn top(&mut self, ast: &mut Ast, top: NodeId) -> Result<()> {
        self.emitter.initialize(ast, top)?;

        let result = self
            .walk_children(ast, top)
            .and_then(|()| self.emitter.dump(ast, top));

        let closed = self.emitter.close();
        result.and(closed)
    }

    fn walk_children(&mut self, ast: &mut Ast, node: NodeId) -> Result<()> {
        let children: Vec<NodeId> = ast.children(node).collect();
        for child in children {
            self.dispatch(ast, child)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, ast: &mut Ast, n: NodeId) -> Result<()> {
        match ast.kind(n).clone() {
            NodeKind::Class => self.class_handler(ast, n),
            NodeKind::Function => {
                if ast.flag(n, "ismember") {
                    self.function_handler(ast, n)
                } else {
                    self.global_function_handler(ast, n)
                }
            }
            NodeKind::Constructor | NodeKind::Destructor => {
                self.emitter.emit_wrapper_function(ast, n)
            }
            NodeKind::Variable => self.variable_handler(ast, n),
            NodeKind::Namespace => self.walk_children(ast, n),
            NodeKind::Enum => self.walk_children(ast, n),
            NodeKind::EnumItem | NodeKind::Constant => self.constant_wrapper(ast, n),
            NodeKind::Native => self.emitter.emit_native_function(ast, n),
            NodeKind::Fragment => self.fragment_directive(ast, n),
            NodeKind::Top => self.walk_children(ast, n),
            NodeKind::Unknown(tag) => {
                let (file, line) = ast.location(n);
                self.emitter.sink.report(
                    Diagnostic::warning(format!("unexpected node kind '{}'", tag)).at(file, line),
                );
                Ok(())
            }
        }
    }

    fn class_handler(&mut self, ast: &mut Ast, n: NodeId) -> Result<()> {
        self.emitter.switch_namespace(ast, n);
        self.emitter.enter_class(ast, n)?;
        self.walk_children(ast, n)?;
        self.emitter.exit_class(ast, n)
    }

    fn function_handler(&mut self, ast: &mut Ast, n: NodeId) -> Result<()> {
        // extensions are emitted as members
        if ast.flag(n, "isextension") {
            ast.set_flag(n, "ismember");
        }
        self.emitter.enter_function(ast, n);
        self.emitter.emit_wrapper_function(ast, n)?;
        self.emitter.exit_function(ast, n)
    }

    fn global_function_handler(&mut self, ast: &mut Ast, n: NodeId) -> Result<()> {
        self.emitter.switch_namespace(ast, n);
        self.emitter.enter_function(ast, n);
        self.emitter.emit_wrapper_function(ast, n)?;
        self.emitter.exit_function(ast, n)
    }

    /// One variable node produces up to two wrappers: the setter view runs
    /// first, then the getter view with the trailing value parameter
    /// removed (the parameter list on the node is the setter's).
    fn variable_handler(&mut self, ast: &mut Ast, n: NodeId) -> Result<()> {
        ast.set_flag(n, "feature:dont_convert_var_to_ptr");

        let is_member = ast.flag(n, "ismember");
        if !is_member {
            self.emitter.switch_namespace(ast, n);
        }

        self.emitter.enter_variable(ast, n);

        let (set_flag, get_flag) = if is_member {
            ("memberset", "memberget")
        } else {
            ("varset", "varget")
        };

        ast.set_flag(n, set_flag);
        self.emitter.emit_wrapper_function(ast, n)?;
        ast.clear_attr(n, set_flag);

        let value_parm = ast.parms_mut(n).pop();
        ast.set_flag(n, get_flag);
        let getter_result = self.emitter.emit_wrapper_function(ast, n);
        ast.clear_attr(n, get_flag);
        if let Some(parm) = value_parm {
            ast.parms_mut(n).push(parm);
        }
        getter_result?;

        self.emitter.exit_variable(ast, n)
    }

    fn constant_wrapper(&mut self, ast: &mut Ast, n: NodeId) -> Result<()> {
        self.emitter.switch_namespace(ast, n);
        // function-typed constants are callback declarations, not values
        if ast.attr(n, "kind") == Some("function") {
            return Ok(());
        }
        self.emitter.emit_constant(ast, n)
    }

    fn fragment_directive(&mut self, ast: &mut Ast, n: NodeId) -> Result<()> {
        if ast.attr(n, "section") == Some("templates") && !ast.flag(n, "imported") {
            let name = ast.attr(n, "value").unwrap_or("").to_string();
            let code = ast.attr(n, "code").unwrap_or("").to_string();
            self.emitter.register_template(&name, &code)?;
        }
        Ok(())
    }
}
