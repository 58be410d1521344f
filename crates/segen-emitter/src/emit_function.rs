//! Function emission: wrappers, overload dispatchers, table registration.

use crate::emit::CocosEmitter;
use crate::marshal::MarshalMode;
use crate::state;
use crate::wrapper::{wrapper_name, Wrapper};
use segen_ast::{Ast, NodeId};
use segen_common::Result;

impl CocosEmitter {
    pub fn enter_function(&mut self, ast: &Ast, n: NodeId) {
        self.state.reset_function();
        self.state
            .set_function(state::NAME, ast.attr(n, "sym:name").unwrap_or(""));
        if ast.attr(n, "storage") == Some("static") {
            self.state.set_function(state::IS_STATIC, "1");
        }
    }

    /// Register the finished wrapper into its table: the class member or
    /// static table for members, the current namespace otherwise. For
    /// overloads only the dispatcher is registered, and only once the last
    /// sibling has been emitted.
    pub fn exit_function(&mut self, ast: &mut Ast, n: NodeId) -> Result<()> {
        let is_member = ast.flag(n, "ismember") || ast.flag(n, "feature:extend");

        if ast.flag(n, "sym:overloaded") {
            if ast.sym_next(n).is_none() {
                self.emit_function_dispatcher(ast, n)?;
            } else {
                // wrappers of overloaded functions stay out of the tables
                return Ok(());
            }
        }

        let name = self.state.function(state::NAME).unwrap_or("").to_string();
        let wrap = self
            .state
            .function(state::WRAPPER_NAME)
            .unwrap_or("")
            .to_string();

        if is_member {
            if self.state.function_flag(state::IS_STATIC) {
                let mut t = self.get_template("jsc_static_function_declaration")?;
                let mut out = String::new();
                t.replace("$jsname", &name)
                    .replace("$jswrapper", &wrap)
                    .pretty_print(&mut out);
                self.state.append_clazz(state::STATIC_FUNCTIONS, &out);
            } else {
                let mut t = self.get_template("jsc_function_declaration")?;
                let mut out = String::new();
                t.replace("$jsname", &name)
                    .replace("$jswrapper", &wrap)
                    .pretty_print(&mut out);
                self.state.append_clazz(state::MEMBER_FUNCTIONS, &out);
            }
        } else {
            let mut t = self.get_template("jsc_global_function_declaration")?;
            let mut out = String::new();
            t.replace("$jsname", &name)
                .replace("$jswrapper", &wrap)
                .pretty_print(&mut out);
            self.namespaces.current_mut().functions.push_str(&out);
        }

        Ok(())
    }

    /// Generate the wrapper for one function (or one overload of it).
    pub fn emit_function(
        &mut self,
        ast: &mut Ast,
        n: NodeId,
        is_member: bool,
        is_static: bool,
    ) -> Result<()> {
        let is_overloaded = ast.flag(n, "sym:overloaded");
        let iname = ast.attr(n, "sym:name").unwrap_or("").to_string();

        let mut wrap_name = wrapper_name(&function_symbol(ast, n, &iname, is_static));
        let mut t_function = if is_overloaded {
            wrap_name.push_str(ast.attr(n, "sym:overname").unwrap_or(""));
            self.get_template("js_overloaded_function")?
        } else {
            self.get_template("js_function")?
        };
        ast.set_attr(n, "wrap:name", wrap_name.clone());
        self.state.set_function(state::WRAPPER_NAME, wrap_name.clone());

        let mut wrapper = Wrapper::new();
        self.emit_parameter_variables(ast, n, &mut wrapper);
        self.marshal_input_args(
            ast,
            n,
            &mut wrapper,
            MarshalMode::Function,
            is_member,
            is_static,
        );
        let action = ast.attr(n, "wrap:action").unwrap_or("").to_string();
        self.marshal_output(ast, n, true, &mut wrapper, &action, None, true);
        self.emit_cleanup_code(ast, n, &mut wrapper);
        wrapper.code = wrapper.code.replace("$symname", &iname);

        let argcount = ast.attr(n, state::ARGCOUNT).unwrap_or("0").to_string();
        t_function
            .replace("$jswrapper", &wrap_name)
            .replace("$jslocals", &wrapper.locals)
            .replace("$jscode", &wrapper.code)
            .replace("$jsargcount", &argcount)
            .pretty_print(&mut self.wrappers);

        Ok(())
    }

    /// Generate the dispatcher that selects an overload by runtime argument
    /// count. Called once, for the last sibling of the chain; its symbol is
    /// the base wrapper symbol without any overname suffix.
    pub fn emit_function_dispatcher(&mut self, ast: &mut Ast, n: NodeId) -> Result<()> {
        let mut wrapper = Wrapper::new();

        let mut sibling = Some(ast.sym_first(n));
        while let Some(sibl) = sibling {
            if let Some(sibl_name) = ast.attr(sibl, "wrap:name").map(str::to_owned) {
                let argcount = ast.attr(sibl, state::ARGCOUNT).unwrap_or("0").to_string();
                let mut t_case = self.get_template("js_function_dispatch_case")?;
                t_case
                    .replace("$jswrapper", &sibl_name)
                    .replace("$jsargcount", &argcount);
                wrapper.code.push_str(&t_case.str());
            }
            sibling = ast.sym_next(sibl);
        }

        // the base symbol is the last wrapper name minus its overname suffix
        let last_name = ast.attr(n, "wrap:name").unwrap_or("").to_string();
        let overname = ast.attr(n, "sym:overname").unwrap_or("").to_string();
        let wrap_name = last_name
            .strip_suffix(overname.as_str())
            .unwrap_or(&last_name)
            .to_string();

        ast.set_attr(n, "wrap:name", wrap_name.clone());
        self.state.set_function(state::WRAPPER_NAME, wrap_name.clone());

        let mut t_dispatcher = self.get_template("js_function_dispatcher")?;
        t_dispatcher
            .replace("$jslocals", &wrapper.locals)
            .replace("$jscode", &wrapper.code)
            .replace("$jswrapper", &wrap_name)
            .replace(
                "$jsname",
                self.state.function(state::NAME).unwrap_or_default(),
            )
            .pretty_print(&mut self.wrappers);

        Ok(())
    }
}

/// Wrapper symbol for a function: the sym name prefixed by the joined
/// ancestor-namespace chain, suffixed `_static` for static members.
fn function_symbol(ast: &Ast, n: NodeId, iname: &str, is_static: bool) -> String {
    let mut parts = ast.namespace_chain(n);
    parts.push(iname.to_string());
    let mut symbol = parts.join("_");
    if is_static {
        symbol.push_str("_static");
    }
    symbol
}
