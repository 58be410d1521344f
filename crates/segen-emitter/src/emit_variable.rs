//! Variable emission: getters, setters, table registration.

use crate::emit::{CocosEmitter, NULL_TOKEN, VETO_SET};
use crate::marshal::MarshalMode;
use crate::state;
use crate::wrapper::{wrapper_name, Wrapper};
use segen_ast::{types, Ast, NodeId, NodeKind};
use segen_common::names;
use segen_common::Result;

impl CocosEmitter {
    pub fn enter_variable(&mut self, ast: &Ast, n: NodeId) {
        self.state.reset_variable();

        // 'sym:name' respects renames; member constants carry their pure
        // name in a handler-scoped attribute
        let name = if ast.attr(n, "view") == Some("memberconstantHandler") {
            ast.attr(n, "memberconstantHandler:sym:name")
                .unwrap_or("")
                .to_string()
        } else {
            names::scope_last(ast.attr(n, "sym:name").unwrap_or("")).to_string()
        };
        self.state.set_variable(state::NAME, name);

        if ast.attr(n, "storage") == Some("static") {
            self.state.set_variable(state::IS_STATIC, "1");
        }

        if ast.flag(n, "feature:immutable") {
            self.state.set_variable(state::IS_IMMUTABLE, "1");
        }
        // assigning to char[] is not valid C++, so these are always read-only
        if ast.attr(n, "type") == Some("a().char") {
            self.state.set_variable(state::IS_IMMUTABLE, "1");
        }

        if ast.flag(n, "feature:writeonly") {
            self.state.set_variable(state::IS_WRITE_ONLY, "1");
        }

        // defaults until the emitters overwrite them
        self.state.set_variable(state::GETTER, NULL_TOKEN);
        self.state.set_variable(state::SETTER, VETO_SET);
    }

    /// Register the getter/setter pair into the matching table.
    pub fn exit_variable(&mut self, ast: &Ast, n: NodeId) -> Result<()> {
        let name = self.state.variable(state::NAME).unwrap_or("").to_string();
        let getter = self.state.variable(state::GETTER).unwrap_or("").to_string();
        let setter = self.state.variable(state::SETTER).unwrap_or("").to_string();

        if ast.flag(n, "ismember") {
            if self.state.variable_flag(state::IS_STATIC)
                || *ast.kind(n) == NodeKind::EnumItem
            {
                let mut t = self.get_template("jsc_static_variable_declaration")?;
                let mut out = String::new();
                t.replace("$jsname", &name)
                    .replace("$jsgetter", &getter)
                    .replace("$jssetter", &setter)
                    .pretty_print(&mut out);
                self.state.append_clazz(state::STATIC_VARIABLES, &out);
            } else {
                let mut t = self.get_template("jsc_variable_declaration")?;
                let mut out = String::new();
                t.replace("$jsname", &name)
                    .replace("$jsgetter", &getter)
                    .replace("$jssetter", &setter)
                    .pretty_print(&mut out);
                self.state.append_clazz(state::MEMBER_VARIABLES, &out);
            }
        } else {
            let mut t = self.get_template("jsc_global_variable_declaration")?;
            let mut out = String::new();
            t.replace("$jsname", &name)
                .replace("$jsgetter", &getter)
                .replace("$jssetter", &setter)
                .pretty_print(&mut out);
            self.namespaces.current_mut().values.push_str(&out);
        }

        Ok(())
    }

    /// Generate a getter wrapper.
    pub fn emit_getter(
        &mut self,
        ast: &mut Ast,
        n: NodeId,
        is_member: bool,
        is_static: bool,
    ) -> Result<()> {
        // write-only variables get no getter
        if self.state.variable_flag(state::IS_WRITE_ONLY) {
            return Ok(());
        }

        let mut t_getter = self.get_template("js_getter")?;
        let wrap_name = accessor_symbol(ast, n, "_get");
        ast.set_attr(n, "wrap:name", wrap_name.clone());
        self.state.set_variable(state::GETTER, wrap_name.clone());

        let mut wrapper = Wrapper::new();
        self.emit_parameter_variables(ast, n, &mut wrapper);
        self.marshal_input_args(ast, n, &mut wrapper, MarshalMode::Getter, is_member, is_static);

        // plain members read the field directly through 'this'; no action,
        // no separate return variable
        if is_direct_member_access(ast, n, is_member, is_static) {
            let field = names::scope_last(ast.attr(n, "name").unwrap_or("")).to_string();
            let cresult = format!("arg1->{}", field);
            self.marshal_output(ast, n, true, &mut wrapper, "", Some(&cresult), false);
        } else {
            let action = ast
                .attr(n, "wrap:action:get")
                .or_else(|| ast.attr(n, "wrap:action"))
                .unwrap_or("")
                .to_string();
            self.marshal_output(ast, n, true, &mut wrapper, &action, None, true);
        }

        self.emit_cleanup_code(ast, n, &mut wrapper);

        t_getter
            .replace("$jswrapper", &wrap_name)
            .replace("$jslocals", &wrapper.locals)
            .replace("$jscode", &wrapper.code)
            .pretty_print(&mut self.wrappers);

        Ok(())
    }

    /// Generate a setter wrapper.
    pub fn emit_setter(
        &mut self,
        ast: &mut Ast,
        n: NodeId,
        is_member: bool,
        is_static: bool,
    ) -> Result<()> {
        // immutable variables keep the veto setter
        if self.state.variable_flag(state::IS_IMMUTABLE) {
            return Ok(());
        }

        let mut t_setter = self.get_template("js_setter")?;
        let wrap_name = accessor_symbol(ast, n, "_set");
        ast.set_attr(n, "wrap:name", wrap_name.clone());
        self.state.set_variable(state::SETTER, wrap_name.clone());

        // Plain members write straight into the field: the value
        // parameter's local is rebound to `arg1-><field>` so the input
        // typemap assigns the member itself. Pointer-typed values (INOUT
        // typemaps such as std::string*) keep their own local and route
        // through it instead.
        let mut direct_write = false;
        if is_direct_member_access(ast, n, is_member, is_static) {
            let value_idx = ast.parms(n).len().saturating_sub(1);
            if ast.parms(n).len() == 2 && !types::is_pointer(ast.parms(n)[value_idx].ty()) {
                let field = names::scope_last(ast.attr(n, "name").unwrap_or("")).to_string();
                ast.parms_mut(n)[value_idx].set("lname", format!("arg1->{}", field));
                direct_write = true;
            }
        }

        let mut wrapper = Wrapper::new();
        self.emit_parameter_variables(ast, n, &mut wrapper);
        self.marshal_input_args(ast, n, &mut wrapper, MarshalMode::Setter, is_member, is_static);

        if !direct_write {
            let action = ast
                .attr(n, "wrap:action:set")
                .or_else(|| ast.attr(n, "wrap:action"))
                .unwrap_or("")
                .to_string();
            if !action.is_empty() {
                wrapper.add_code(&action);
            }
        }

        self.emit_cleanup_code(ast, n, &mut wrapper);

        t_setter
            .replace("$jswrapper", &wrap_name)
            .replace("$jslocals", &wrapper.locals)
            .replace("$jscode", &wrapper.code)
            .pretty_print(&mut self.wrappers);

        Ok(())
    }
}

/// True when the accessor can touch the member through `this` directly:
/// an ordinary member of an ordinary class, not `%extend`ed, not static.
fn is_direct_member_access(ast: &Ast, n: NodeId, is_member: bool, is_static: bool) -> bool {
    is_member && !is_static && !ast.flag(n, "feature:extend")
}

/// Wrapper symbol for a getter or setter.
///
/// `variableWrapper:name` wins when the front-end provides it; otherwise
/// the sym name is prefixed with the joined ancestor-namespace chain.
fn accessor_symbol(ast: &Ast, n: NodeId, suffix: &str) -> String {
    if let Some(vw_name) = ast.attr(n, "variableWrapper:name") {
        return wrapper_name(&format!("{}{}", names::mangle(vw_name), suffix));
    }
    let mut parts = ast.namespace_chain(n);
    parts.push(ast.attr(n, "sym:name").unwrap_or("").to_string());
    wrapper_name(&format!("{}{}", parts.join("_"), suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state;
    use segen_ast::Parm;

    fn variable_templates(emitter: &mut CocosEmitter) {
        for (name, code) in [
            ("js_getter", "static bool $jswrapper(se::State& s) { $jslocals $jscode }"),
            ("js_setter", "static bool $jswrapper(se::State& s) { $jslocals $jscode }"),
            ("jsc_variable_declaration", "cls->defineProperty(\"$jsname\", _SE($jsgetter), _SE($jssetter));\n"),
            ("jsc_static_variable_declaration", "cls->defineStaticProperty(\"$jsname\", _SE($jsgetter), _SE($jssetter));\n"),
            ("jsc_global_variable_declaration", "ns->defineProperty(\"$jsname\", _SE($jsgetter), _SE($jssetter));\n"),
        ] {
            emitter.register_template(name, code).unwrap();
        }
    }

    fn member_variable(ast: &mut Ast, name: &str, value_ty: &str, value_tmap: &str) -> NodeId {
        let top = ast.add_node(NodeKind::Top, None);
        let class = ast.add_node(NodeKind::Class, Some(top));
        ast.set_attr(class, "sym:name", "Klass");
        ast.set_attr(class, "classtype", "Klass");
        let var = ast.add_node(NodeKind::Variable, Some(class));
        ast.set_attr(var, "name", name);
        ast.set_attr(var, "sym:name", name);
        ast.set_attr(var, "kind", "variable");
        ast.set_flag(var, "ismember");
        ast.set_attr(var, "variableWrapper:name", format!("Klass_{}", name));
        ast.set_parms(
            var,
            vec![
                Parm::new("self", "p.Klass")
                    .with("lname", "arg1")
                    .with("tmap:in", "$1 = (Klass*)($input)->getPrivateData();"),
                Parm::new("value", value_ty)
                    .with("lname", "arg2")
                    .with("tmap:in", value_tmap),
            ],
        );
        var
    }

    #[test]
    fn plain_member_setter_writes_straight_into_the_field() {
        let mut ast = Ast::new();
        let var = member_variable(&mut ast, "mX", "int", "$1 = ($input).toInt32();");

        let mut emitter = CocosEmitter::quiet(false);
        variable_templates(&mut emitter);
        emitter.enter_variable(&ast, var);
        emitter.emit_setter(&mut ast, var, true, false).unwrap();

        assert!(emitter.wrappers.contains("js_Klass_mX_set"));
        assert!(emitter.wrappers.contains("arg1->mX = (value).toInt32();"));
        // the rebound parameter gets no local declaration
        assert!(!emitter.wrappers.contains("int arg2"));
    }

    #[test]
    fn pointer_values_route_through_the_value_parameter() {
        let mut ast = Ast::new();
        let var = member_variable(
            &mut ast,
            "name",
            "p.std::string",
            "$1 = to_string_ptr($input);",
        );
        ast.set_attr(var, "wrap:action:set", "arg1->name = *arg2;");

        let mut emitter = CocosEmitter::quiet(false);
        variable_templates(&mut emitter);
        emitter.enter_variable(&ast, var);
        emitter.emit_setter(&mut ast, var, true, false).unwrap();

        // no rewrite to arg1->name inside the typemap
        assert!(emitter.wrappers.contains("arg2 = to_string_ptr(value);"));
        assert!(emitter.wrappers.contains("std::string * arg2 ;"));
        assert!(emitter.wrappers.contains("arg1->name = *arg2;"));
    }

    #[test]
    fn char_array_variables_are_always_immutable() {
        let mut ast = Ast::new();
        let var = member_variable(&mut ast, "label", "a().char", "$1 = ($input).toCString();");
        ast.set_attr(var, "type", "a().char");

        let mut emitter = CocosEmitter::quiet(false);
        variable_templates(&mut emitter);
        emitter.enter_variable(&ast, var);
        assert!(emitter.state.variable_flag(state::IS_IMMUTABLE));

        emitter.emit_setter(&mut ast, var, true, false).unwrap();
        // the setter was vetoed: nothing was emitted and the veto symbol stays
        assert!(emitter.wrappers.is_empty());
        assert_eq!(emitter.state.variable(state::SETTER), Some(VETO_SET));
    }

    #[test]
    fn write_only_variables_get_no_getter() {
        let mut ast = Ast::new();
        let var = member_variable(&mut ast, "password", "int", "$1 = ($input).toInt32();");
        ast.set_flag(var, "feature:writeonly");

        let mut emitter = CocosEmitter::quiet(false);
        variable_templates(&mut emitter);
        emitter.enter_variable(&ast, var);
        emitter.emit_getter(&mut ast, var, true, false).unwrap();

        assert!(emitter.wrappers.is_empty());
        assert_eq!(emitter.state.variable(state::GETTER), Some(NULL_TOKEN));
    }

    #[test]
    fn getter_reads_the_member_through_this() {
        let mut ast = Ast::new();
        let var = member_variable(&mut ast, "mX", "int", "$1 = ($input).toInt32();");
        ast.set_attr(var, "type", "int");
        ast.set_attr(var, "tmap:out", "$result.setInt32($1);");
        // the getter view sees the parameter list without the value parm
        ast.parms_mut(var).pop();

        let mut emitter = CocosEmitter::quiet(false);
        variable_templates(&mut emitter);
        emitter.enter_variable(&ast, var);
        emitter.emit_getter(&mut ast, var, true, false).unwrap();

        assert!(emitter.wrappers.contains("js_Klass_mX_get"));
        assert!(emitter
            .wrappers
            .contains("arg1 = (Klass*)(thisObject)->getPrivateData();"));
        assert!(emitter.wrappers.contains("jsresult.setInt32(arg1->mX);"));
        // direct member reads declare no result variable
        assert!(!emitter.wrappers.contains("int result;"));
    }

    #[test]
    fn static_members_and_enum_items_register_as_statics() {
        let mut ast = Ast::new();
        let var = member_variable(&mut ast, "sCount", "int", "$1 = ($input).toInt32();");
        ast.set_attr(var, "storage", "static");

        let mut emitter = CocosEmitter::quiet(false);
        variable_templates(&mut emitter);
        emitter.enter_variable(&ast, var);
        emitter.exit_variable(&ast, var).unwrap();

        let statics = emitter.state.clazz(state::STATIC_VARIABLES).unwrap_or("");
        assert!(statics.contains("defineStaticProperty(\"sCount\""));
    }
}
