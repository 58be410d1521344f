//! Per-class emission: enter/exit, constructors, destructors.

use crate::emit::{CocosEmitter, NULL_TOKEN, SENTINEL_CLOSE, SENTINEL_OPEN};
use crate::marshal::MarshalMode;
use crate::state;
use crate::wrapper::{wrapper_name, Wrapper};
use segen_ast::{types, Ast, NodeId, NodeKind};
use segen_common::names;
use segen_common::Result;

impl CocosEmitter {
    /// Open a fresh class scope and seed its state.
    ///
    /// Every class starts out abstract; emitting a constructor clears the
    /// flag. If it is still set at `exit_class` the rendered ctor entry
    /// stays the null token and the class cannot be constructed from script.
    pub fn enter_class(&mut self, ast: &Ast, n: NodeId) -> Result<()> {
        self.state.push();

        let sym_name = ast.attr(n, "sym:name").unwrap_or("").to_string();
        let classtype = ast.attr(n, "classtype").unwrap_or("").to_string();
        let mangled = names::mangle(&classtype);

        self.state.set_clazz(state::NAME, sym_name.clone());
        self.state.set_clazz(state::NAME_MANGLED, mangled.clone());
        self.state.set_clazz(state::TYPE, classtype);
        self.state
            .set_clazz(state::TYPE_MANGLED, format!("p_{}", mangled));
        self.state.set_clazz(
            state::NSPACE,
            self.namespaces.current().name_mangled.clone(),
        );

        if ast.flag(n, "nested") {
            self.state
                .set_clazz(state::NEST_NAMES, nest_class_sym_names(ast, n));
        }

        self.state.set_clazz(state::CTOR, NULL_TOKEN);
        self.state.set_clazz(state::CTOR_DISPATCHERS, "");
        self.state.set_clazz(state::DTOR, "0");
        self.state.set_clazz(state::IS_ABSTRACT, "1");

        self.state.set_clazz(state::MEMBER_VARIABLES, "");
        self.state.set_clazz(state::MEMBER_FUNCTIONS, "");
        self.state.set_clazz(state::STATIC_VARIABLES, "");
        self.state.set_clazz(state::STATIC_FUNCTIONS, "");

        let mut t_decl = self.get_template("jsc_class_declaration")?;
        let mut decl = String::new();
        t_decl
            .replace("$jsmangledname", &mangled)
            .replace("$jsname", &sym_name)
            .pretty_print(&mut decl);
        self.wrappers.push_str(&decl);

        // list the class in the module initializer
        let mut t_register = self.get_template("jsc_class_registration")?;
        let mut register = String::new();
        t_register
            .replace("$jsname", &sym_name)
            .replace("$jsmangledname", &mangled)
            .replace(
                "$jsnspace",
                self.state.clazz(state::NSPACE).unwrap_or_default(),
            )
            .pretty_print(&mut register);
        self.state
            .append_global(state::REGISTER_CLASSES, &register);

        Ok(())
    }

    /// Render the class definition, its inheritance clause, the finalizer,
    /// struct property conversion for plain-data structs, and the header
    /// declaration; then pop the class scope.
    pub fn exit_class(&mut self, ast: &Ast, n: NodeId) -> Result<()> {
        self.state.clear_global(state::INITIALIZER);

        let name = self.state.clazz(state::NAME).unwrap_or("").to_string();
        let mangled = self
            .state
            .clazz(state::NAME_MANGLED)
            .unwrap_or("")
            .to_string();
        let ctor = self.state.clazz(state::CTOR).unwrap_or(NULL_TOKEN).to_string();
        let dtor = self.state.clazz(state::DTOR).unwrap_or("0").to_string();

        // Nested classes render their full enclosing-name chain. The list
        // syntax uses braces, which the pretty-printer would reflow, so the
        // braces travel as sentinels and are restored after printing.
        let display_name = match self.state.clazz(state::NEST_NAMES) {
            Some(list) => format!("{}{}{}", SENTINEL_OPEN, list, SENTINEL_CLOSE),
            None => name.clone(),
        };

        let mut inheritance = String::new();
        match ast.base_class(n) {
            Some(base) => {
                let base_mangled = names::mangle(ast.attr(base, "classtype").unwrap_or(""));
                let mut t = self.get_template("jsc_class_inherit")?;
                t.replace("$jsmangledname", &mangled)
                    .replace("$jsname", &display_name)
                    .replace("$jsctor", &ctor)
                    .replace("$jsbaseclassmangled", &base_mangled)
                    .pretty_print(&mut inheritance);
            }
            None => {
                let mut t = self.get_template("jsc_class_noinherit")?;
                t.replace("$jsmangledname", &mangled)
                    .replace("$jsname", &display_name)
                    .replace("$jsctor", &ctor)
                    .pretty_print(&mut inheritance);
            }
        }

        let finalize = if self.state.clazz_flag(state::DTOR) {
            let mut t = self.get_template("jsc_finalize_function")?;
            let mut out = String::new();
            t.replace("$jsmangledname", &mangled)
                .replace("$jsdtor", &dtor)
                .trim()
                .print(&mut out);
            out
        } else {
            String::new()
        };

        let mut t_class = self.get_template("jsc_class_definition")?;
        t_class
            .replace("$jsmangledname", &mangled)
            .replace("$jsclassname", ast.attr(n, "name").unwrap_or(""))
            .replace("$jsname", &name)
            .replace(
                "$jsmangledtype",
                self.state.clazz(state::TYPE_MANGLED).unwrap_or_default(),
            )
            .replace("$jsclass_inheritance", &inheritance)
            .replace("$jsctor", &ctor)
            .replace("$jsdtor", &dtor)
            .replace("$jsfinalizefunction", &finalize)
            .replace(
                "$jsnspace",
                self.state.clazz(state::NSPACE).unwrap_or_default(),
            )
            .replace(
                "$jsclassvariables",
                self.state.clazz(state::MEMBER_VARIABLES).unwrap_or_default(),
            )
            .replace(
                "$jsclassfunctions",
                self.state.clazz(state::MEMBER_FUNCTIONS).unwrap_or_default(),
            )
            .replace(
                "$jsstaticclassfunctions",
                self.state.clazz(state::STATIC_FUNCTIONS).unwrap_or_default(),
            )
            .replace(
                "$jsstaticclassvariables",
                self.state.clazz(state::STATIC_VARIABLES).unwrap_or_default(),
            );

        let mut definition = String::new();
        t_class.pretty_print(&mut definition);
        let definition = definition
            .replace(SENTINEL_OPEN, "{")
            .replace(SENTINEL_CLOSE, "}");
        self.state.append_global(state::INITIALIZER, &definition);

        self.wrappers
            .push_str(self.state.global(state::INITIALIZER).unwrap_or(""));

        if ast.attr(n, "kind") == Some("struct") {
            self.emit_struct_prop_conversion(ast, n)?;
        }

        // header-side declaration for the module header
        let mut t_header = self.get_template("jsc_class_declaration")?;
        let mut header_decl = String::new();
        t_header
            .replace("$jsmangledname", &mangled)
            .replace("$jsname", &name)
            .pretty_print(&mut header_decl);
        self.state
            .append_global(state::HEADER_REGISTER_CLASSES, &header_decl);

        self.state.pop();

        Ok(())
    }

    /// Field-by-field script/struct conversion helper for plain-data
    /// structs, plus its header declaration.
    fn emit_struct_prop_conversion(&mut self, ast: &Ast, n: NodeId) -> Result<()> {
        let mangled = self
            .state
            .clazz(state::NAME_MANGLED)
            .unwrap_or("")
            .to_string();
        let classtype = self.state.clazz(state::TYPE).unwrap_or("").to_string();
        let classname = ast.attr(n, "name").unwrap_or("").to_string();

        let mut snippets = String::new();
        for member in ast.children(n) {
            if *ast.kind(member) != NodeKind::Variable {
                continue;
            }
            if ast.attr(member, "storage") == Some("static") {
                continue;
            }
            if matches!(ast.attr(member, "access"), Some(access) if access != "public") {
                continue;
            }
            if ast.flag(member, "feature:ignore") {
                continue;
            }

            let field_name = ast.attr(member, "name").unwrap_or("");
            let symname = ast.attr(member, "sym:name").unwrap_or(field_name);
            let mut t = self.get_template("jsc_struct_prop_snippet")?;
            t.replace("$field_name", field_name)
                .replace("$field_symname", names::fix_keyword(symname))
                .pretty_print(&mut snippets);
        }

        let mut conversion = String::new();
        let mut t = self.get_template("jsc_struct_prop_conversion")?;
        t.replace("$jsmangledname", &mangled)
            .replace("$jsclassname", &classname)
            .replace("${type}", &classtype)
            .replace("$jscode", &snippets)
            .pretty_print(&mut conversion);
        self.wrappers.push_str(&conversion);

        let mut declare = String::new();
        let mut t = self.get_template("jsc_struct_prop_conversion_declare")?;
        t.replace("$jsmangledname", &mangled)
            .replace("$jsclassname", &classname)
            .replace("${type}", &classtype)
            .pretty_print(&mut declare);
        self.state
            .append_global(state::HEADER_REGISTER_CLASSES, &declare);

        Ok(())
    }

    /// Generate the wrapper for one constructor overload.
    pub fn emit_ctor(&mut self, ast: &mut Ast, n: NodeId) -> Result<()> {
        let is_overloaded = ast.flag(n, "sym:overloaded");
        let mangled = self
            .state
            .clazz(state::NAME_MANGLED)
            .unwrap_or("")
            .to_string();

        let base_name = wrapper_name(&format!("new_{}", mangled));
        let mut wrap_name = base_name.clone();
        let mut t_ctor = if is_overloaded {
            wrap_name.push_str(ast.attr(n, "sym:overname").unwrap_or(""));
            self.get_template("js_overloaded_ctor")?
        } else {
            self.get_template("js_ctor")?
        };
        ast.set_attr(n, "wrap:name", wrap_name.clone());

        // only non-abstract classes get constructors emitted
        self.state.set_clazz(state::IS_ABSTRACT, "0");

        let mut wrapper = Wrapper::new();
        self.emit_parameter_variables(ast, n, &mut wrapper);

        let result_ty = ast
            .attr(n, "type")
            .map(str::to_owned)
            .unwrap_or_else(|| format!("p.{}", self.state.clazz(state::TYPE).unwrap_or("")));
        wrapper.add_local(&format!("{} result;", types::cpp_str(&result_ty)));

        self.marshal_input_args(ast, n, &mut wrapper, MarshalMode::Ctor, true, false);
        let action = ast.attr(n, "wrap:action").unwrap_or("").to_string();
        wrapper.add_code(&action);
        self.emit_cleanup_code(ast, n, &mut wrapper);

        let argcount = ast.attr(n, state::ARGCOUNT).unwrap_or("0").to_string();
        t_ctor
            .replace("$jswrapper", &wrap_name)
            .replace(
                "$jsmangledtype",
                self.state.clazz(state::TYPE_MANGLED).unwrap_or_default(),
            )
            .replace("$jslocals", &wrapper.locals)
            .replace("$jscode", &wrapper.code)
            .replace("$jsargcount", &argcount)
            .pretty_print(&mut self.wrappers);

        let mut t_case = self.get_template("js_ctor_dispatch_case")?;
        t_case
            .replace("$jswrapper", &wrap_name)
            .replace("$jsargcount", &argcount);
        let case = t_case.str();
        self.state.append_clazz(state::CTOR_DISPATCHERS, &case);

        if is_overloaded {
            // the dispatching ctor is created after the last overload
            if ast.sym_next(n).is_none() {
                let mut t_main = self.get_template("js_ctor_dispatcher")?;
                t_main
                    .replace("$jswrapper", &base_name)
                    .replace("$jsmangledname", &mangled)
                    .replace(
                        "$jsname",
                        self.state.clazz(state::NAME).unwrap_or_default(),
                    )
                    .replace(
                        "$jsdispatchcases",
                        self.state.clazz(state::CTOR_DISPATCHERS).unwrap_or_default(),
                    )
                    .pretty_print(&mut self.wrappers);
                self.state.set_clazz(state::CTOR, base_name);
            }
        } else {
            self.state.set_clazz(state::CTOR, wrap_name);
        }

        Ok(())
    }

    /// Generate the destructor wrapper.
    pub fn emit_dtor(&mut self, ast: &mut Ast, n: NodeId) -> Result<()> {
        let mangled = self
            .state
            .clazz(state::NAME_MANGLED)
            .unwrap_or("")
            .to_string();
        let wrap_name = wrapper_name(&format!("delete_{}", mangled));

        let classtype = self.state.clazz(state::TYPE).unwrap_or("").to_string();
        let ctype = format!("{} *", types::cpp_str(&classtype));

        let jsfree = if types::is_array(&classtype) {
            format!("delete [] ({})", ctype)
        } else {
            format!("delete ({})", ctype)
        };

        // %extend destructors carry their helper function in wrap:code
        if let Some(wrap_code) = ast.attr(n, "wrap:code") {
            self.wrappers.push_str(wrap_code);
        }

        self.state.set_clazz(state::DTOR, wrap_name.clone());
        ast.set_attr(n, "wrap:name", wrap_name.clone());

        match ast.attr(n, "wrap:action").map(str::to_owned) {
            Some(destructor_action) => {
                let mut t_dtor = self.get_template("js_dtoroverride")?;
                t_dtor
                    .replace("${classname_mangled}", &mangled)
                    .replace("$jswrapper", &wrap_name)
                    .replace("$jsfree", &jsfree)
                    .replace("$jstype", &ctype)
                    .replace("${destructor_action}", &destructor_action)
                    .pretty_print(&mut self.wrappers);
            }
            None => {
                let mut t_dtor = self.get_template("js_dtor")?;
                t_dtor
                    .replace("$jsmangledname", &mangled)
                    .replace("$jswrapper", &wrap_name)
                    .replace("$jsfree", &jsfree)
                    .replace("$jstype", &ctype)
                    .pretty_print(&mut self.wrappers);
            }
        }

        Ok(())
    }
}

/// The ordered list of enclosing class sym-names for a nested class,
/// outermost first, terminating with the class itself, rendered as a
/// quoted, comma-separated list.
pub(crate) fn nest_class_sym_names(ast: &Ast, n: NodeId) -> String {
    let mut chain = vec![ast.attr(n, "sym:name").unwrap_or("").to_string()];
    let mut cursor = ast.parent(n);
    while let Some(node) = cursor {
        if *ast.kind(node) == NodeKind::Class {
            chain.push(ast.attr(node, "sym:name").unwrap_or("").to_string());
        }
        cursor = ast.parent(node);
    }
    chain.reverse();
    chain
        .iter()
        .map(|name| format!("\"{}\"", name))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::VETO_SET;

    fn class_templates(emitter: &mut CocosEmitter) {
        for (name, code) in [
            ("jsc_class_declaration", "se::Object* __jsb_$jsmangledname_proto = nullptr;\n"),
            ("jsc_class_registration", "js_register_$jsmangledname($jsnspace);\n"),
            ("jsc_class_definition", "se::Class* cls_$jsmangledname; $jsclass_inheritance"),
            ("jsc_class_inherit", "cls = se::Class::create($jsname, ns, __jsb_$jsbaseclassmangled_proto, _SE($jsctor));"),
            ("jsc_class_noinherit", "cls = se::Class::create($jsname, ns, nullptr, _SE($jsctor));"),
            ("js_dtor", "static bool $jswrapper(se::Object* obj) { $jsfree obj->getPrivateData(); }"),
            ("js_dtoroverride", "static bool $jswrapper(se::Object* obj) { ${type} arg1 = (${type})obj->getPrivateData(); ${destructor_action} }"),
            ("jsc_finalize_function", "js_$jsmangledname_finalize"),
        ] {
            emitter.register_template(name, code).unwrap();
        }
    }

    fn class_node(ast: &mut Ast, classtype: &str) -> NodeId {
        let top = ast.add_node(NodeKind::Top, None);
        let class = ast.add_node(NodeKind::Class, Some(top));
        ast.set_attr(class, "name", classtype);
        ast.set_attr(class, "sym:name", names::scope_last(classtype));
        ast.set_attr(class, "classtype", classtype);
        class
    }

    #[test]
    fn abstract_class_keeps_the_null_ctor_token() {
        let mut ast = Ast::new();
        let class = class_node(&mut ast, "cc::gfx::Shape");

        let mut emitter = CocosEmitter::quiet(false);
        class_templates(&mut emitter);
        emitter.enter_class(&ast, class).unwrap();
        assert!(emitter.state.clazz_flag(state::IS_ABSTRACT));
        emitter.exit_class(&ast, class).unwrap();

        assert!(emitter.wrappers.contains("_SE(nullptr)"));
        assert_eq!(emitter.state.depth(), 1);
    }

    #[test]
    fn default_dtor_uses_plain_delete() {
        let mut ast = Ast::new();
        let class = class_node(&mut ast, "Klass");
        let dtor = ast.add_node(NodeKind::Destructor, Some(class));
        ast.set_attr(dtor, "sym:name", "~Klass");

        let mut emitter = CocosEmitter::quiet(false);
        class_templates(&mut emitter);
        emitter.enter_class(&ast, class).unwrap();
        emitter.emit_dtor(&mut ast, dtor).unwrap();

        assert!(emitter.wrappers.contains("js_delete_Klass"));
        assert!(emitter.wrappers.contains("delete (Klass *)"));
        assert_eq!(emitter.state.clazz(state::DTOR), Some("js_delete_Klass"));
    }

    #[test]
    fn user_action_routes_through_the_override_template() {
        let mut ast = Ast::new();
        let class = class_node(&mut ast, "MyData");
        let dtor = ast.add_node(NodeKind::Destructor, Some(class));
        ast.set_attr(dtor, "sym:name", "~MyData");
        ast.set_attr(dtor, "wrap:action", "FreeData(arg1);");

        let mut emitter = CocosEmitter::quiet(false);
        class_templates(&mut emitter);
        emitter.enter_class(&ast, class).unwrap();
        emitter.emit_dtor(&mut ast, dtor).unwrap();

        assert!(emitter.wrappers.contains("FreeData(arg1);"));
        assert!(!emitter.wrappers.contains("delete (MyData *)"));
    }

    #[test]
    fn array_class_type_deletes_with_brackets() {
        let mut ast = Ast::new();
        let class = class_node(&mut ast, "a(4).Block");
        let dtor = ast.add_node(NodeKind::Destructor, Some(class));
        ast.set_attr(dtor, "sym:name", "~Block");

        let mut emitter = CocosEmitter::quiet(false);
        class_templates(&mut emitter);
        emitter.enter_class(&ast, class).unwrap();
        emitter.emit_dtor(&mut ast, dtor).unwrap();

        assert!(emitter.wrappers.contains("delete [] (Block [4] *)"));
    }

    #[test]
    fn emitted_ctor_clears_the_abstract_flag_and_registers() {
        let mut ast = Ast::new();
        let class = class_node(&mut ast, "cc::gfx::Circle");
        let ctor = ast.add_node(NodeKind::Constructor, Some(class));
        ast.set_attr(ctor, "sym:name", "Circle");
        ast.set_attr(ctor, "type", "p.cc::gfx::Circle");
        ast.set_attr(ctor, "wrap:action", "result = new cc::gfx::Circle();");

        let mut emitter = CocosEmitter::quiet(false);
        class_templates(&mut emitter);
        emitter
            .register_template("js_ctor", "static bool $jswrapper(se::State& s) { $jslocals $jscode }")
            .unwrap();
        emitter
            .register_template("js_ctor_dispatch_case", "case $jsargcount: return $jswrapper(s);\n")
            .unwrap();

        emitter.enter_class(&ast, class).unwrap();
        emitter.emit_ctor(&mut ast, ctor).unwrap();

        assert!(!emitter.state.clazz_flag(state::IS_ABSTRACT));
        assert_eq!(
            emitter.state.clazz(state::CTOR),
            Some("js_new_cc_gfx_Circle")
        );
        assert!(emitter.wrappers.contains("js_new_cc_gfx_Circle"));
        assert!(emitter
            .wrappers
            .contains("result = new cc::gfx::Circle();"));
    }

    #[test]
    fn nest_chain_is_outermost_first_and_quoted() {
        let mut ast = Ast::new();
        let top = ast.add_node(NodeKind::Top, None);
        let outer = ast.add_node(NodeKind::Class, Some(top));
        ast.set_attr(outer, "sym:name", "Square");
        let inner = ast.add_node(NodeKind::Class, Some(outer));
        ast.set_attr(inner, "sym:name", "MyEnumClass");

        assert_eq!(
            nest_class_sym_names(&ast, inner),
            "\"Square\",\"MyEnumClass\""
        );
    }

    #[test]
    fn veto_setter_constant_is_the_cocos_symbol() {
        assert_eq!(VETO_SET, "JS_veto_set_variable");
    }
}
