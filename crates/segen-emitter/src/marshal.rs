//! Typemap marshalling: argument binding, output binding, cleanup.
//!
//! Every parameter reaches the backend with its typemap snippets already
//! attached (`tmap:in`, `tmap:check`, `tmap:argout`, `tmap:freearg`). The
//! marshaller picks the script-side source expression for each argument,
//! substitutes the snippet's slots and appends the result to the wrapper
//! body. Snippets reference the C-side local as `$1` and the script-side
//! source as `$input`.

use crate::emit::CocosEmitter;
use crate::state;
use crate::wrapper::Wrapper;
use segen_ast::{types, Ast, NodeId};
use segen_common::names;
use segen_common::Diagnostic;

/// What kind of wrapper the arguments are being marshalled for. The mode
/// decides where each argument comes from: `this`, `args[i]`, or the
/// setter's `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarshalMode {
    Getter,
    Setter,
    Ctor,
    Function,
}

impl CocosEmitter {
    /// Bind every input argument of `n` into the wrapper body.
    ///
    /// Members carry an implicit `this` in slot 0, except static members
    /// and constructors. The computed script-side argument count is stored
    /// on the node as `wrap:argc` for the argument check and the overload
    /// dispatcher.
    pub(crate) fn marshal_input_args(
        &mut self,
        ast: &mut Ast,
        n: NodeId,
        wrapper: &mut Wrapper,
        mode: MarshalMode,
        is_member: bool,
        is_static: bool,
    ) {
        let start_idx = if is_member && !is_static && mode != MarshalMode::Ctor {
            1
        } else {
            0
        };

        let num_args = segen_ast::parm::num_arguments(ast.parms(n)).saturating_sub(start_idx);
        ast.set_attr(n, state::ARGCOUNT, num_args.to_string());

        let parm_count = ast.parms(n).len();
        let mut script_idx = 0usize;

        for pi in 0..parm_count {
            let ty = ast.parms(n)[pi].ty().to_string();

            // ignore varargs
            if types::is_varargs(&ty) {
                break;
            }

            let consumes = !ast.parms(n)[pi].consumes_no_input();
            let arg = if !consumes {
                String::new()
            } else {
                match mode {
                    MarshalMode::Getter | MarshalMode::Function => {
                        if is_member && !is_static && script_idx == 0 {
                            "thisObject".to_string()
                        } else {
                            format!("args[{}]", script_idx - start_idx)
                        }
                    }
                    MarshalMode::Setter => {
                        if is_member && !is_static && script_idx == 0 {
                            "thisObject".to_string()
                        } else {
                            "value".to_string()
                        }
                    }
                    MarshalMode::Ctor => format!("args[{}]", script_idx),
                }
            };

            self.emit_input_typemap(ast, n, pi, wrapper, &arg);

            if consumes {
                script_idx += 1;
            }
        }

        // constraint checking code comes in a second pass
        for pi in 0..parm_count {
            let (check, lname) = {
                let parm = &ast.parms(n)[pi];
                (
                    parm.get("tmap:check").map(str::to_owned),
                    parm.lname().to_string(),
                )
            };
            if let Some(check) = check {
                wrapper.add_code(&check.replace("$1", &lname));
            }
        }
    }

    /// Emit the input typemap of one parameter, or warn if there is none.
    fn emit_input_typemap(
        &mut self,
        ast: &mut Ast,
        n: NodeId,
        pi: usize,
        wrapper: &mut Wrapper,
        arg: &str,
    ) {
        let symname = ast.attr(n, "sym:name").unwrap_or("").to_string();
        let (tm, ty, lname, disown) = {
            let parm = &ast.parms(n)[pi];
            (
                parm.get("tmap:in").map(str::to_owned),
                parm.ty().to_string(),
                parm.lname().to_string(),
                parm.flag("wrap:disown") || parm.flag("tmap:in:disown"),
            )
        };

        match tm {
            Some(tm) => {
                let disown = if disown { "SWIG_POINTER_DISOWN" } else { "0" };
                let code = tm
                    .replace("$input", arg)
                    .replace("$1", &lname)
                    .replace("$disown", disown)
                    .replace("$symname", &symname);
                wrapper.add_code(&code);
                ast.parms_mut(n)[pi].set("emit:input", arg);
            }
            None => {
                let (file, line) = ast.location(n);
                self.sink.report(
                    Diagnostic::warning(format!(
                        "unable to use type {} as a function argument",
                        types::cpp_str(&ty)
                    ))
                    .at(file, line),
                );
            }
        }
    }

    /// Bind the wrapper result: action code, `out` typemap, `argout`
    /// fragments, and the `$result` → `jsresult` rewrite.
    pub(crate) fn marshal_output(
        &mut self,
        ast: &mut Ast,
        n: NodeId,
        use_parms: bool,
        wrapper: &mut Wrapper,
        actioncode: &str,
        cresult: Option<&str>,
        emit_return_variable: bool,
    ) {
        let ty = ast.attr(n, "type").unwrap_or("").to_string();

        if emit_return_variable && !ty.is_empty() && ty != "void" {
            wrapper.add_local(&format!("{} result;", types::cpp_str(&ty)));
        }

        let cresult = cresult.unwrap_or("result");

        if !actioncode.is_empty() {
            wrapper.add_code(actioncode);
        }

        match ast.attr(n, "tmap:out").map(str::to_owned) {
            Some(tm) => {
                let objecttype =
                    names::scope_last(&types::cpp_str(types::strip_qualifiers(&ty))).to_string();
                let owner = if ast.flag(n, "feature:new") {
                    "SWIG_POINTER_OWN"
                } else {
                    "0"
                };
                let code = tm
                    .replace("$1", cresult)
                    .replace("$objecttype", &objecttype)
                    .replace("$owner", owner);
                if !code.is_empty() {
                    wrapper.add_code(&code);
                }
            }
            None => {
                if !ty.is_empty() && ty != "void" {
                    let (file, line) = ast.location(n);
                    let name = ast.attr(n, "name").unwrap_or("").to_string();
                    self.sink.report(
                        Diagnostic::warning(format!(
                            "unable to use return type {} in function {}",
                            types::cpp_str(&ty),
                            name
                        ))
                        .at(file, line),
                    );
                }
            }
        }

        if use_parms {
            for pi in 0..ast.parms(n).len() {
                let (argout, input, lname) = {
                    let parm = &ast.parms(n)[pi];
                    (
                        parm.get("tmap:argout").map(str::to_owned),
                        parm.get("emit:input").unwrap_or("").to_string(),
                        parm.lname().to_string(),
                    )
                };
                if let Some(argout) = argout {
                    wrapper.add_code(&argout.replace("$input", &input).replace("$1", &lname));
                }
            }
        }

        wrapper.code = wrapper.code.replace("$result", "jsresult");
    }

    /// Argument cleanup: `freearg` per parameter, `newfree` for owned
    /// results, and the `ret` typemap if one exists.
    pub(crate) fn emit_cleanup_code(&mut self, ast: &mut Ast, n: NodeId, wrapper: &mut Wrapper) {
        for pi in 0..ast.parms(n).len() {
            let (freearg, input, lname) = {
                let parm = &ast.parms(n)[pi];
                (
                    parm.get("tmap:freearg").map(str::to_owned),
                    parm.get("emit:input").unwrap_or("").to_string(),
                    parm.lname().to_string(),
                )
            };
            if let Some(freearg) = freearg {
                if !freearg.is_empty() {
                    wrapper.add_code(&freearg.replace("$input", &input).replace("$1", &lname));
                }
            }
        }

        if ast.flag(n, "feature:new") {
            if let Some(newfree) = ast.attr(n, "tmap:newfree").map(str::to_owned) {
                wrapper.add_code(&newfree);
            }
        }

        if let Some(ret) = ast.attr(n, "tmap:ret").map(str::to_owned) {
            wrapper.add_code(&ret);
        }
    }

    /// Emit a local declaration per parameter. Parameters whose local name
    /// was rebound to a member access (`arg1->field`) get no declaration.
    pub(crate) fn emit_parameter_variables(&self, ast: &Ast, n: NodeId, wrapper: &mut Wrapper) {
        for parm in ast.parms(n) {
            let lname = parm.lname();
            if lname.is_empty() || lname.contains("->") {
                continue;
            }
            let ty = parm.ty();
            if types::is_varargs(ty) {
                continue;
            }
            wrapper.add_local(&format!("{} {} ;", types::cpp_str(ty), lname));
        }
    }
}
