//! Parameter lists with attached typemap attributes.

use crate::types;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// One parameter of a wrapped declaration.
///
/// The front-end attaches typemap snippets (`tmap:in`, `tmap:check`,
/// `tmap:argout`, `tmap:freearg`, …) before the tree reaches the backend.
/// "next" chains (`tmap:in:next`) are positional: the parameter at the next
/// index. A parameter with `tmap:in:numinputs == "0"` consumes no script
/// argument.
#[derive(Debug, Clone, Default)]
pub struct Parm {
    attrs: FxHashMap<SmolStr, String>,
}

impl Parm {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        let mut parm = Parm::default();
        parm.set("name", name);
        parm.set("type", ty);
        parm
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.attrs.insert(SmolStr::new(key), value.into());
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Some(v) if v != "0")
    }

    pub fn ty(&self) -> &str {
        self.get("type").unwrap_or("")
    }

    /// Local variable name inside the wrapper body (`arg1`, `arg2`, …).
    pub fn lname(&self) -> &str {
        self.get("lname").unwrap_or("")
    }

    /// True when the input typemap consumes no script-side argument.
    pub fn consumes_no_input(&self) -> bool {
        self.get("tmap:in:numinputs") == Some("0")
    }
}

/// Skip parameters whose input typemap consumes no argument, starting at
/// `idx`; returns the index of the next consuming parameter.
pub fn skip_ignored_args(parms: &[Parm], mut idx: usize) -> usize {
    while idx < parms.len() && parms[idx].consumes_no_input() {
        idx += 1;
    }
    idx
}

/// Number of script-side arguments the parameter list consumes.
///
/// Varargs terminate the count; the variadic tail is not a fixed argument.
pub fn num_arguments(parms: &[Parm]) -> usize {
    let mut count = 0;
    for parm in parms {
        if types::is_varargs(parm.ty()) {
            break;
        }
        if !parm.consumes_no_input() {
            count += 1;
        }
    }
    count
}

/// Assign default local names (`arg1`, `arg2`, …) to parameters that the
/// front-end did not name explicitly.
pub fn assign_local_names(parms: &mut [Parm]) {
    for (i, parm) in parms.iter_mut().enumerate() {
        if parm.get("lname").is_none() {
            parm.set("lname", format!("arg{}", i + 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_only_consuming_parameters() {
        let parms = vec![
            Parm::new("x", "int"),
            Parm::new("unused", "int").with("tmap:in:numinputs", "0"),
            Parm::new("y", "float"),
        ];
        assert_eq!(num_arguments(&parms), 2);
    }

    #[test]
    fn varargs_terminate_the_count() {
        let parms = vec![Parm::new("fmt", "p.q(const).char"), Parm::new("rest", "v(...)")];
        assert_eq!(num_arguments(&parms), 1);
    }

    #[test]
    fn skips_non_consuming_parameters() {
        let parms = vec![
            Parm::new("ignored", "int").with("tmap:in:numinputs", "0"),
            Parm::new("x", "int"),
        ];
        assert_eq!(skip_ignored_args(&parms, 0), 1);
    }

    #[test]
    fn assigns_default_local_names() {
        let mut parms = vec![Parm::new("x", "int"), Parm::new("y", "int").with("lname", "self_")];
        assign_local_names(&mut parms);
        assert_eq!(parms[0].lname(), "arg1");
        assert_eq!(parms[1].lname(), "self_");
    }
}
