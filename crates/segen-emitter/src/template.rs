//! Code template store and template instances.
//!
//! Templates are registered once, while fragment directives are processed,
//! and are read-only afterwards. Acquiring a template clones it into a
//! mutable instance; substitution is plain textual replacement of literal
//! placeholder tokens (`$jsWrapper`, `${identifier}`), order-independent and
//! without any escaping grammar.

use crate::pretty;
use rustc_hash::FxHashMap;
use segen_common::{Error, Result};
use smol_str::SmolStr;

#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: FxHashMap<SmolStr, String>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `code` verbatim under `name`.
    pub fn register(&mut self, name: &str, code: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::NullTemplate);
        }
        self.templates.insert(SmolStr::new(name), code.to_string());
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Clone the registered code into a fresh instance.
    pub fn acquire(&self, name: &str, debug: bool) -> Result<Template> {
        let code = self
            .templates
            .get(name)
            .ok_or_else(|| Error::MissingTemplate(name.to_string()))?;
        Ok(Template {
            code: code.clone(),
            name: name.to_string(),
            debug,
        })
    }
}

/// A mutable clone of a registered template.
#[derive(Debug, Clone)]
pub struct Template {
    code: String,
    name: String,
    debug: bool,
}

impl Template {
    pub fn from_code(code: &str) -> Self {
        Self {
            code: code.to_string(),
            name: String::new(),
            debug: false,
        }
    }

    /// Replace every occurrence of `pattern`, returning `self` for chaining.
    pub fn replace(&mut self, pattern: &str, repl: &str) -> &mut Self {
        self.code = self.code.replace(pattern, repl);
        self
    }

    /// Strip leading and trailing ASCII whitespace.
    pub fn trim(&mut self) -> &mut Self {
        self.code = self
            .code
            .trim_matches(|c: char| matches!(c, ' ' | '\t' | '\r' | '\n'))
            .to_string();
        self
    }

    /// The rendered code; in debug mode wrapped in markers naming the
    /// template, so generated output can be traced back to its fragment.
    pub fn str(&self) -> String {
        if self.debug && !self.name.is_empty() {
            format!(
                "/* begin fragment(\"{name}\") */\n{code}\n/* end fragment(\"{name}\") */\n",
                name = self.name,
                code = self.code
            )
        } else {
            self.code.clone()
        }
    }

    /// Append verbatim.
    pub fn print(&self, sink: &mut String) -> &Self {
        sink.push_str(&self.str());
        self
    }

    /// Append with brace-aware re-indentation.
    pub fn pretty_print(&self, sink: &mut String) -> &Self {
        pretty::pretty_print(&self.str(), sink);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_clones_the_registered_code() {
        let mut store = TemplateStore::new();
        store.register("js_function", "void $jswrapper() {}").unwrap();

        let mut a = store.acquire("js_function", false).unwrap();
        a.replace("$jswrapper", "js_f");
        let b = store.acquire("js_function", false).unwrap();

        assert_eq!(a.str(), "void js_f() {}");
        assert_eq!(b.str(), "void $jswrapper() {}");
    }

    #[test]
    fn missing_template_is_fatal() {
        let store = TemplateStore::new();
        assert!(matches!(
            store.acquire("js_ctor", false),
            Err(Error::MissingTemplate(name)) if name == "js_ctor"
        ));
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut store = TemplateStore::new();
        assert!(matches!(store.register("", "code"), Err(Error::NullTemplate)));
    }

    #[test]
    fn replacement_chains_and_hits_all_occurrences() {
        let mut t = Template::from_code("$a $b $a");
        t.replace("$a", "x").replace("$b", "y");
        assert_eq!(t.str(), "x y x");
    }

    #[test]
    fn trim_strips_surrounding_whitespace() {
        let mut t = Template::from_code("\n  body  \n\t");
        t.trim();
        assert_eq!(t.str(), "body");
    }

    #[test]
    fn debug_mode_wraps_in_fragment_markers() {
        let mut store = TemplateStore::new();
        store.register("js_dtor", "free($x);").unwrap();
        let t = store.acquire("js_dtor", true).unwrap();
        let rendered = t.str();
        assert!(rendered.starts_with("/* begin fragment(\"js_dtor\") */"));
        assert!(rendered.trim_end().ends_with("/* end fragment(\"js_dtor\") */"));
        assert!(rendered.contains("free($x);"));
    }
}
