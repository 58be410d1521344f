//! Name mangling and `::`-scope helpers.
//!
//! Mangled names are derived from qualified C++ type strings and must be
//! valid C identifiers: every character outside `[A-Za-z0-9_]` is replaced
//! with an underscore or removed. The replacement set matches what the glue
//! templates expect, so `cc::gfx::Device` becomes `cc_gfx_Device` and
//! `std::vector<float>` becomes `std_vector_float`.

/// Prefix used by the front-end to escape C++ members whose script-side name
/// collides with a C++ keyword.
const KEYWORD_PREFIX: &str = "cpp_keyword_";

/// Mangle a qualified C++ name into a C identifier.
///
/// Idempotent: mangling a mangled name returns it unchanged.
pub fn mangle(qualified: &str) -> String {
    let mut out = String::with_capacity(qualified.len());
    let mut chars = qualified.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ':' => {
                // "::" collapses to a single underscore
                if chars.peek() == Some(&':') {
                    chars.next();
                }
                out.push('_');
            }
            '<' | ',' | '*' => out.push('_'),
            '>' | ' ' => {}
            other => out.push(other),
        }
    }
    out
}

/// The last `::`-segment of a qualified name.
pub fn scope_last(qualified: &str) -> &str {
    match qualified.rfind("::") {
        Some(idx) => &qualified[idx + 2..],
        None => qualified,
    }
}

/// Everything before the last `::`-segment, or `None` for unqualified names.
pub fn scope_prefix(qualified: &str) -> Option<&str> {
    qualified.rfind("::").map(|idx| &qualified[..idx])
}

/// Undo the front-end's keyword escaping.
pub fn fix_keyword(name: &str) -> &str {
    name.strip_prefix(KEYWORD_PREFIX).unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mangles_scope_separators() {
        assert_eq!(mangle("cc::gfx::Device"), "cc_gfx_Device");
    }

    #[test]
    fn mangles_template_arguments() {
        assert_eq!(mangle("std::vector<float>"), "std_vector_float");
        assert_eq!(mangle("std::map<int, float>"), "std_map_int_float");
    }

    #[test]
    fn mangles_pointers_and_spaces() {
        assert_eq!(mangle("cc::Device *"), "cc_Device_");
    }

    #[test]
    fn mangle_is_idempotent() {
        let once = mangle("cc::gfx::Swapchain<cc::Device *>");
        assert_eq!(mangle(&once), once);
        assert!(once.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }

    #[test]
    fn scope_helpers_split_on_last_separator() {
        assert_eq!(scope_last("cc::gfx::Device"), "Device");
        assert_eq!(scope_prefix("cc::gfx::Device"), Some("cc::gfx"));
        assert_eq!(scope_last("Device"), "Device");
        assert_eq!(scope_prefix("Device"), None);
    }

    #[test]
    fn fix_keyword_strips_escape_prefix() {
        assert_eq!(fix_keyword("cpp_keyword_default"), "default");
        assert_eq!(fix_keyword("width"), "width");
    }
}
