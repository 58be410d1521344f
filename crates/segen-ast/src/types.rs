//! Helpers over the front-end's encoded type strings.
//!
//! Types arrive in the SWIG prefix encoding: `p.` for pointer, `r.` for
//! reference, `a(N).` for array, `q(const).` for qualifiers, `m(Class).` for
//! member pointers, `v(...)` for varargs. The base name is a plain qualified
//! C++ name (`cc::gfx::Device`, `std::string`). The backend only needs a
//! handful of predicates plus a best-effort rendering back to C++ syntax for
//! locals and casts.

/// True for array-encoded types such as `a().char` or `a(16).int`.
pub fn is_array(ty: &str) -> bool {
    ty.starts_with("a(")
}

/// True for the varargs marker.
pub fn is_varargs(ty: &str) -> bool {
    ty.starts_with("v(")
}

/// True for pointer-encoded types such as `p.std::string`.
pub fn is_pointer(ty: &str) -> bool {
    strip_qualifiers(ty).starts_with("p.")
}

/// True for member-pointer-encoded types such as `m(Klass).f(int).int`.
pub fn is_member_pointer(ty: &str) -> bool {
    strip_qualifiers(ty).starts_with("m(")
}

/// Drop leading `q(...).` qualifier segments.
pub fn strip_qualifiers(ty: &str) -> &str {
    let mut rest = ty;
    while let Some(stripped) = rest.strip_prefix("q(") {
        match stripped.find(')') {
            Some(close) => {
                rest = stripped[close + 1..].trim_start_matches('.');
            }
            None => break,
        }
    }
    rest
}

/// Render an encoded type back to C++ declaration syntax.
///
/// `p.q(const).char` becomes `char const *`, `a().char` becomes `char []`,
/// a plain name passes through unchanged. Unknown segments pass through
/// untouched so a front-end that hands us plain C++ still works.
pub fn cpp_str(ty: &str) -> String {
    let mut suffix = String::new();
    let mut qualifier = String::new();
    let mut rest = ty;

    loop {
        if let Some(stripped) = rest.strip_prefix("p.") {
            suffix.insert_str(0, " *");
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix("r.") {
            suffix.insert_str(0, " &");
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix("a(") {
            match stripped.find(')') {
                Some(close) => {
                    let dims = &stripped[..close];
                    suffix.push_str(&format!(" [{}]", dims));
                    rest = stripped[close + 1..].trim_start_matches('.');
                }
                None => break,
            }
        } else if let Some(stripped) = rest.strip_prefix("q(") {
            match stripped.find(')') {
                Some(close) => {
                    qualifier = format!("{} ", &stripped[..close]);
                    rest = stripped[close + 1..].trim_start_matches('.');
                }
                None => break,
            }
        } else {
            break;
        }
    }

    let mut out = rest.to_string();
    if !qualifier.is_empty() {
        out.push(' ');
        out.push_str(qualifier.trim_end());
    }
    out.push_str(&suffix);
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_read_the_encoding() {
        assert!(is_array("a().char"));
        assert!(is_array("a(16).int"));
        assert!(is_pointer("p.std::string"));
        assert!(is_pointer("q(const).p.char"));
        assert!(is_varargs("v(...)"));
        assert!(is_member_pointer("m(Klass).int"));
        assert!(!is_pointer("int"));
    }

    #[test]
    fn renders_plain_names_unchanged() {
        assert_eq!(cpp_str("int"), "int");
        assert_eq!(cpp_str("cc::gfx::Device"), "cc::gfx::Device");
    }

    #[test]
    fn renders_pointers_and_arrays() {
        assert_eq!(cpp_str("p.std::string"), "std::string *");
        assert_eq!(cpp_str("a().char"), "char []");
        assert_eq!(cpp_str("a(16).int"), "int [16]");
        assert_eq!(cpp_str("r.cc::Device"), "cc::Device &");
    }

    #[test]
    fn renders_qualifiers_before_declarators() {
        assert_eq!(cpp_str("p.q(const).char"), "char const *");
    }
}
