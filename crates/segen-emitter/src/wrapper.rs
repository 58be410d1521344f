//! Wrapper function under construction: local declarations plus body code.

/// Accumulates the pieces of one wrapper function before the surrounding
/// template is rendered. `locals` fills the `$jslocals` slot, `code` fills
/// `$jscode`.
#[derive(Debug, Default)]
pub struct Wrapper {
    pub locals: String,
    pub code: String,
}

impl Wrapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_local(&mut self, decl: &str) {
        self.locals.push_str(decl);
        self.locals.push('\n');
    }

    pub fn add_code(&mut self, code: &str) {
        self.code.push_str(code);
        self.code.push('\n');
    }
}

/// Derive the wrapper symbol for a scripted name.
pub fn wrapper_name(name: &str) -> String {
    format!("js_{}", name)
}
