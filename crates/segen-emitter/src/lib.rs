//! Code emission for the segen backend.
//!
//! The emitter walks an annotated declaration tree and renders registered
//! code templates into named buffers: wrapper bodies, the module
//! initializer, and header registrations. The only concrete engine is the
//! Cocos script engine (`se::*`).

mod emit;
mod emit_class;
mod emit_function;
mod emit_variable;
mod marshal;
pub mod nspace;
pub mod pretty;
pub mod state;
mod template;
pub mod visitor;
mod wrapper;

pub use emit::{CocosEmitter, Engine, NULL_TOKEN, VETO_SET};
pub use marshal::MarshalMode;
pub use template::{Template, TemplateStore};
pub use visitor::Visitor;
pub use wrapper::{wrapper_name, Wrapper};
