//! SNEX compiler front end.
//!
//! Takes declaration level SNEX source, builds the namespace tree and the
//! scope chain for it, lays out every class variable in its
//! [`RootClassData`] and hands function bodies to a pluggable
//! [`CodeGenerator`]. The result is a [`JitObject`] the host can call into.
//!
//! ```
//! use snex_jit::{Compiler, GlobalScope};
//! use snex_core::VariableStorage;
//!
//! let mut global = GlobalScope::new();
//! let object = Compiler::new(&global)
//!     .compile(&mut global, "struct Stereo { float l; float r; }; Stereo frame; int voices = 4;")
//!     .unwrap();
//!
//! assert_eq!(object.get_variable("voices"), Some(VariableStorage::Integer(4)));
//! assert_eq!(object.get_variable_data("frame").map(<[u8]>::len), Some(8));
//! ```

pub mod ast;
mod buffer;
mod compiled;
mod compiler;
mod debug;
mod global_scope;
mod lexer;
mod options;
mod parser;
mod root_class_data;
mod scope;

pub use buffer::{BufferHandler, SharedBuffer};
pub use compiled::{JitCompiledFunctionClass, JitObject};
pub use compiler::{CodeGenerator, Compiler, FunctionSource, NullCodeGenerator};
pub use debug::{BreakpointHandler, DebugEntry, DebugHandler, MessageCollector, ObjectDeleteListener};
pub use global_scope::GlobalScope;
pub use lexer::{Token, TokenKind, tokenize};
pub use options::CompilerConfig;
pub use parser::{Parser, parse};
pub use root_class_data::{RootClassData, Slot, SlotValue};
pub use scope::{BaseScope, ClassScope, RegisteredClass, ScopeArena, ScopeId, ScopeKind};
