//! SNEX front end.
//!
//! Facade over the workspace crates:
//!
//! - [`core`]: names, the type model, struct layout and overload sets
//! - [`registry`]: the namespace tree built during a compilation
//! - [`jit`]: scopes, class data, the compiler and its results
//!
//! Most hosts only need the [`prelude`].

pub use snex_core as core;
pub use snex_jit as jit;
pub use snex_registry as registry;

pub use snex_core::SnexError;

pub type SnexResult<T> = Result<T, SnexError>;

/// Compile `source` against a default [`GlobalScope`](jit::GlobalScope).
pub fn compile(source: &str) -> SnexResult<jit::JitObject> {
    let mut global = jit::GlobalScope::new();
    Ok(jit::Compiler::new(&global).compile(&mut global, source)?)
}

pub mod prelude {
    pub use crate::{SnexError, SnexResult};
    pub use snex_core::{
        CompileError, ComplexType, ComplexTypePtr, DynType, FunctionClass, FunctionData,
        FunctionError, Identifier, InitialiserList, LayoutError, Member, NamespacedIdentifier,
        NativeFn, OverloadPolicy, ResolveError, ScopeError, SpanType, StructType, Symbol,
        TemplateArgument, TypeId, TypeInfo, VariableStorage, WrapType,
    };
    pub use snex_jit::{
        ClassScope, CodeGenerator, Compiler, CompilerConfig, FunctionSource, GlobalScope,
        JitCompiledFunctionClass, JitObject, NullCodeGenerator,
    };
    pub use snex_registry::{
        NamespaceHandler, ResolutionResult, SymbolType, TemplateObject, TemplateParameter,
    };
}
