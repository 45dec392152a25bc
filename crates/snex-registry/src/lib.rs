//! SNEX namespace registry.
//!
//! Holds the [`NamespaceHandler`]: the tree of namespaces built while a
//! compilation walks its source, the aliases declared in each namespace, the
//! host templates it may instantiate and the interned
//! [`ComplexType`](snex_core::ComplexType) list that owns every complex type
//! of the compilation.

mod namespace_handler;
mod template;

pub use namespace_handler::{
    Alias, NamespaceData, NamespaceEdge, NamespaceHandler, ResolutionResult,
    ScopedNamespaceSetter, SymbolType,
};
pub use template::{
    ClassBuilder, FunctionBuilder, TemplateBuilder, TemplateObject, TemplateParameter,
    TemplateParameterKind, instance_name,
};
