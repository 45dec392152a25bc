//! Core types of the SNEX front end.
//!
//! This crate holds everything that does not depend on a namespace tree or a
//! scope chain:
//!
//! - [`CharPtr`] / [`HashedCharPtr`]: shared string handles used as keys
//! - [`TypeId`], [`VariableStorage`]: primitive tags and values
//! - [`TypeInfo`], [`ComplexType`]: the type model with layout computation
//! - [`NamespacedIdentifier`], [`Symbol`]: qualified names
//! - [`FunctionData`], [`FunctionClass`]: overload sets and native callables
//! - [`error`]: the error hierarchy for every phase

mod char_ptr;
mod complex_type;
pub mod error;
mod function_class;
mod function_data;
mod identifier;
mod initialiser;
mod native_fn;
mod span;
mod symbol;
mod type_hash;
mod type_info;
mod types;

pub use char_ptr::{CharPtr, HashedCharPtr, Identifier, StringPool};
pub use complex_type::{
    ComplexType, ComplexVisitor, DynType, Member, MemberLayout, SpanType, StructType,
    TemplateArgument, WrapType,
};
pub use error::{
    CompileError, FunctionError, LayoutError, LexError, ParseError, ParseErrorKind, ResolveError,
    ScopeError, SnexError,
};
pub use function_class::{FunctionClass, FunctionConstant, select_overload};
pub use function_data::{
    FunctionData, InlineArgument, InlineData, InlineKind, Inliner, MatchKind, OverloadPolicy,
};
pub use identifier::NamespacedIdentifier;
pub use initialiser::{InitialiserItem, InitialiserList, parse_literal};
pub use native_fn::{CallContext, NativeCallable, NativeFn, ObjectHandle};
pub use span::Span;
pub use symbol::{Symbol, Visibility};
pub use type_hash::TypeHash;
pub use type_info::{ComplexTypePtr, TypeInfo, TypeKind, TypeModifiers};
pub use types::{Block, HiseEvent, TypeId, VariableStorage};
