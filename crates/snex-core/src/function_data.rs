//! A single typed function signature with its native implementation.
//!
//! [`FunctionData`] carries everything the front end knows about one
//! overload: the qualified id, the bound host object (if any), the native
//! callable, return and parameter types and an optional [`Inliner`].
//!
//! A `FunctionData` without a native callable is a placeholder: it type
//! checks but cannot be called until the code generator injects the pointer.

use std::fmt;
use std::sync::Arc;

use crate::{
    CallContext, FunctionError, NamespacedIdentifier, NativeFn, ObjectHandle, Symbol, TypeHash,
    TypeInfo, VariableStorage,
};

// ============================================================================
// Match ranking
// ============================================================================

/// How well an argument list fits a signature. Ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    /// Arity or a type is incompatible.
    None,
    /// Compatible after numeric conversions or through a dynamic parameter.
    Implicit,
    /// Every argument has exactly the parameter's type.
    Exact,
}

impl MatchKind {
    pub fn is_match(self) -> bool {
        self != MatchKind::None
    }
}

/// What to do when several overloads match equally well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverloadPolicy {
    /// Report the call as ambiguous.
    #[default]
    Strict,
    /// Pick the candidate registered first.
    FirstMatch,
}

// ============================================================================
// Inliner
// ============================================================================

/// Which backend stage consumes an inliner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InlineKind {
    /// Replaces the call during front end constant folding.
    #[default]
    HighLevel,
    /// Emits instructions directly; only the code generator runs it.
    Assembly,
}

/// One argument handed to an inliner.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineArgument {
    pub type_info: TypeInfo,
    /// Known value when the argument is a compile time constant.
    pub constant: Option<VariableStorage>,
}

/// Input and output of an inline expansion.
#[derive(Debug, Clone, Default)]
pub struct InlineData {
    pub args: Vec<InlineArgument>,
    /// Folded result, set by the inliner when it could evaluate the call.
    pub result: Option<VariableStorage>,
}

impl InlineData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constant_arg(mut self, value: VariableStorage) -> Self {
        self.args.push(InlineArgument {
            type_info: TypeInfo::new(value.type_id()),
            constant: Some(value),
        });
        self
    }

    pub fn with_arg(mut self, type_info: TypeInfo) -> Self {
        self.args.push(InlineArgument {
            type_info,
            constant: None,
        });
        self
    }

    /// Constant value of argument `index`.
    pub fn constant_arg(&self, index: usize) -> Option<VariableStorage> {
        self.args.get(index).and_then(|a| a.constant)
    }

    pub fn set_result(&mut self, value: VariableStorage) {
        self.result = Some(value);
    }
}

type InlineFn = dyn Fn(&mut InlineData) -> Result<(), FunctionError> + Send + Sync;

/// Inline expansion callback registered for a function.
#[derive(Clone)]
pub struct Inliner {
    pub id: NamespacedIdentifier,
    pub kind: InlineKind,
    func: Arc<InlineFn>,
}

impl Inliner {
    pub fn from_fn<F>(id: NamespacedIdentifier, f: F) -> Self
    where
        F: Fn(&mut InlineData) -> Result<(), FunctionError> + Send + Sync + 'static,
    {
        Self {
            id,
            kind: InlineKind::HighLevel,
            func: Arc::new(f),
        }
    }

    pub fn with_kind(mut self, kind: InlineKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn process(&self, data: &mut InlineData) -> Result<(), FunctionError> {
        (self.func)(data)
    }
}

impl fmt::Debug for Inliner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inliner")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// FunctionData
// ============================================================================

/// One overload.
#[derive(Debug, Clone, Default)]
pub struct FunctionData {
    pub id: NamespacedIdentifier,
    /// Host object passed ahead of the arguments.
    pub object: Option<ObjectHandle>,
    pub function: Option<NativeFn>,
    pub return_type: TypeInfo,
    pub args: Vec<Symbol>,
    pub description: String,
    pub inliner: Option<Inliner>,
}

impl FunctionData {
    pub fn new(id: NamespacedIdentifier, return_type: TypeInfo) -> Self {
        Self {
            id,
            return_type,
            ..Self::default()
        }
    }

    /// Append a parameter. Parameter symbols live below the function id.
    pub fn with_arg(mut self, name: &str, type_info: TypeInfo) -> Self {
        self.add_arg(name, type_info);
        self
    }

    pub fn add_arg(&mut self, name: &str, type_info: TypeInfo) {
        self.args.push(Symbol::new(self.id.get_child_id(name), type_info));
    }

    pub fn with_function(mut self, function: NativeFn) -> Self {
        self.function = Some(function);
        self
    }

    pub fn with_object(mut self, object: ObjectHandle) -> Self {
        self.object = Some(object);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_inliner(mut self, inliner: Inliner) -> Self {
        self.inliner = Some(inliner);
        self
    }

    /// A function is usable once it has a native callable.
    pub fn is_resolved(&self) -> bool {
        self.function.is_some()
    }

    pub fn is_inlineable(&self) -> bool {
        self.inliner.is_some()
    }

    pub fn arg_types(&self) -> Vec<TypeInfo> {
        self.args.iter().map(|a| a.type_info.clone()).collect()
    }

    /// Rank `arg_types` against the parameter list.
    ///
    /// Complex types must match structurally. Primitives match exactly or
    /// through a numeric conversion. A dynamic parameter (or argument) is a
    /// wildcard that ranks as implicit.
    pub fn matches_argument_types(&self, arg_types: &[TypeInfo]) -> MatchKind {
        if arg_types.len() != self.args.len() {
            return MatchKind::None;
        }

        let mut result = MatchKind::Exact;
        for (param, arg) in self.args.iter().map(|a| &a.type_info).zip(arg_types) {
            let m = Self::match_single(param, arg);
            if m == MatchKind::None {
                return MatchKind::None;
            }
            result = result.min(m);
        }
        result
    }

    fn match_single(param: &TypeInfo, arg: &TypeInfo) -> MatchKind {
        if param.is_dynamic() || arg.is_dynamic() {
            return MatchKind::Implicit;
        }
        if param.same_kind(arg) {
            return MatchKind::Exact;
        }
        if param.is_complex_type() || arg.is_complex_type() {
            return MatchKind::None;
        }
        if arg.get_type().converts_implicitly_to(param.get_type()) {
            MatchKind::Implicit
        } else {
            MatchKind::None
        }
    }

    /// Same id, return type and parameter types.
    pub fn matches_signature(&self, other: &FunctionData) -> bool {
        self.id == other.id
            && self.return_type.same_kind(&other.return_type)
            && self.args.len() == other.args.len()
            && self
                .args
                .iter()
                .zip(&other.args)
                .all(|(a, b)| a.type_info.same_kind(&b.type_info))
    }

    /// Identity of the signature, independent of parameter names.
    pub fn signature_hash(&self) -> TypeHash {
        let params: Vec<TypeHash> = self.args.iter().map(|a| a.type_info.type_hash()).collect();
        TypeHash::from_signature(&self.id.to_string(), &params)
    }

    /// `int Math::get(double value)`.
    pub fn get_signature(&self) -> String {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| format!("{} {}", a.type_info, a.get_name()))
            .collect();
        format!("{} {}({})", self.return_type, self.id, args.join(", "))
    }

    /// Call with arity, type and liveness checks.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn call(&self, args: &[VariableStorage]) -> Result<VariableStorage, FunctionError> {
        let converted = self.check_args(args)?;
        self.invoke(None, &converted)
    }

    /// Call a member function on `data`.
    pub fn call_with_data(&self, data: &mut [u8], args: &[VariableStorage]) -> Result<VariableStorage, FunctionError> {
        let converted = self.check_args(args)?;
        self.invoke(Some(data), &converted)
    }

    /// Call without any checks. Arguments are passed as given.
    pub fn call_unchecked(&self, args: &[VariableStorage]) -> Result<VariableStorage, FunctionError> {
        self.invoke(None, args)
    }

    fn check_args(&self, args: &[VariableStorage]) -> Result<Vec<VariableStorage>, FunctionError> {
        if args.len() != self.args.len() {
            return Err(FunctionError::ArgumentCount {
                name: self.id.to_string(),
                expected: self.args.len(),
                actual: args.len(),
            });
        }

        self.args
            .iter()
            .zip(args)
            .enumerate()
            .map(|(index, (param, value))| {
                if param.type_info.is_dynamic() {
                    return Ok(*value);
                }
                let expected = param.type_info.get_type();
                value.convert_to(expected).ok_or_else(|| FunctionError::ArgumentType {
                    name: self.id.to_string(),
                    index,
                    expected: param.type_info.to_string(),
                    actual: value.type_id().name().to_string(),
                })
            })
            .collect()
    }

    fn invoke(&self, data: Option<&mut [u8]>, args: &[VariableStorage]) -> Result<VariableStorage, FunctionError> {
        let Some(function) = &self.function else {
            return Err(FunctionError::Unresolved {
                name: self.id.to_string(),
            });
        };

        let mut ctx = CallContext::new(args);
        if let Some(object) = &self.object {
            if !object.is_alive() {
                return Err(FunctionError::ObjectDeleted {
                    name: self.id.to_string(),
                });
            }
            ctx = ctx.with_object(object);
        }
        if let Some(data) = data {
            ctx = ctx.with_this_data(data);
        }

        function.call(&mut ctx)?;
        Ok(ctx.into_return_value())
    }
}

impl fmt::Display for FunctionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.get_signature())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComplexType, SpanType, TypeId};

    fn t(id: TypeId) -> TypeInfo {
        TypeInfo::new(id)
    }

    fn get_fn(arg: TypeId) -> FunctionData {
        FunctionData::new(NamespacedIdentifier::new("get"), t(TypeId::Integer)).with_arg("v", t(arg))
    }

    #[test]
    fn exact_and_implicit() {
        let f = get_fn(TypeId::Float);
        assert_eq!(f.matches_argument_types(&[t(TypeId::Float)]), MatchKind::Exact);
        assert_eq!(f.matches_argument_types(&[t(TypeId::Integer)]), MatchKind::Implicit);
        assert_eq!(f.matches_argument_types(&[t(TypeId::Event)]), MatchKind::None);
        assert_eq!(f.matches_argument_types(&[]), MatchKind::None);
    }

    #[test]
    fn const_argument_is_exact() {
        let f = get_fn(TypeId::Float);
        assert_eq!(
            f.matches_argument_types(&[t(TypeId::Float).with_const(true)]),
            MatchKind::Exact
        );
    }

    #[test]
    fn dynamic_is_wildcard() {
        let f = get_fn(TypeId::Dynamic);
        assert_eq!(f.matches_argument_types(&[t(TypeId::Event)]), MatchKind::Implicit);
    }

    #[test]
    fn complex_never_converts() {
        let span = std::sync::Arc::new(ComplexType::from(SpanType::new(t(TypeId::Float), 2)));
        let other = std::sync::Arc::new(ComplexType::from(SpanType::new(t(TypeId::Float), 3)));
        let f = FunctionData::new(NamespacedIdentifier::new("process"), TypeInfo::void())
            .with_arg("data", TypeInfo::from_complex(span.clone()).with_ref(true));

        assert_eq!(
            f.matches_argument_types(&[TypeInfo::from_complex(span)]),
            MatchKind::Exact
        );
        assert_eq!(
            f.matches_argument_types(&[TypeInfo::from_complex(other)]),
            MatchKind::None
        );
        assert_eq!(f.matches_argument_types(&[t(TypeId::Pointer)]), MatchKind::None);
    }

    #[test]
    fn unresolved_is_falsy() {
        let f = get_fn(TypeId::Float);
        assert!(!f.is_resolved());
        assert!(matches!(
            f.call(&[VariableStorage::Float(1.0)]),
            Err(FunctionError::Unresolved { .. })
        ));
    }

    #[test]
    fn call_converts_arguments() {
        let f = get_fn(TypeId::Double).with_function(NativeFn::from_fn(|ctx| {
            let v = ctx.arg(0)?;
            assert!(matches!(v, VariableStorage::Double(_)));
            ctx.set_return(VariableStorage::Integer(v.to_int() * 2));
            Ok(())
        }));
        assert_eq!(
            f.call(&[VariableStorage::Integer(21)]).unwrap(),
            VariableStorage::Integer(42)
        );
    }

    #[test]
    fn call_checks_arity_and_type() {
        let f = get_fn(TypeId::Float).with_function(NativeFn::constant(VariableStorage::Integer(0)));
        assert!(matches!(
            f.call(&[]),
            Err(FunctionError::ArgumentCount { expected: 1, actual: 0, .. })
        ));
        assert!(matches!(
            f.call(&[VariableStorage::Pointer(1)]),
            Err(FunctionError::ArgumentType { index: 0, .. })
        ));
    }

    #[test]
    fn dead_object_blocks_call() {
        let object = ObjectHandle::new(0, 0);
        let f = FunctionData::new(NamespacedIdentifier::from_string("Host::ping"), TypeInfo::void())
            .with_object(object.clone())
            .with_function(NativeFn::from_fn(|ctx| {
                assert!(ctx.object().is_some());
                Ok(())
            }));

        assert!(f.call(&[]).is_ok());
        object.invalidate();
        assert!(matches!(f.call(&[]), Err(FunctionError::ObjectDeleted { .. })));
    }

    #[test]
    fn signature_text() {
        let f = FunctionData::new(NamespacedIdentifier::from_string("Math::get"), t(TypeId::Integer))
            .with_arg("value", t(TypeId::Double));
        assert_eq!(f.get_signature(), "int Math::get(double value)");
        assert_eq!(f.args[0].id.to_string(), "Math::get::value");
    }

    #[test]
    fn signatures_compare_types_not_names() {
        let a = get_fn(TypeId::Float);
        let b = FunctionData::new(NamespacedIdentifier::new("get"), t(TypeId::Integer))
            .with_arg("other", t(TypeId::Float));
        assert!(a.matches_signature(&b));
        assert_eq!(a.signature_hash(), b.signature_hash());
        assert!(!a.matches_signature(&get_fn(TypeId::Double)));
    }

    #[test]
    fn inliner_folds() {
        let inliner = Inliner::from_fn(NamespacedIdentifier::new("square"), |d| {
            if let Some(v) = d.constant_arg(0) {
                d.set_result(VariableStorage::Integer(v.to_int() * v.to_int()));
            }
            Ok(())
        });
        let mut data = InlineData::new().with_constant_arg(VariableStorage::Integer(7));
        inliner.process(&mut data).unwrap();
        assert_eq!(data.result, Some(VariableStorage::Integer(49)));
    }
}
