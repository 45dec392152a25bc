//! Non-primitive types with computed memory layout.
//!
//! [`ComplexType`] is a closed family: structs, fixed size spans, dynamic
//! views and wrapped integers. Every variant
//!
//! - reports its byte size and alignment,
//! - computes its layout once in [`ComplexType::finalise_alignment`],
//! - writes an [`InitialiserList`] into raw memory with
//!   [`ComplexType::initialise`],
//! - and can walk nested complex members with [`ComplexType::for_each`].
//!
//! Complex types are shared as [`ComplexTypePtr`](crate::ComplexTypePtr) and
//! interned by the namespace handler, so structurally identical declarations
//! end up as one instance.

mod dyn_type;
mod span_type;
mod struct_type;
mod wrap_type;

pub use dyn_type::DynType;
pub use span_type::SpanType;
pub use struct_type::{Member, MemberLayout, StructType, TemplateArgument};
pub use wrap_type::WrapType;

use std::fmt::Write as _;

use crate::{FunctionClass, InitialiserList, LayoutError, TypeHash, TypeId, VariableStorage};

/// Visitor for [`ComplexType::for_each`]. Returning `true` stops the walk.
pub type ComplexVisitor<'v> = dyn FnMut(&ComplexType, &mut [u8]) -> bool + 'v;

/// A struct, span, dyn or wrap type.
#[derive(Debug)]
pub enum ComplexType {
    Struct(StructType),
    Span(SpanType),
    Dyn(DynType),
    Wrap(WrapType),
}

impl ComplexType {
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn required_byte_size(&self) -> usize {
        match self {
            ComplexType::Struct(s) => s.required_byte_size(),
            ComplexType::Span(s) => s.required_byte_size(),
            ComplexType::Dyn(_) => DynType::SIZE,
            ComplexType::Wrap(_) => WrapType::SIZE,
        }
    }

    pub fn required_alignment(&self) -> usize {
        match self {
            ComplexType::Struct(s) => s.required_alignment(),
            ComplexType::Span(s) => s.required_alignment(),
            ComplexType::Dyn(_) => DynType::ALIGNMENT,
            ComplexType::Wrap(_) => WrapType::ALIGNMENT,
        }
    }

    /// Compute offsets and padding. Nested complex types are finalised
    /// first. Calling this again is a no-op.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn finalise_alignment(&self) -> Result<(), LayoutError> {
        match self {
            ComplexType::Struct(s) => s.finalise_alignment(),
            ComplexType::Span(s) => s.finalise_alignment(),
            ComplexType::Dyn(d) => d.finalise_alignment(),
            ComplexType::Wrap(w) => w.finalise_alignment(),
        }
    }

    pub fn is_finalised(&self) -> bool {
        match self {
            ComplexType::Struct(s) => s.is_finalised(),
            ComplexType::Span(s) => s.is_finalised(),
            ComplexType::Dyn(d) => d.is_finalised(),
            ComplexType::Wrap(w) => w.is_finalised(),
        }
    }

    /// Write `list` into `data`. Fails on unfinalised types, on arity or
    /// type mismatches, and when `data` is too small. On failure the memory
    /// content is unspecified.
    pub fn initialise(&self, data: &mut [u8], list: &InitialiserList) -> Result<(), LayoutError> {
        if !self.is_finalised() {
            return Err(LayoutError::NotFinalised {
                type_name: self.to_string_internal(),
            });
        }
        let required = self.required_byte_size();
        if data.len() < required {
            return Err(LayoutError::BufferTooSmall {
                required,
                actual: data.len(),
            });
        }
        match self {
            ComplexType::Struct(s) => s.initialise(data, list),
            ComplexType::Span(s) => s.initialise(data, list),
            ComplexType::Dyn(d) => d.initialise(data, list),
            ComplexType::Wrap(w) => w.initialise(data, list),
        }
    }

    /// A list that, passed to [`initialise`](Self::initialise), yields the
    /// declared defaults (or zero) for every member.
    pub fn make_default_initialiser_list(&self) -> InitialiserList {
        match self {
            ComplexType::Struct(s) => s.make_default_initialiser_list(),
            ComplexType::Span(s) => s.make_default_initialiser_list(),
            ComplexType::Dyn(_) => DynType::make_default_initialiser_list(),
            ComplexType::Wrap(_) => WrapType::make_default_initialiser_list(),
        }
    }

    /// Visit `self` and then every nested complex member with the memory
    /// it occupies. Returns `true` if the visitor stopped the walk.
    pub fn for_each(&self, data: &mut [u8], visitor: &mut ComplexVisitor<'_>) -> bool {
        if visitor(self, data) {
            return true;
        }
        match self {
            ComplexType::Struct(s) => s.for_each_member(data, visitor),
            ComplexType::Span(s) => s.for_each_element(data, visitor),
            ComplexType::Dyn(_) | ComplexType::Wrap(_) => false,
        }
    }

    /// Human readable view of `data` interpreted as this type.
    pub fn dump_table(&self, data: &[u8]) -> String {
        let mut out = String::new();
        self.dump_into(data, 0, &mut out);
        out
    }

    pub(crate) fn dump_into(&self, data: &[u8], indent: usize, out: &mut String) {
        match self {
            ComplexType::Struct(s) => s.dump_into(data, indent, out),
            ComplexType::Span(s) => s.dump_into(data, indent, out),
            ComplexType::Dyn(d) => d.dump_into(data, indent, out),
            ComplexType::Wrap(w) => w.dump_into(data, indent, out),
        }
    }

    /// Canonical layout string, e.g. `span<float, 4>`.
    pub fn to_string_internal(&self) -> String {
        match self {
            ComplexType::Struct(s) => s.to_string_internal(),
            ComplexType::Span(s) => s.to_string_internal(),
            ComplexType::Dyn(d) => d.to_string_internal(),
            ComplexType::Wrap(w) => w.to_string_internal(),
        }
    }

    /// Structural identity.
    pub fn type_hash(&self) -> TypeHash {
        TypeHash::from_name(&self.to_string_internal())
    }

    pub fn matches_other_type(&self, other: &ComplexType) -> bool {
        self.type_hash() == other.type_hash()
    }

    /// Member functions callable on instances of this type.
    pub fn function_class(&self) -> Option<FunctionClass> {
        match self {
            ComplexType::Struct(s) => Some(s.member_functions()),
            ComplexType::Span(s) => Some(s.function_class()),
            ComplexType::Dyn(d) => Some(d.function_class()),
            ComplexType::Wrap(_) => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match self {
            ComplexType::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_span(&self) -> Option<&SpanType> {
        match self {
            ComplexType::Span(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dyn(&self) -> Option<&DynType> {
        match self {
            ComplexType::Dyn(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_wrap(&self) -> Option<&WrapType> {
        match self {
            ComplexType::Wrap(w) => Some(w),
            _ => None,
        }
    }
}

impl From<StructType> for ComplexType {
    fn from(s: StructType) -> Self {
        ComplexType::Struct(s)
    }
}

impl From<SpanType> for ComplexType {
    fn from(s: SpanType) -> Self {
        ComplexType::Span(s)
    }
}

impl From<DynType> for ComplexType {
    fn from(d: DynType) -> Self {
        ComplexType::Dyn(d)
    }
}

impl From<WrapType> for ComplexType {
    fn from(w: WrapType) -> Self {
        ComplexType::Wrap(w)
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Store `value` as a member of primitive type `target` at `offset`.
///
/// Numeric values convert implicitly. Event and block members accept their
/// own kind or a zero literal.
pub(crate) fn write_native_member(
    target: TypeId,
    value: VariableStorage,
    data: &mut [u8],
    offset: usize,
    type_name: &str,
    index: usize,
) -> Result<(), LayoutError> {
    if target.size() == 0 {
        return Err(LayoutError::UnsizedMember {
            type_name: type_name.to_string(),
            name: format!("#{index}"),
        });
    }
    let converted = value
        .convert_for_initialiser(target)
        .ok_or_else(|| LayoutError::TypeMismatch {
            type_name: type_name.to_string(),
            index,
            expected: target.name().to_string(),
            actual: value.type_id().name().to_string(),
        })?;
    converted.write_to(data, offset)
}

pub(crate) fn dump_primitive(target: TypeId, data: &[u8], offset: usize, label: &str, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    match VariableStorage::read_from(target, data, offset) {
        Ok(v) => {
            let _ = writeln!(out, "{pad}{label}: {v}");
        }
        Err(_) => {
            let _ = writeln!(out, "{pad}{label}: <out of range>");
        }
    }
}
