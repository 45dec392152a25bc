//! Type references used throughout the front end.
//!
//! A [`TypeInfo`] is either a primitive [`TypeId`] or a shared
//! [`ComplexType`], plus `const`/`&` modifiers and an optional alias name.
//!
//! Equality is structural: two complex types are equal when their layout
//! strings hash the same, so an alias compares equal to the type it names.
//!
//! ```
//! use snex_core::{NamespacedIdentifier, TypeId, TypeInfo};
//!
//! let int = TypeInfo::new(TypeId::Integer);
//! let alias = int.clone().with_alias(NamespacedIdentifier::new("Index"));
//! assert_eq!(int, alias);
//! assert_eq!(alias.to_string(), "Index");
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use bitflags::bitflags;

use crate::{ComplexType, InitialiserList, NamespacedIdentifier, TypeHash, TypeId, VariableStorage};

/// Shared handle to an interned complex type.
pub type ComplexTypePtr = Arc<ComplexType>;

bitflags! {
    /// Qualifiers attached to a type reference.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeModifiers: u8 {
        const CONST = 0b01;
        const REF = 0b10;
    }
}

/// What a [`TypeInfo`] refers to.
#[derive(Debug, Clone)]
pub enum TypeKind {
    Primitive(TypeId),
    Complex(ComplexTypePtr),
}

/// A type reference with modifiers.
#[derive(Clone)]
pub struct TypeInfo {
    kind: TypeKind,
    modifiers: TypeModifiers,
    alias: Option<NamespacedIdentifier>,
}

impl TypeInfo {
    pub fn new(type_id: TypeId) -> Self {
        Self {
            kind: TypeKind::Primitive(type_id),
            modifiers: TypeModifiers::empty(),
            alias: None,
        }
    }

    /// The invalid/void type.
    pub fn void() -> Self {
        Self::new(TypeId::Void)
    }

    /// The wildcard type accepted by native functions with untyped
    /// parameters.
    pub fn dynamic() -> Self {
        Self::new(TypeId::Dynamic)
    }

    pub fn from_complex(complex: ComplexTypePtr) -> Self {
        Self {
            kind: TypeKind::Complex(complex),
            modifiers: TypeModifiers::empty(),
            alias: None,
        }
    }

    /// A reference to a complex object, the form used for pointer slots.
    pub fn pointer_to(complex: ComplexTypePtr) -> Self {
        Self::from_complex(complex).with_ref(true)
    }

    pub fn with_const(mut self, is_const: bool) -> Self {
        self.modifiers.set(TypeModifiers::CONST, is_const);
        self
    }

    pub fn with_ref(mut self, is_ref: bool) -> Self {
        self.modifiers.set(TypeModifiers::REF, is_ref);
        self
    }

    pub fn with_alias(mut self, alias: NamespacedIdentifier) -> Self {
        self.alias = Some(alias);
        self
    }

    pub fn without_alias(mut self) -> Self {
        self.alias = None;
        self
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn modifiers(&self) -> TypeModifiers {
        self.modifiers
    }

    /// The primitive tag. Complex types report [`TypeId::Pointer`].
    pub fn get_type(&self) -> TypeId {
        match &self.kind {
            TypeKind::Primitive(t) => *t,
            TypeKind::Complex(_) => TypeId::Pointer,
        }
    }

    pub fn is_complex_type(&self) -> bool {
        matches!(self.kind, TypeKind::Complex(_))
    }

    pub fn get_complex_type(&self) -> Option<&ComplexTypePtr> {
        match &self.kind {
            TypeKind::Complex(c) => Some(c),
            TypeKind::Primitive(_) => None,
        }
    }

    pub fn is_const(&self) -> bool {
        self.modifiers.contains(TypeModifiers::CONST)
    }

    pub fn is_ref(&self) -> bool {
        self.modifiers.contains(TypeModifiers::REF)
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive(TypeId::Void))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive(TypeId::Dynamic))
    }

    pub fn is_valid(&self) -> bool {
        !self.is_void()
    }

    pub fn get_alias(&self) -> Option<&NamespacedIdentifier> {
        self.alias.as_ref()
    }

    /// A primitive `Pointer` with no complex type behind it is malformed.
    pub fn check(&self) -> bool {
        !matches!(self.kind, TypeKind::Primitive(TypeId::Pointer))
    }

    pub fn required_byte_size(&self) -> usize {
        match &self.kind {
            TypeKind::Primitive(t) => t.size(),
            TypeKind::Complex(c) => c.required_byte_size(),
        }
    }

    pub fn required_alignment(&self) -> usize {
        match &self.kind {
            TypeKind::Primitive(t) => t.alignment(),
            TypeKind::Complex(c) => c.required_alignment(),
        }
    }

    /// Zero values for primitives, member defaults for complex types.
    pub fn make_default_initialiser_list(&self) -> InitialiserList {
        match &self.kind {
            TypeKind::Primitive(t) => InitialiserList::make_single_list(VariableStorage::zero(*t)),
            TypeKind::Complex(c) => c.make_default_initialiser_list(),
        }
    }

    /// Same referent, ignoring modifiers and alias.
    pub fn same_kind(&self, other: &TypeInfo) -> bool {
        match (&self.kind, &other.kind) {
            (TypeKind::Primitive(a), TypeKind::Primitive(b)) => a == b,
            (TypeKind::Complex(a), TypeKind::Complex(b)) => {
                Arc::ptr_eq(a, b) || a.matches_other_type(b)
            }
            _ => false,
        }
    }

    pub fn type_hash(&self) -> TypeHash {
        match &self.kind {
            TypeKind::Primitive(t) => TypeHash::from_name(t.name()),
            TypeKind::Complex(c) => c.type_hash(),
        }
    }

    /// The printed name ignoring any alias.
    pub fn to_string_without_alias(&self) -> String {
        let base = match &self.kind {
            TypeKind::Primitive(t) => t.name().to_string(),
            TypeKind::Complex(c) => c.to_string_internal(),
        };
        self.decorate(&base)
    }

    fn decorate(&self, base: &str) -> String {
        let mut s = String::new();
        if self.is_const() {
            s.push_str("const ");
        }
        s.push_str(base);
        if self.is_ref() {
            s.push('&');
        }
        s
    }
}

impl Default for TypeInfo {
    fn default() -> Self {
        Self::void()
    }
}

impl From<TypeId> for TypeInfo {
    fn from(t: TypeId) -> Self {
        Self::new(t)
    }
}

impl From<ComplexTypePtr> for TypeInfo {
    fn from(c: ComplexTypePtr) -> Self {
        Self::from_complex(c)
    }
}

/// Structural equality: referent plus constness. Alias and reference-ness
/// are ignored.
impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.same_kind(other) && self.is_const() == other.is_const()
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_hash().hash(state);
        self.is_const().hash(state);
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => f.write_str(&self.decorate(&alias.to_string())),
            None => f.write_str(&self.to_string_without_alias()),
        }
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeInfo({self})")
    }
}
