//! Resolved names bound to a type.

use std::fmt;

use crate::{Identifier, NamespacedIdentifier, TypeInfo, VariableStorage};

/// Access level of a struct member or namespace alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

/// A fully scoped name with its type and, for compile time constants, its
/// value.
///
/// Two symbols are equal when path and type match; the constant value is
/// not compared.
#[derive(Debug, Clone, Default)]
pub struct Symbol {
    pub id: NamespacedIdentifier,
    pub type_info: TypeInfo,
    pub const_expr: Option<VariableStorage>,
}

impl Symbol {
    pub fn new(id: NamespacedIdentifier, type_info: TypeInfo) -> Self {
        Self {
            id,
            type_info,
            const_expr: None,
        }
    }

    pub fn with_const_value(mut self, value: VariableStorage) -> Self {
        self.const_expr = Some(value);
        self
    }

    /// A symbol one level below `self`.
    pub fn get_child_symbol(&self, name: impl Into<Identifier>, type_info: TypeInfo) -> Symbol {
        Symbol::new(self.id.get_child_id(name), type_info)
    }

    /// The symbol of the enclosing scope. Its type is unknown.
    pub fn get_parent_symbol(&self) -> Symbol {
        Symbol::new(self.id.get_parent(), TypeInfo::void())
    }

    pub fn get_name(&self) -> &Identifier {
        self.id.get_identifier()
    }

    pub fn is_explicit(&self) -> bool {
        self.id.is_explicit()
    }

    pub fn is_valid(&self) -> bool {
        self.id.is_valid()
    }

    pub fn is_const(&self) -> bool {
        self.type_info.is_const()
    }

    pub fn is_const_expr(&self) -> bool {
        self.const_expr.is_some()
    }

    /// `self` with the path relocated from `old_parent` to `new_parent`.
    pub fn relocate(&self, old_parent: &NamespacedIdentifier, new_parent: &NamespacedIdentifier) -> Symbol {
        Symbol {
            id: self.id.relocate(old_parent, new_parent),
            ..self.clone()
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.type_info == other.type_info
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.type_info.is_void() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} {}", self.type_info, self.id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeId;

    fn int() -> TypeInfo {
        TypeInfo::new(TypeId::Integer)
    }

    #[test]
    fn child_and_parent() {
        let ns = Symbol::new(NamespacedIdentifier::new("Voice"), TypeInfo::void());
        let child = ns.get_child_symbol("index", int());
        assert_eq!(child.id.to_string(), "Voice::index");
        assert!(child.is_explicit());
        assert_eq!(child.get_parent_symbol().id, ns.id);
        assert_eq!(child.get_name().as_str(), "index");
    }

    #[test]
    fn equality_ignores_constant() {
        let a = Symbol::new(NamespacedIdentifier::new("x"), int());
        let b = a.clone().with_const_value(VariableStorage::Integer(5));
        assert_eq!(a, b);
        assert!(b.is_const_expr());
    }

    #[test]
    fn equality_requires_same_type() {
        let a = Symbol::new(NamespacedIdentifier::new("x"), int());
        let b = Symbol::new(NamespacedIdentifier::new("x"), TypeInfo::new(TypeId::Float));
        assert_ne!(a, b);
    }

    #[test]
    fn display() {
        let s = Symbol::new(NamespacedIdentifier::from_string("A::gain"), TypeInfo::new(TypeId::Float));
        assert_eq!(s.to_string(), "float A::gain");
    }

    #[test]
    fn relocate() {
        let s = Symbol::new(NamespacedIdentifier::from_string("Tmp::x"), int());
        let moved = s.relocate(
            &NamespacedIdentifier::new("Tmp"),
            &NamespacedIdentifier::new("Final"),
        );
        assert_eq!(moved.id.to_string(), "Final::x");
        assert_eq!(moved.type_info, int());
    }
}
