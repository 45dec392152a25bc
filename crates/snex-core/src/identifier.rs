//! Fully qualified names.
//!
//! A [`NamespacedIdentifier`] is a path of [`Identifier`]s: the namespace
//! components followed by the simple name. The root namespace is the empty
//! path.
//!
//! # Examples
//!
//! ```
//! use snex_core::NamespacedIdentifier;
//!
//! let id = NamespacedIdentifier::from_string("Math::Filters::cutoff");
//! assert!(id.is_explicit());
//! assert_eq!(id.get_identifier().as_str(), "cutoff");
//! assert_eq!(id.get_parent().to_string(), "Math::Filters");
//! ```

use std::fmt;

use crate::{Identifier, TypeHash};

/// A scope path plus a simple name.
#[derive(Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct NamespacedIdentifier {
    namespaces: Vec<Identifier>,
    id: Identifier,
}

impl NamespacedIdentifier {
    /// An unqualified identifier.
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self {
            namespaces: Vec::new(),
            id: id.into(),
        }
    }

    /// The root namespace (empty path).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse `A::B::c`. A leading `::` is ignored.
    pub fn from_string(s: &str) -> Self {
        let mut parts: Vec<Identifier> = s
            .split("::")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(Identifier::from)
            .collect();
        match parts.pop() {
            Some(id) => Self {
                namespaces: parts,
                id,
            },
            None => Self::root(),
        }
    }

    /// Build from a full path of components.
    pub fn from_id_list(mut list: Vec<Identifier>) -> Self {
        match list.pop() {
            Some(id) => Self {
                namespaces: list,
                id,
            },
            None => Self::root(),
        }
    }

    /// Whether a simple name is present.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty()
    }

    /// Whether this is the root namespace.
    pub fn is_root(&self) -> bool {
        self.namespaces.is_empty() && self.id.is_empty()
    }

    /// Whether the name carries a namespace qualifier.
    pub fn is_explicit(&self) -> bool {
        !self.namespaces.is_empty()
    }

    pub fn is_in_global_namespace(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// The simple name.
    pub fn get_identifier(&self) -> &Identifier {
        &self.id
    }

    /// The namespace components, outermost first.
    pub fn namespaces(&self) -> &[Identifier] {
        &self.namespaces
    }

    /// Every component including the simple name.
    pub fn get_id_list(&self) -> Vec<Identifier> {
        let mut list = self.namespaces.clone();
        if self.is_valid() {
            list.push(self.id.clone());
        }
        list
    }

    /// Number of path components.
    pub fn len(&self) -> usize {
        self.namespaces.len() + usize::from(self.is_valid())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `self::name`.
    pub fn get_child_id(&self, name: impl Into<Identifier>) -> Self {
        Self {
            namespaces: self.get_id_list(),
            id: name.into(),
        }
    }

    /// The enclosing path. The parent of a top level name is the root.
    pub fn get_parent(&self) -> Self {
        Self::from_id_list(self.namespaces.clone())
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn is_parent_of(&self, other: &NamespacedIdentifier) -> bool {
        let mine = self.get_id_list();
        let theirs = other.get_id_list();
        mine.len() <= theirs.len() && theirs[..mine.len()] == mine[..]
    }

    /// Replace the `old_parent` prefix with `new_parent`. Identifiers outside
    /// `old_parent` are returned unchanged.
    pub fn relocate(&self, old_parent: &NamespacedIdentifier, new_parent: &NamespacedIdentifier) -> Self {
        if old_parent.is_root() || !old_parent.is_parent_of(self) {
            return self.clone();
        }
        let mut list = new_parent.get_id_list();
        list.extend(self.get_id_list().into_iter().skip(old_parent.len()));
        Self::from_id_list(list)
    }

    /// Append `other`'s path below `self`.
    pub fn join(&self, other: &NamespacedIdentifier) -> Self {
        let mut list = self.get_id_list();
        list.extend(other.get_id_list());
        Self::from_id_list(list)
    }

    pub fn to_type_hash(&self) -> TypeHash {
        TypeHash::from_name(&self.to_string())
    }
}

impl fmt::Display for NamespacedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ns in &self.namespaces {
            write!(f, "{ns}::")?;
        }
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for NamespacedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamespacedIdentifier({self})")
    }
}

impl From<&str> for NamespacedIdentifier {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_qualified() {
        let id = NamespacedIdentifier::from_string("A::B::c");
        assert_eq!(id.namespaces().len(), 2);
        assert_eq!(id.get_identifier().as_str(), "c");
        assert!(id.is_explicit());
        assert_eq!(id.len(), 3);
        assert_eq!(id.to_string(), "A::B::c");
    }

    #[test]
    fn leading_separator_is_ignored() {
        assert_eq!(
            NamespacedIdentifier::from_string("::A::x"),
            NamespacedIdentifier::from_string("A::x")
        );
    }

    #[test]
    fn root_properties() {
        let root = NamespacedIdentifier::root();
        assert!(root.is_root());
        assert!(!root.is_valid());
        assert_eq!(root.to_string(), "");
        assert_eq!(NamespacedIdentifier::from_string(""), root);
    }

    #[test]
    fn child_and_parent() {
        let a = NamespacedIdentifier::new("A");
        let ab = a.get_child_id("B");
        assert_eq!(ab.to_string(), "A::B");
        assert_eq!(ab.get_parent(), a);
        assert_eq!(a.get_parent(), NamespacedIdentifier::root());
        assert_eq!(NamespacedIdentifier::root().get_child_id("x").to_string(), "x");
    }

    #[test]
    fn parent_of() {
        let a = NamespacedIdentifier::from_string("A");
        let abc = NamespacedIdentifier::from_string("A::B::c");
        assert!(a.is_parent_of(&abc));
        assert!(!abc.is_parent_of(&a));
        assert!(NamespacedIdentifier::root().is_parent_of(&a));
        assert!(!NamespacedIdentifier::from_string("B").is_parent_of(&abc));
    }

    #[test]
    fn relocate_prefix() {
        let id = NamespacedIdentifier::from_string("Tmp::Inner::value");
        let moved = id.relocate(
            &NamespacedIdentifier::from_string("Tmp"),
            &NamespacedIdentifier::from_string("Real::Place"),
        );
        assert_eq!(moved.to_string(), "Real::Place::Inner::value");

        let untouched = id.relocate(
            &NamespacedIdentifier::from_string("Other"),
            &NamespacedIdentifier::from_string("X"),
        );
        assert_eq!(untouched, id);
    }

    #[test]
    fn join_paths() {
        let a = NamespacedIdentifier::from_string("A");
        let bc = NamespacedIdentifier::from_string("B::c");
        assert_eq!(a.join(&bc).to_string(), "A::B::c");
        assert_eq!(NamespacedIdentifier::root().join(&bc), bc);
    }
}
