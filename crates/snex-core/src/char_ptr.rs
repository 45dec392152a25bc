//! Cheap string handles used as symbol keys.
//!
//! [`CharPtr`] is a shared, immutable string that compares by pointer first
//! and by content second. [`HashedCharPtr`] additionally caches a hash so map
//! lookups and comparisons of unequal keys short-circuit on the hash.
//!
//! Handles created through a [`StringPool`] share one allocation per distinct
//! string, which makes the pointer fast path the common case.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHashSet;
use xxhash_rust::xxh64::xxh64;

/// A reference counted immutable string.
#[derive(Clone)]
pub struct CharPtr(Arc<str>);

impl CharPtr {
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// The empty string.
    pub fn empty() -> Self {
        Self(Arc::from(""))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether both handles point at the same allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &CharPtr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for CharPtr {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for CharPtr {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl Eq for CharPtr {}

impl Hash for CharPtr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl PartialOrd for CharPtr {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CharPtr {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl From<&str> for CharPtr {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CharPtr {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl Borrow<str> for CharPtr {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CharPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for CharPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A [`CharPtr`] with a precomputed hash.
///
/// Equality checks the cached hash before touching the string contents.
#[derive(Clone)]
pub struct HashedCharPtr {
    text: CharPtr,
    hash: u64,
}

impl HashedCharPtr {
    pub fn new(s: &str) -> Self {
        Self::from_char_ptr(CharPtr::new(s))
    }

    pub fn from_char_ptr(text: CharPtr) -> Self {
        let hash = xxh64(text.as_str().as_bytes(), 0);
        Self { text, hash }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    #[inline]
    pub fn char_ptr(&self) -> &CharPtr {
        &self.text
    }

    #[inline]
    pub fn hash_value(&self) -> u64 {
        self.hash
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl Default for HashedCharPtr {
    fn default() -> Self {
        Self::new("")
    }
}

impl PartialEq for HashedCharPtr {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.text == other.text
    }
}

impl Eq for HashedCharPtr {}

impl Hash for HashedCharPtr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash)
    }
}

impl PartialOrd for HashedCharPtr {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HashedCharPtr {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.text.cmp(&other.text)
    }
}

impl From<&str> for HashedCharPtr {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for HashedCharPtr {
    fn from(s: String) -> Self {
        Self::from_char_ptr(CharPtr::from(s))
    }
}

impl PartialEq<str> for HashedCharPtr {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for HashedCharPtr {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Debug for HashedCharPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for HashedCharPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single path component of a namespaced name.
pub type Identifier = HashedCharPtr;

/// Deduplicating store for [`CharPtr`]s.
#[derive(Debug, Default)]
pub struct StringPool {
    strings: FxHashSet<CharPtr>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the pooled handle for `s`, inserting it on first use.
    pub fn intern(&mut self, s: &str) -> CharPtr {
        if let Some(existing) = self.strings.get(s) {
            return existing.clone();
        }
        let ptr = CharPtr::new(s);
        self.strings.insert(ptr.clone());
        ptr
    }

    pub fn intern_hashed(&mut self, s: &str) -> HashedCharPtr {
        HashedCharPtr::from_char_ptr(self.intern(s))
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn char_ptr_compares_by_content() {
        let a = CharPtr::new("value");
        let b = CharPtr::new("value");
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
        assert_ne!(a, CharPtr::new("other"));
    }

    #[test]
    fn hashed_char_ptr_equality() {
        let a = HashedCharPtr::new("process");
        let b = HashedCharPtr::from("process");
        assert_eq!(a, b);
        assert_eq!(a.hash_value(), b.hash_value());
        assert_ne!(a, HashedCharPtr::new("prepare"));
        assert!(a == "process");
    }

    #[test]
    fn hashed_char_ptr_as_map_key() {
        let mut map = HashMap::new();
        map.insert(HashedCharPtr::new("x"), 1);
        map.insert(HashedCharPtr::new("y"), 2);
        assert_eq!(map.get(&HashedCharPtr::new("y")), Some(&2));
    }

    #[test]
    fn pool_shares_allocation() {
        let mut pool = StringPool::new();
        let a = pool.intern("gain");
        let b = pool.intern("gain");
        assert!(a.ptr_eq(&b));
        assert_eq!(pool.len(), 1);

        let c = pool.intern_hashed("gain");
        assert!(c.char_ptr().ptr_eq(&a));
    }

    #[test]
    fn empty_handles() {
        assert!(CharPtr::default().is_empty());
        assert!(HashedCharPtr::default().is_empty());
    }
}
