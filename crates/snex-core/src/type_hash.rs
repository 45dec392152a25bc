//! Deterministic 64-bit identity hashes.
//!
//! [`TypeHash`] identifies complex types by the hash of their layout string
//! (so two textually identical `span<float, 4>` declarations share one
//! identity) and function signatures by name plus parameter hashes.
//!
//! ```
//! use snex_core::TypeHash;
//!
//! let a = TypeHash::from_name("span<float, 4>");
//! let b = TypeHash::from_name("span<float, 4>");
//! assert_eq!(a, b);
//!
//! let f1 = TypeHash::from_signature("get", &[TypeHash::from_name("float")]);
//! let f2 = TypeHash::from_signature("get", &[TypeHash::from_name("double")]);
//! assert_ne!(f1, f2);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

// Seeds keep type names and signatures in separate hash domains.
const TYPE_SEED: u64 = 0x736e_6578_7479_7065;
const SIGNATURE_SEED: u64 = 0x736e_6578_7369_6773;

/// A deterministic 64-bit hash identifying a type or a function signature.
///
/// Zero is reserved for [`TypeHash::EMPTY`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Hash a type by its canonical string.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        Self::non_zero(xxh64(name.as_bytes(), TYPE_SEED))
    }

    /// Hash a function signature. Each parameter reseeds the running hash,
    /// so parameter order matters.
    pub fn from_signature(name: &str, params: &[TypeHash]) -> Self {
        let seed = params.iter().fold(SIGNATURE_SEED, |seed, param| {
            xxh64(&param.0.to_le_bytes(), seed)
        });
        Self::non_zero(xxh64(name.as_bytes(), seed ^ params.len() as u64))
    }

    fn non_zero(raw: u64) -> Self {
        TypeHash(if raw == 0 { 1 } else { raw })
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeHash")
            .field(&format_args!("{:016x}", self.0))
            .finish()
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_hash_is_deterministic() {
        assert_eq!(TypeHash::from_name("int"), TypeHash::from_name("int"));
        assert_ne!(TypeHash::from_name("int"), TypeHash::from_name("float"));
    }

    #[test]
    fn signature_order_matters() {
        let int = TypeHash::from_name("int");
        let float = TypeHash::from_name("float");
        assert_ne!(
            TypeHash::from_signature("f", &[int, float]),
            TypeHash::from_signature("f", &[float, int])
        );
    }

    #[test]
    fn signature_differs_from_type() {
        assert_ne!(
            TypeHash::from_name("process"),
            TypeHash::from_signature("process", &[])
        );
    }

    #[test]
    fn parameter_count_matters() {
        let p = vec![TypeHash::from_name("int"); 12];
        let a = TypeHash::from_signature("wide", &p);
        let b = TypeHash::from_signature("wide", &p[..11]);
        assert_ne!(a, b);
    }

    #[test]
    fn computed_hashes_are_never_empty() {
        assert!(TypeHash::EMPTY.is_empty());
        assert!(!TypeHash::from_name("").is_empty());
        assert!(!TypeHash::from_signature("", &[]).is_empty());
    }
}
