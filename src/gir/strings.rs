//! String interning pool for attribute values
//!
//! GIR documents repeat the same short strings thousands of times
//! (`transfer-ownership="none"`, `c:type="gchar*"`, version numbers).
//! Each distinct value is stored once in a contiguous buffer and referred to
//! by a `Sym` handle.
//!
//! Uses hash-based lookup with per-hash collision lists to avoid storing
//! duplicate string data.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::num::NonZeroU32;

/// Handle to an interned string; only meaningful for the pool that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sym(NonZeroU32);

impl Sym {
    #[inline]
    fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// String interning pool owned by one parse, then by its `Repository`
///
/// Memory layout:
/// - `entries`: (offset, len) into `data` for each handle
/// - `data`: concatenated string bytes
/// - `hash_index`: hash -> handles with that hash
#[derive(Debug, Default)]
pub struct StringPool {
    entries: Vec<(u32, u32)>,
    data: String,
    hash_index: HashMap<u64, Vec<Sym>>,
}

impl StringPool {
    pub fn new() -> Self {
        StringPool {
            entries: Vec::with_capacity(256),
            data: String::with_capacity(4096),
            hash_index: HashMap::new(),
        }
    }

    #[inline]
    fn compute_hash(s: &str) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Intern an optional value; absent in, absent out, nothing allocated
    #[inline]
    pub fn intern(&mut self, s: Option<&str>) -> Option<Sym> {
        s.map(|s| self.intern_str(s))
    }

    /// Intern a value, returning the existing handle for equal content
    pub fn intern_str(&mut self, s: &str) -> Sym {
        let hash = Self::compute_hash(s);

        if let Some(syms) = self.hash_index.get(&hash) {
            for &sym in syms {
                if self.resolve(sym) == s {
                    return sym;
                }
            }
        }

        // Handles are 1-based indexes into `entries`
        let sym = Sym(NonZeroU32::MIN.saturating_add(self.entries.len() as u32));
        let offset = self.data.len() as u32;
        self.data.push_str(s);
        self.entries.push((offset, s.len() as u32));
        self.hash_index.entry(hash).or_default().push(sym);

        sym
    }

    /// Look up an existing value without interning it
    pub fn get(&self, s: &str) -> Option<Sym> {
        let hash = Self::compute_hash(s);
        self.hash_index
            .get(&hash)?
            .iter()
            .copied()
            .find(|&sym| self.resolve(sym) == s)
    }

    /// Resolve a handle issued by this pool
    #[inline]
    pub fn resolve(&self, sym: Sym) -> &str {
        match self.entries.get(sym.index()) {
            Some(&(offset, len)) => &self.data[offset as usize..(offset + len) as usize],
            None => "",
        }
    }

    /// Number of distinct strings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes of string data held by the pool
    pub fn data_len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_deduplicates() {
        let mut pool = StringPool::new();
        let a = pool.intern_str("none");
        let b = pool.intern_str("full");
        let c = pool.intern_str("none");

        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.data_len(), 8);
        assert_eq!(pool.resolve(a), "none");
        assert_eq!(pool.resolve(b), "full");
    }

    #[test]
    fn test_absent_stays_absent() {
        let mut pool = StringPool::new();
        assert_eq!(pool.intern(None), None);
        assert!(pool.is_empty());
        assert_eq!(pool.data_len(), 0);
    }

    #[test]
    fn test_empty_string_is_a_value() {
        let mut pool = StringPool::new();
        let empty = pool.intern(Some(""));
        assert!(empty.is_some());
        assert_eq!(empty.map(|s| pool.resolve(s)), Some(""));
        assert_eq!(pool.intern(Some("")), empty);
    }

    #[test]
    fn test_get_does_not_intern() {
        let mut pool = StringPool::new();
        let sym = pool.intern_str("gchar*");
        assert_eq!(pool.get("gchar*"), Some(sym));
        assert_eq!(pool.get("gint"), None);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_many_strings() {
        let mut pool = StringPool::new();
        let syms: Vec<_> = (0..1000).map(|i| pool.intern_str(&format!("sym_{}", i))).collect();
        for (i, sym) in syms.iter().enumerate() {
            assert_eq!(pool.resolve(*sym), format!("sym_{}", i));
        }
        assert_eq!(pool.len(), 1000);
    }
}
