//! Structural equality over optional sequences and maps.
//!
//! Comparisons short-circuit on length before falling back to element-wise
//! comparison, and the `PartialEq` based ones also on identity (both sides
//! pointing at the same storage). An absent side only equals another absent
//! side.

use std::{
    collections::{BTreeMap, HashMap},
    hash::{BuildHasher, Hash},
    ptr,
};

/// Compares two optional sequences element by element with `eq`.
///
/// Every pair is handed to `eq`, even when both sides share storage.
pub fn sequences_equal_by<T, U>(
    a: Option<&[T]>,
    b: Option<&[U]>,
    mut eq: impl FnMut(&T, &U) -> bool,
) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| eq(x, y)),
        _ => false,
    }
}

/// Slices sharing storage compare equal without visiting their elements.
pub fn sequences_equal<T: PartialEq<U>, U>(a: Option<&[T]>, b: Option<&[U]>) -> bool {
    if let (Some(a), Some(b)) = (a, b) {
        if a.len() == b.len() && ptr::eq(a.as_ptr().cast::<()>(), b.as_ptr().cast::<()>()) {
            return true;
        }
    }
    sequences_equal_by(a, b, |x, y| x == y)
}

pub fn bytes_equal(a: Option<&[u8]>, b: Option<&[u8]>) -> bool {
    sequences_equal(a, b)
}

/// Read access to a key/value container.
pub trait Mapping {
    type Key;
    type Value;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &Self::Key) -> Option<&Self::Value>;

    fn entries(&self) -> Box<dyn Iterator<Item = (&Self::Key, &Self::Value)> + '_>;
}

impl<K: Eq + Hash, V, S: BuildHasher> Mapping for HashMap<K, V, S> {
    type Key = K;
    type Value = V;

    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }
}

impl<K: Ord, V> Mapping for BTreeMap<K, V> {
    type Key = K;
    type Value = V;

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }
}

/// Two maps are equal if they hold the same keys mapped to equal values,
/// regardless of container type or iteration order.
pub fn maps_equal<A, B>(a: Option<&A>, b: Option<&B>) -> bool
where
    A: Mapping + ?Sized,
    B: Mapping<Key = A::Key> + ?Sized,
    A::Value: PartialEq<B::Value>,
{
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            if a.len() != b.len() {
                return false;
            }
            if ptr::eq((a as *const A).cast::<()>(), (b as *const B).cast::<()>()) {
                return true;
            }
            a.entries()
                .all(|(key, value)| b.lookup(key).is_some_and(|other| value == other))
        }
        _ => false,
    }
}
