//! Structural comparison.
//!
//! Equality is whatever the value's [`PartialEq`] says, which for the std
//! collections is already structural: sequences compare element by element in
//! order, maps compare by key set and per-key value regardless of insertion
//! order. Decoded JSON trees go through [`json_equal`], which compares their
//! canonical forms, so `1` and `1.0` are the same number.
//!
//! Nil-ness is a separate question answered by [`NilLike`]. A zero-valued
//! struct is never nil; only types with an explicit "no value" state are.

use crate::canonical;
use serde_json::Value;
use std::rc::Rc;
use std::sync::Arc;

/// Returns true if `actual` is structurally equal to `expected`.
pub fn equal<A, E>(actual: &A, expected: &E) -> bool
where
    A: PartialEq<E> + ?Sized,
    E: ?Sized,
{
    actual == expected
}

/// Structural equality over decoded JSON trees.
///
/// Both trees are compared in canonical form (see [`canonical::normalize`]):
/// objects by key set and per-key value, arrays in order, integral floats
/// within ±2^53 equal to the matching integer. Integers outside that range
/// compare exactly.
pub fn json_equal(a: &Value, b: &Value) -> bool {
    canonical::normalize(a.clone()) == canonical::normalize(b.clone())
}

/// Types that have a "no value" state.
pub trait NilLike {
    /// Returns true if this value represents the absence of a value.
    fn is_nil(&self) -> bool;
}

/// Returns true if `value` is in its "no value" state.
pub fn is_nil_like<T: NilLike + ?Sized>(value: &T) -> bool {
    value.is_nil()
}

impl<T> NilLike for Option<T> {
    fn is_nil(&self) -> bool {
        self.is_none()
    }
}

impl NilLike for Value {
    fn is_nil(&self) -> bool {
        self.is_null()
    }
}

impl NilLike for () {
    fn is_nil(&self) -> bool {
        true
    }
}

impl<T: ?Sized> NilLike for *const T {
    fn is_nil(&self) -> bool {
        self.is_null()
    }
}

impl<T: ?Sized> NilLike for *mut T {
    fn is_nil(&self) -> bool {
        self.is_null()
    }
}

impl<T: NilLike + ?Sized> NilLike for &T {
    fn is_nil(&self) -> bool {
        (**self).is_nil()
    }
}

impl<T: NilLike + ?Sized> NilLike for &mut T {
    fn is_nil(&self) -> bool {
        (**self).is_nil()
    }
}

impl<T: NilLike + ?Sized> NilLike for Box<T> {
    fn is_nil(&self) -> bool {
        (**self).is_nil()
    }
}

impl<T: NilLike + ?Sized> NilLike for Rc<T> {
    fn is_nil(&self) -> bool {
        (**self).is_nil()
    }
}

impl<T: NilLike + ?Sized> NilLike for Arc<T> {
    fn is_nil(&self) -> bool {
        (**self).is_nil()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};

    #[test]
    fn test_equal_nested_composites() {
        let a: Vec<HashMap<&str, Vec<i32>>> = vec![HashMap::from([("x", vec![1, 2])])];
        let b: Vec<HashMap<&str, Vec<i32>>> = vec![HashMap::from([("x", vec![1, 2])])];
        assert!(equal(&a, &b));
    }

    #[test]
    fn test_equal_sequence_order_matters() {
        assert!(!equal(&vec![1, 2], &vec![2, 1]));
    }

    #[test]
    fn test_equal_map_ignores_insertion_order() {
        let mut a = HashMap::new();
        a.insert("a", 1);
        a.insert("b", 2);
        let mut b = HashMap::new();
        b.insert("b", 2);
        b.insert("a", 1);
        assert!(equal(&a, &b));
    }

    #[test]
    fn test_equal_none_only_matches_none() {
        let none: Option<BTreeMap<String, i32>> = None;
        let empty = Some(BTreeMap::<String, i32>::new());
        assert!(equal(&none, &None));
        assert!(!equal(&none, &empty));
    }

    #[test]
    fn test_equal_across_types() {
        let owned = String::from("abc");
        assert!(equal(&owned, "abc"));
    }

    #[test]
    fn test_json_equal_numbers() {
        assert!(json_equal(&json!(1), &json!(1.0)));
        assert!(!json_equal(&json!(1), &json!(1.5)));
        assert!(json_equal(&json!(u64::MAX), &json!(u64::MAX)));
        assert!(!json_equal(&json!(u64::MAX), &json!(u64::MAX - 1)));
    }

    #[test]
    fn test_json_equal_large_integers_stay_exact() {
        // 2^53 + 1 has no exact f64 representation.
        let above = json!(9_007_199_254_740_993_u64);
        assert!(!json_equal(&above, &json!(9_007_199_254_740_992.0)));
        assert!(json_equal(&json!(9_007_199_254_740_992_u64), &json!(9_007_199_254_740_992.0)));
        assert!(!json_equal(&json!(-3), &json!(3.0)));
    }

    #[test]
    fn test_json_equal_objects() {
        let a = json!({"a": 1, "b": [1, {"c": null}]});
        let b = json!({"b": [1.0, {"c": null}], "a": 1});
        assert!(json_equal(&a, &b));
        assert!(!json_equal(&a, &json!({"a": 1})));
        assert!(!json_equal(&json!({"a": 1}), &json!({"b": 1})));
    }

    #[test]
    fn test_json_equal_null_is_not_empty() {
        assert!(!json_equal(&json!(null), &json!({})));
        assert!(!json_equal(&json!(null), &json!([])));
    }

    #[test]
    fn test_nil_like_option() {
        assert!(is_nil_like(&None::<i32>));
        assert!(!is_nil_like(&Some(0)));
    }

    #[test]
    fn test_nil_like_pointers() {
        let value = 5;
        assert!(is_nil_like(&std::ptr::null::<i32>()));
        assert!(!is_nil_like(&std::ptr::addr_of!(value)));
    }

    #[test]
    fn test_nil_like_through_wrappers() {
        let boxed: Box<Option<u8>> = Box::new(None);
        let shared = Arc::new(Some(1u8));
        assert!(is_nil_like(&boxed));
        assert!(!is_nil_like(&shared));
        assert!(is_nil_like(&Rc::new(json!(null))));
    }
}
