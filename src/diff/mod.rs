//! Structural comparison of DID Documents.
//!
//! Equality is defined over [serde_json::Value]: scalars compare by value,
//! containers by their key sets and recursively by the value under every key.
//! Arrays take part as containers keyed by their indices (`"0"`, `"1"`, ...).

use serde::Serialize;
use serde_json::{Map, Value};

use crate::document::{DidDocument, to_json};

/// Deep structural equality. Inputs are assumed to be acyclic, which any
/// `Value` is.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (is_object(a), is_object(b)) {
        (true, true) => {
            let keys = keys(a);
            if keys.len() != len(b) {
                return false;
            }
            keys.iter().all(|key| match (member(a, key), member(b, key)) {
                (Some(va), Some(vb)) => deep_equal(va, vb),
                _ => false,
            })
        }
        (false, false) => scalar_equal(a, b),
        _ => false,
    }
}

/// `true` for keyed structures (arrays and objects), `false` for null and scalars.
pub fn is_object(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

/// `true` when both values expose the same set of keys. Scalars have no keys.
pub fn compare_keys(a: &Value, b: &Value) -> bool {
    let mut a_keys = keys(a);
    let mut b_keys = keys(b);
    a_keys.sort();
    b_keys.sort();
    a_keys == b_keys
}

/// Remove every pair of structurally equal elements from `org` and `new`.
///
/// `org` is walked from last to first and each element is paired with the
/// first still-unpaired equal element of `new`. What remains on each side is
/// returned in its original order.
pub fn symmetric_difference(org: &[Value], new: &[Value]) -> (Vec<Value>, Vec<Value>) {
    let (org_keep, new_keep) = unpaired(org, new);
    (select(org, &org_keep), select(new, &new_keep))
}

/// Pure counterpart of removing common entries from two documents in place:
/// every sequence member of the returned documents only holds entries without
/// a structural counterpart on the other side. Scalar members are untouched.
pub fn remove_common_items(org: &DidDocument, new: &DidDocument) -> (DidDocument, DidDocument) {
    let mut org_out = org.clone();
    let mut new_out = new.clone();

    (org_out.verification_method, new_out.verification_method) =
        retain_unpaired(&org.verification_method, &new.verification_method);
    (org_out.service, new_out.service) = retain_unpaired(&org.service, &new.service);

    let references = [
        (&mut org_out.also_known_as, &mut new_out.also_known_as),
        (&mut org_out.authentication, &mut new_out.authentication),
        (&mut org_out.assertion_method, &mut new_out.assertion_method),
        (&mut org_out.key_agreement, &mut new_out.key_agreement),
        (
            &mut org_out.capability_invocation,
            &mut new_out.capability_invocation,
        ),
        (
            &mut org_out.capability_delegation,
            &mut new_out.capability_delegation,
        ),
    ];
    for (org_refs, new_refs) in references {
        let (o, n) = retain_unpaired(org_refs.as_slice(), new_refs.as_slice());
        *org_refs = o;
        *new_refs = n;
    }

    (org_out, new_out)
}

/// [remove_common_items] over arbitrary JSON documents: applies to every
/// top-level member of `org` that is an array and is also an array on `new`.
pub fn remove_common_json_items(org: &Value, new: &Value) -> (Value, Value) {
    let (Value::Object(org_map), Value::Object(new_map)) = (org, new) else {
        return (org.clone(), new.clone());
    };

    let mut org_out = org_map.clone();
    let mut new_out: Map<String, Value> = new_map.clone();
    for (key, org_item) in org_map {
        let (Value::Array(org_items), Some(Value::Array(new_items))) = (org_item, new_map.get(key))
        else {
            continue;
        };
        let (o, n) = symmetric_difference(org_items, new_items);
        org_out.insert(key.clone(), Value::Array(o));
        new_out.insert(key.clone(), Value::Array(n));
    }

    (Value::Object(org_out), Value::Object(new_out))
}

fn retain_unpaired<T: Clone + Serialize>(org: &[T], new: &[T]) -> (Vec<T>, Vec<T>) {
    let org_json: Vec<Value> = org.iter().map(to_json).collect();
    let new_json: Vec<Value> = new.iter().map(to_json).collect();
    let (org_keep, new_keep) = unpaired(&org_json, &new_json);
    (select(org, &org_keep), select(new, &new_keep))
}

/// Keep-masks for both sides after pairing equal elements.
fn unpaired(org: &[Value], new: &[Value]) -> (Vec<bool>, Vec<bool>) {
    let mut org_keep = vec![true; org.len()];
    let mut new_keep = vec![true; new.len()];

    for (i, item) in org.iter().enumerate().rev() {
        let matched = new
            .iter()
            .enumerate()
            .find(|(j, candidate)| new_keep[*j] && deep_equal(item, candidate))
            .map(|(j, _)| j);
        if let Some(j) = matched {
            org_keep[i] = false;
            new_keep[j] = false;
        }
    }

    (org_keep, new_keep)
}

fn select<T: Clone>(items: &[T], keep: &[bool]) -> Vec<T> {
    items
        .iter()
        .zip(keep)
        .filter(|(_, keep)| **keep)
        .map(|(item, _)| item.clone())
        .collect()
}

fn keys(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
        Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

fn len(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        _ => 0,
    }
}

fn member<'a>(container: &'a Value, key: &str) -> Option<&'a Value> {
    match container {
        Value::Array(items) => key
            .parse::<usize>()
            .ok()
            .filter(|i| i.to_string() == key)
            .and_then(|i| items.get(i)),
        Value::Object(map) => map.get(key),
        _ => None,
    }
}

fn scalar_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}
