//! Key selection over maps and JSON objects

use crate::CollectionError;
use ahash::AHashSet;
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

/// Shallow copy keeping only the listed keys that are present
pub fn pick<'a, K, V, Q, S, I>(object: &HashMap<K, V, S>, keys: I) -> HashMap<K, V, S>
where
    K: Borrow<Q> + Eq + Hash + Clone,
    V: Clone,
    Q: Eq + Hash + ?Sized + 'a,
    S: BuildHasher + Default,
    I: IntoIterator<Item = &'a Q>,
{
    let mut result = HashMap::default();
    for key in keys {
        if let Some((k, v)) = object.get_key_value(key) {
            result.insert(k.clone(), v.clone());
        }
    }
    result
}

/// Shallow copy without the listed keys
pub fn omit<'a, K, V, Q, S, I>(object: &HashMap<K, V, S>, keys: I) -> HashMap<K, V, S>
where
    K: Borrow<Q> + Eq + Hash + Clone,
    V: Clone,
    Q: Eq + Hash + ?Sized + 'a,
    S: BuildHasher + Default,
    I: IntoIterator<Item = &'a Q>,
{
    let excluded: AHashSet<&Q> = keys.into_iter().collect();
    object
        .iter()
        .filter(|&(k, _)| !excluded.contains(&Borrow::<Q>::borrow(k)))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// `pick` for a JSON object; key order follows the source object
///
/// Fails when `value` is not an object.
pub fn pick_json(value: &Value, keys: &[&str]) -> Result<Value, CollectionError> {
    let object = expect_object(value)?;
    let wanted: AHashSet<&str> = keys.iter().copied().collect();
    let picked: Map<String, Value> = object
        .iter()
        .filter(|(k, _)| wanted.contains(k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Ok(Value::Object(picked))
}

/// `omit` for a JSON object
///
/// Fails when `value` is not an object.
pub fn omit_json(value: &Value, keys: &[&str]) -> Result<Value, CollectionError> {
    let object = expect_object(value)?;
    let excluded: AHashSet<&str> = keys.iter().copied().collect();
    let kept: Map<String, Value> = object
        .iter()
        .filter(|(k, _)| !excluded.contains(k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Ok(Value::Object(kept))
}

fn expect_object(value: &Value) -> Result<&Map<String, Value>, CollectionError> {
    value.as_object().ok_or_else(|| {
        CollectionError::InvalidArgument(format!("expected a JSON object, got {}", kind(value)))
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
