//! Slice helpers
//!
//! Iteratees and predicates receive `(value, index, slice)`.

use crate::CollectionError;
use ahash::AHashSet;
use std::hash::Hash;

/// Apply `iteratee` to every element, producing a vector of equal length
pub fn map<T, U, F>(array: &[T], mut iteratee: F) -> Vec<U>
where
    F: FnMut(&T, usize, &[T]) -> U,
{
    let mut results = Vec::with_capacity(array.len());
    for (index, value) in array.iter().enumerate() {
        results.push(iteratee(value, index, array));
    }
    results
}

/// Elements for which `predicate` holds, in order
pub fn filter<T, F>(array: &[T], mut predicate: F) -> Vec<T>
where
    T: Clone,
    F: FnMut(&T, usize, &[T]) -> bool,
{
    array
        .iter()
        .enumerate()
        .filter(|&(index, value)| predicate(value, index, array))
        .map(|(_, value)| value.clone())
        .collect()
}

/// First occurrence of each distinct value, in order
pub fn uniq<T>(array: &[T]) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let mut seen = AHashSet::with_capacity(array.len());
    let mut result = Vec::new();

    for value in array {
        if seen.insert(value) {
            result.push(value.clone());
        }
    }
    result
}

/// Split into consecutive groups of `size`; the last group may be shorter
///
/// Fails when `size` is zero.
pub fn chunk<T>(array: &[T], size: usize) -> Result<Vec<Vec<T>>, CollectionError>
where
    T: Clone,
{
    if size == 0 {
        return Err(CollectionError::InvalidArgument(
            "chunk size must be a positive integer".to_string(),
        ));
    }
    Ok(array.chunks(size).map(<[T]>::to_vec).collect())
}
