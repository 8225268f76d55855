//! A dictionary that can hold multiple values per key.
//!
//! [`MultiValueDict`] backs query-string and form-body parameters, where a
//! single key may appear several times. Keys are kept in first-insertion order
//! so iteration is deterministic.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// An insertion-ordered dictionary that maps keys to lists of values.
///
/// [`get`](MultiValueDict::get) returns the **last** value for a key, while
/// [`get_list`](MultiValueDict::get_list) returns all of them.
///
/// # Examples
///
/// ```
/// use pecan_rs_core::utils::MultiValueDict;
///
/// let mut d = MultiValueDict::new();
/// d.append("color".to_string(), "red");
/// d.append("color".to_string(), "blue");
///
/// assert_eq!(d.get("color"), Some(&"blue"));
/// assert_eq!(d.get_list("color"), Some(&["red", "blue"][..]));
/// ```
#[derive(Debug, Clone)]
pub struct MultiValueDict<K: Eq + Hash + Clone, V> {
    entries: Vec<(K, Vec<V>)>,
    index: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone, V> Default for MultiValueDict<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone, V> MultiValueDict<K, V> {
    /// Creates an empty `MultiValueDict`.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Returns the last value associated with the key.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_list(key).and_then(<[V]>::last)
    }

    /// Returns all values associated with the key, in insertion order.
    pub fn get_list<Q>(&self, key: &Q) -> Option<&[V]>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index
            .get(key)
            .map(|&pos| self.entries[pos].1.as_slice())
    }

    /// Sets the value for a key, replacing any existing values.
    ///
    /// A replaced key keeps its original position.
    pub fn set(&mut self, key: K, value: V) {
        self.set_list(key, vec![value]);
    }

    /// Replaces all values for a key.
    pub fn set_list(&mut self, key: K, values: Vec<V>) {
        if let Some(&pos) = self.index.get(&key) {
            self.entries[pos].1 = values;
        } else {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, values));
        }
    }

    /// Appends a value to the list for the given key.
    pub fn append(&mut self, key: K, value: V) {
        if let Some(&pos) = self.index.get(&key) {
            self.entries[pos].1.push(value);
        } else {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, vec![value]));
        }
    }

    /// Removes a key, returning its values.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<Vec<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let pos = self.index.remove(key)?;
        let (_, values) = self.entries.remove(pos);
        for (k, _) in &self.entries[pos..] {
            if let Some(slot) = self.index.get_mut::<K>(k) {
                *slot -= 1;
            }
        }
        Some(values)
    }

    /// Merges `other` into `self`. Keys present in `other` replace the
    /// values of the same key in `self`.
    pub fn extend_replacing(&mut self, other: Self) {
        for (key, values) in other.entries {
            self.set_list(key, values);
        }
    }

    /// Returns an iterator over the keys, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Returns an iterator over (key, values) pairs, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[V])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the dictionary contains no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if the dictionary contains the specified key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }
}

impl<K: Eq + Hash + Clone, V> IntoIterator for MultiValueDict<K, V> {
    type Item = (K, Vec<V>);
    type IntoIter = std::vec::IntoIter<(K, Vec<V>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Eq + Hash + Clone, V> FromIterator<(K, V)> for MultiValueDict<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Self::new();
        for (k, v) in iter {
            dict.append(k, v);
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let d: MultiValueDict<String, String> = MultiValueDict::new();
        assert!(d.is_empty());
        assert_eq!(d.len(), 0);
    }

    #[test]
    fn test_append_and_get_returns_last() {
        let mut d = MultiValueDict::new();
        d.append("color", "red");
        d.append("color", "blue");
        d.append("color", "green");

        assert_eq!(d.get("color"), Some(&"green"));
        assert_eq!(d.get_list("color"), Some(&["red", "blue", "green"][..]));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn test_set_replaces_existing_in_place() {
        let mut d = MultiValueDict::new();
        d.append("k", "a");
        d.append("j", "b");
        d.set("k", "c");
        assert_eq!(d.get_list("k"), Some(&["c"][..]));
        assert_eq!(d.keys().copied().collect::<Vec<_>>(), vec!["k", "j"]);
    }

    #[test]
    fn test_keys_keep_insertion_order() {
        let d: MultiValueDict<&str, i32> =
            [("z", 1), ("a", 2), ("m", 3), ("a", 4)].into_iter().collect();
        assert_eq!(d.keys().copied().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_remove_reindexes() {
        let mut d: MultiValueDict<&str, i32> =
            [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        assert_eq!(d.remove("a"), Some(vec![1]));
        assert_eq!(d.get("b"), Some(&2));
        assert_eq!(d.get("c"), Some(&3));
        assert_eq!(d.remove("a"), None);
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn test_extend_replacing() {
        let mut query: MultiValueDict<&str, &str> =
            [("a", "query"), ("b", "query")].into_iter().collect();
        let body: MultiValueDict<&str, &str> = [("b", "body"), ("c", "body")].into_iter().collect();
        query.extend_replacing(body);

        assert_eq!(query.get("a"), Some(&"query"));
        assert_eq!(query.get_list("b"), Some(&["body"][..]));
        assert_eq!(query.get("c"), Some(&"body"));
    }

    #[test]
    fn test_string_keys_borrow_as_str() {
        let mut d = MultiValueDict::new();
        d.set("name".to_string(), 1);
        assert!(d.contains_key("name"));
        assert_eq!(d.get("name"), Some(&1));
    }

    #[test]
    fn test_get_missing_key() {
        let d: MultiValueDict<&str, &str> = MultiValueDict::new();
        assert_eq!(d.get("missing"), None);
        assert_eq!(d.get_list("missing"), None);
    }
}
