//! User-entered key/value variables
//!
//! Scripts read these through `getVariableFromStorage`. The bag keeps
//! insertion order (the harness shows variables in the order they were
//! added) and never rejects a duplicate key: writing an existing key
//! replaces its value in place.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableBag {
    entries: Vec<(String, Value)>,
}

impl VariableBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, overwriting an existing key in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Add an empty variable named `key{n}` where n is the new length.
    ///
    /// Returns the generated key.
    pub fn add_placeholder(&mut self) -> String {
        let key = format!("key{}", self.entries.len() + 1);
        self.set(key.clone(), "");
        key
    }

    /// Rename a variable, keeping its value.
    ///
    /// The renamed entry moves to the end unless `new_key` already exists, in
    /// which case that entry takes the value where it stands. Renaming a
    /// missing key creates `new_key` with a null value.
    pub fn rename(&mut self, old_key: &str, new_key: impl Into<String>) {
        let value = self.remove(old_key).unwrap_or(Value::Null);
        self.set(new_key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for VariableBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = Self::new();
        for (k, v) in iter {
            bag.set(k, v);
        }
        bag
    }
}

impl Serialize for VariableBag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for VariableBag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BagVisitor;

        impl<'de> Visitor<'de> for BagVisitor {
            type Value = VariableBag;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of variable names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<VariableBag, A::Error> {
                let mut bag = VariableBag::new();
                while let Some((k, v)) = access.next_entry::<String, Value>()? {
                    bag.set(k, v);
                }
                Ok(bag)
            }
        }

        deserializer.deserialize_map(BagVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overwrite_in_place() {
        let mut bag = VariableBag::new();
        bag.set("apiKey", "abc");
        bag.set("radius", 500);
        bag.set("apiKey", "xyz");

        assert_eq!(bag.len(), 2);
        assert_eq!(bag.get("apiKey"), Some(&json!("xyz")));
        assert_eq!(bag.keys().collect::<Vec<_>>(), vec!["apiKey", "radius"]);
    }

    #[test]
    fn test_placeholder_keys() {
        let mut bag = VariableBag::new();
        assert_eq!(bag.add_placeholder(), "key1");
        assert_eq!(bag.add_placeholder(), "key2");
        assert_eq!(bag.get("key2"), Some(&json!("")));
    }

    #[test]
    fn test_rename_moves_to_end() {
        let mut bag: VariableBag = [("key1", "a"), ("key2", "b")].into_iter().collect();
        bag.rename("key1", "token");
        assert_eq!(bag.keys().collect::<Vec<_>>(), vec!["key2", "token"]);
        assert_eq!(bag.get("token"), Some(&json!("a")));
    }

    #[test]
    fn test_rename_onto_existing_key() {
        let mut bag: VariableBag = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        bag.rename("c", "a");
        assert_eq!(bag.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(bag.get("a"), Some(&json!(3)));
    }

    #[test]
    fn test_serde_keeps_order() {
        let bag: VariableBag = serde_json::from_str(r#"{"z": 1, "a": "two", "m": true}"#).unwrap();
        assert_eq!(bag.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
        assert_eq!(serde_json::to_string(&bag).unwrap(), r#"{"z":1,"a":"two","m":true}"#);
    }
}
