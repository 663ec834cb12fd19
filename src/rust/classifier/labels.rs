use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Maps area label values to dense keys and back.
///
/// Keys are assigned in order of first occurrence, and that order is also the
/// order of every score vector the classifier produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct LabelMap {
    labels: Vec<String>,
    keys: HashMap<String, usize>,
}

impl From<Vec<String>> for LabelMap {
    fn from(values: Vec<String>) -> Self {
        Self::fit(values.iter().map(String::as_str))
    }
}

impl From<LabelMap> for Vec<String> {
    fn from(map: LabelMap) -> Self {
        map.labels
    }
}

impl LabelMap {
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut map = Self::default();
        for value in values {
            if !map.keys.contains_key(value) {
                map.keys.insert(value.to_string(), map.labels.len());
                map.labels.push(value.to_string());
            }
        }
        map
    }

    pub fn key(&self, value: &str) -> Option<usize> {
        self.keys.get(value).copied()
    }

    pub fn value(&self, key: usize) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_follow_first_occurrence() {
        let map = LabelMap::fit(["b", "a", "b", "c", "a"]);
        assert_eq!(map.labels(), &["b", "a", "c"]);
        assert_eq!(map.key("a"), Some(1));
        assert_eq!(map.value(2), Some("c"));
        assert_eq!(map.key("missing"), None);
    }

    #[test]
    fn test_serializes_as_label_list() {
        let map = LabelMap::fit(["x", "y"]);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"["x","y"]"#);
        let back: LabelMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
