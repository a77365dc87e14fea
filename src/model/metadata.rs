//! MetaDataCollection: the read-only output of metadata extraction

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Immutable mapping from metadata key to value.
///
/// Keys are whatever the extractor produced: flat dotted keys such as
/// `Exif.title`, or nested objects such as `{"Exif": {"title": ..}}`.
/// Once built, the collection is only read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetaDataCollection {
    entries: Map<String, Value>,
}

impl MetaDataCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, for assembling a collection before use
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Build from a JSON object. Returns `None` for any other JSON value.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(entries) => Some(Self { entries }),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_accepts_only_objects() {
        assert!(MetaDataCollection::from_json(json!({"Exif.title": "x"})).is_some());
        assert!(MetaDataCollection::from_json(json!(["Exif.title"])).is_none());
        assert!(MetaDataCollection::from_json(json!("x")).is_none());
    }

    #[test]
    fn deserializes_from_plain_object() {
        let md: MetaDataCollection =
            serde_json::from_str(r#"{"Exif": {"label": "sunset"}, "Iptc.city": "Oslo"}"#).unwrap();
        assert_eq!(md.len(), 2);
        assert_eq!(md.get("Iptc.city"), Some(&json!("Oslo")));
        assert_eq!(md.get("Exif"), Some(&json!({"label": "sunset"})));
    }
}
