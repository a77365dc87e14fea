//! Variable context handed to an evaluator

use serde_json::{Map, Value};

/// Named variables visible to an expression.
///
/// Variable names may themselves contain dots (`Exif.title`), so lookups of
/// dotted paths try the longest matching variable name first and navigate
/// into the value with the remaining segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalContext {
    variables: Map<String, Value>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(variables: Map<String, Value>) -> Self {
        Self { variables }
    }

    /// Set a variable, replacing any previous value under that name
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Resolve a dotted path such as `Exif.GPS.latitude`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let segments: Vec<&str> = path.split('.').collect();
        for split in (1..=segments.len()).rev() {
            let name = segments[..split].join(".");
            if let Some(root) = self.variables.get(&name) {
                if let Some(found) = navigate(root, &segments[split..]) {
                    return Some(found);
                }
            }
        }
        None
    }
}

fn navigate<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(*segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
