use serde_json::{Map, Value};

/// Site-level overrides for the default table and the parser options.
///
/// Keys are dotted paths into a JSON object, e.g. `element.strokeColor`, `text.fontSize`,
/// `appState.viewBackgroundColor` or `parser.fontSize`.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig(Value);

impl Default for SceneConfig {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl SceneConfig {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Walks `dotted_path` through nested objects.
    pub fn lookup(&self, dotted_path: &str) -> Option<&Value> {
        let mut cur = &self.0;
        for segment in dotted_path.split('.') {
            cur = cur.as_object()?.get(segment)?;
        }
        Some(cur)
    }

    pub fn get_u64(&self, dotted_path: &str) -> Option<u64> {
        self.lookup(dotted_path)?.as_u64()
    }
}
