use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key/value body sent to a generation endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestPayload(Map<String, Value>);

impl RequestPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Copy of this payload carrying its own seed.
    pub fn with_seed(&self, seed: i64) -> Self {
        let mut payload = self.clone();
        payload.insert("seed", seed);
        payload
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}
