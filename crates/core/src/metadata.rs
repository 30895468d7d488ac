//! Document-level metadata (title, meta description, schema, keyword).
//!
//! A thin wrapper over a JSON object so arbitrary fields survive the
//! pipeline, with typed accessors for the well-known keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PRIMARY_KEYWORD: &str = "primary_keyword";
pub const TITLE: &str = "title";
pub const META_DESCRIPTION: &str = "meta_description";
pub const SCHEMA: &str = "schema";

/// Key of the FAQ entry list inside `schema`.
pub const SCHEMA_FAQ: &str = "faq";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value for `key`, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Overwrite this map with every entry of `writes`.
    pub fn apply(&mut self, writes: &Metadata) {
        for (key, value) in &writes.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// The primary keyword, ignoring blank values.
    pub fn primary_keyword(&self) -> Option<&str> {
        non_blank(self.get_str(PRIMARY_KEYWORD))
    }

    pub fn title(&self) -> Option<&str> {
        non_blank(self.get_str(TITLE))
    }

    pub fn meta_description(&self) -> Option<&str> {
        non_blank(self.get_str(META_DESCRIPTION))
    }

    /// FAQ entries declared in `schema.faq`; empty when absent or malformed.
    pub fn faq_schema_entries(&self) -> &[Value] {
        self.get(SCHEMA)
            .and_then(|schema| schema.get(SCHEMA_FAQ))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn with_primary_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.insert(PRIMARY_KEYWORD, keyword.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.insert(TITLE, title.into());
        self
    }

    pub fn with_meta_description(mut self, description: impl Into<String>) -> Self {
        self.insert(META_DESCRIPTION, description.into());
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.insert(SCHEMA, schema);
        self
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
