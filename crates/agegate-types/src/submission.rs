use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A content submission as it arrives from the content-creation flow.
///
/// Ephemeral: it exists for the duration of one moderation decision and is
/// never persisted by the engine. Deserializes directly from a JSON body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Submission {
    fields: BTreeMap<String, FieldValue>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper for a plain text field.
    pub fn with_text(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.fields
            .insert(name.into(), FieldValue::Text(text.into()));
        self
    }

    /// Builder-style helper for an array field.
    pub fn with_list(mut self, name: impl Into<String>, items: Vec<ListItem>) -> Self {
        self.fields.insert(name.into(), FieldValue::List(items));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Value of a single submission field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<ListItem>),
    /// Numbers, booleans, objects and nulls. Never scanned.
    Other(Value),
}

/// Element of an array-valued field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListItem {
    Text(String),
    Object(Map<String, Value>),
    Other(Value),
}

impl ListItem {
    /// Object element carrying a `text` entry.
    pub fn text_object(text: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("text".into(), Value::String(text.into()));
        ListItem::Object(map)
    }

    /// The element's text: the string itself, or the object's `text` entry,
    /// falling back to `content`, falling back to empty.
    pub fn text(&self) -> &str {
        match self {
            ListItem::Text(text) => text,
            ListItem::Object(map) => ["text", "content"]
                .iter()
                .filter_map(|key| map.get(*key).and_then(Value::as_str))
                .find(|text| !text.is_empty())
                .unwrap_or(""),
            ListItem::Other(_) => "",
        }
    }
}

/// The restricted term found by a keyword scan and where it was found.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub term: String,
    pub field: String,
    /// Array index when the match came from an array-valued field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_mixed_body() {
        let body = r#"{
            "caption": "sunset",
            "texts": ["plain", {"text": "styled"}, {"content": "legacy"}, 7],
            "likes": 3
        }"#;
        let submission: Submission = serde_json::from_str(body).unwrap();

        assert!(matches!(submission.get("caption"), Some(FieldValue::Text(t)) if t == "sunset"));
        assert!(matches!(submission.get("likes"), Some(FieldValue::Other(_))));

        let Some(FieldValue::List(items)) = submission.get("texts") else {
            panic!("texts should be a list");
        };
        let texts: Vec<&str> = items.iter().map(ListItem::text).collect();
        assert_eq!(texts, vec!["plain", "styled", "legacy", ""]);
    }

    #[test]
    fn empty_text_entry_falls_back_to_content() {
        let item: ListItem = serde_json::from_str(r#"{"text": "", "content": "fallback"}"#).unwrap();
        assert_eq!(item.text(), "fallback");
    }

    #[test]
    fn builder_helpers() {
        let submission = Submission::new()
            .with_text("title", "hello")
            .with_list("texts", vec![ListItem::text_object("world")]);
        assert!(!submission.is_empty());
        assert!(submission.get("description").is_none());
    }
}
