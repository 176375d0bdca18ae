//! Generic decoded payload tree

use crate::types::{format_timestamp, JsonValue, Timestamp};
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use std::fmt;

/// A decoded JSON payload, nested maps kept in received order
///
/// Scalars and arrays are leaves. Instants already parsed by the caller are
/// carried as [`Tree::Instant`] so timestamp fields can arrive either way.
#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
    Leaf(JsonValue),
    Instant(Timestamp),
    Node(Vec<(String, Tree)>),
}

impl Tree {
    /// Child of a node by key
    pub fn get(&self, key: &str) -> Option<&Tree> {
        match self {
            Tree::Node(children) => children.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Tree::Node(_))
    }

    /// Children of a node, empty for leaves
    pub fn children(&self) -> &[(String, Tree)] {
        match self {
            Tree::Node(children) => children,
            _ => &[],
        }
    }

    /// Convert back to JSON; instants become RFC 3339 strings
    pub fn to_json(&self) -> JsonValue {
        match self {
            Tree::Leaf(value) => value.clone(),
            Tree::Instant(ts) => JsonValue::String(format_timestamp(ts)),
            Tree::Node(children) => JsonValue::Object(
                children
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<JsonValue> for Tree {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(map) => {
                Tree::Node(map.into_iter().map(|(k, v)| (k, Tree::from(v))).collect())
            }
            other => Tree::Leaf(other),
        }
    }
}

impl From<Timestamp> for Tree {
    fn from(ts: Timestamp) -> Self {
        Tree::Instant(ts)
    }
}

// ============================================================================
// Deserialization
// ============================================================================

impl<'de> Deserialize<'de> for Tree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TreeVisitor)
    }
}

struct TreeVisitor;

impl<'de> Visitor<'de> for TreeVisitor {
    type Value = Tree;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Tree, E> {
        Ok(Tree::Leaf(JsonValue::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Tree, E> {
        Ok(Tree::Leaf(JsonValue::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Tree, E> {
        Ok(Tree::Leaf(JsonValue::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Tree, E> {
        // JSON has no NaN or infinity
        Ok(Tree::Leaf(
            serde_json::Number::from_f64(v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
        ))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Tree, E> {
        Ok(Tree::Leaf(JsonValue::String(v.to_string())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Tree, E> {
        Ok(Tree::Leaf(JsonValue::String(v)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Tree, E> {
        Ok(Tree::Leaf(JsonValue::Null))
    }

    fn visit_none<E: de::Error>(self) -> Result<Tree, E> {
        Ok(Tree::Leaf(JsonValue::Null))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Tree, D::Error> {
        Tree::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Tree, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<JsonValue>()? {
            items.push(item);
        }
        Ok(Tree::Leaf(JsonValue::Array(items)))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Tree, A::Error> {
        let mut children: Vec<(String, Tree)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Tree>()? {
            // Last occurrence wins, at the position of the first
            match children.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => children.push((key, value)),
            }
        }
        Ok(Tree::Node(children))
    }
}
