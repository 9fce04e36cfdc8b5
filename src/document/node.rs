//! The generic document node.

use crate::env::{EnvLookup, expand};
use serde_yaml::{Number, Value};
use std::collections::HashMap;

/// A node of a configuration document.
///
/// Scalars keep their text and are only converted when read, so a value is
/// expanded and coerced according to the type the caller asks for.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    /// A key that is present without a value (`configs:`).
    #[default]
    Null,
    Scalar(String),
    Sequence(Vec<Node>),
    Mapping(Mapping),
}

/// Unique-keyed children, iterated in insertion order.
///
/// Lookups go through a key index; `entries` stays the source of order.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: Vec<(String, Node)>,
    index: HashMap<String, usize>,
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Insert or replace `key`. A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: Node) -> Option<Node> {
        let key = key.into();
        match self.index.get(&key) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Node> {
        let pos = self.index.remove(key)?;
        let (_, value) = self.entries.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(value)
    }

    /// Mutable child at `key`, inserted as [`Node::Null`] when absent.
    pub fn get_or_insert_null(&mut self, key: &str) -> &mut Node {
        let pos = match self.index.get(key) {
            Some(&pos) => pos,
            None => {
                let pos = self.entries.len();
                self.index.insert(key.to_string(), pos);
                self.entries.push((key.to_string(), Node::Null));
                pos
            }
        };
        &mut self.entries[pos].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl FromIterator<(String, Node)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (String, Node)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (key, value) in iter {
            mapping.insert(key, value);
        }
        mapping
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Node);
    type IntoIter = std::vec::IntoIter<(String, Node)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Node {
    pub fn scalar(text: impl Into<String>) -> Self {
        Node::Scalar(text.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    /// Child of a mapping node by key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Raw scalar text, without expansion.
    pub fn as_raw_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(text) => Some(text),
            _ => None,
        }
    }

    /// Turn this node into an empty mapping unless it already is one.
    pub(crate) fn make_mapping(&mut self) -> &mut Mapping {
        if !matches!(self, Node::Mapping(_)) {
            *self = Node::Mapping(Mapping::new());
        }
        match self {
            Node::Mapping(map) => map,
            _ => unreachable!("node was just replaced with a mapping"),
        }
    }

    /// Turn this node into an empty sequence unless it already is one.
    pub(crate) fn make_sequence(&mut self) -> &mut Vec<Node> {
        if !matches!(self, Node::Sequence(_)) {
            *self = Node::Sequence(Vec::new());
        }
        match self {
            Node::Sequence(items) => items,
            _ => unreachable!("node was just replaced with a sequence"),
        }
    }

    /// Convert back to a YAML value for display.
    ///
    /// With an environment, scalars are expanded first. Scalars that look
    /// like booleans or numbers are emitted as such.
    pub fn to_yaml(&self, env: Option<&dyn EnvLookup>) -> Value {
        match self {
            Node::Null => Value::Null,
            Node::Scalar(text) => {
                let text = match env {
                    Some(env) => expand(text, env),
                    None => text.clone(),
                };
                typed_scalar(text)
            }
            Node::Sequence(items) => {
                Value::Sequence(items.iter().map(|item| item.to_yaml(env)).collect())
            }
            Node::Mapping(map) => Value::Mapping(
                map.iter()
                    .map(|(k, v)| (Value::String(k.to_string()), v.to_yaml(env)))
                    .collect(),
            ),
        }
    }
}

/// Emit `text` as a boolean or number when that renders back to the same
/// text, so `1.10` and `0x1F` stay strings.
fn typed_scalar(text: String) -> Value {
    match text.as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    let number = if let Ok(n) = text.parse::<i64>() {
        Some(Number::from(n))
    } else if let Ok(n) = text.parse::<u64>() {
        Some(Number::from(n))
    } else {
        text.parse::<f64>().ok().filter(|n| n.is_finite()).map(Number::from)
    };
    match number {
        Some(number) if number.to_string() == text => Value::Number(number),
        _ => Value::String(text),
    }
}
