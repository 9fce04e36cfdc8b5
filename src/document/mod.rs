//! Path-addressable YAML document.
//!
//! A [`Document`] owns a tree of [`Node`]s and exposes typed reads and writes
//! keyed by paths such as `base_value.subvalue.subvalue2.boolean` or
//! `base_value_2.sample_list[0]`. String scalars are expanded against the
//! document's [`EnvLookup`] on every read.

mod node;
pub mod path;
mod scalar;
mod source;

pub use node::{Mapping, Node};
pub use path::Segment;
pub use scalar::{FromNode, FromScalar, ToScalar, coerce};

use crate::env::{EnvLookup, ProcessEnv, expand};
use crate::error::{ConfigError, ConfigResult};
use serde_yaml::Value;
use std::path::Path;
use std::sync::Arc;

/// Source name used in parse errors for in-memory text.
const STRING_SOURCE: &str = "<string>";

/// A generic configuration document.
#[derive(Debug, Clone)]
pub struct Document {
    root: Node,
    env: Arc<dyn EnvLookup>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document reading the process environment.
    pub fn new() -> Self {
        Self::with_env(Arc::new(ProcessEnv))
    }

    /// Empty document expanding scalars against `env`.
    pub fn with_env(env: Arc<dyn EnvLookup>) -> Self {
        Self {
            root: Node::Mapping(Mapping::new()),
            env,
        }
    }

    pub fn env(&self) -> &Arc<dyn EnvLookup> {
        &self.env
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    /// Parse YAML text into a node tree. An empty document is an empty mapping.
    pub fn parse_str(text: &str, source_name: &str) -> ConfigResult<Node> {
        match source::parse_yaml(text).map_err(|e| ConfigError::parse(source_name, e))? {
            Node::Null => Ok(Node::Mapping(Mapping::new())),
            node => Ok(node),
        }
    }

    /// Read and parse a YAML file into a node tree.
    pub fn parse_file(path: &Path) -> ConfigResult<Node> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::parse_str(&text, &path.display().to_string())
    }

    /// Replace the content of this document with `text`.
    ///
    /// On failure the previous content is kept.
    pub fn load_from_string(&mut self, text: &str) -> ConfigResult<()> {
        self.root = Self::parse_str(text, STRING_SOURCE)?;
        Ok(())
    }

    /// Replace the content of this document with the file at `path`.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> ConfigResult<()> {
        self.root = Self::parse_file(path.as_ref())?;
        Ok(())
    }

    /// Reset to an empty mapping.
    pub fn clear(&mut self) {
        self.root = Node::Mapping(Mapping::new());
    }

    fn lookup(&self, path: &str) -> Option<&Node> {
        let segments = path::parse(path).ok()?;
        segments
            .iter()
            .try_fold(&self.root, |node, segment| match (node, segment) {
                (Node::Mapping(map), Segment::Key(key)) => map.get(key),
                (Node::Sequence(items), Segment::Index(index)) => items.get(*index),
                _ => None,
            })
    }

    /// True when `path` resolves to any node, including a null value.
    pub fn is_defined(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// Copy of the node at `path`.
    pub fn get_node(&self, path: &str) -> Option<Node> {
        self.lookup(path).cloned()
    }

    /// Read the scalar at `path` as a `T`, expanding environment references.
    ///
    /// Returns `default` when the path is missing or not a scalar, and
    /// `T::default()` when the expanded text does not coerce to `T`.
    pub fn get_scalar<T: FromScalar>(&self, path: &str, default: T) -> T {
        coerce(self.lookup(path), self.env.as_ref(), default)
    }

    /// Expanded text of the scalar at `path`.
    pub fn get_expanded(&self, path: &str) -> Option<String> {
        self.lookup(path)
            .and_then(Node::as_raw_str)
            .map(|raw| expand(raw, self.env.as_ref()))
    }

    /// Write `value` as a scalar at `path`, creating intermediate nodes.
    pub fn set_scalar<T: ToScalar + ?Sized>(&mut self, path: &str, value: &T) -> ConfigResult<()> {
        self.set_node(path, Node::Scalar(value.to_scalar()))
    }

    /// Write `node` at `path`, creating intermediate nodes.
    ///
    /// Intermediate nodes of the wrong kind are replaced. An index may name an
    /// existing element or the slot just past the end, which appends. The path
    /// must start with a key.
    pub fn set_node(&mut self, path: &str, node: Node) -> ConfigResult<()> {
        let segments = path::parse(path).map_err(|reason| ConfigError::invalid_path(path, reason))?;
        if let Some(Segment::Index(_)) = segments.first() {
            return Err(ConfigError::invalid_path(path, "the document root is not a sequence"));
        }
        self.check_indices(path, &segments)?;

        let mut current = &mut self.root;
        for segment in &segments {
            current = match segment {
                Segment::Key(key) => current.make_mapping().get_or_insert_null(key),
                Segment::Index(index) => {
                    let items = current.make_sequence();
                    if *index == items.len() {
                        items.push(Node::Null);
                    }
                    &mut items[*index]
                }
            };
        }
        *current = node;
        Ok(())
    }

    /// Reject indices more than one past the end of the sequence they address.
    ///
    /// Nodes that are missing or not sequences count as empty, since writing
    /// through them replaces them with a new sequence.
    fn check_indices(&self, path: &str, segments: &[Segment]) -> ConfigResult<()> {
        let mut current = Some(&self.root);
        for segment in segments {
            current = match segment {
                Segment::Key(key) => current.and_then(|node| node.get(key)),
                Segment::Index(index) => {
                    let items: &[Node] = match current {
                        Some(Node::Sequence(items)) => items,
                        _ => &[],
                    };
                    if *index > items.len() {
                        return Err(ConfigError::invalid_path(
                            path,
                            format!(
                                "index {} is past the end of a sequence of {} items",
                                index,
                                items.len()
                            ),
                        ));
                    }
                    items.get(*index)
                }
            };
        }
        Ok(())
    }

    /// Decode the sequence at `path`, element by element, in order.
    ///
    /// A scalar is read as a one-element sequence. Missing paths, nulls and
    /// mappings give an empty collection.
    pub fn get_sequence<T: FromNode, C: FromIterator<T>>(&self, path: &str) -> C {
        let env = self.env.as_ref();
        match self.lookup(path) {
            Some(Node::Sequence(items)) => items.iter().map(|item| T::from_node(item, env)).collect(),
            Some(scalar @ Node::Scalar(_)) => std::iter::once(T::from_node(scalar, env)).collect(),
            _ => std::iter::empty().collect(),
        }
    }

    /// Merge the top-level keys of `other` into this document.
    ///
    /// Each key of `other` replaces the whole value stored under the same key;
    /// nested mappings are not merged field by field.
    pub fn merge_top_level(&mut self, other: Node) {
        match other {
            Node::Mapping(map) => {
                let target = self.root.make_mapping();
                for (key, value) in map {
                    target.insert(key, value);
                }
            }
            Node::Null => {}
            other => self.root = other,
        }
    }

    /// The whole tree as a YAML value, optionally with scalars expanded.
    pub fn to_yaml_value(&self, expand_env: bool) -> Value {
        let env = expand_env.then_some(self.env.as_ref());
        self.root.to_yaml(env)
    }
}
