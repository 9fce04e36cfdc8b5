//! Source-preserving YAML parsing.
//!
//! serde_yaml resolves plain scalars such as `1.10` or `0x1F` to numbers,
//! which loses the text that was written. Parsing therefore runs two passes
//! over the same input: the first records the shape of the tree, the second
//! follows that shape and reads every scalar back as a string.

use super::node::{Mapping, Node};
use serde::Deserialize;
use serde::de::{
    self, DeserializeSeed, Deserializer, EnumAccess, IgnoredAny, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};
use std::fmt;

/// Parse `text` into a node tree, keeping every scalar exactly as written.
pub(super) fn parse_yaml(text: &str) -> Result<Node, serde_yaml::Error> {
    let shape = Shape::deserialize(serde_yaml::Deserializer::from_str(text))?;
    if matches!(shape, Shape::Null) {
        return Ok(Node::Null);
    }
    Source(&shape).deserialize(serde_yaml::Deserializer::from_str(text))
}

/// Structure of a parsed document, without scalar values.
#[derive(Debug)]
enum Shape {
    Null,
    Scalar,
    Sequence(Vec<Shape>),
    /// Key and value shapes, in document order. Keys are `Null` or `Scalar`.
    Mapping(Vec<(Shape, Shape)>),
    /// Value carrying a custom tag such as `!include`.
    Tagged(Box<Shape>),
}

impl<'de> Deserialize<'de> for Shape {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ShapeVisitor)
    }
}

struct ShapeVisitor;

impl<'de> Visitor<'de> for ShapeVisitor {
    type Value = Shape;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a YAML value")
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Shape, E> {
        Ok(Shape::Scalar)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Shape, E> {
        Ok(Shape::Scalar)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Shape, E> {
        Ok(Shape::Scalar)
    }

    fn visit_i128<E: de::Error>(self, _: i128) -> Result<Shape, E> {
        Ok(Shape::Scalar)
    }

    fn visit_u128<E: de::Error>(self, _: u128) -> Result<Shape, E> {
        Ok(Shape::Scalar)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Shape, E> {
        Ok(Shape::Scalar)
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<Shape, E> {
        Ok(Shape::Scalar)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Shape, E> {
        Ok(Shape::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Shape, E> {
        Ok(Shape::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Shape, D::Error> {
        Shape::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Shape, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Shape::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Shape, A::Error> {
        let mut entries = Vec::new();
        while let Some(key) = map.next_key::<Shape>()? {
            if !matches!(key, Shape::Null | Shape::Scalar) {
                return Err(de::Error::custom("mapping keys must be scalars"));
            }
            entries.push((key, map.next_value()?));
        }
        Ok(Shape::Mapping(entries))
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Shape, A::Error> {
        let (_, variant) = data.variant::<IgnoredAny>()?;
        Ok(Shape::Tagged(Box::new(variant.newtype_variant()?)))
    }
}

/// Reads a node whose structure is already known.
struct Source<'s>(&'s Shape);

impl<'de> DeserializeSeed<'de> for Source<'_> {
    type Value = Node;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Node, D::Error> {
        match self.0 {
            Shape::Null => IgnoredAny::deserialize(deserializer).map(|_| Node::Null),
            Shape::Scalar => deserializer.deserialize_str(TextVisitor).map(Node::Scalar),
            Shape::Sequence(items) => deserializer.deserialize_seq(SequenceVisitor(items)),
            Shape::Mapping(entries) => deserializer.deserialize_map(MappingVisitor(entries)),
            Shape::Tagged(inner) => deserializer.deserialize_any(TaggedVisitor(inner)),
        }
    }
}

/// Mapping key; null keys read as `"null"`.
struct Key<'s>(&'s Shape);

impl<'de> DeserializeSeed<'de> for Key<'_> {
    type Value = String;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<String, D::Error> {
        match self.0 {
            Shape::Scalar => deserializer.deserialize_str(TextVisitor),
            _ => IgnoredAny::deserialize(deserializer).map(|_| "null".to_string()),
        }
    }
}

struct TextVisitor;

impl<'de> Visitor<'de> for TextVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a scalar")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }
}

struct SequenceVisitor<'s>(&'s [Shape]);

impl<'de> Visitor<'de> for SequenceVisitor<'_> {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a sequence of {} items", self.0.len())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Node, A::Error> {
        let mut items = Vec::with_capacity(self.0.len());
        for shape in self.0 {
            match seq.next_element_seed(Source(shape))? {
                Some(item) => items.push(item),
                None => return Err(de::Error::invalid_length(items.len(), &self)),
            }
        }
        Ok(Node::Sequence(items))
    }
}

struct MappingVisitor<'s>(&'s [(Shape, Shape)]);

impl<'de> Visitor<'de> for MappingVisitor<'_> {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a mapping of {} entries", self.0.len())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Node, A::Error> {
        let mut mapping = Mapping::new();
        for (key_shape, value_shape) in self.0 {
            let Some(key) = map.next_key_seed(Key(key_shape))? else {
                return Err(de::Error::invalid_length(mapping.len(), &self));
            };
            if mapping.contains_key(&key) {
                return Err(de::Error::custom(format_args!("duplicate mapping key `{}`", key)));
            }
            let value = map.next_value_seed(Source(value_shape))?;
            mapping.insert(key, value);
        }
        Ok(Node::Mapping(mapping))
    }
}

struct TaggedVisitor<'s>(&'s Shape);

impl<'de> Visitor<'de> for TaggedVisitor<'_> {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a tagged value")
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Node, A::Error> {
        let (_, variant) = data.variant::<IgnoredAny>()?;
        variant.newtype_variant_seed(Source(self.0))
    }
}
