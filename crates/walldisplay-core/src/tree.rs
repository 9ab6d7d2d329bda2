//! Wire types for the WallDisplay plugin's `full_table` response.
//!
//! The plugin is PHP, so the payload is loosely typed: collections arrive as
//! objects keyed by id, or as `[]` when empty; ids arrive as numbers or as
//! numeric strings. Everything here normalizes that into plain Rust types.
//!
//! Album nesting has no fixed depth, so [`RawTree::from_json`] parses without
//! serde_json's recursion limit and grows the stack on demand.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;

/// Full album/tag table plus the current display mode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTree {
    /// Top-level albums, in document order
    #[serde(default, deserialize_with = "listing")]
    pub cats: Vec<RawCategory>,
    #[serde(default, deserialize_with = "listing")]
    pub tags: Vec<RawTag>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub mode: String,
}

/// One album node with its sub-albums.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCategory {
    #[serde(deserialize_with = "id")]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "optional_id")]
    pub id_uppercat: Option<u32>,
    #[serde(default, rename = "Enabled")]
    pub enabled: Option<Value>,
    #[serde(default, deserialize_with = "listing")]
    pub children: Vec<RawCategory>,
}

/// One tag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTag {
    #[serde(deserialize_with = "id")]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "Enabled")]
    pub enabled: Option<Value>,
}

impl RawTree {
    /// Parse a `full_table` body, however deeply its albums nest.
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        let mut de = serde_json::Deserializer::from_str(body);
        de.disable_recursion_limit();
        let tree = Self::deserialize(serde_stacker::Deserializer::new(&mut de))?;
        de.end()?;
        Ok(tree)
    }
}

impl RawCategory {
    pub fn is_enabled(&self) -> bool {
        is_enabled(self.enabled.as_ref())
    }
}

// Children are moved onto a work list so a deep chain is not dropped
// recursively.
impl Drop for RawCategory {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

impl RawTag {
    pub fn is_enabled(&self) -> bool {
        is_enabled(self.enabled.as_ref())
    }
}

/// Only the exact string `"0"` disables an album or tag.
fn is_enabled(flag: Option<&Value>) -> bool {
    !matches!(flag, Some(Value::String(s)) if s == "0")
}

/// Accept either a JSON object (values taken in document order) or an array.
fn listing<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct ListingVisitor<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for ListingVisitor<T> {
        type Value = Vec<T>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an object or an array")
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(item) = seq.next_element()? {
                out.push(item);
            }
            Ok(out)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((_key, item)) = map.next_entry::<de::IgnoredAny, T>()? {
                out.push(item);
            }
            Ok(out)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(ListingVisitor(PhantomData))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberLike {
    Int(i64),
    Text(String),
}

impl NumberLike {
    /// Piwigo ids are unsigned `INT` columns.
    fn into_id<E: de::Error>(self) -> Result<u32, E> {
        match self {
            Self::Int(v) => u32::try_from(v).map_err(|_| E::custom(format!("invalid id {}", v))),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid id '{}'", s))),
        }
    }
}

fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    NumberLike::deserialize(deserializer)?.into_id()
}

fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    match Option::<NumberLike>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberLike::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => value.into_id().map(Some),
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!("expected a string, got {}", other))),
    }
}
