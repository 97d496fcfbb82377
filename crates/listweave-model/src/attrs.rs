//! Node attribute values.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single attribute value. Attributes are small scalar settings such as a
/// list's starting number or a heading level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    String(String),
}

impl AttrValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(value.into())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => f.write_str("null"),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Int(n) => write!(f, "{n}"),
            AttrValue::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// Attribute map of a node. Ordered so that equality and rendering are stable.
pub type Attrs = BTreeMap<String, AttrValue>;

/// Declaration of one attribute on a node type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrSpec {
    /// Value used when none is given. An attribute without a default is required.
    pub default: Option<AttrValue>,
}

impl AttrSpec {
    pub fn with_default(value: impl Into<AttrValue>) -> Self {
        Self {
            default: Some(value.into()),
        }
    }

    pub fn required() -> Self {
        Self { default: None }
    }
}
