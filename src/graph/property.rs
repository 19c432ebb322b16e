//! Attribute value types for the name-keyed facade.
//!
//! The core adjacency structure never reads these; attributes ride along in
//! the facade and round-trip through GraphML with their type tag.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// An attribute value: string, integer or float.
///
/// These are exactly the three types the GraphML collaborator can tag, so a
/// value survives a save/load cycle with its type intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Str(String),
    Integer(i64),
    Float(f64),
}

impl PropertyValue {
    /// Get the string if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer if this is an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the float if this is a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Coerce to a float: floats pass through, integers widen, strings are
    /// parsed. `None` when a string does not parse as a number.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Str(s) => s.trim().parse().ok(),
        }
    }

    /// GraphML type tag for this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Str(_) => "str",
            PropertyValue::Integer(_) => "int",
            PropertyValue::Float(_) => "float",
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Str(s) => write!(f, "{}", s),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(fl) => write!(f, "{}", fl),
        }
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Str(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Str(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Integer(i as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

/// Attribute map for nodes and edges.
pub type PropertyMap = HashMap<String, PropertyValue>;
