//! Literal values carried by `CONSTANT` nodes.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// A literal value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(FloatBits),
    String(String),
    Bytes(Vec<u8>),
}

impl Constant {
    /// Render this constant as concrete syntax.
    pub fn to_source(&self) -> String {
        match self {
            Constant::Null => "null".to_owned(),
            Constant::Bool(b) => b.to_string(),
            Constant::Int(i) => i.to_string(),
            Constant::Uint(u) => format!("{u}u"),
            Constant::Double(d) => format!("{:?}", d.value()),
            Constant::String(s) => quote_string(s),
            Constant::Bytes(bytes) => {
                let mut out = String::from("b\"");
                for &byte in bytes {
                    match byte {
                        b'"' => out.push_str("\\\""),
                        b'\\' => out.push_str("\\\\"),
                        0x20..=0x7e => out.push(byte as char),
                        _ => {
                            let _ = write!(out, "\\x{byte:02x}");
                        }
                    }
                }
                out.push('"');
                out
            }
        }
    }
}

fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

impl From<bool> for Constant {
    fn from(value: bool) -> Self {
        Constant::Bool(value)
    }
}

impl From<i64> for Constant {
    fn from(value: i64) -> Self {
        Constant::Int(value)
    }
}

impl From<u64> for Constant {
    fn from(value: u64) -> Self {
        Constant::Uint(value)
    }
}

impl From<f64> for Constant {
    fn from(value: f64) -> Self {
        Constant::Double(FloatBits::new(value))
    }
}

impl From<&str> for Constant {
    fn from(value: &str) -> Self {
        Constant::String(value.to_owned())
    }
}

impl From<String> for Constant {
    fn from(value: String) -> Self {
        Constant::String(value)
    }
}

/// Wrapper for f64 that implements Eq and Hash.
///
/// This is needed because f64 doesn't implement Eq/Hash due to NaN.
/// We use the bit representation for comparison.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FloatBits(f64);

impl FloatBits {
    /// Create a new FloatBits from an f64.
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the underlying f64 value.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for FloatBits {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatBits {}

impl std::hash::Hash for FloatBits {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}
