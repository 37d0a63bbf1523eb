//! Parameter value kinds and coercion
//!
//! Every cached parameter has a [`ParamKind`] fixed at construction. Values
//! arriving from the device or from a local edit are coerced to that kind
//! before they are stored, so a device that echoes `"42"` for an integer
//! parameter still produces `ParamValue::Int(42)`.

use alloc::string::{String, ToString};

use super::error::CoercionError;

/// Parameter kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// Boolean flag
    Bool,
    /// Free-form text
    Text,
}

impl ParamKind {
    /// Coerce `value` to this kind
    ///
    /// Returns the coerced value, or [`CoercionError`] when the value is
    /// structurally incompatible (e.g. non-numeric text for `Int`).
    pub fn coerce(self, value: &ParamValue) -> Result<ParamValue, CoercionError> {
        let coerced = match (self, value) {
            (ParamKind::Int, ParamValue::Int(i)) => Some(ParamValue::Int(*i)),
            (ParamKind::Int, ParamValue::Float(f)) => float_to_int(*f).map(ParamValue::Int),
            (ParamKind::Int, ParamValue::Bool(b)) => Some(ParamValue::Int(i64::from(*b))),
            (ParamKind::Int, ParamValue::Text(s)) => s.trim().parse().ok().map(ParamValue::Int),

            (ParamKind::Float, ParamValue::Int(i)) => Some(ParamValue::Float(*i as f64)),
            (ParamKind::Float, ParamValue::Float(f)) => Some(ParamValue::Float(*f)),
            (ParamKind::Float, ParamValue::Bool(b)) => {
                Some(ParamValue::Float(if *b { 1.0 } else { 0.0 }))
            }
            (ParamKind::Float, ParamValue::Text(s)) => {
                s.trim().parse().ok().map(ParamValue::Float)
            }

            (ParamKind::Bool, ParamValue::Int(i)) => Some(ParamValue::Bool(*i != 0)),
            (ParamKind::Bool, ParamValue::Float(f)) => Some(ParamValue::Bool(*f != 0.0)),
            (ParamKind::Bool, ParamValue::Bool(b)) => Some(ParamValue::Bool(*b)),
            (ParamKind::Bool, ParamValue::Text(s)) => parse_bool(s).map(ParamValue::Bool),

            (ParamKind::Text, ParamValue::Text(s)) => Some(ParamValue::Text(s.clone())),
            (ParamKind::Text, other) => Some(ParamValue::Text(other.to_string())),
        };

        coerced.ok_or_else(|| CoercionError::new(self, value.to_string()))
    }

    /// Check whether `value` can be coerced to this kind
    pub fn accepts(self, value: &ParamValue) -> bool {
        self.coerce(value).is_ok()
    }
}

impl core::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            ParamKind::Int => "int",
            ParamKind::Float => "float",
            ParamKind::Bool => "bool",
            ParamKind::Text => "text",
        };
        f.write_str(name)
    }
}

/// Parameter value (union of supported kinds)
///
/// Equality treats two `Float(NaN)` values as equal, so a NaN reported by
/// the device compares equal to itself when computing dirty state.
#[derive(Debug, Clone)]
pub enum ParamValue {
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Text value
    Text(String),
}

impl ParamValue {
    /// Get the kind of this value
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::Float(_) => ParamKind::Float,
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::Text(_) => ParamKind::Text,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(f) => Some(*f),
            ParamValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParamValue::Int(a), ParamValue::Int(b)) => a == b,
            (ParamValue::Float(a), ParamValue::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (ParamValue::Bool(a), ParamValue::Bool(b)) => a == b,
            (ParamValue::Text(a), ParamValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl core::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

/// Truncate toward zero, rejecting NaN, infinities and out-of-range values
fn float_to_int(value: f64) -> Option<i64> {
    // 2^63 is exactly representable; i64::MAX is not
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if value.is_finite() && value >= -LIMIT && value < LIMIT {
        Some(value as i64)
    } else {
        None
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    const TRUE: [&str; 4] = ["true", "1", "yes", "on"];
    const FALSE: [&str; 4] = ["false", "0", "no", "off"];

    if TRUE.iter().any(|t| t.eq_ignore_ascii_case(text)) {
        Some(true)
    } else if FALSE.iter().any(|t| t.eq_ignore_ascii_case(text)) {
        Some(false)
    } else {
        None
    }
}
