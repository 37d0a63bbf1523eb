//! Parameter error types
//!
//! Provides the error returned when a value cannot be coerced to a
//! parameter's declared kind.

use alloc::string::String;

use super::value::ParamKind;

/// A value could not be coerced to the requested kind
#[derive(Debug, Clone, PartialEq)]
pub struct CoercionError {
    /// Kind the value was coerced to
    pub expected: ParamKind,
    /// Display form of the rejected value
    pub found: String,
}

impl CoercionError {
    pub(crate) fn new(expected: ParamKind, found: String) -> Self {
        Self { expected, found }
    }
}

impl core::fmt::Display for CoercionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "cannot coerce {:?} to {}", self.found, self.expected)
    }
}

impl core::error::Error for CoercionError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_display() {
        let err = CoercionError::new(ParamKind::Int, "abc".to_string());
        assert_eq!(err.to_string(), "cannot coerce \"abc\" to int");
    }
}
