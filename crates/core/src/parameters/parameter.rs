//! Cached device parameter
//!
//! A [`Parameter`] is one named, typed value mirrored from the device. It
//! remembers the last value the device confirmed so the dirty flag always
//! answers "does the local value differ from the device?".

use alloc::string::String;

use super::error::CoercionError;
use super::value::{ParamKind, ParamValue};

/// Locally cached device parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    id: String,
    index: u16,
    kind: ParamKind,
    value: ParamValue,
    /// Last value received from (or accepted by) the device
    confirmed: ParamValue,
}

impl Parameter {
    /// Create a parameter whose kind is taken from the first value
    ///
    /// The value is treated as device-confirmed, so the parameter starts clean.
    pub fn new(id: impl Into<String>, index: u16, value: ParamValue) -> Self {
        Self {
            id: id.into(),
            index,
            kind: value.kind(),
            confirmed: value.clone(),
            value,
        }
    }

    /// Create a parameter with an explicit kind
    ///
    /// # Errors
    ///
    /// Returns [`CoercionError`] if `value` cannot be coerced to `kind`.
    pub fn with_kind(
        id: impl Into<String>,
        index: u16,
        kind: ParamKind,
        value: ParamValue,
    ) -> Result<Self, CoercionError> {
        let value = kind.coerce(&value)?;
        Ok(Self {
            id: id.into(),
            index,
            kind,
            confirmed: value.clone(),
            value,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    /// Declared kind (fixed for the lifetime of the parameter)
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    /// Last device-confirmed value
    pub fn confirmed(&self) -> &ParamValue {
        &self.confirmed
    }

    /// True when the local value differs from the last device-confirmed value
    pub fn is_dirty(&self) -> bool {
        self.value != self.confirmed
    }

    /// Set a new local value
    ///
    /// The value is coerced to the declared kind. On success the new dirty
    /// state is returned. On failure nothing is modified.
    ///
    /// Dirty is measured against [`Parameter::confirmed`], not the previous
    /// local value: repeating an edit keeps it dirty, reverting it clears it.
    pub fn set_value(&mut self, value: impl Into<ParamValue>) -> Result<bool, CoercionError> {
        self.value = self.kind.coerce(&value.into())?;
        Ok(self.is_dirty())
    }

    /// Check whether `value` would be accepted by [`Parameter::set_value`]
    pub fn validate(&self, value: &ParamValue) -> bool {
        self.kind.accepts(value)
    }

    /// Store a device-confirmed value and clear the dirty flag
    ///
    /// # Errors
    ///
    /// Returns [`CoercionError`] if the device value does not fit the
    /// declared kind; the parameter is left untouched.
    pub fn confirm(&mut self, value: &ParamValue) -> Result<(), CoercionError> {
        let value = self.kind.coerce(value)?;
        self.confirmed = value.clone();
        self.value = value;
        Ok(())
    }
}

impl core::fmt::Display for Parameter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "<Parameter {} #{} {}({}){}>",
            self.id,
            self.index,
            self.kind,
            self.value,
            if self.is_dirty() { "*" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_new_is_clean() {
        let param = Parameter::new("RPM_LIMIT", 3, ParamValue::Int(6000));
        assert_eq!(param.id(), "RPM_LIMIT");
        assert_eq!(param.index(), 3);
        assert_eq!(param.kind(), ParamKind::Int);
        assert!(!param.is_dirty());
    }

    #[test]
    fn test_dirty_tracking() {
        let mut param = Parameter::new("RPM_LIMIT", 0, ParamValue::Int(6000));

        assert_eq!(param.set_value(6500), Ok(true));
        assert!(param.is_dirty());

        // Back to the device value
        assert_eq!(param.set_value(6000), Ok(false));
        assert!(!param.is_dirty());
    }

    #[test]
    fn test_same_edit_twice_stays_dirty() {
        let mut param = Parameter::new("RPM_LIMIT", 0, ParamValue::Int(6000));
        param.set_value(6500).unwrap();
        assert_eq!(param.set_value(6500), Ok(true));
    }

    #[test]
    fn test_set_value_coerces() {
        let mut param = Parameter::new("TEMP_MAX", 1, ParamValue::Float(95.0));
        assert_eq!(param.set_value("101.5"), Ok(true));
        assert_eq!(param.value(), &ParamValue::Float(101.5));
    }

    #[test]
    fn test_rejected_value_is_noop() {
        let mut param = Parameter::new("RPM_LIMIT", 0, ParamValue::Int(6000));
        param.set_value(6100).unwrap();

        let err = param.set_value("not-a-number").unwrap_err();
        assert_eq!(err.expected, ParamKind::Int);
        assert_eq!(param.value(), &ParamValue::Int(6100));
        assert!(param.is_dirty());
    }

    #[test]
    fn test_validate_is_pure() {
        let param = Parameter::new("RPM_LIMIT", 0, ParamValue::Int(6000));
        assert!(param.validate(&ParamValue::from("7000")));
        assert!(!param.validate(&ParamValue::from("fast")));
        assert_eq!(param.value(), &ParamValue::Int(6000));
    }

    #[test]
    fn test_with_kind() {
        let param = Parameter::with_kind("ENABLED", 2, ParamKind::Bool, ParamValue::Int(1)).unwrap();
        assert_eq!(param.value(), &ParamValue::Bool(true));

        assert!(Parameter::with_kind("ENABLED", 2, ParamKind::Bool, "sometimes".into()).is_err());
    }

    #[test]
    fn test_confirm_clears_dirty() {
        let mut param = Parameter::new("RPM_LIMIT", 0, ParamValue::Int(6000));
        param.set_value(6500).unwrap();

        param.confirm(&ParamValue::Float(6500.0)).unwrap();
        assert_eq!(param.value(), &ParamValue::Int(6500));
        assert!(!param.is_dirty());
    }

    #[test]
    fn test_nan_device_value_is_clean() {
        let mut param = Parameter::new("GAIN", 0, ParamValue::Float(f64::NAN));
        assert!(!param.is_dirty());

        param.confirm(&ParamValue::Float(f64::NAN)).unwrap();
        assert!(!param.is_dirty());

        assert_eq!(param.set_value(0.5), Ok(true));
        assert_eq!(param.set_value(f64::NAN), Ok(false));
    }

    #[test]
    fn test_display() {
        let mut param = Parameter::new("RPM_LIMIT", 4, ParamValue::Int(6000));
        assert_eq!(param.to_string(), "<Parameter RPM_LIMIT #4 int(6000)>");

        param.set_value(1).unwrap();
        assert_eq!(param.to_string(), "<Parameter RPM_LIMIT #4 int(1)*>");
    }
}
