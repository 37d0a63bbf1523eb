//! Conversions between MAVLink PARAM_* fields and cached parameter values
//!
//! MAVLink carries every parameter as an `f32` plus a type tag. Integer
//! types use the C-cast encoding (the integer converted to float), matching
//! the vehicle side of the protocol.

use mavlink::common::MavParamType;
use param_sync_core::parameters::ParamValue;

use crate::error::TransportError;

/// Maximum MAVLink parameter id length
pub const PARAM_ID_LEN: usize = 16;

/// Encode a parameter id into the fixed, NUL-padded MAVLink field
pub fn encode_param_id(id: &str) -> Result<[u8; PARAM_ID_LEN], TransportError> {
    let bytes = id.as_bytes();
    if bytes.len() > PARAM_ID_LEN {
        return Err(TransportError::Unsupported {
            id: id.to_string(),
            reason: "parameter id longer than 16 bytes",
        });
    }

    let mut param_id = [0u8; PARAM_ID_LEN];
    param_id[..bytes.len()].copy_from_slice(bytes);
    Ok(param_id)
}

/// Decode a NUL-padded MAVLink parameter id
pub fn decode_param_id(raw: &[u8; PARAM_ID_LEN]) -> String {
    let len = raw.iter().position(|&b| b == 0).unwrap_or(PARAM_ID_LEN);
    String::from_utf8_lossy(&raw[..len]).into_owned()
}

/// Convert a PARAM_VALUE payload into a cached value
pub fn decode_value(value: f32, param_type: MavParamType) -> ParamValue {
    match param_type {
        MavParamType::MAV_PARAM_TYPE_REAL32 | MavParamType::MAV_PARAM_TYPE_REAL64 => {
            // Shortest decimal form, so 0.1f32 becomes 0.1 rather than 0.10000000149
            ParamValue::Float(value.to_string().parse().unwrap_or(f64::from(value)))
        }
        _ => ParamValue::Int(value as i64),
    }
}

/// Convert a cached value into a PARAM_SET payload
pub fn encode_value(id: &str, value: &ParamValue) -> Result<(f32, MavParamType), TransportError> {
    match value {
        ParamValue::Int(i) => Ok((*i as f32, MavParamType::MAV_PARAM_TYPE_INT32)),
        ParamValue::Float(f) => Ok((*f as f32, MavParamType::MAV_PARAM_TYPE_REAL32)),
        ParamValue::Bool(b) => Ok((
            if *b { 1.0 } else { 0.0 },
            MavParamType::MAV_PARAM_TYPE_UINT8,
        )),
        ParamValue::Text(_) => Err(TransportError::Unsupported {
            id: id.to_string(),
            reason: "text values cannot be sent over MAVLink",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_id_padding() {
        let raw = encode_param_id("SR_EXTRA1").unwrap();
        assert_eq!(&raw[..9], b"SR_EXTRA1");
        assert!(raw[9..].iter().all(|&b| b == 0));
        assert_eq!(decode_param_id(&raw), "SR_EXTRA1");
    }

    #[test]
    fn test_param_id_full_length() {
        let raw = encode_param_id("ABCDEFGHIJKLMNOP").unwrap();
        assert_eq!(decode_param_id(&raw), "ABCDEFGHIJKLMNOP");
    }

    #[test]
    fn test_param_id_too_long() {
        assert!(matches!(
            encode_param_id("ABCDEFGHIJKLMNOPQ"),
            Err(TransportError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_decode_value() {
        assert_eq!(
            decode_value(10.0, MavParamType::MAV_PARAM_TYPE_UINT32),
            ParamValue::Int(10)
        );
        assert_eq!(
            decode_value(0.1, MavParamType::MAV_PARAM_TYPE_REAL32),
            ParamValue::Float(0.1)
        );
    }

    #[test]
    fn test_encode_value() {
        assert_eq!(
            encode_value("X", &ParamValue::Int(20)).unwrap(),
            (20.0, MavParamType::MAV_PARAM_TYPE_INT32)
        );
        assert_eq!(
            encode_value("X", &ParamValue::Bool(true)).unwrap(),
            (1.0, MavParamType::MAV_PARAM_TYPE_UINT8)
        );
        assert!(encode_value("X", &ParamValue::from("abc")).is_err());
    }
}
