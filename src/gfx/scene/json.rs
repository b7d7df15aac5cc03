//! Small typed accessors over `serde_json::Value` shared by the scene loaders.
//!
//! Each helper takes the error constructor to use, so the same check reports
//! `MalformedDescriptor` inside an object and `MalformedUsage` inside a usage.

use serde_json::Value;

use crate::error::{Error, Result};

pub(crate) type ErrorKind = fn(String) -> Error;

pub(crate) fn float_array(value: &Value, what: &str, err: ErrorKind) -> Result<Vec<f32>> {
    value
        .as_array()
        .ok_or_else(|| err(format!("{what} must be an array of numbers")))?
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| err(format!("{what} contains a non-number")))
        })
        .collect()
}

pub(crate) fn uint_array(value: &Value, what: &str, err: ErrorKind) -> Result<Vec<u32>> {
    value
        .as_array()
        .ok_or_else(|| err(format!("{what} must be an array of unsigned integers")))?
        .iter()
        .map(|v| {
            v.as_u64()
                .and_then(|u| u32::try_from(u).ok())
                .ok_or_else(|| err(format!("{what} contains a non-u32 value")))
        })
        .collect()
}

pub(crate) fn vec3(value: &Value, what: &str, err: ErrorKind) -> Result<[f32; 3]> {
    let values = float_array(value, what, err)?;
    <[f32; 3]>::try_from(values.as_slice())
        .map_err(|_| err(format!("{what} must have exactly 3 components")))
}

pub(crate) fn number(value: &Value, what: &str, err: ErrorKind) -> Result<f32> {
    value
        .as_f64()
        .map(|f| f as f32)
        .ok_or_else(|| err(format!("{what} must be a number")))
}

pub(crate) fn string<'a>(value: &'a Value, what: &str, err: ErrorKind) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| err(format!("{what} must be a string")))
}

/// Looks up a required field of a JSON object.
pub(crate) fn field<'a>(value: &'a Value, key: &str, err: ErrorKind) -> Result<&'a Value> {
    value
        .get(key)
        .ok_or_else(|| err(format!("missing field {key:?}")))
}
