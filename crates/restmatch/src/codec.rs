//! Request and response body codecs.
//!
//! A [`Marshaler`] turns a request body [`Value`] into bytes; an
//! [`Unmarshaler`] decodes response bytes back into a [`Value`]. JSON is the
//! default for both. Closures with matching signatures implement the traits.

use crate::error::CodecError;
use crate::value::Value;
use bytes::Bytes;

pub trait Marshaler: Send + Sync {
    fn marshal(&self, value: &Value) -> Result<Bytes, CodecError>;
}

pub trait Unmarshaler: Send + Sync {
    fn unmarshal(&self, body: &[u8]) -> Result<Value, CodecError>;
}

impl<F> Marshaler for F
where
    F: Fn(&Value) -> Result<Bytes, CodecError> + Send + Sync,
{
    fn marshal(&self, value: &Value) -> Result<Bytes, CodecError> {
        self(value)
    }
}

impl<F> Unmarshaler for F
where
    F: Fn(&[u8]) -> Result<Value, CodecError> + Send + Sync,
{
    fn unmarshal(&self, body: &[u8]) -> Result<Value, CodecError> {
        self(body)
    }
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Marshaler for JsonCodec {
    fn marshal(&self, value: &Value) -> Result<Bytes, CodecError> {
        Ok(Bytes::from(serde_json::to_vec(value)?))
    }
}

impl Unmarshaler for JsonCodec {
    fn unmarshal(&self, body: &[u8]) -> Result<Value, CodecError> {
        Ok(serde_json::from_slice(body)?)
    }
}

/// YAML codec backed by `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl Marshaler for YamlCodec {
    fn marshal(&self, value: &Value) -> Result<Bytes, CodecError> {
        Ok(Bytes::from(serde_yaml::to_string(value)?))
    }
}

impl Unmarshaler for YamlCodec {
    fn unmarshal(&self, body: &[u8]) -> Result<Value, CodecError> {
        Ok(serde_yaml::from_slice(body)?)
    }
}

/// Passes text through unchanged.
///
/// Marshaling accepts only string values. Unmarshaling yields the body as a
/// string, replacing invalid UTF-8 sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl Marshaler for RawCodec {
    fn marshal(&self, value: &Value) -> Result<Bytes, CodecError> {
        match value {
            Value::String(s) => Ok(Bytes::copy_from_slice(s.as_bytes())),
            other => Err(CodecError::NotText(other.kind())),
        }
    }
}

impl Unmarshaler for RawCodec {
    fn unmarshal(&self, body: &[u8]) -> Result<Value, CodecError> {
        Ok(Value::String(String::from_utf8_lossy(body).into_owned()))
    }
}
