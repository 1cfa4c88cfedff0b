use std::str::FromStr;

use bytes::Bytes;

use crate::error::RingError;

/// Which value transform a ring applies on every set and get.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecKind {
    /// Pass bytes through unchanged; callers serialize themselves.
    Identity,
    /// Wrap values in a compact bincode envelope.
    #[default]
    Binary,
}

impl FromStr for CodecKind {
    type Err = RingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identity" | "plain" => Ok(CodecKind::Identity),
            "binary" | "compact-binary" => Ok(CodecKind::Binary),
            other => Err(RingError::UnknownCodec(other.to_string())),
        }
    }
}

impl CodecKind {
    pub(crate) fn build(self) -> Box<dyn ValueCodec> {
        match self {
            CodecKind::Identity => Box::new(IdentityCodec),
            CodecKind::Binary => Box::new(BinaryCodec),
        }
    }
}

/// The shapes a value may take before encoding. Every variant lowers to a
/// canonical byte representation: text as UTF-8, integers as decimal ASCII
/// (the backend's own convention for numbers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bytes(Bytes),
    Text(String),
    Int(i64),
}

impl Value {
    pub fn into_bytes(self) -> Bytes {
        match self {
            Value::Bytes(b) => b,
            Value::Text(s) => Bytes::from(s),
            Value::Int(n) => Bytes::from(n.to_string()),
        }
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(b))
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(Bytes::copy_from_slice(b))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

/// Applied to outbound values before transmission and to inbound bytes
/// after retrieval. `decode(encode(v))` returns `v`'s canonical bytes.
pub trait ValueCodec: Send + Sync {
    fn encode(&self, value: Value) -> Result<Bytes, RingError>;
    fn decode(&self, raw: Bytes) -> Result<Bytes, RingError>;
}

pub struct IdentityCodec;

impl ValueCodec for IdentityCodec {
    fn encode(&self, value: Value) -> Result<Bytes, RingError> {
        Ok(value.into_bytes())
    }

    fn decode(&self, raw: Bytes) -> Result<Bytes, RingError> {
        Ok(raw)
    }
}

pub struct BinaryCodec;

impl ValueCodec for BinaryCodec {
    fn encode(&self, value: Value) -> Result<Bytes, RingError> {
        let payload = value.into_bytes();
        let envelope = bincode::serde::encode_to_vec(
            payload.as_ref(),
            bincode::config::standard(),
        )?;
        Ok(Bytes::from(envelope))
    }

    fn decode(&self, raw: Bytes) -> Result<Bytes, RingError> {
        let (payload, read): (Vec<u8>, usize) =
            bincode::serde::decode_from_slice(
                &raw,
                bincode::config::standard(),
            )?;
        if read != raw.len() {
            return Err(RingError::TrailingBytes(raw.len() - read));
        }
        Ok(Bytes::from(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_a_no_op_both_ways() {
        let codec = IdentityCodec;
        let encoded = codec.encode(Value::from("haha")).unwrap();
        assert_eq!(encoded.as_ref(), b"haha");
        assert_eq!(codec.decode(encoded).unwrap().as_ref(), b"haha");
    }

    #[test]
    fn binary_round_trips_every_shape() {
        let codec = BinaryCodec;
        for (value, canonical) in [
            (Value::from("haha"), &b"haha"[..]),
            (Value::from(vec![0u8, 1, 2, 255]), &[0u8, 1, 2, 255][..]),
            (Value::from(42i64), &b"42"[..]),
            (Value::from(-7i64), &b"-7"[..]),
        ] {
            let encoded = codec.encode(value).unwrap();
            assert_ne!(encoded.as_ref(), canonical);
            assert_eq!(codec.decode(encoded).unwrap().as_ref(), canonical);
        }
    }

    #[test]
    fn binary_rejects_garbage() {
        let codec = BinaryCodec;
        // A length prefix pointing past the end of the buffer.
        let err = codec.decode(Bytes::from_static(&[250, 1, 2])).unwrap_err();
        assert!(matches!(err, RingError::Decode(_)));
    }

    #[test]
    fn binary_rejects_trailing_bytes() {
        let codec = BinaryCodec;
        let mut enc = codec.encode(Value::from("x")).unwrap().to_vec();
        enc.push(0);
        let err = codec.decode(Bytes::from(enc)).unwrap_err();
        assert!(matches!(err, RingError::TrailingBytes(1)));
    }

    #[test]
    fn kind_parses_the_public_names() {
        assert_eq!("identity".parse::<CodecKind>().unwrap(), CodecKind::Identity);
        assert_eq!(
            "compact-binary".parse::<CodecKind>().unwrap(),
            CodecKind::Binary
        );
        assert_eq!(CodecKind::default(), CodecKind::Binary);
        let err = "msgpack".parse::<CodecKind>().unwrap_err();
        assert!(matches!(err, RingError::UnknownCodec(_)));
    }
}
