use crate::error::RpcError;
use bytes::{BufMut, Bytes, BytesMut};
use serde_json::Value;

/// Current serialization format version. Bumped when the body encoding
/// changes; a decoder rejects blobs written by a different version.
pub const CODEC_VERSION: u8 = 1;

const BLOB_MAGIC: u8 = 0xCB;
const HEADER_LEN: usize = 2;

/// Versioned structured-value codec.
///
/// Blobs carry a two-byte header (magic, version) followed by the encoded
/// body. The codec is opaque to the rest of the bridge: callers only move
/// `Bytes` around and never look inside.
#[derive(Debug, Clone, Copy)]
pub struct ValueCodec {
    version: u8,
}

impl ValueCodec {
    pub fn new() -> Self {
        ValueCodec {
            version: CODEC_VERSION,
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn serialize(&self, value: &Value) -> Result<Bytes, RpcError> {
        let body = serde_json::to_vec(value)
            .map_err(|e| RpcError::internal(format!("value serialization failed: {}", e)))?;
        let mut buf = BytesMut::with_capacity(HEADER_LEN + body.len());
        buf.put_u8(BLOB_MAGIC);
        buf.put_u8(self.version);
        buf.put_slice(&body);
        Ok(buf.freeze())
    }

    pub fn deserialize(&self, blob: &[u8]) -> Result<Value, RpcError> {
        if blob.len() < HEADER_LEN {
            return Err(RpcError::malformed_arguments(
                "serialized value is truncated: missing codec header",
            ));
        }
        if blob[0] != BLOB_MAGIC {
            return Err(RpcError::malformed_arguments(
                "serialized value has an unrecognized header",
            ));
        }
        if blob[1] != self.version {
            return Err(RpcError::malformed_arguments(format!(
                "serialized value has codec version {}, expected {}",
                blob[1], self.version
            )));
        }
        let value = serde_json::from_slice(&blob[HEADER_LEN..]).map_err(|e| {
            RpcError::malformed_arguments(format!("value deserialization failed: {}", e))
        })?;
        Ok(value)
    }
}

impl Default for ValueCodec {
    fn default() -> Self {
        Self::new()
    }
}
