//! Document codec boundary.
//!
//! Bodies travel as bytes. A [DocumentCodecProvider] turns a `serde_json::Value`
//! tree into bytes and back; conversion between the tree and the caller's own types
//! happens at the call site through serde. [RawBatch] and [RawJson] bypass typed
//! conversion for callers that already hold serialized payloads.

use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{DocLinkError, DocLinkResult, ErrorKind};

/// Serializes and deserializes request and response bodies.
pub trait DocumentCodecProvider: Send + Sync {
    fn serialize(&self, value: &serde_json::Value) -> DocLinkResult<Vec<u8>>;

    fn deserialize(&self, bytes: &[u8]) -> DocLinkResult<serde_json::Value>;

    /// Content type announced for encoded bodies.
    fn content_type(&self) -> &str;
}

/// Shared handle to a [DocumentCodecProvider].
#[derive(Clone)]
pub struct DocumentCodec {
    inner: Arc<dyn DocumentCodecProvider>,
}

impl Default for DocumentCodec {
    fn default() -> Self {
        DocumentCodec::new(JsonCodec)
    }
}

impl DocumentCodec {
    pub fn new<T: DocumentCodecProvider + 'static>(inner: T) -> Self {
        DocumentCodec { inner: Arc::new(inner) }
    }

    /// Encodes any serializable value.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> DocLinkResult<Vec<u8>> {
        let tree = serde_json::to_value(value)?;
        self.inner.serialize(&tree)
    }

    /// Decodes bytes into any deserializable type.
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> DocLinkResult<T> {
        let tree = self.inner.deserialize(bytes)?;
        Ok(serde_json::from_value(tree)?)
    }
}

impl Deref for DocumentCodec {
    type Target = Arc<dyn DocumentCodecProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// JSON codec over `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl DocumentCodecProvider for JsonCodec {
    fn serialize(&self, value: &serde_json::Value) -> DocLinkResult<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn deserialize(&self, bytes: &[u8]) -> DocLinkResult<serde_json::Value> {
        if bytes.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    fn content_type(&self) -> &str {
        "application/json"
    }
}

/// A pre-serialized batch of documents, sent as the request body unchanged.
///
/// The batch must encode an array; its length is the number of inputs the bulk
/// result is checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBatch(Vec<u8>);

impl RawBatch {
    pub fn new(bytes: Vec<u8>) -> Self {
        RawBatch(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Counts the documents of the batch.
    pub(crate) fn count(&self, codec: &DocumentCodec) -> DocLinkResult<usize> {
        match codec.deserialize(&self.0)? {
            serde_json::Value::Array(items) => Ok(items.len()),
            _ => {
                log::error!("Raw batch does not encode an array");
                Err(DocLinkError::new(
                    "Raw batch does not encode an array",
                    ErrorKind::Invalid,
                ))
            }
        }
    }
}

impl From<String> for RawBatch {
    fn from(value: String) -> Self {
        RawBatch(value.into_bytes())
    }
}

impl From<&str> for RawBatch {
    fn from(value: &str) -> Self {
        RawBatch(value.as_bytes().to_vec())
    }
}

/// A document or value kept as its JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawJson(String);

impl RawJson {
    pub fn new(json: &str) -> Self {
        RawJson(json.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RawJson {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for RawJson {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value: serde_json::Value =
            serde_json::from_str(&self.0).map_err(serde::ser::Error::custom)?;
        value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(RawJson(value.to_string()))
    }
}
