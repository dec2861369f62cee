use im::OrdMap;
use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::common::{Value, DOC_ID, DOC_KEY, DOC_REV, SYSTEM_ATTRIBUTES};
use crate::errors::{DocLinkError, DocLinkResult, ErrorKind};
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};

/// A schemaless document: a map from attribute name to [Value].
///
/// Three attributes are reserved and managed by the server:
///
/// * `_key` - unique within its collection, immutable after creation.
/// * `_id` - the document handle, `"<collection>/<key>"`.
/// * `_rev` - opaque revision tag, replaced on every successful mutation.
///
/// A document sent to the server may carry `_key` (to choose the key) and `_rev`
/// (as an expected revision when revisions are checked); `_id` is ignored on input.
///
/// The map is a persistent ordered map, so cloning a document is O(1) and a
/// mutation never affects earlier clones.
#[derive(Clone, PartialEq, Default)]
pub struct Document {
    data: OrdMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: OrdMap::new(),
        }
    }

    /// Converts any serializable value into a document.
    ///
    /// # Errors
    ///
    /// Returns an [ErrorKind::EncodingError] if the value does not serialize to an
    /// object.
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> DocLinkResult<Document> {
        match serde_json::to_value(value)? {
            serde_json::Value::Object(map) => Ok(Document::from(map)),
            other => {
                log::error!("Expected an object, found {}", other);
                Err(DocLinkError::new(
                    "Value does not serialize to a document",
                    ErrorKind::EncodingError,
                ))
            }
        }
    }

    /// Converts the document into any deserializable type.
    pub fn to_typed<T: DeserializeOwned>(&self) -> DocLinkResult<T> {
        let json = serde_json::Value::Object(self.clone().into());
        Ok(serde_json::from_value(json)?)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of top level attributes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates the specified [Value] with the specified attribute name.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The key is empty
    /// * The key is a system attribute and the value is not a string
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let mut doc = Document::new();
    /// doc.put("name", "Alice")?;
    /// doc.put("_key", "alice")?;
    /// assert_eq!(doc.key(), Some("alice"));
    /// ```
    pub fn put<'a, T: Into<Value>>(&mut self, key: impl Into<Cow<'a, str>>, value: T) -> DocLinkResult<()> {
        let key = key.into();
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(DocLinkError::new(
                "Document does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }

        let value = value.into();
        if SYSTEM_ATTRIBUTES.contains(&key.as_ref()) && value.as_string().is_none() {
            log::error!("System attribute {} must be a string, found {}", key, value.type_name());
            return Err(DocLinkError::new(
                &format!("System attribute {} must be a string", key),
                ErrorKind::Invalid,
            ));
        }

        self.data.insert(key.into_owned(), value);
        Ok(())
    }

    /// Inserts without validation. Used when decoding payloads the server produced.
    pub(crate) fn insert_unchecked(&mut self, key: String, value: Value) {
        self.data.insert(key, value);
    }

    /// Returns the value of a top level attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns the value at a nested path, e.g. `["address", "city"]`.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let value = self.data.get(*first)?;
        if rest.is_empty() {
            Some(value)
        } else {
            value.as_document()?.get_path(rest)
        }
    }

    /// Checks if a top level attribute exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Removes an attribute, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// The document key, if present.
    pub fn key(&self) -> Option<&str> {
        self.string_attribute(DOC_KEY)
    }

    /// The document handle (`collection/key`), if present.
    pub fn id(&self) -> Option<&str> {
        self.string_attribute(DOC_ID)
    }

    /// The revision tag, if present.
    pub fn rev(&self) -> Option<&str> {
        self.string_attribute(DOC_REV)
    }

    fn string_attribute(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(|v| v.as_string()).map(String::as_str)
    }

    /// Stamps the system attributes the server assigns after a write.
    pub(crate) fn set_system_attributes(&mut self, key: &str, id: &str, rev: &str) {
        self.data.insert(DOC_KEY.to_string(), Value::from(key));
        self.data.insert(DOC_ID.to_string(), Value::from(id));
        self.data.insert(DOC_REV.to_string(), Value::from(rev));
    }

    /// Returns a copy without `_key`, `_id` and `_rev`.
    pub fn without_system_attributes(&self) -> Document {
        let mut data = self.data.clone();
        for attribute in SYSTEM_ATTRIBUTES {
            data.remove(attribute);
        }
        Document { data }
    }

    /// Iterates over attribute names in order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Iterates over attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Document {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        let mut document = Document::new();
        for (key, value) in map {
            document.insert_unchecked(key, Value::from(value));
        }
        document
    }
}

impl From<Document> for serde_json::Map<String, serde_json::Value> {
    fn from(document: Document) -> Self {
        document
            .data
            .into_iter()
            .map(|(key, value)| (key, serde_json::Value::from(value)))
            .collect()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.data.len()))?;
        for (key, value) in self.data.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a document")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Document, A::Error> {
        let mut document = Document::new();
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            document.insert_unchecked(key, value);
        }
        Ok(document)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(DocumentVisitor)
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.data.iter()).finish()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", serde_json::Value::Object(self.clone().into()))
    }
}

pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// # Examples
///
/// ```rust
/// use doclink::doc;
///
/// let empty = doc!{};
///
/// let base = 100;
/// let user = doc!{
///     "_key": "alice",
///     name: "Alice",
///     score: (base * 2),
///     address: {
///         city: "Berlin",
///     },
///     tags: ["a", "b"],
/// };
/// assert_eq!(user.key(), Some("alice"));
/// ```
#[macro_export]
macro_rules! doc {
    // match an empty document (with braces for backward compat)
    ({}) => {
        $crate::collection::Document::new()
    };

    // match an empty document
    () => {
        $crate::collection::Document::new()
    };

    // match a document with key value pairs (outer braces)
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    // match a document with key value pairs
    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $(
                doc.put($crate::collection::normalize(stringify!($key)), $crate::doc_value!($value))
                .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro to convert values for the doc! macro.
#[macro_export]
macro_rules! doc_value {
    // match a nested document
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        {
            $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
        }
    };

    // match an array of values
    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    // match an expression (variable, function call, arithmetic in parens, literals, etc.)
    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
