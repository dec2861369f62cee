use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as Json;

use crate::codec::{RawBatch, RawJson};
use crate::collection::operation::{BulkEngine, BulkResult, DocumentEntity};
use crate::collection::{
    DocumentCreateOptions, DocumentDeleteOptions, DocumentReadOptions, DocumentReplaceOptions,
    DocumentUpdateOptions,
};
use crate::common::DOC_KEY;
use crate::doclink_config::DocLinkConfig;
use crate::errors::{DocLinkError, DocLinkResult, ErrorKind};

/// Document operations on one collection.
///
/// Every operation has a bulk form taking a slice and returning a [BulkResult] with
/// one slot per input, and a single-document form that returns the lone outcome
/// directly. Documents can be any serde type; [Document](crate::collection::Document)
/// works for schemaless data.
///
/// A collection handle is cheap to clone and holds no server state. Passing a
/// stream transaction id in the options runs the operation inside that
/// transaction.
///
/// # Examples
///
/// ```rust,ignore
/// use doclink::doc;
/// use doclink::collection::{DocumentCreateOptions, DocumentReadOptions};
///
/// let users = db.collection("users")?;
/// let meta = users.create_document(&doc! { "_key": "alice", name: "Alice" }, &DocumentCreateOptions::new())?;
/// let alice: Option<Document> = users.read_document("alice", &DocumentReadOptions::new())?;
/// assert_eq!(alice.unwrap().rev(), Some(meta.rev()));
/// ```
#[derive(Clone)]
pub struct DocumentCollection {
    engine: BulkEngine,
}

impl std::fmt::Debug for DocumentCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCollection")
            .field("name", &self.name())
            .finish()
    }
}

impl DocumentCollection {
    pub(crate) fn new(config: DocLinkConfig, name: &str) -> Self {
        DocumentCollection {
            engine: BulkEngine::new(config, name),
        }
    }

    /// Returns the collection name.
    pub fn name(&self) -> &str {
        self.engine.collection()
    }

    /// Creates one document.
    ///
    /// # Errors
    ///
    /// Returns the server's verdict for the document, e.g. [ErrorKind::Conflict]
    /// for a duplicate key under the default overwrite mode. Silent mode is not
    /// available for single-document calls.
    pub fn create_document<T>(
        &self,
        document: &T,
        options: &DocumentCreateOptions,
    ) -> DocLinkResult<DocumentEntity<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        ensure_not_silent(options.is_silent())?;
        single(self.engine.create(std::slice::from_ref(document), options)?)
    }

    /// Creates many documents in one request.
    pub fn create_documents<T>(
        &self,
        documents: &[T],
        options: &DocumentCreateOptions,
    ) -> DocLinkResult<BulkResult<DocumentEntity<T>>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.engine.create(documents, options)
    }

    /// Creates the documents of a pre-serialized batch.
    ///
    /// The batch is sent as is; `new` / `old` snapshots come back as raw JSON.
    pub fn create_documents_raw(
        &self,
        batch: RawBatch,
        options: &DocumentCreateOptions,
    ) -> DocLinkResult<BulkResult<DocumentEntity<RawJson>>> {
        self.engine.create_raw(batch, options)
    }

    /// Reads one document by key.
    ///
    /// Returns `None` when the document does not exist, when `if_none_match`
    /// matched the stored revision, or when `if_match` did not. Use
    /// [read_documents](Self::read_documents) to learn whether the answer came from a
    /// follower replica.
    pub fn read_document<T: DeserializeOwned>(
        &self,
        key: &str,
        options: &DocumentReadOptions,
    ) -> DocLinkResult<Option<T>> {
        self.engine.read_one(key, options)
    }

    /// Reads many documents by key; a missing key is a not-found slot.
    pub fn read_documents<T, K>(
        &self,
        keys: &[K],
        options: &DocumentReadOptions,
    ) -> DocLinkResult<BulkResult<T>>
    where
        T: DeserializeOwned,
        K: AsRef<str>,
    {
        self.engine.read(keys, options)
    }

    /// Partially updates the document with the given key.
    pub fn update_document<T>(
        &self,
        key: &str,
        document: &T,
        options: &DocumentUpdateOptions,
    ) -> DocLinkResult<DocumentEntity<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        ensure_not_silent(options.is_silent())?;
        let item = keyed_item(key, document)?;
        single(self.engine.update_items(vec![item], options)?)
    }

    /// Partially updates many documents; each must carry its `_key`.
    pub fn update_documents<T>(
        &self,
        documents: &[T],
        options: &DocumentUpdateOptions,
    ) -> DocLinkResult<BulkResult<DocumentEntity<T>>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.engine.update(documents, options)
    }

    /// Replaces the document with the given key.
    pub fn replace_document<T>(
        &self,
        key: &str,
        document: &T,
        options: &DocumentReplaceOptions,
    ) -> DocLinkResult<DocumentEntity<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        ensure_not_silent(options.is_silent())?;
        let item = keyed_item(key, document)?;
        single(self.engine.replace_items(vec![item], options)?)
    }

    /// Replaces many documents; each must carry its `_key`.
    pub fn replace_documents<T>(
        &self,
        documents: &[T],
        options: &DocumentReplaceOptions,
    ) -> DocLinkResult<BulkResult<DocumentEntity<T>>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.engine.replace(documents, options)
    }

    /// Deletes the document with the given key.
    pub fn delete_document<T: DeserializeOwned>(
        &self,
        key: &str,
        options: &DocumentDeleteOptions,
    ) -> DocLinkResult<DocumentEntity<T>> {
        ensure_not_silent(options.is_silent())?;
        single(self.engine.delete(&[key], options)?)
    }

    /// Deletes many documents by key.
    pub fn delete_documents<T, K>(
        &self,
        keys: &[K],
        options: &DocumentDeleteOptions,
    ) -> DocLinkResult<BulkResult<DocumentEntity<T>>>
    where
        T: DeserializeOwned,
        K: AsRef<str>,
    {
        self.engine.delete(keys, options)
    }
}

fn ensure_not_silent(silent: bool) -> DocLinkResult<()> {
    if silent {
        log::error!("Silent mode requested for a single document operation");
        return Err(DocLinkError::new(
            "Silent mode is only supported for bulk operations",
            ErrorKind::InvalidOperation,
        ));
    }
    Ok(())
}

fn single<S>(result: BulkResult<S>) -> DocLinkResult<S> {
    match result.into_single() {
        Some(item) => item.into_result(),
        None => {
            log::error!("Server returned no result for a single document operation");
            Err(DocLinkError::new(
                "No result for single document operation",
                ErrorKind::InternalError,
            ))
        }
    }
}

fn keyed_item<T: Serialize>(key: &str, document: &T) -> DocLinkResult<Json> {
    match serde_json::to_value(document)? {
        Json::Object(mut object) => {
            object.insert(DOC_KEY.to_string(), Json::from(key));
            Ok(Json::Object(object))
        }
        other => {
            log::error!("Document for key {} is not an object: {}", key, other);
            Err(DocLinkError::new(
                "Document must serialize to an object",
                ErrorKind::Invalid,
            ))
        }
    }
}
