use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as Json;

use crate::codec::{RawBatch, RawJson};
use crate::collection::operation::{BulkItem, BulkResult, DocumentEntity};
use crate::collection::{
    DocumentCreateOptions, DocumentDeleteOptions, DocumentReadOptions, DocumentReplaceOptions,
    DocumentUpdateOptions,
};
use crate::common::{
    ATTR_ERROR, ATTR_ERROR_MESSAGE, ATTR_ERROR_NUM, DOC_KEY, DOC_REV, HEADER_IF_MATCH,
    HEADER_IF_NONE_MATCH, HEADER_POTENTIAL_DIRTY_READ, PARAM_IGNORE_REVS, PARAM_ONLY_GET,
    PATH_API_DOCUMENT,
};
use crate::doclink_config::DocLinkConfig;
use crate::errors::{error_codes, DocLinkError, DocLinkResult, ErrorKind};
use crate::policy::validate_key;
use crate::transport::{Method, Request};

/// Executes N-ary document operations against one collection.
///
/// Every call is one request carrying all inputs; the response holds one slot per
/// input, either the success payload or an error object. Slots are decoded
/// independently so one bad slot never hides its siblings. Single-document writes
/// are the same calls with one input.
#[derive(Clone)]
pub(crate) struct BulkEngine {
    config: DocLinkConfig,
    collection: String,
}

impl BulkEngine {
    pub(crate) fn new(config: DocLinkConfig, collection: &str) -> Self {
        BulkEngine {
            config,
            collection: collection.to_string(),
        }
    }

    pub(crate) fn collection(&self) -> &str {
        &self.collection
    }

    fn path(&self) -> String {
        format!("{}/{}", PATH_API_DOCUMENT, self.collection)
    }

    pub(crate) fn create<T>(
        &self,
        documents: &[T],
        options: &DocumentCreateOptions,
    ) -> DocLinkResult<BulkResult<DocumentEntity<T>>>
    where
        T: Serialize + DeserializeOwned,
    {
        let items = to_json_items(documents)?;
        if items.is_empty() {
            return Ok(empty_result(options.is_silent()));
        }

        let expected = items.len();
        let body = self.config.codec().serialize(&Json::Array(items))?;
        let request = options.apply(self.config.request(Method::Post, &self.path()).with_body(body));
        self.execute(request, expected, options.is_silent())
    }

    pub(crate) fn create_raw(
        &self,
        batch: RawBatch,
        options: &DocumentCreateOptions,
    ) -> DocLinkResult<BulkResult<DocumentEntity<RawJson>>> {
        let expected = batch.count(&self.config.codec())?;
        if expected == 0 {
            return Ok(empty_result(options.is_silent()));
        }

        let request = options.apply(
            self.config
                .request(Method::Post, &self.path())
                .with_body(batch.into_bytes()),
        );
        self.execute(request, expected, options.is_silent())
    }

    /// Reads one document through the direct document endpoint.
    ///
    /// Not found, not modified (`if_none_match` matched) and precondition failed
    /// (`if_match` did not match) all yield `None`. A missing collection is still an
    /// error, and so is a malformed key, which is checked before it becomes part of
    /// the path.
    pub(crate) fn read_one<T: DeserializeOwned>(
        &self,
        key: &str,
        options: &DocumentReadOptions,
    ) -> DocLinkResult<Option<T>> {
        validate_key(key)?;
        let path = format!("{}/{}", self.path(), key);
        let request = self
            .config
            .request(Method::Get, &path)
            .with_optional_header(HEADER_IF_MATCH, options.get_if_match())
            .with_optional_header(HEADER_IF_NONE_MATCH, options.get_if_none_match());
        let response = self.config.send(options.apply(request))?;

        match response.status() {
            304 | 412 => Ok(None),
            404 => {
                let err = response.to_error();
                if err.error_num() == Some(error_codes::DATA_SOURCE_NOT_FOUND) {
                    Err(err)
                } else {
                    Ok(None)
                }
            }
            _ if response.is_success() => Ok(Some(self.config.codec().decode(response.body())?)),
            _ => Err(response.to_error()),
        }
    }

    pub(crate) fn read<T, K>(
        &self,
        keys: &[K],
        options: &DocumentReadOptions,
    ) -> DocLinkResult<BulkResult<T>>
    where
        T: DeserializeOwned,
        K: AsRef<str>,
    {
        if keys.is_empty() {
            return Ok(BulkResult::default());
        }

        let selectors = keys.iter().map(|key| Json::from(key.as_ref())).collect();
        let body = self.config.codec().serialize(&Json::Array(selectors))?;
        let request = self
            .config
            .request(Method::Put, &self.path())
            .with_query(PARAM_ONLY_GET, true)
            .with_query(PARAM_IGNORE_REVS, options.is_ignore_revs())
            .with_body(body);
        self.execute(options.apply(request), keys.len(), false)
    }

    pub(crate) fn update<T>(
        &self,
        documents: &[T],
        options: &DocumentUpdateOptions,
    ) -> DocLinkResult<BulkResult<DocumentEntity<T>>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.update_items(to_json_items(documents)?, options)
    }

    pub(crate) fn update_items<S: DeserializeOwned>(
        &self,
        items: Vec<Json>,
        options: &DocumentUpdateOptions,
    ) -> DocLinkResult<BulkResult<S>> {
        let tags = SingleDocumentTags {
            if_match: options.get_if_match(),
            if_none_match: options.get_if_none_match(),
        };
        self.modify(Method::Patch, items, tags, options.is_silent(), |request| {
            options.apply(request)
        })
    }

    pub(crate) fn replace<T>(
        &self,
        documents: &[T],
        options: &DocumentReplaceOptions,
    ) -> DocLinkResult<BulkResult<DocumentEntity<T>>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.replace_items(to_json_items(documents)?, options)
    }

    pub(crate) fn replace_items<S: DeserializeOwned>(
        &self,
        items: Vec<Json>,
        options: &DocumentReplaceOptions,
    ) -> DocLinkResult<BulkResult<S>> {
        let tags = SingleDocumentTags {
            if_match: options.get_if_match(),
            if_none_match: options.get_if_none_match(),
        };
        self.modify(Method::Put, items, tags, options.is_silent(), |request| {
            options.apply(request)
        })
    }

    pub(crate) fn delete<T, K>(
        &self,
        keys: &[K],
        options: &DocumentDeleteOptions,
    ) -> DocLinkResult<BulkResult<DocumentEntity<T>>>
    where
        T: DeserializeOwned,
        K: AsRef<str>,
    {
        let selectors = keys
            .iter()
            .map(|key| {
                let mut selector = serde_json::Map::new();
                selector.insert(DOC_KEY.to_string(), Json::from(key.as_ref()));
                Json::Object(selector)
            })
            .collect();
        let tags = SingleDocumentTags {
            if_match: options.get_if_match(),
            if_none_match: options.get_if_none_match(),
        };
        self.modify(Method::Delete, selectors, tags, options.is_silent(), |request| {
            options.apply(request)
        })
    }

    /// Shared path of update, replace and delete.
    ///
    /// `if_match` and `if_none_match` tags are only meaningful for a single
    /// document. An `if_match` tag is stamped as the `_rev` of that document,
    /// `if_none_match` travels as a header, and the options switch revision checks on.
    fn modify<S, F>(
        &self,
        method: Method,
        mut items: Vec<Json>,
        tags: SingleDocumentTags<'_>,
        silent: bool,
        apply: F,
    ) -> DocLinkResult<BulkResult<S>>
    where
        S: DeserializeOwned,
        F: FnOnce(Request) -> Request,
    {
        if tags.is_present() && items.len() > 1 {
            log::error!(
                "Revision tag given for {} documents of collection {}",
                items.len(),
                self.collection
            );
            return Err(DocLinkError::new(
                "if_match and if_none_match are only valid for single document operations",
                ErrorKind::Invalid,
            ));
        }

        if let Some(rev) = tags.if_match {
            for item in items.iter_mut() {
                if let Json::Object(object) = item {
                    object.insert(DOC_REV.to_string(), Json::from(rev));
                }
            }
        }

        if items.is_empty() {
            return Ok(empty_result(silent));
        }

        let expected = items.len();
        let body = self.config.codec().serialize(&Json::Array(items))?;
        let request = apply(self.config.request(method, &self.path()).with_body(body));
        self.execute(request, expected, silent)
    }

    fn execute<S: DeserializeOwned>(
        &self,
        request: Request,
        expected: usize,
        silent: bool,
    ) -> DocLinkResult<BulkResult<S>> {
        let response = self.config.send(request)?;
        if !response.is_success() {
            return Err(response.to_error());
        }

        let potential_dirty_read = response.header_flag(HEADER_POTENTIAL_DIRTY_READ);
        if silent {
            return Ok(BulkResult::silent(potential_dirty_read));
        }

        let items = match self.config.codec().deserialize(response.body())? {
            Json::Array(items) => items,
            other => {
                log::error!("Expected an array from bulk call, found {}", other);
                return Err(DocLinkError::new(
                    "Bulk response is not an array",
                    ErrorKind::EncodingError,
                ));
            }
        };

        if items.len() != expected {
            log::error!(
                "Bulk response has {} items for {} inputs on collection {}",
                items.len(),
                expected,
                self.collection
            );
            return Err(DocLinkError::new(
                &format!("Bulk response has {} items, expected {}", items.len(), expected),
                ErrorKind::ServerError,
            ));
        }

        let items = items.into_iter().map(decode_item).collect();
        Ok(BulkResult::new(items, potential_dirty_read))
    }
}

/// Revision tags that restrict a write to a single document.
struct SingleDocumentTags<'a> {
    if_match: Option<&'a str>,
    if_none_match: Option<&'a str>,
}

impl SingleDocumentTags<'_> {
    fn is_present(&self) -> bool {
        self.if_match.is_some() || self.if_none_match.is_some()
    }
}

fn to_json_items<T: Serialize>(documents: &[T]) -> DocLinkResult<Vec<Json>> {
    documents
        .iter()
        .map(|document| serde_json::to_value(document).map_err(DocLinkError::from))
        .collect()
}

fn empty_result<S>(silent: bool) -> BulkResult<S> {
    if silent {
        BulkResult::silent(false)
    } else {
        BulkResult::default()
    }
}

fn decode_item<S: DeserializeOwned>(item: Json) -> BulkItem<S> {
    if let Some(err) = item_error(&item) {
        return BulkItem::Error(err);
    }
    BulkItem::from(serde_json::from_value(item).map_err(DocLinkError::from))
}

/// Reads an error slot: `{"error": true, "errorNum": 1210, "errorMessage": "..."}`.
///
/// A slot is an error only when it carries both the flag and a number, so a stored
/// document that happens to have an `error` attribute still decodes as a document.
fn item_error(item: &Json) -> Option<DocLinkError> {
    let object = item.as_object()?;
    if object.get(ATTR_ERROR).and_then(Json::as_bool) != Some(true) {
        return None;
    }

    let error_num = object.get(ATTR_ERROR_NUM).and_then(Json::as_u64)? as u32;
    let message = object
        .get(ATTR_ERROR_MESSAGE)
        .and_then(Json::as_str)
        .unwrap_or("unknown error");
    Some(DocLinkError::server(
        error_codes::http_status_for(error_num),
        Some(error_num),
        message,
    ))
}
