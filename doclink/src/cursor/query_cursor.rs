use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value as Json;

use crate::collection::Document;
use crate::common::{
    HEADER_ALLOW_DIRTY_READ, HEADER_POTENTIAL_DIRTY_READ, HEADER_TRANSACTION_ID, PATH_API_CURSOR,
};
use crate::cursor::{
    CursorEntity, CursorRequest, CursorRequestOptions, CursorStats, CursorWarning, QueryOptions,
};
use crate::doclink_config::DocLinkConfig;
use crate::errors::{DocLinkError, DocLinkResult, ErrorKind};
use crate::transport::{Method, Request};

/// Lifecycle of a [Cursor].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// The first batch is buffered and nothing has been consumed yet.
    Created,
    /// At least one element has been consumed and more may follow.
    Buffered,
    /// Every element has been delivered.
    Exhausted,
    /// Closed before exhaustion, or after a failed fetch.
    Closed,
}

impl Display for CursorState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CursorState::Created => write!(f, "created"),
            CursorState::Buffered => write!(f, "buffered"),
            CursorState::Exhausted => write!(f, "exhausted"),
            CursorState::Closed => write!(f, "closed"),
        }
    }
}

/// Query metadata, fixed once the first batch has arrived.
#[derive(Debug, Clone, Default, PartialEq)]
struct CursorMetadata {
    count: Option<u64>,
    potential_dirty_read: bool,
    stats: Option<CursorStats>,
    warnings: Vec<CursorWarning>,
    cached: bool,
}

/// Lazily paginated query result.
///
/// The cursor buffers one batch at a time. [advance](Cursor::advance) hands out the
/// buffered elements and fetches the next batch from the server-side cursor when
/// the buffer runs dry. Elements are decoded into `T` as they are handed out.
///
/// When the query was opened with `allow_retry`, every fetch names the batch it
/// wants, and a fetch that failed with a transient error is re-requested, up to the
/// configured retry budget. The server answers a repeated request for the same
/// batch with the same elements, so no element is skipped or duplicated. Without
/// `allow_retry` a fetch is never repeated.
///
/// A cursor that is dropped before exhaustion releases its server-side resource;
/// failures while doing so are logged and ignored because the server expires idle
/// cursors on its own.
///
/// # Examples
///
/// ```rust,ignore
/// let mut cursor = db.query::<Document>("FOR u IN users RETURN u", None, &QueryOptions::new().batch_size(2))?;
/// while let Some(user) = cursor.advance()? {
///     println!("{}", user);
/// }
/// ```
pub struct Cursor<T> {
    config: DocLinkConfig,
    id: Option<String>,
    buffer: VecDeque<Json>,
    has_more: bool,
    state: CursorState,
    allow_retry: bool,
    allow_dirty_read: bool,
    stream_transaction_id: Option<String>,
    last_batch_id: Option<String>,
    next_batch_id: Option<String>,
    metadata: CursorMetadata,
    _marker: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for Cursor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish()
    }
}

/// Runs a query and opens a cursor over its first batch.
pub(crate) fn open_cursor<T>(
    config: &DocLinkConfig,
    query: &str,
    bind_vars: Option<Document>,
    options: &QueryOptions,
) -> DocLinkResult<Cursor<T>> {
    let body = CursorRequest {
        query: query.to_string(),
        bind_vars,
        count: options.is_count(),
        batch_size: options.get_batch_size(),
        ttl: options.get_ttl(),
        cache: options.get_cache(),
        options: CursorRequestOptions {
            full_count: options.is_full_count(),
            fail_on_warning: options.is_fail_on_warning(),
            stream: options.is_stream(),
            allow_retry: options.is_allow_retry(),
        },
    };

    let codec = config.codec();
    let request = batch_request(
        config.request(Method::Post, PATH_API_CURSOR),
        options.get_stream_transaction_id(),
        options.is_allow_dirty_read(),
    )
    .with_body(codec.encode(&body)?);

    let response = config.execute(request)?;
    let potential_dirty_read = response.header_flag(HEADER_POTENTIAL_DIRTY_READ);
    let entity: CursorEntity = codec.decode(response.body())?;
    log::debug!(
        "Opened cursor {:?} with {} elements, more: {}",
        entity.id,
        entity.result.len(),
        entity.has_more
    );
    Ok(Cursor::new(config.clone(), entity, potential_dirty_read, options))
}

fn batch_request(request: Request, stream_transaction_id: Option<&str>, allow_dirty_read: bool) -> Request {
    let request = request.with_optional_header(HEADER_TRANSACTION_ID, stream_transaction_id);
    if allow_dirty_read {
        request.with_header(HEADER_ALLOW_DIRTY_READ, "true")
    } else {
        request
    }
}

impl<T> Cursor<T> {
    fn new(config: DocLinkConfig, entity: CursorEntity, potential_dirty_read: bool, options: &QueryOptions) -> Self {
        let extra = entity.extra.unwrap_or_default();
        let metadata = CursorMetadata {
            count: entity.count,
            potential_dirty_read,
            stats: Some(extra.stats),
            warnings: extra.warnings,
            cached: entity.cached,
        };

        let mut cursor = Cursor {
            config,
            id: entity.id,
            buffer: entity.result.into(),
            has_more: entity.has_more,
            state: CursorState::Created,
            allow_retry: options.is_allow_retry(),
            allow_dirty_read: options.is_allow_dirty_read(),
            stream_transaction_id: options.get_stream_transaction_id().map(str::to_string),
            last_batch_id: None,
            next_batch_id: entity.next_batch_id,
            metadata,
            _marker: PhantomData,
        };
        if cursor.buffer.is_empty() && !cursor.has_more {
            cursor.finish();
        }
        cursor
    }

    /// The server-side cursor id; absent when the whole result fit one batch or the
    /// cursor has been released.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Id of the batch currently buffered, for retry-capable cursors past their
    /// first batch.
    pub fn last_batch_id(&self) -> Option<&str> {
        self.last_batch_id.as_deref()
    }

    /// Total number of results, when `count` was requested.
    pub fn count(&self) -> Option<u64> {
        self.metadata.count
    }

    /// Whether the server signalled that results may come from a follower replica.
    pub fn is_potential_dirty_read(&self) -> bool {
        self.metadata.potential_dirty_read
    }

    pub fn stats(&self) -> Option<&CursorStats> {
        self.metadata.stats.as_ref()
    }

    pub fn warnings(&self) -> &[CursorWarning] {
        &self.metadata.warnings
    }

    /// Whether the result was served from the query results cache.
    pub fn is_cached(&self) -> bool {
        self.metadata.cached
    }

    /// Whether another element is available, buffered or on the server.
    pub fn has_next(&self) -> bool {
        matches!(self.state, CursorState::Created | CursorState::Buffered)
            && (!self.buffer.is_empty() || self.has_more)
    }

    /// Releases the server-side cursor.
    ///
    /// Closing is best-effort: a failure is logged and ignored. Closing a closed or
    /// exhausted cursor does nothing on the server.
    pub fn close(&mut self) {
        if self.state == CursorState::Closed {
            return;
        }
        self.state = CursorState::Closed;
        self.buffer.clear();
        if let Some(id) = self.id.take() {
            if self.has_more || self.allow_retry {
                self.release(&id);
            }
        }
        self.has_more = false;
    }

    fn finish(&mut self) {
        self.state = CursorState::Exhausted;
        if let Some(id) = self.id.take() {
            // the server keeps retry-capable cursors until deleted or expired
            if self.allow_retry {
                self.release(&id);
            }
        }
    }

    fn release(&self, id: &str) {
        let path = format!("{}/{}", PATH_API_CURSOR, id);
        let request = batch_request(
            self.config.request(Method::Delete, &path),
            self.stream_transaction_id.as_deref(),
            false,
        );
        match self.config.execute(request) {
            Ok(_) => log::debug!("Released cursor {}", id),
            Err(err) => log::warn!("Failed to release cursor {}: {}", id, err),
        }
    }

    fn fetch_next(&mut self) -> DocLinkResult<()> {
        let id = match &self.id {
            Some(id) => id.clone(),
            None => {
                log::error!("Cursor reports more results but has no id");
                return Err(DocLinkError::new(
                    "Cursor reports more results but has no id",
                    ErrorKind::InternalError,
                ));
            }
        };

        let path = if self.allow_retry {
            match &self.next_batch_id {
                Some(batch_id) => format!("{}/{}/{}", PATH_API_CURSOR, id, batch_id),
                None => {
                    log::error!("Retry-capable cursor {} has no next batch id", id);
                    return Err(DocLinkError::new(
                        "Retry-capable cursor has no next batch id",
                        ErrorKind::InternalError,
                    ));
                }
            }
        } else {
            format!("{}/{}", PATH_API_CURSOR, id)
        };

        let budget = if self.allow_retry {
            self.config.cursor_retry_budget()
        } else {
            0
        };

        let mut retries = 0;
        loop {
            log::debug!("Fetching batch {}", path);
            match self.request_batch(&path) {
                Ok(entity) => {
                    self.accept(entity);
                    return Ok(());
                }
                Err(err) if self.allow_retry && err.is_transient() => {
                    if retries >= budget {
                        log::error!("Giving up on {} after {} retries: {}", path, retries, err);
                        let kind = err.kind().clone();
                        return Err(DocLinkError::new_with_cause(
                            &format!("Cursor batch fetch failed after {} retries", retries),
                            kind,
                            err,
                        ));
                    }
                    retries += 1;
                    log::warn!("Retrying {} ({} of {}) after: {}", path, retries, budget, err);
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn request_batch(&self, path: &str) -> DocLinkResult<CursorEntity> {
        let request = batch_request(
            self.config.request(Method::Post, path),
            self.stream_transaction_id.as_deref(),
            self.allow_dirty_read,
        );
        let response = self.config.execute(request)?;
        self.config.codec().decode(response.body())
    }

    fn accept(&mut self, entity: CursorEntity) {
        self.buffer = entity.result.into();
        self.has_more = entity.has_more;
        self.last_batch_id = self.next_batch_id.take();
        self.next_batch_id = entity.next_batch_id;
        if entity.id.is_some() {
            self.id = entity.id;
        }
    }
}

impl<T: DeserializeOwned> Cursor<T> {
    /// Returns the next element, fetching the next batch when the buffer is empty.
    ///
    /// Returns `Ok(None)` once every element has been delivered.
    ///
    /// # Errors
    ///
    /// A failed fetch closes the cursor and returns the error; when retries were
    /// allowed and exhausted, the last transient error is the cause. Advancing a
    /// closed cursor is an [ErrorKind::InvalidOperation]. An element that does not
    /// decode as `T` is returned as an error without closing the cursor.
    pub fn advance(&mut self) -> DocLinkResult<Option<T>> {
        match self.state {
            CursorState::Closed => {
                log::error!("Cannot advance a closed cursor");
                return Err(DocLinkError::new(
                    "Cursor is closed",
                    ErrorKind::InvalidOperation,
                ));
            }
            CursorState::Exhausted => return Ok(None),
            CursorState::Created | CursorState::Buffered => {}
        }

        loop {
            if let Some(element) = self.buffer.pop_front() {
                self.state = CursorState::Buffered;
                if self.buffer.is_empty() && !self.has_more {
                    self.finish();
                }
                return Ok(Some(serde_json::from_value(element)?));
            }

            if !self.has_more {
                self.finish();
                return Ok(None);
            }

            if let Err(err) = self.fetch_next() {
                self.close();
                return Err(err);
            }
        }
    }

    /// Drains the cursor into a vector.
    pub fn collect_remaining(&mut self) -> DocLinkResult<Vec<T>> {
        let mut elements = Vec::new();
        while let Some(element) = self.advance()? {
            elements.push(element);
        }
        Ok(elements)
    }
}

impl<T: DeserializeOwned> Iterator for Cursor<T> {
    type Item = DocLinkResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == CursorState::Closed {
            return None;
        }
        self.advance().transpose()
    }
}

impl<T> Drop for Cursor<T> {
    fn drop(&mut self) {
        self.close();
    }
}
