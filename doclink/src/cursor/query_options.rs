/// Options of a query.
///
/// # Examples
///
/// ```rust,ignore
/// let options = QueryOptions::new()
///     .batch_size(100)
///     .count(true)
///     .allow_retry(true);
/// let cursor = db.query::<Document>("FOR u IN users RETURN u", None, &options)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    count: bool,
    batch_size: Option<usize>,
    ttl: Option<u64>,
    cache: Option<bool>,
    full_count: bool,
    fail_on_warning: bool,
    stream: bool,
    allow_retry: bool,
    allow_dirty_read: bool,
    stream_transaction_id: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks for the total number of results in the first batch.
    pub fn count(mut self, count: bool) -> Self {
        self.count = count;
        self
    }

    /// Maximum number of results per batch.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Idle lifetime of the server-side cursor, in seconds.
    pub fn ttl(mut self, ttl: u64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Reports the number of matches ignoring the last top-level `LIMIT`.
    pub fn full_count(mut self, full_count: bool) -> Self {
        self.full_count = full_count;
        self
    }

    pub fn fail_on_warning(mut self, fail_on_warning: bool) -> Self {
        self.fail_on_warning = fail_on_warning;
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Makes batch fetches repeatable, so a fetch that failed in transit can be
    /// re-requested.
    pub fn allow_retry(mut self, allow_retry: bool) -> Self {
        self.allow_retry = allow_retry;
        self
    }

    pub fn allow_dirty_read(mut self, allow_dirty_read: bool) -> Self {
        self.allow_dirty_read = allow_dirty_read;
        self
    }

    pub fn stream_transaction_id(mut self, id: &str) -> Self {
        self.stream_transaction_id = Some(id.to_string());
        self
    }

    pub fn is_count(&self) -> bool {
        self.count
    }

    pub fn get_batch_size(&self) -> Option<usize> {
        self.batch_size
    }

    pub fn get_ttl(&self) -> Option<u64> {
        self.ttl
    }

    pub fn get_cache(&self) -> Option<bool> {
        self.cache
    }

    pub fn is_full_count(&self) -> bool {
        self.full_count
    }

    pub fn is_fail_on_warning(&self) -> bool {
        self.fail_on_warning
    }

    pub fn is_stream(&self) -> bool {
        self.stream
    }

    pub fn is_allow_retry(&self) -> bool {
        self.allow_retry
    }

    pub fn is_allow_dirty_read(&self) -> bool {
        self.allow_dirty_read
    }

    pub fn get_stream_transaction_id(&self) -> Option<&str> {
        self.stream_transaction_id.as_deref()
    }
}
