use serde::{Deserialize, Serialize};

/// Options of a stream transaction.
///
/// Collections are declared by access: `read`, `write` (shared write lock) and
/// `exclusive`. With `allow_implicit` (the default) the transaction may also read
/// collections it did not declare.
///
/// # Examples
///
/// ```rust,ignore
/// let options = StreamTransactionOptions::new()
///     .write_collections(&["orders"])
///     .read_collections(&["users"])
///     .allow_implicit(false)
///     .lock_timeout(5);
/// let tx = db.begin_stream_transaction(&options)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTransactionOptions {
    read: Vec<String>,
    write: Vec<String>,
    exclusive: Vec<String>,
    allow_implicit: bool,
    wait_for_sync: bool,
    lock_timeout: Option<u64>,
    max_transaction_size: Option<u64>,
}

impl Default for StreamTransactionOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamTransactionOptions {
    pub fn new() -> Self {
        StreamTransactionOptions {
            read: Vec::new(),
            write: Vec::new(),
            exclusive: Vec::new(),
            allow_implicit: true,
            wait_for_sync: false,
            lock_timeout: None,
            max_transaction_size: None,
        }
    }

    pub fn read_collections<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.read.extend(names.iter().map(|n| n.as_ref().to_string()));
        self
    }

    pub fn write_collections<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.write.extend(names.iter().map(|n| n.as_ref().to_string()));
        self
    }

    pub fn exclusive_collections<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.exclusive.extend(names.iter().map(|n| n.as_ref().to_string()));
        self
    }

    pub fn allow_implicit(mut self, allow_implicit: bool) -> Self {
        self.allow_implicit = allow_implicit;
        self
    }

    pub fn wait_for_sync(mut self, wait_for_sync: bool) -> Self {
        self.wait_for_sync = wait_for_sync;
        self
    }

    /// Seconds to wait for collection locks.
    pub fn lock_timeout(mut self, seconds: u64) -> Self {
        self.lock_timeout = Some(seconds);
        self
    }

    /// Upper bound of the transaction's memory footprint, in bytes.
    pub fn max_transaction_size(mut self, bytes: u64) -> Self {
        self.max_transaction_size = Some(bytes);
        self
    }

    pub fn get_read_collections(&self) -> &[String] {
        &self.read
    }

    pub fn get_write_collections(&self) -> &[String] {
        &self.write
    }

    pub fn get_exclusive_collections(&self) -> &[String] {
        &self.exclusive
    }

    pub fn is_allow_implicit(&self) -> bool {
        self.allow_implicit
    }

    pub fn is_wait_for_sync(&self) -> bool {
        self.wait_for_sync
    }

    pub fn get_lock_timeout(&self) -> Option<u64> {
        self.lock_timeout
    }

    pub fn get_max_transaction_size(&self) -> Option<u64> {
        self.max_transaction_size
    }

    pub(crate) fn to_request(&self) -> BeginTransactionRequest {
        BeginTransactionRequest {
            collections: TransactionCollections {
                read: self.read.clone(),
                write: self.write.clone(),
                exclusive: self.exclusive.clone(),
            },
            allow_implicit: self.allow_implicit,
            wait_for_sync: self.wait_for_sync,
            lock_timeout: self.lock_timeout,
            max_transaction_size: self.max_transaction_size,
        }
    }
}

/// Body of a begin request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BeginTransactionRequest {
    #[serde(default)]
    pub(crate) collections: TransactionCollections,
    #[serde(default = "default_allow_implicit")]
    pub(crate) allow_implicit: bool,
    #[serde(default)]
    pub(crate) wait_for_sync: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) lock_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) max_transaction_size: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TransactionCollections {
    #[serde(default)]
    pub(crate) read: Vec<String>,
    #[serde(default)]
    pub(crate) write: Vec<String>,
    #[serde(default)]
    pub(crate) exclusive: Vec<String>,
}

fn default_allow_implicit() -> bool {
    true
}
