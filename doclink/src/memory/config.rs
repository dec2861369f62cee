use std::time::Duration;

use crate::common::{DEFAULT_CURSOR_TTL_SECS, DEFAULT_SERVER_BATCH_SIZE};

/// Limits of a [MemoryServer](crate::memory::MemoryServer).
///
/// ```rust,ignore
/// let server = MemoryServer::with_config(
///     MemoryServerConfig::new().max_document_size(64).default_batch_size(10),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryServerConfig {
    max_document_size: usize,
    default_batch_size: usize,
    default_cursor_ttl: Duration,
}

impl Default for MemoryServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryServerConfig {
    pub fn new() -> Self {
        MemoryServerConfig {
            max_document_size: 16 * 1024 * 1024,
            default_batch_size: DEFAULT_SERVER_BATCH_SIZE,
            default_cursor_ttl: Duration::from_secs(DEFAULT_CURSOR_TTL_SECS),
        }
    }

    /// Largest accepted document, measured as its serialized JSON length in bytes.
    pub fn max_document_size(mut self, bytes: usize) -> Self {
        self.max_document_size = bytes;
        self
    }

    /// Batch size of cursors created without one.
    pub fn default_batch_size(mut self, batch_size: usize) -> Self {
        self.default_batch_size = batch_size;
        self
    }

    /// Idle lifetime of cursors created without a `ttl`.
    pub fn default_cursor_ttl(mut self, ttl: Duration) -> Self {
        self.default_cursor_ttl = ttl;
        self
    }

    pub fn get_max_document_size(&self) -> usize {
        self.max_document_size
    }

    pub fn get_default_batch_size(&self) -> usize {
        self.default_batch_size
    }

    pub fn get_default_cursor_ttl(&self) -> Duration {
        self.default_cursor_ttl
    }
}
