use serde::{Deserialize, Serialize};

use crate::collection::Document;

/// Body of a cursor creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CursorRequest {
    pub(crate) query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) bind_vars: Option<Document>,
    #[serde(default)]
    pub(crate) count: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) batch_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) ttl: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) cache: Option<bool>,
    #[serde(default)]
    pub(crate) options: CursorRequestOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CursorRequestOptions {
    #[serde(default)]
    pub(crate) full_count: bool,
    #[serde(default)]
    pub(crate) fail_on_warning: bool,
    #[serde(default)]
    pub(crate) stream: bool,
    #[serde(default)]
    pub(crate) allow_retry: bool,
}

/// One batch of a cursor as the server sends it.
///
/// `id` is absent when the whole result fits the first batch. `next_batch_id` is
/// only sent for retry-capable cursors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CursorEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<String>,
    #[serde(default)]
    pub(crate) result: Vec<serde_json::Value>,
    #[serde(default)]
    pub(crate) has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) count: Option<u64>,
    #[serde(default)]
    pub(crate) cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) extra: Option<CursorExtra>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) next_batch_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct CursorExtra {
    #[serde(default)]
    pub(crate) stats: CursorStats,
    #[serde(default)]
    pub(crate) warnings: Vec<CursorWarning>,
}

/// Execution statistics of a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorStats {
    #[serde(default)]
    pub(crate) writes_executed: u64,
    #[serde(default)]
    pub(crate) writes_ignored: u64,
    #[serde(default)]
    pub(crate) scanned_full: u64,
    #[serde(default)]
    pub(crate) scanned_index: u64,
    #[serde(default)]
    pub(crate) filtered: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) full_count: Option<u64>,
    #[serde(default)]
    pub(crate) execution_time: f64,
}

impl CursorStats {
    pub fn writes_executed(&self) -> u64 {
        self.writes_executed
    }

    pub fn writes_ignored(&self) -> u64 {
        self.writes_ignored
    }

    pub fn scanned_full(&self) -> u64 {
        self.scanned_full
    }

    pub fn scanned_index(&self) -> u64 {
        self.scanned_index
    }

    pub fn filtered(&self) -> u64 {
        self.filtered
    }

    /// Number of matches before the last top-level `LIMIT`, when `full_count` was
    /// requested.
    pub fn full_count(&self) -> Option<u64> {
        self.full_count
    }

    /// Execution time in seconds.
    pub fn execution_time(&self) -> f64 {
        self.execution_time
    }
}

/// A warning raised while executing a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorWarning {
    pub(crate) code: u32,
    pub(crate) message: String,
}

impl CursorWarning {
    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
