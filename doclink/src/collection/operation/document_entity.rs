use serde::{Deserialize, Serialize};

/// Success payload of a write.
///
/// Carries the identity of the written document and its new revision. `old_rev` is
/// present when the server reports the revision that was overwritten or removed.
/// `new` and `old` hold full snapshots when `return_new` / `return_old` were asked
/// for, decoded as `T`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEntity<T> {
    #[serde(rename = "_key")]
    key: String,
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_rev")]
    rev: String,
    #[serde(rename = "_oldRev", default, skip_serializing_if = "Option::is_none")]
    old_rev: Option<String>,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    new: Option<T>,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    old: Option<T>,
}

impl<T> DocumentEntity<T> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn rev(&self) -> &str {
        &self.rev
    }

    pub fn old_rev(&self) -> Option<&str> {
        self.old_rev.as_deref()
    }

    pub fn new_document(&self) -> Option<&T> {
        self.new.as_ref()
    }

    pub fn old_document(&self) -> Option<&T> {
        self.old.as_ref()
    }

    pub fn into_new_document(self) -> Option<T> {
        self.new
    }

    pub fn into_old_document(self) -> Option<T> {
        self.old
    }
}
