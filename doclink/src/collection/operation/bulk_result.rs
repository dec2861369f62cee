use crate::errors::{DocLinkError, DocLinkResult};

/// Outcome of one slot of a bulk call.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkItem<S> {
    Success(S),
    Error(DocLinkError),
}

impl<S> BulkItem<S> {
    pub fn is_success(&self) -> bool {
        matches!(self, BulkItem::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, BulkItem::Error(_))
    }

    pub fn success(&self) -> Option<&S> {
        match self {
            BulkItem::Success(value) => Some(value),
            BulkItem::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&DocLinkError> {
        match self {
            BulkItem::Success(_) => None,
            BulkItem::Error(err) => Some(err),
        }
    }

    pub fn into_result(self) -> DocLinkResult<S> {
        match self {
            BulkItem::Success(value) => Ok(value),
            BulkItem::Error(err) => Err(err),
        }
    }
}

impl<S> From<DocLinkResult<S>> for BulkItem<S> {
    fn from(result: DocLinkResult<S>) -> Self {
        match result {
            Ok(value) => BulkItem::Success(value),
            Err(err) => BulkItem::Error(err),
        }
    }
}

/// Order-preserving outcome of a bulk call.
///
/// Slot `i` holds the outcome of input `i`; a failed slot never affects its
/// siblings. The aggregate also reports whether any part of the answer may have
/// come from a stale follower replica.
///
/// A silent call is the one exception to the length invariant: it carries no
/// items at all, not even errors, and [BulkResult::is_silent] is set.
///
/// # Examples
///
/// ```rust,ignore
/// let result = collection.create_documents(&docs, &DocumentCreateOptions::new())?;
/// for (index, item) in result.iter().enumerate() {
///     if let Some(err) = item.error() {
///         println!("document {} failed: {}", index, err);
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BulkResult<S> {
    items: Vec<BulkItem<S>>,
    potential_dirty_read: bool,
    silent: bool,
}

impl<S> Default for BulkResult<S> {
    fn default() -> Self {
        BulkResult::new(Vec::new(), false)
    }
}

impl<S> BulkResult<S> {
    pub(crate) fn new(items: Vec<BulkItem<S>>, potential_dirty_read: bool) -> Self {
        BulkResult {
            items,
            potential_dirty_read,
            silent: false,
        }
    }

    pub(crate) fn silent(potential_dirty_read: bool) -> Self {
        BulkResult {
            items: Vec::new(),
            potential_dirty_read,
            silent: true,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BulkItem<S>> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[BulkItem<S>] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BulkItem<S>> {
        self.items.iter()
    }

    /// Iterates over the successful slots.
    pub fn successes(&self) -> impl Iterator<Item = &S> {
        self.items.iter().filter_map(BulkItem::success)
    }

    /// Iterates over the failed slots.
    pub fn errors(&self) -> impl Iterator<Item = &DocLinkError> {
        self.items.iter().filter_map(BulkItem::error)
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(BulkItem::is_error)
    }

    /// Whether the server signalled that results may come from a follower replica.
    pub fn is_potential_dirty_read(&self) -> bool {
        self.potential_dirty_read
    }

    /// Whether the call ran in silent mode and therefore carries no items.
    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn into_items(self) -> Vec<BulkItem<S>> {
        self.items
    }

    /// Takes the outcome of a single-item call.
    pub(crate) fn into_single(self) -> Option<BulkItem<S>> {
        self.items.into_iter().next()
    }
}

impl<S> IntoIterator for BulkResult<S> {
    type Item = BulkItem<S>;
    type IntoIter = std::vec::IntoIter<BulkItem<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, S> IntoIterator for &'a BulkResult<S> {
    type Item = &'a BulkItem<S>;
    type IntoIter = std::slice::Iter<'a, BulkItem<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
