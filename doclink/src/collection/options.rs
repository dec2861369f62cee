use crate::common::{
    HEADER_ALLOW_DIRTY_READ, HEADER_IF_NONE_MATCH, HEADER_TRANSACTION_ID, PARAM_IGNORE_REVS,
    PARAM_KEEP_NULL, PARAM_MERGE_OBJECTS, PARAM_OVERWRITE_MODE, PARAM_RETURN_NEW,
    PARAM_RETURN_OLD, PARAM_SILENT, PARAM_VERSION_ATTRIBUTE, PARAM_WAIT_FOR_SYNC,
};
use crate::policy::OverwriteMode;
use crate::transport::Request;

/// Options of a create.
///
/// By default a create fails on a duplicate key ([OverwriteMode::Conflict]),
/// returns metadata only and keeps null attributes.
///
/// # Examples
///
/// ```rust,ignore
/// use doclink::collection::DocumentCreateOptions;
/// use doclink::policy::OverwriteMode;
///
/// let options = DocumentCreateOptions::new()
///     .overwrite_mode(OverwriteMode::Update)
///     .merge_objects(false)
///     .return_new(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCreateOptions {
    wait_for_sync: bool,
    return_new: bool,
    return_old: bool,
    silent: bool,
    overwrite_mode: Option<OverwriteMode>,
    keep_null: bool,
    merge_objects: bool,
    version_attribute: Option<String>,
    stream_transaction_id: Option<String>,
}

impl Default for DocumentCreateOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentCreateOptions {
    pub fn new() -> Self {
        DocumentCreateOptions {
            wait_for_sync: false,
            return_new: false,
            return_old: false,
            silent: false,
            overwrite_mode: None,
            keep_null: true,
            merge_objects: true,
            version_attribute: None,
            stream_transaction_id: None,
        }
    }

    /// Waits until the write has been synced to disk.
    pub fn wait_for_sync(mut self, wait_for_sync: bool) -> Self {
        self.wait_for_sync = wait_for_sync;
        self
    }

    /// Returns the stored document in the `new` attribute of each result.
    pub fn return_new(mut self, return_new: bool) -> Self {
        self.return_new = return_new;
        self
    }

    /// Returns the overwritten document in the `old` attribute of each result.
    /// Only meaningful together with an overwrite mode.
    pub fn return_old(mut self, return_old: bool) -> Self {
        self.return_old = return_old;
        self
    }

    /// Executes the whole batch but returns no per-item data, not even errors.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn overwrite_mode(mut self, overwrite_mode: OverwriteMode) -> Self {
        self.overwrite_mode = Some(overwrite_mode);
        self
    }

    pub fn keep_null(mut self, keep_null: bool) -> Self {
        self.keep_null = keep_null;
        self
    }

    pub fn merge_objects(mut self, merge_objects: bool) -> Self {
        self.merge_objects = merge_objects;
        self
    }

    pub fn version_attribute(mut self, attribute: &str) -> Self {
        self.version_attribute = Some(attribute.to_string());
        self
    }

    pub fn stream_transaction_id(mut self, id: &str) -> Self {
        self.stream_transaction_id = Some(id.to_string());
        self
    }

    pub fn is_wait_for_sync(&self) -> bool {
        self.wait_for_sync
    }

    pub fn is_return_new(&self) -> bool {
        self.return_new
    }

    pub fn is_return_old(&self) -> bool {
        self.return_old
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn get_overwrite_mode(&self) -> Option<OverwriteMode> {
        self.overwrite_mode
    }

    pub fn is_keep_null(&self) -> bool {
        self.keep_null
    }

    pub fn is_merge_objects(&self) -> bool {
        self.merge_objects
    }

    pub fn get_version_attribute(&self) -> Option<&str> {
        self.version_attribute.as_deref()
    }

    pub fn get_stream_transaction_id(&self) -> Option<&str> {
        self.stream_transaction_id.as_deref()
    }

    pub(crate) fn apply(&self, request: Request) -> Request {
        let request = write_params(
            request,
            self.wait_for_sync,
            self.return_new,
            self.return_old,
            self.silent,
        )
        .with_optional_query(PARAM_OVERWRITE_MODE, self.overwrite_mode.map(|m| m.as_str()))
        .with_optional_query(PARAM_VERSION_ATTRIBUTE, self.version_attribute.as_deref());
        let request = merge_params(request, self.keep_null, self.merge_objects);
        with_transaction(request, self.stream_transaction_id.as_deref())
    }
}

/// Options of a read.
///
/// `if_match` / `if_none_match` apply to the single-document read only; bulk
/// reads compare the `_rev` of each selector instead when `ignore_revs` is unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReadOptions {
    if_match: Option<String>,
    if_none_match: Option<String>,
    ignore_revs: bool,
    allow_dirty_read: bool,
    stream_transaction_id: Option<String>,
}

impl Default for DocumentReadOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentReadOptions {
    pub fn new() -> Self {
        DocumentReadOptions {
            if_match: None,
            if_none_match: None,
            ignore_revs: true,
            allow_dirty_read: false,
            stream_transaction_id: None,
        }
    }

    pub fn if_match(mut self, rev: &str) -> Self {
        self.if_match = Some(rev.to_string());
        self
    }

    pub fn if_none_match(mut self, rev: &str) -> Self {
        self.if_none_match = Some(rev.to_string());
        self
    }

    pub fn ignore_revs(mut self, ignore_revs: bool) -> Self {
        self.ignore_revs = ignore_revs;
        self
    }

    /// Accepts results served by a follower replica, possibly stale.
    pub fn allow_dirty_read(mut self, allow_dirty_read: bool) -> Self {
        self.allow_dirty_read = allow_dirty_read;
        self
    }

    pub fn stream_transaction_id(mut self, id: &str) -> Self {
        self.stream_transaction_id = Some(id.to_string());
        self
    }

    pub fn get_if_match(&self) -> Option<&str> {
        self.if_match.as_deref()
    }

    pub fn get_if_none_match(&self) -> Option<&str> {
        self.if_none_match.as_deref()
    }

    pub fn is_ignore_revs(&self) -> bool {
        self.ignore_revs
    }

    pub fn is_allow_dirty_read(&self) -> bool {
        self.allow_dirty_read
    }

    pub fn get_stream_transaction_id(&self) -> Option<&str> {
        self.stream_transaction_id.as_deref()
    }

    pub(crate) fn apply(&self, request: Request) -> Request {
        let request = if self.allow_dirty_read {
            request.with_header(HEADER_ALLOW_DIRTY_READ, "true")
        } else {
            request
        };
        with_transaction(request, self.stream_transaction_id.as_deref())
    }
}

/// Options of an update (partial modification).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpdateOptions {
    wait_for_sync: bool,
    return_new: bool,
    return_old: bool,
    silent: bool,
    keep_null: bool,
    merge_objects: bool,
    ignore_revs: bool,
    if_match: Option<String>,
    if_none_match: Option<String>,
    version_attribute: Option<String>,
    stream_transaction_id: Option<String>,
}

impl Default for DocumentUpdateOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentUpdateOptions {
    pub fn new() -> Self {
        DocumentUpdateOptions {
            wait_for_sync: false,
            return_new: false,
            return_old: false,
            silent: false,
            keep_null: true,
            merge_objects: true,
            ignore_revs: true,
            if_match: None,
            if_none_match: None,
            version_attribute: None,
            stream_transaction_id: None,
        }
    }

    pub fn wait_for_sync(mut self, wait_for_sync: bool) -> Self {
        self.wait_for_sync = wait_for_sync;
        self
    }

    pub fn return_new(mut self, return_new: bool) -> Self {
        self.return_new = return_new;
        self
    }

    pub fn return_old(mut self, return_old: bool) -> Self {
        self.return_old = return_old;
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn keep_null(mut self, keep_null: bool) -> Self {
        self.keep_null = keep_null;
        self
    }

    pub fn merge_objects(mut self, merge_objects: bool) -> Self {
        self.merge_objects = merge_objects;
        self
    }

    /// When unset, the `_rev` carried by each document must match the stored one.
    pub fn ignore_revs(mut self, ignore_revs: bool) -> Self {
        self.ignore_revs = ignore_revs;
        self
    }

    /// Expected revision; valid for single-document calls only.
    pub fn if_match(mut self, rev: &str) -> Self {
        self.if_match = Some(rev.to_string());
        self
    }

    /// Revision the stored document must not have; valid for single-document
    /// calls only. Turns revision checks on like `if_match` does.
    pub fn if_none_match(mut self, rev: &str) -> Self {
        self.if_none_match = Some(rev.to_string());
        self
    }

    pub fn version_attribute(mut self, attribute: &str) -> Self {
        self.version_attribute = Some(attribute.to_string());
        self
    }

    pub fn stream_transaction_id(mut self, id: &str) -> Self {
        self.stream_transaction_id = Some(id.to_string());
        self
    }

    pub fn is_wait_for_sync(&self) -> bool {
        self.wait_for_sync
    }

    pub fn is_return_new(&self) -> bool {
        self.return_new
    }

    pub fn is_return_old(&self) -> bool {
        self.return_old
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn is_keep_null(&self) -> bool {
        self.keep_null
    }

    pub fn is_merge_objects(&self) -> bool {
        self.merge_objects
    }

    pub fn is_ignore_revs(&self) -> bool {
        self.ignore_revs
    }

    pub fn get_if_match(&self) -> Option<&str> {
        self.if_match.as_deref()
    }

    pub fn get_if_none_match(&self) -> Option<&str> {
        self.if_none_match.as_deref()
    }

    pub fn get_version_attribute(&self) -> Option<&str> {
        self.version_attribute.as_deref()
    }

    pub fn get_stream_transaction_id(&self) -> Option<&str> {
        self.stream_transaction_id.as_deref()
    }

    pub(crate) fn apply(&self, request: Request) -> Request {
        let request = write_params(
            request,
            self.wait_for_sync,
            self.return_new,
            self.return_old,
            self.silent,
        )
        .with_optional_query(PARAM_VERSION_ATTRIBUTE, self.version_attribute.as_deref());
        let request = revision_params(
            request,
            self.ignore_revs,
            self.if_match.as_deref(),
            self.if_none_match.as_deref(),
        );
        let request = merge_params(request, self.keep_null, self.merge_objects);
        with_transaction(request, self.stream_transaction_id.as_deref())
    }
}

/// Options of a replace (full substitution).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReplaceOptions {
    wait_for_sync: bool,
    return_new: bool,
    return_old: bool,
    silent: bool,
    ignore_revs: bool,
    if_match: Option<String>,
    if_none_match: Option<String>,
    version_attribute: Option<String>,
    stream_transaction_id: Option<String>,
}

impl Default for DocumentReplaceOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentReplaceOptions {
    pub fn new() -> Self {
        DocumentReplaceOptions {
            wait_for_sync: false,
            return_new: false,
            return_old: false,
            silent: false,
            ignore_revs: true,
            if_match: None,
            if_none_match: None,
            version_attribute: None,
            stream_transaction_id: None,
        }
    }

    pub fn wait_for_sync(mut self, wait_for_sync: bool) -> Self {
        self.wait_for_sync = wait_for_sync;
        self
    }

    pub fn return_new(mut self, return_new: bool) -> Self {
        self.return_new = return_new;
        self
    }

    pub fn return_old(mut self, return_old: bool) -> Self {
        self.return_old = return_old;
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn ignore_revs(mut self, ignore_revs: bool) -> Self {
        self.ignore_revs = ignore_revs;
        self
    }

    /// Expected revision; valid for single-document calls only.
    pub fn if_match(mut self, rev: &str) -> Self {
        self.if_match = Some(rev.to_string());
        self
    }

    /// Revision the stored document must not have; valid for single-document
    /// calls only. Turns revision checks on like `if_match` does.
    pub fn if_none_match(mut self, rev: &str) -> Self {
        self.if_none_match = Some(rev.to_string());
        self
    }

    pub fn version_attribute(mut self, attribute: &str) -> Self {
        self.version_attribute = Some(attribute.to_string());
        self
    }

    pub fn stream_transaction_id(mut self, id: &str) -> Self {
        self.stream_transaction_id = Some(id.to_string());
        self
    }

    pub fn is_wait_for_sync(&self) -> bool {
        self.wait_for_sync
    }

    pub fn is_return_new(&self) -> bool {
        self.return_new
    }

    pub fn is_return_old(&self) -> bool {
        self.return_old
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn is_ignore_revs(&self) -> bool {
        self.ignore_revs
    }

    pub fn get_if_match(&self) -> Option<&str> {
        self.if_match.as_deref()
    }

    pub fn get_if_none_match(&self) -> Option<&str> {
        self.if_none_match.as_deref()
    }

    pub fn get_version_attribute(&self) -> Option<&str> {
        self.version_attribute.as_deref()
    }

    pub fn get_stream_transaction_id(&self) -> Option<&str> {
        self.stream_transaction_id.as_deref()
    }

    pub(crate) fn apply(&self, request: Request) -> Request {
        let request = write_params(
            request,
            self.wait_for_sync,
            self.return_new,
            self.return_old,
            self.silent,
        )
        .with_optional_query(PARAM_VERSION_ATTRIBUTE, self.version_attribute.as_deref());
        let request = revision_params(
            request,
            self.ignore_revs,
            self.if_match.as_deref(),
            self.if_none_match.as_deref(),
        );
        with_transaction(request, self.stream_transaction_id.as_deref())
    }
}

/// Options of a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDeleteOptions {
    wait_for_sync: bool,
    return_old: bool,
    silent: bool,
    ignore_revs: bool,
    if_match: Option<String>,
    if_none_match: Option<String>,
    stream_transaction_id: Option<String>,
}

impl Default for DocumentDeleteOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentDeleteOptions {
    pub fn new() -> Self {
        DocumentDeleteOptions {
            wait_for_sync: false,
            return_old: false,
            silent: false,
            ignore_revs: true,
            if_match: None,
            if_none_match: None,
            stream_transaction_id: None,
        }
    }

    pub fn wait_for_sync(mut self, wait_for_sync: bool) -> Self {
        self.wait_for_sync = wait_for_sync;
        self
    }

    pub fn return_old(mut self, return_old: bool) -> Self {
        self.return_old = return_old;
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn ignore_revs(mut self, ignore_revs: bool) -> Self {
        self.ignore_revs = ignore_revs;
        self
    }

    /// Expected revision; valid for single-document calls only.
    pub fn if_match(mut self, rev: &str) -> Self {
        self.if_match = Some(rev.to_string());
        self
    }

    /// Revision the stored document must not have; valid for single-document
    /// calls only. Turns revision checks on like `if_match` does.
    pub fn if_none_match(mut self, rev: &str) -> Self {
        self.if_none_match = Some(rev.to_string());
        self
    }

    pub fn stream_transaction_id(mut self, id: &str) -> Self {
        self.stream_transaction_id = Some(id.to_string());
        self
    }

    pub fn is_wait_for_sync(&self) -> bool {
        self.wait_for_sync
    }

    pub fn is_return_old(&self) -> bool {
        self.return_old
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn is_ignore_revs(&self) -> bool {
        self.ignore_revs
    }

    pub fn get_if_match(&self) -> Option<&str> {
        self.if_match.as_deref()
    }

    pub fn get_if_none_match(&self) -> Option<&str> {
        self.if_none_match.as_deref()
    }

    pub fn get_stream_transaction_id(&self) -> Option<&str> {
        self.stream_transaction_id.as_deref()
    }

    pub(crate) fn apply(&self, request: Request) -> Request {
        let request = write_params(request, self.wait_for_sync, false, self.return_old, self.silent);
        let request = revision_params(
            request,
            self.ignore_revs,
            self.if_match.as_deref(),
            self.if_none_match.as_deref(),
        );
        with_transaction(request, self.stream_transaction_id.as_deref())
    }
}

/// Creates `DocumentCreateOptions` resolving duplicate keys with the given mode.
pub fn overwrite_with(mode: OverwriteMode) -> DocumentCreateOptions {
    DocumentCreateOptions::new().overwrite_mode(mode)
}

/// Creates `DocumentReadOptions` that accept reads from follower replicas.
pub fn dirty_read() -> DocumentReadOptions {
    DocumentReadOptions::new().allow_dirty_read(true)
}

fn write_params(
    request: Request,
    wait_for_sync: bool,
    return_new: bool,
    return_old: bool,
    silent: bool,
) -> Request {
    let mut request = request;
    if wait_for_sync {
        request = request.with_query(PARAM_WAIT_FOR_SYNC, true);
    }
    if return_new {
        request = request.with_query(PARAM_RETURN_NEW, true);
    }
    if return_old {
        request = request.with_query(PARAM_RETURN_OLD, true);
    }
    if silent {
        request = request.with_query(PARAM_SILENT, true);
    }
    request
}

/// An explicit revision tag only takes effect with revision checks on.
fn revision_params(
    request: Request,
    ignore_revs: bool,
    if_match: Option<&str>,
    if_none_match: Option<&str>,
) -> Request {
    let ignore_revs = ignore_revs && if_match.is_none() && if_none_match.is_none();
    request
        .with_query(PARAM_IGNORE_REVS, ignore_revs)
        .with_optional_header(HEADER_IF_NONE_MATCH, if_none_match)
}

fn merge_params(request: Request, keep_null: bool, merge_objects: bool) -> Request {
    request
        .with_query(PARAM_KEEP_NULL, keep_null)
        .with_query(PARAM_MERGE_OBJECTS, merge_objects)
}

fn with_transaction(request: Request, stream_transaction_id: Option<&str>) -> Request {
    request.with_optional_header(HEADER_TRANSACTION_ID, stream_transaction_id)
}
