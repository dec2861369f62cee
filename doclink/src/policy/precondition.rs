/// Optimistic concurrency settings of a single write or read.
///
/// * `if_match` - proceed only if the stored `_rev` equals the tag.
/// * `if_none_match` - proceed only if the stored `_rev` differs from the tag.
/// * `ignore_revs` - skip every revision comparison, including the `_rev` carried by
///   the incoming document.
/// * `version_attribute` - external versioning: the write becomes a no-op when the
///   incoming value of this attribute is not strictly greater than the stored one.
///
/// Revisions are ignored unless asked for, matching the server default.
///
/// # Examples
///
/// ```rust,ignore
/// let precondition = ConcurrencyPrecondition::new()
///     .if_match("_hK9tE--")
///     .ignore_revs(false);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcurrencyPrecondition {
    if_match: Option<String>,
    if_none_match: Option<String>,
    ignore_revs: bool,
    version_attribute: Option<String>,
}

impl Default for ConcurrencyPrecondition {
    fn default() -> Self {
        Self::new()
    }
}

impl ConcurrencyPrecondition {
    pub fn new() -> Self {
        ConcurrencyPrecondition {
            if_match: None,
            if_none_match: None,
            ignore_revs: true,
            version_attribute: None,
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

    pub fn version_attribute(mut self, attribute: &str) -> Self {
        self.version_attribute = Some(attribute.to_string());
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

    pub fn get_version_attribute(&self) -> Option<&str> {
        self.version_attribute.as_deref()
    }
}

/// Attribute handling flags of a write.
///
/// `keep_null = false` drops null-valued incoming attributes (and removes the stored
/// attribute on update). `merge_objects = true` deep-merges nested documents on update
/// instead of replacing them wholesale. Both default to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteFlags {
    keep_null: bool,
    merge_objects: bool,
}

impl Default for WriteFlags {
    fn default() -> Self {
        WriteFlags::new(true, true)
    }
}

impl WriteFlags {
    pub fn new(keep_null: bool, merge_objects: bool) -> Self {
        WriteFlags {
            keep_null,
            merge_objects,
        }
    }

    pub fn is_keep_null(&self) -> bool {
        self.keep_null
    }

    pub fn is_merge_objects(&self) -> bool {
        self.merge_objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_defaults() {
        let precondition = ConcurrencyPrecondition::default();
        assert!(precondition.is_ignore_revs());
        assert!(precondition.get_if_match().is_none());
        assert!(precondition.get_if_none_match().is_none());
        assert!(precondition.get_version_attribute().is_none());
    }

    #[test]
    fn test_precondition_builder() {
        let precondition = ConcurrencyPrecondition::new()
            .if_match("a")
            .if_none_match("b")
            .ignore_revs(false)
            .version_attribute("version");
        assert_eq!(precondition.get_if_match(), Some("a"));
        assert_eq!(precondition.get_if_none_match(), Some("b"));
        assert!(!precondition.is_ignore_revs());
        assert_eq!(precondition.get_version_attribute(), Some("version"));
    }

    #[test]
    fn test_write_flags_default() {
        let flags = WriteFlags::default();
        assert!(flags.is_keep_null());
        assert!(flags.is_merge_objects());
    }
}
