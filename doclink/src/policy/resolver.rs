use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::collection::Document;
use crate::common::{Value, DOC_ID, DOC_KEY, DOC_REV, SYSTEM_ATTRIBUTES};
use crate::errors::{error_codes, DocLinkError, DocLinkResult};
use crate::policy::{ConcurrencyPrecondition, OverwriteMode, WriteFlags};

static KEY_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    match Regex::new(r"^[a-zA-Z0-9_\-:.@()+,=;$!*'%]{1,254}$") {
        Ok(regex) => Some(regex),
        Err(e) => {
            log::error!("Failed to compile document key pattern: {}", e);
            None
        }
    }
});

/// Outcome of a create against a possibly existing key.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateResolution {
    /// No document with the key exists; store the body as a new document.
    Insert(Document),
    /// The stored document is overwritten with the body and gets a new revision.
    Overwrite(Document),
    /// Nothing is written; the stored document (with its revision) is the result.
    Unchanged(Document),
}

/// The two mutations of an existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Update,
    Replace,
}

/// Outcome of an update or replace of an existing document.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationResolution {
    /// Store the body; the server assigns a new revision.
    Write(Document),
    /// Nothing is written; the stored document is the result.
    Unchanged(Document),
}

/// Resolves a create of `incoming` against the `existing` document with the same key.
///
/// The duplicate-key error of [OverwriteMode::Conflict] is raised before external
/// versioning is considered; for every other mode a stale version turns the write
/// into a no-op returning the stored state.
pub fn resolve_create(
    existing: Option<&Document>,
    incoming: &Document,
    mode: OverwriteMode,
    flags: &WriteFlags,
    precondition: &ConcurrencyPrecondition,
) -> DocLinkResult<CreateResolution> {
    if let Some(key) = key_of(incoming)? {
        validate_key(key)?;
    }

    let existing = match existing {
        None => {
            let mut body = incoming.clone();
            body.remove(DOC_ID);
            body.remove(DOC_REV);
            return Ok(CreateResolution::Insert(body));
        }
        Some(existing) => existing,
    };

    if mode == OverwriteMode::Conflict {
        let key = existing.key().unwrap_or_default();
        return Err(DocLinkError::server(
            409,
            Some(error_codes::UNIQUE_CONSTRAINT_VIOLATED),
            &format!(
                "unique constraint violated - in index primary of type primary over '_key'; conflicting key: {}",
                key
            ),
        ));
    }

    if mode != OverwriteMode::Ignore {
        check_revision(existing.rev(), precondition, incoming.rev())?;
    }

    if is_stale_version(existing, incoming, precondition) {
        return Ok(CreateResolution::Unchanged(existing.clone()));
    }

    match mode {
        OverwriteMode::Replace => Ok(CreateResolution::Overwrite(replace_body(existing, incoming, flags))),
        OverwriteMode::Update => Ok(CreateResolution::Overwrite(merge_documents(existing, incoming, flags))),
        OverwriteMode::Ignore | OverwriteMode::Conflict => Ok(CreateResolution::Unchanged(existing.clone())),
    }
}

/// Resolves an update or replace of an existing document.
///
/// With `ignore_revs` unset the expected revision is the explicit `if_match` tag, or
/// else the `_rev` the incoming document carries.
pub fn resolve_mutation(
    existing: &Document,
    incoming: &Document,
    kind: MutationKind,
    flags: &WriteFlags,
    precondition: &ConcurrencyPrecondition,
) -> DocLinkResult<MutationResolution> {
    check_revision(existing.rev(), precondition, incoming.rev())?;

    if is_stale_version(existing, incoming, precondition) {
        return Ok(MutationResolution::Unchanged(existing.clone()));
    }

    let body = match kind {
        MutationKind::Update => merge_documents(existing, incoming, flags),
        MutationKind::Replace => replace_body(existing, incoming, flags),
    };
    Ok(MutationResolution::Write(body))
}

/// Checks the stored revision against the precondition.
///
/// Used directly by delete and by reads with a revision selector.
pub fn check_revision(
    current_rev: Option<&str>,
    precondition: &ConcurrencyPrecondition,
    incoming_rev: Option<&str>,
) -> DocLinkResult<()> {
    if precondition.is_ignore_revs() {
        return Ok(());
    }

    if let Some(expected) = precondition.get_if_match().or(incoming_rev) {
        if current_rev != Some(expected) {
            return Err(precondition_failed());
        }
    }

    if let Some(unexpected) = precondition.get_if_none_match() {
        if current_rev == Some(unexpected) {
            return Err(precondition_failed());
        }
    }
    Ok(())
}

/// Merges `patch` into `existing` with update semantics.
///
/// Nested documents merge recursively when `merge_objects` is set; arrays and every
/// other value are replaced. With `keep_null` unset a null in the patch removes the
/// attribute. System attributes of the patch are ignored.
pub fn merge_documents(existing: &Document, patch: &Document, flags: &WriteFlags) -> Document {
    let mut result = existing.clone();
    for (name, value) in patch.iter() {
        if SYSTEM_ATTRIBUTES.contains(&name.as_str()) {
            continue;
        }

        if value.is_null() && !flags.is_keep_null() {
            result.remove(name);
            continue;
        }

        let merged = match (result.get(name), value) {
            (Some(Value::Document(stored)), Value::Document(incoming)) if flags.is_merge_objects() => {
                Value::Document(merge_documents(stored, incoming, flags))
            }
            (_, Value::Document(incoming)) if !flags.is_keep_null() => {
                Value::Document(strip_nulls(incoming))
            }
            (_, other) => other.clone(),
        };
        result.insert_unchecked(name.clone(), merged);
    }
    result
}

/// Validates a document key.
///
/// A key is 1 to 254 characters from letters, digits and `_-:.@()+,=;$!*'%`.
pub fn validate_key(key: &str) -> DocLinkResult<()> {
    let valid = match KEY_PATTERN.as_ref() {
        Some(pattern) => pattern.is_match(key),
        None => false,
    };

    if valid {
        Ok(())
    } else {
        log::error!("Illegal document key {:?}", key);
        Err(DocLinkError::server(
            400,
            Some(error_codes::DOCUMENT_KEY_BAD),
            "illegal document key",
        ))
    }
}

fn key_of(document: &Document) -> DocLinkResult<Option<&str>> {
    match document.get(DOC_KEY) {
        None => Ok(None),
        Some(Value::String(key)) => Ok(Some(key.as_str())),
        Some(_) => Err(DocLinkError::server(
            400,
            Some(error_codes::DOCUMENT_KEY_BAD),
            "illegal document key",
        )),
    }
}

fn replace_body(existing: &Document, incoming: &Document, flags: &WriteFlags) -> Document {
    let mut body = incoming.without_system_attributes();
    if !flags.is_keep_null() {
        body = strip_nulls(&body);
    }
    carry_identity(existing, &mut body);
    body
}

fn carry_identity(existing: &Document, body: &mut Document) {
    for attribute in [DOC_KEY, DOC_ID] {
        if let Some(value) = existing.get(attribute) {
            body.insert_unchecked(attribute.to_string(), value.clone());
        }
    }
}

fn strip_nulls(document: &Document) -> Document {
    document
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| match value {
            Value::Document(nested) => (name.clone(), Value::Document(strip_nulls(nested))),
            other => (name.clone(), other.clone()),
        })
        .collect()
}

fn is_stale_version(existing: &Document, incoming: &Document, precondition: &ConcurrencyPrecondition) -> bool {
    let attribute = match precondition.get_version_attribute() {
        Some(attribute) => attribute,
        None => return false,
    };

    match (incoming.get(attribute), existing.get(attribute)) {
        (Some(incoming), Some(stored)) => matches!(
            incoming.compare_numeric(stored),
            Some(Ordering::Less) | Some(Ordering::Equal)
        ),
        _ => false,
    }
}

fn precondition_failed() -> DocLinkError {
    DocLinkError::server(
        412,
        Some(error_codes::CONFLICT),
        "conflict, _rev values do not match",
    )
}
