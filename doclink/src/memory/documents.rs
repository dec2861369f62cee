use std::str::FromStr;

use serde_json::{Map, Value as Json};
use uuid::Uuid;

use crate::collection::Document;
use crate::common::{
    Value, ATTR_ERROR, ATTR_ERROR_MESSAGE, ATTR_ERROR_NUM, ATTR_NEW, ATTR_OLD, DOC_ID, DOC_KEY,
    DOC_OLD_REV, DOC_REV, HEADER_ETAG, HEADER_IF_MATCH, HEADER_IF_NONE_MATCH, PARAM_IGNORE_REVS,
    PARAM_KEEP_NULL, PARAM_MERGE_OBJECTS, PARAM_OVERWRITE_MODE, PARAM_RETURN_NEW, PARAM_RETURN_OLD,
    PARAM_SILENT, PARAM_VERSION_ATTRIBUTE, PARAM_WAIT_FOR_SYNC,
};
use crate::errors::{error_codes, DocLinkError, DocLinkResult};
use crate::memory::collections::Scope;
use crate::memory::server::{json_response, parse_body};
use crate::memory::MemoryServerConfig;
use crate::policy::{
    check_revision, resolve_create, resolve_mutation, validate_key, ConcurrencyPrecondition,
    CreateResolution, MutationKind, MutationResolution, OverwriteMode, WriteFlags,
};
use crate::transport::{Request, Response};

/// Query parameters of a write.
struct WriteParams {
    wait_for_sync: bool,
    return_new: bool,
    return_old: bool,
    silent: bool,
    overwrite_mode: OverwriteMode,
    flags: WriteFlags,
    precondition: ConcurrencyPrecondition,
}

impl WriteParams {
    fn from_request(request: &Request) -> DocLinkResult<Self> {
        let overwrite_mode = match request.query_param(PARAM_OVERWRITE_MODE) {
            Some(mode) => OverwriteMode::from_str(mode)?,
            None => OverwriteMode::default(),
        };

        let mut precondition =
            ConcurrencyPrecondition::new().ignore_revs(request.query_flag(PARAM_IGNORE_REVS, true));
        if let Some(attribute) = request.query_param(PARAM_VERSION_ATTRIBUTE) {
            precondition = precondition.version_attribute(attribute);
        }
        if let Some(unexpected) = request.header(HEADER_IF_NONE_MATCH) {
            precondition = precondition.if_none_match(unexpected);
        }

        Ok(WriteParams {
            wait_for_sync: request.query_flag(PARAM_WAIT_FOR_SYNC, false),
            return_new: request.query_flag(PARAM_RETURN_NEW, false),
            return_old: request.query_flag(PARAM_RETURN_OLD, false),
            silent: request.query_flag(PARAM_SILENT, false),
            overwrite_mode,
            flags: WriteFlags::new(
                request.query_flag(PARAM_KEEP_NULL, true),
                request.query_flag(PARAM_MERGE_OBJECTS, true),
            ),
            precondition,
        })
    }

    fn respond(&self, slots: Vec<Json>) -> DocLinkResult<Response> {
        let status = if self.wait_for_sync { 201 } else { 202 };
        if self.silent {
            json_response(status, &Json::Array(Vec::new()))
        } else {
            json_response(status, &Json::Array(slots))
        }
    }
}

/// `POST /_api/document/{collection}`: creates every document of the body array.
pub(crate) fn create(scope: &mut Scope, config: &MemoryServerConfig, request: &Request) -> DocLinkResult<Response> {
    let params = WriteParams::from_request(request)?;
    let slots = items(request)?
        .into_iter()
        .map(|item| slot(create_one(scope, config, &params, item)))
        .collect();
    params.respond(slots)
}

fn create_one(
    scope: &mut Scope,
    config: &MemoryServerConfig,
    params: &WriteParams,
    item: Json,
) -> DocLinkResult<Json> {
    let mut incoming = to_document(config, item)?;
    let key = match incoming.get(DOC_KEY) {
        Some(Value::String(key)) => key.clone(),
        Some(_) => return Err(bad_key("illegal document key")),
        None => {
            let key = scope.generate_key();
            incoming.insert_unchecked(DOC_KEY.to_string(), Value::from(key.as_str()));
            key
        }
    };

    let existing = scope.get(&key).cloned();
    let resolution = resolve_create(
        existing.as_ref(),
        &incoming,
        params.overwrite_mode,
        &params.flags,
        &params.precondition,
    )?;

    match resolution {
        CreateResolution::Insert(body) => {
            let stored = store(scope, &key, body);
            Ok(entity(&stored, None, params.return_new.then_some(&stored), None))
        }
        CreateResolution::Overwrite(body) => {
            let stored = store(scope, &key, body);
            let old = existing.as_ref();
            Ok(entity(
                &stored,
                old.and_then(Document::rev),
                params.return_new.then_some(&stored),
                old.filter(|_| params.return_old),
            ))
        }
        CreateResolution::Unchanged(current) => Ok(entity(
            &current,
            None,
            params.return_new.then_some(&current),
            None,
        )),
    }
}

/// `GET /_api/document/{collection}/{key}`: one document, honoring
/// `If-None-Match` (304) and `If-Match` (412).
pub(crate) fn read_one(scope: &Scope, request: &Request, key: &str) -> DocLinkResult<Response> {
    validate_key(key)?;
    let document = scope.get(key).ok_or_else(document_not_found)?;
    let rev = document.rev().unwrap_or_default();

    if request.header(HEADER_IF_NONE_MATCH) == Some(rev) {
        return Ok(Response::new(304).with_header(HEADER_ETAG, rev));
    }
    if let Some(expected) = request.header(HEADER_IF_MATCH) {
        if expected != rev {
            return Err(DocLinkError::server(
                412,
                Some(error_codes::CONFLICT),
                "conflict, _rev values do not match",
            ));
        }
    }
    Ok(json_response(200, document)?.with_header(HEADER_ETAG, rev))
}

/// `PUT /_api/document/{collection}?onlyget=true`: reads by key selectors.
pub(crate) fn read_many(scope: &mut Scope, request: &Request) -> DocLinkResult<Response> {
    let precondition =
        ConcurrencyPrecondition::new().ignore_revs(request.query_flag(PARAM_IGNORE_REVS, true));
    let slots = items(request)?
        .iter()
        .map(|item| {
            slot(selector(item).and_then(|(key, rev)| {
                let document = scope.get(&key).ok_or_else(document_not_found)?;
                check_revision(document.rev(), &precondition, rev.as_deref())?;
                Ok(Json::Object(document.clone().into()))
            }))
        })
        .collect();
    json_response(200, &Json::Array(slots))
}

/// `PATCH` and `PUT /_api/document/{collection}`: updates or replaces existing
/// documents selected by their `_key`.
pub(crate) fn mutate(
    scope: &mut Scope,
    config: &MemoryServerConfig,
    request: &Request,
    kind: MutationKind,
) -> DocLinkResult<Response> {
    let params = WriteParams::from_request(request)?;
    let slots = items(request)?
        .into_iter()
        .map(|item| slot(mutate_one(scope, config, &params, kind, item)))
        .collect();
    params.respond(slots)
}

fn mutate_one(
    scope: &mut Scope,
    config: &MemoryServerConfig,
    params: &WriteParams,
    kind: MutationKind,
    item: Json,
) -> DocLinkResult<Json> {
    let incoming = to_document(config, item)?;
    let key = incoming
        .key()
        .map(str::to_string)
        .ok_or_else(|| bad_key("document key missing"))?;
    validate_key(&key)?;
    let existing = scope.get(&key).cloned().ok_or_else(document_not_found)?;

    match resolve_mutation(&existing, &incoming, kind, &params.flags, &params.precondition)? {
        MutationResolution::Write(body) => {
            let stored = store(scope, &key, body);
            Ok(entity(
                &stored,
                existing.rev(),
                params.return_new.then_some(&stored),
                params.return_old.then_some(&existing),
            ))
        }
        MutationResolution::Unchanged(current) => Ok(entity(
            &current,
            current.rev(),
            params.return_new.then_some(&current),
            params.return_old.then_some(&current),
        )),
    }
}

/// `DELETE /_api/document/{collection}`: removes documents by key selectors.
pub(crate) fn delete(scope: &mut Scope, request: &Request) -> DocLinkResult<Response> {
    let params = WriteParams::from_request(request)?;
    let slots = items(request)?
        .iter()
        .map(|item| {
            slot(selector(item).and_then(|(key, rev)| {
                let existing = scope.get(&key).cloned().ok_or_else(document_not_found)?;
                check_revision(existing.rev(), &params.precondition, rev.as_deref())?;
                scope.remove(&key);
                Ok(entity(&existing, None, None, params.return_old.then_some(&existing)))
            }))
        })
        .collect();
    let status = if params.wait_for_sync { 200 } else { 202 };
    if params.silent {
        json_response(status, &Json::Array(Vec::new()))
    } else {
        json_response(status, &Json::Array(slots))
    }
}

/// Stamps fresh system attributes on `body` and stores it.
fn store(scope: &mut Scope, key: &str, mut body: Document) -> Document {
    let id = format!("{}/{}", scope.name(), key);
    let rev = format!("_{}", Uuid::new_v4().simple());
    body.set_system_attributes(key, &id, &rev);
    scope.put(key, body.clone());
    body
}

fn items(request: &Request) -> DocLinkResult<Vec<Json>> {
    match parse_body::<Json>(request)? {
        Json::Array(items) => Ok(items),
        _ => Err(DocLinkError::server(
            400,
            Some(error_codes::BAD_PARAMETER),
            "expecting an array of documents",
        )),
    }
}

fn to_document(config: &MemoryServerConfig, item: Json) -> DocLinkResult<Document> {
    let size = serde_json::to_vec(&item)?.len();
    if size > config.get_max_document_size() {
        return Err(DocLinkError::server(
            413,
            Some(error_codes::DOCUMENT_TOO_LARGE),
            &format!(
                "document too large: {} bytes, limit is {}",
                size,
                config.get_max_document_size()
            ),
        ));
    }

    match item {
        Json::Object(object) => Ok(Document::from(object)),
        _ => Err(DocLinkError::server(
            400,
            Some(error_codes::DOCUMENT_TYPE_INVALID),
            "invalid document type",
        )),
    }
}

/// Reads a key selector: a plain key, or an object with `_key` and optional `_rev`.
/// The key must be well formed.
fn selector(item: &Json) -> DocLinkResult<(String, Option<String>)> {
    let (key, rev) = match item {
        Json::String(key) => (key.as_str(), None),
        Json::Object(object) => {
            let key = object
                .get(DOC_KEY)
                .and_then(Json::as_str)
                .ok_or_else(|| bad_key("document key missing"))?;
            let rev = object.get(DOC_REV).and_then(Json::as_str).map(str::to_string);
            (key, rev)
        }
        _ => return Err(bad_key("illegal document key")),
    };
    validate_key(key)?;
    Ok((key.to_string(), rev))
}

fn entity(stored: &Document, old_rev: Option<&str>, new: Option<&Document>, old: Option<&Document>) -> Json {
    let mut object = Map::new();
    for attribute in [DOC_KEY, DOC_ID, DOC_REV] {
        if let Some(value) = stored.get(attribute) {
            object.insert(attribute.to_string(), Json::from(value.clone()));
        }
    }
    if let Some(old_rev) = old_rev {
        object.insert(DOC_OLD_REV.to_string(), Json::from(old_rev));
    }
    if let Some(new) = new {
        object.insert(ATTR_NEW.to_string(), Json::Object(new.clone().into()));
    }
    if let Some(old) = old {
        object.insert(ATTR_OLD.to_string(), Json::Object(old.clone().into()));
    }
    Json::Object(object)
}

fn slot(result: DocLinkResult<Json>) -> Json {
    match result {
        Ok(json) => json,
        Err(err) => {
            let mut object = Map::new();
            object.insert(ATTR_ERROR.to_string(), Json::Bool(true));
            object.insert(
                ATTR_ERROR_NUM.to_string(),
                Json::from(err.error_num().unwrap_or(error_codes::BAD_PARAMETER)),
            );
            object.insert(ATTR_ERROR_MESSAGE.to_string(), Json::from(err.message()));
            Json::Object(object)
        }
    }
}

fn document_not_found() -> DocLinkError {
    DocLinkError::server(404, Some(error_codes::DOCUMENT_NOT_FOUND), "document not found")
}

fn bad_key(message: &str) -> DocLinkError {
    DocLinkError::server(400, Some(error_codes::DOCUMENT_KEY_BAD), message)
}
