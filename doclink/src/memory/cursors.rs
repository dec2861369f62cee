use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde_json::Value as Json;

use crate::common::HEADER_TRANSACTION_ID;
use crate::cursor::{CursorEntity, CursorExtra, CursorRequest, CursorStats};
use crate::errors::{error_codes, DocLinkError, DocLinkResult};
use crate::memory::query;
use crate::memory::server::{json_response, parse_body, DatabaseState, IdGenerator};
use crate::memory::MemoryServerConfig;
use crate::transport::{Request, Response};

/// A query result not yet fully delivered.
///
/// Retry-capable cursors remember the last batch they sent, so a client that lost
/// the response can ask for the same batch id again. Batch ids start at 1 with the
/// batch sent on creation.
pub(crate) struct ServerCursor {
    id: String,
    pending: VecDeque<Json>,
    batch_size: usize,
    allow_retry: bool,
    batch_id: u64,
    last_batch: CursorEntity,
    ttl: Duration,
    expires_at: Instant,
}

impl ServerCursor {
    fn touch(&mut self) {
        self.expires_at = Instant::now() + self.ttl;
    }

    fn advance(&mut self) -> CursorEntity {
        let result = take_batch(&mut self.pending, self.batch_size);
        let has_more = !self.pending.is_empty();
        self.batch_id += 1;
        let entity = CursorEntity {
            id: Some(self.id.clone()),
            result,
            has_more,
            count: None,
            cached: false,
            extra: None,
            next_batch_id: self.next_batch_id(has_more),
        };
        self.last_batch = entity.clone();
        entity
    }

    fn next_batch_id(&self, has_more: bool) -> Option<String> {
        if self.allow_retry && has_more {
            Some((self.batch_id + 1).to_string())
        } else {
            None
        }
    }
}

/// `POST /_api/cursor`: runs a query and sends its first batch.
pub(crate) fn create(
    db: &mut DatabaseState,
    ids: &mut IdGenerator,
    config: &MemoryServerConfig,
    request: &Request,
) -> DocLinkResult<Response> {
    expire(db);
    let body: CursorRequest = parse_body(request)?;
    let batch_size = body.batch_size.unwrap_or(config.get_default_batch_size());
    if batch_size == 0 {
        return Err(DocLinkError::server(
            400,
            Some(error_codes::BAD_PARAMETER),
            "batchSize must be a positive number",
        ));
    }

    let started = Instant::now();
    let query = query::parse(&body.query)?;
    let output = query.execute(db, body.bind_vars.as_ref(), request.header(HEADER_TRANSACTION_ID))?;

    let total = output.results.len() as u64;
    let mut pending: VecDeque<Json> = output.results.into();
    let result = take_batch(&mut pending, batch_size);
    let has_more = !pending.is_empty();
    let allow_retry = body.options.allow_retry;

    let stats = CursorStats {
        scanned_full: output.scanned_full,
        full_count: body.options.full_count.then_some(output.full_count),
        execution_time: started.elapsed().as_secs_f64(),
        ..CursorStats::default()
    };

    let id = (has_more || allow_retry).then(|| ids.next_id());
    let entity = CursorEntity {
        id: id.clone(),
        result,
        has_more,
        count: body.count.then_some(total),
        cached: false,
        extra: Some(CursorExtra {
            stats,
            warnings: Vec::new(),
        }),
        next_batch_id: (allow_retry && has_more).then(|| "2".to_string()),
    };

    if let Some(id) = id {
        let ttl = body
            .ttl
            .filter(|ttl| *ttl > 0)
            .map(Duration::from_secs)
            .unwrap_or(config.get_default_cursor_ttl());
        log::debug!("Cursor {} holds {} more results", id, pending.len());
        db.cursors.insert(
            id.clone(),
            ServerCursor {
                id,
                pending,
                batch_size,
                allow_retry,
                batch_id: 1,
                last_batch: entity.clone(),
                ttl,
                expires_at: Instant::now() + ttl,
            },
        );
    }
    json_response(201, &entity)
}

/// `POST /_api/cursor/{id}[/{batchId}]`: sends the next batch, or repeats the last
/// one when a retry-capable cursor is asked for it again.
pub(crate) fn next(db: &mut DatabaseState, id: &str, batch_id: Option<&str>) -> DocLinkResult<Response> {
    expire(db);
    let cursor = db.cursors.get_mut(id).ok_or_else(|| cursor_not_found(id))?;

    let entity = match batch_id {
        None => cursor.advance(),
        Some(requested) => {
            if !cursor.allow_retry {
                return Err(bad_batch(&format!("cursor {} does not allow retry", id)));
            }
            let requested: u64 = requested
                .parse()
                .map_err(|_| bad_batch(&format!("invalid batch id {}", requested)))?;
            if requested == cursor.batch_id {
                log::debug!("Repeating batch {} of cursor {}", requested, id);
                cursor.last_batch.clone()
            } else if requested == cursor.batch_id + 1 {
                cursor.advance()
            } else {
                return Err(bad_batch(&format!("batch id {} not found", requested)));
            }
        }
    };
    cursor.touch();

    if !entity.has_more && !cursor.allow_retry {
        db.cursors.remove(id);
    }
    json_response(200, &entity)
}

/// `DELETE /_api/cursor/{id}`
pub(crate) fn delete(db: &mut DatabaseState, id: &str) -> DocLinkResult<Response> {
    expire(db);
    match db.cursors.remove(id) {
        Some(_) => json_response(202, &serde_json::json!({"id": id, "error": false, "code": 202})),
        None => Err(cursor_not_found(id)),
    }
}

/// Drops cursors idle for longer than their ttl.
pub(crate) fn expire(db: &mut DatabaseState) {
    let now = Instant::now();
    db.cursors.retain(|id, cursor| {
        let alive = cursor.expires_at > now;
        if !alive {
            log::debug!("Cursor {} expired", id);
        }
        alive
    });
}

fn take_batch(pending: &mut VecDeque<Json>, batch_size: usize) -> Vec<Json> {
    let count = batch_size.min(pending.len());
    pending.drain(..count).collect()
}

fn cursor_not_found(id: &str) -> DocLinkError {
    DocLinkError::server(
        404,
        Some(error_codes::CURSOR_NOT_FOUND),
        &format!("cursor {} not found", id),
    )
}

fn bad_batch(message: &str) -> DocLinkError {
    DocLinkError::server(400, Some(error_codes::BAD_PARAMETER), message)
}
