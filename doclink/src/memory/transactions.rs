use std::collections::{HashMap, HashSet};

use crate::errors::{error_codes, DocLinkError, DocLinkResult};
use crate::memory::collections::Overlay;
use crate::memory::server::{json_response, parse_body, DatabaseState, IdGenerator};
use crate::transaction::{
    BeginTransactionRequest, StreamTransactionStatus, TransactionEntity, TransactionEnvelope,
    TransactionListEnvelope,
};
use crate::transport::{Request, Response};

/// Server-side state of a stream transaction.
pub(crate) struct ServerTransaction {
    id: String,
    status: StreamTransactionStatus,
    declared: HashSet<String>,
    allow_implicit: bool,
    overlays: HashMap<String, Overlay>,
}

impl std::fmt::Debug for ServerTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerTransaction")
            .field("id", &self.id)
            .field("status", &self.status)
            .finish()
    }
}

impl ServerTransaction {
    fn new(id: String, request: BeginTransactionRequest) -> Self {
        let collections = request.collections;
        let declared = collections
            .read
            .into_iter()
            .chain(collections.write)
            .chain(collections.exclusive)
            .collect();
        ServerTransaction {
            id,
            status: StreamTransactionStatus::Running,
            declared,
            allow_implicit: request.allow_implicit,
            overlays: HashMap::new(),
        }
    }

    fn entity(&self) -> TransactionEntity {
        TransactionEntity::new(&self.id, self.status)
    }

    /// Whether the transaction may touch the collection.
    pub(crate) fn check_collection(&self, collection: &str) -> DocLinkResult<()> {
        if self.allow_implicit || self.declared.contains(collection) {
            Ok(())
        } else {
            Err(DocLinkError::server(
                400,
                Some(error_codes::TRANSACTION_UNREGISTERED_COLLECTION),
                &format!("collection '{}' is not registered in transaction {}", collection, self.id),
            ))
        }
    }

    pub(crate) fn overlay(&mut self, collection: &str) -> &mut Overlay {
        self.overlays.entry(collection.to_string()).or_default()
    }
}

/// Looks up a transaction that still accepts operations.
pub(crate) fn running<'a>(
    transactions: &'a mut HashMap<String, ServerTransaction>,
    id: &str,
) -> DocLinkResult<&'a mut ServerTransaction> {
    match transactions.get_mut(id) {
        Some(transaction) if transaction.status == StreamTransactionStatus::Running => Ok(transaction),
        Some(transaction) => Err(not_found(&format!(
            "transaction {} is {}",
            id, transaction.status
        ))),
        None => Err(not_found(&format!("transaction {} not found", id))),
    }
}

pub(crate) fn begin(db: &mut DatabaseState, ids: &mut IdGenerator, request: &Request) -> DocLinkResult<Response> {
    let body: BeginTransactionRequest = parse_body(request)?;
    let collections = &body.collections;
    for name in collections.read.iter().chain(&collections.write).chain(&collections.exclusive) {
        db.collection(name)?;
    }

    let transaction = ServerTransaction::new(ids.next_id(), body);
    let envelope = TransactionEnvelope {
        result: transaction.entity(),
    };
    log::debug!("Transaction {} started", transaction.id);
    db.transactions.insert(transaction.id.clone(), transaction);
    json_response(201, &envelope)
}

pub(crate) fn status(db: &DatabaseState, id: &str) -> DocLinkResult<Response> {
    match db.transactions.get(id) {
        Some(transaction) => json_response(
            200,
            &TransactionEnvelope {
                result: transaction.entity(),
            },
        ),
        None => Err(not_found(&format!("transaction {} not found", id))),
    }
}

pub(crate) fn list(db: &DatabaseState) -> DocLinkResult<Response> {
    let mut transactions: Vec<TransactionEntity> = db
        .transactions
        .values()
        .filter(|transaction| transaction.status == StreamTransactionStatus::Running)
        .map(ServerTransaction::entity)
        .collect();
    transactions.sort_by(|a, b| a.id().cmp(b.id()));
    json_response(200, &TransactionListEnvelope { transactions })
}

/// Commits: the overlays become the committed state. Committing twice is a no-op.
pub(crate) fn commit(db: &mut DatabaseState, id: &str) -> DocLinkResult<Response> {
    let transaction = db
        .transactions
        .get_mut(id)
        .ok_or_else(|| not_found(&format!("transaction {} not found", id)))?;

    match transaction.status {
        StreamTransactionStatus::Committed => return terminal_response(transaction),
        StreamTransactionStatus::Aborted => {
            return Err(disallowed(&format!("transaction {} was aborted, cannot commit", id)))
        }
        StreamTransactionStatus::Running => {}
    }

    transaction.status = StreamTransactionStatus::Committed;
    let overlays = std::mem::take(&mut transaction.overlays);
    let envelope = TransactionEnvelope {
        result: transaction.entity(),
    };

    for (name, overlay) in overlays {
        if let Some(collection) = db.collections.get_mut(&name) {
            collection.apply(overlay);
        }
    }
    log::debug!("Transaction {} committed", id);
    json_response(200, &envelope)
}

/// Aborts: the overlays are dropped. Aborting twice is a no-op.
pub(crate) fn abort(db: &mut DatabaseState, id: &str) -> DocLinkResult<Response> {
    let transaction = db
        .transactions
        .get_mut(id)
        .ok_or_else(|| not_found(&format!("transaction {} not found", id)))?;

    match transaction.status {
        StreamTransactionStatus::Aborted => terminal_response(transaction),
        StreamTransactionStatus::Committed => {
            Err(disallowed(&format!("transaction {} was committed, cannot abort", id)))
        }
        StreamTransactionStatus::Running => {
            transaction.status = StreamTransactionStatus::Aborted;
            transaction.overlays.clear();
            log::debug!("Transaction {} aborted", id);
            terminal_response(transaction)
        }
    }
}

fn terminal_response(transaction: &ServerTransaction) -> DocLinkResult<Response> {
    json_response(
        200,
        &TransactionEnvelope {
            result: transaction.entity(),
        },
    )
}

fn not_found(message: &str) -> DocLinkError {
    DocLinkError::server(404, Some(error_codes::TRANSACTION_NOT_FOUND), message)
}

fn disallowed(message: &str) -> DocLinkError {
    DocLinkError::server(409, Some(error_codes::TRANSACTION_DISALLOWED_OPERATION), message)
}
