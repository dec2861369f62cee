use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::common::{PATH_API_TRANSACTION, PATH_TRANSACTION_BEGIN};
use crate::doclink_config::DocLinkConfig;
use crate::errors::DocLinkResult;
use crate::transaction::StreamTransactionOptions;
use crate::transport::Method;

/// Status of a stream transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamTransactionStatus {
    /// Accepting operations
    Running,
    /// Changes applied (terminal)
    Committed,
    /// Changes discarded (terminal)
    Aborted,
}

impl StreamTransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamTransactionStatus::Running)
    }
}

impl Display for StreamTransactionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamTransactionStatus::Running => write!(f, "running"),
            StreamTransactionStatus::Committed => write!(f, "committed"),
            StreamTransactionStatus::Aborted => write!(f, "aborted"),
        }
    }
}

/// Id and status of a stream transaction as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEntity {
    id: String,
    #[serde(alias = "state")]
    status: StreamTransactionStatus,
}

impl TransactionEntity {
    pub(crate) fn new(id: &str, status: StreamTransactionStatus) -> Self {
        TransactionEntity {
            id: id.to_string(),
            status,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> StreamTransactionStatus {
        self.status
    }
}

#[derive(Serialize, Deserialize)]
pub(crate) struct TransactionEnvelope {
    pub(crate) result: TransactionEntity,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct TransactionListEnvelope {
    pub(crate) transactions: Vec<TransactionEntity>,
}

/// Handle to a server-side stream transaction.
///
/// The handle only correlates: its id is attached to document operations and
/// queries through their `stream_transaction_id` option, and those operations run
/// through the ordinary paths unchanged. The handle remembers the last status the
/// server confirmed; it changes only when a commit, abort or refresh succeeds.
///
/// Committing or aborting a transaction that already ended is sent to the server
/// like any other call and its verdict is returned; the handle stays consistent.
///
/// Clones share the same status.
///
/// # Examples
///
/// ```rust,ignore
/// let tx = db.begin_stream_transaction(&StreamTransactionOptions::new().write_collections(&["orders"]))?;
/// let orders = db.collection("orders")?;
/// orders.create_document(&order, &DocumentCreateOptions::new().stream_transaction_id(tx.id()))?;
/// tx.commit()?;
/// ```
#[derive(Clone)]
pub struct StreamTransaction {
    inner: Arc<StreamTransactionInner>,
}

struct StreamTransactionInner {
    id: String,
    status: Mutex<StreamTransactionStatus>,
    config: DocLinkConfig,
}

impl StreamTransaction {
    fn new(config: DocLinkConfig, entity: TransactionEntity) -> Self {
        StreamTransaction {
            inner: Arc::new(StreamTransactionInner {
                id: entity.id,
                status: Mutex::new(entity.status),
                config,
            }),
        }
    }

    /// The server-assigned transaction id.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// The last status the server confirmed.
    pub fn status(&self) -> StreamTransactionStatus {
        *self.inner.status.lock()
    }

    pub fn is_running(&self) -> bool {
        self.status() == StreamTransactionStatus::Running
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns the server's error, e.g. when the transaction was aborted before.
    pub fn commit(&self) -> DocLinkResult<()> {
        let entity = commit(&self.inner.config, &self.inner.id)?;
        self.set_status(entity.status);
        Ok(())
    }

    /// Aborts the transaction, discarding its changes.
    pub fn abort(&self) -> DocLinkResult<()> {
        let entity = abort(&self.inner.config, &self.inner.id)?;
        self.set_status(entity.status);
        Ok(())
    }

    /// Reloads the status from the server.
    pub fn refresh(&self) -> DocLinkResult<StreamTransactionStatus> {
        let entity = status_of(&self.inner.config, &self.inner.id)?;
        self.set_status(entity.status);
        Ok(entity.status)
    }

    fn set_status(&self, status: StreamTransactionStatus) {
        let mut current = self.inner.status.lock();
        if *current != status {
            log::debug!("Stream transaction {} is now {}", self.inner.id, status);
        }
        *current = status;
    }
}

impl Debug for StreamTransaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransaction")
            .field("id", &self.inner.id)
            .field("status", &self.status())
            .finish()
    }
}

pub(crate) fn begin(config: &DocLinkConfig, options: &StreamTransactionOptions) -> DocLinkResult<StreamTransaction> {
    let path = format!("{}/{}", PATH_API_TRANSACTION, PATH_TRANSACTION_BEGIN);
    let codec = config.codec();
    let request = config
        .request(Method::Post, &path)
        .with_body(codec.encode(&options.to_request())?);
    let response = config.execute(request)?;
    let envelope: TransactionEnvelope = codec.decode(response.body())?;
    log::debug!("Began stream transaction {}", envelope.result.id);
    Ok(StreamTransaction::new(config.clone(), envelope.result))
}

pub(crate) fn status_of(config: &DocLinkConfig, id: &str) -> DocLinkResult<TransactionEntity> {
    transaction_call(config, Method::Get, id)
}

pub(crate) fn commit(config: &DocLinkConfig, id: &str) -> DocLinkResult<TransactionEntity> {
    transaction_call(config, Method::Put, id)
}

pub(crate) fn abort(config: &DocLinkConfig, id: &str) -> DocLinkResult<TransactionEntity> {
    transaction_call(config, Method::Delete, id)
}

pub(crate) fn list(config: &DocLinkConfig) -> DocLinkResult<Vec<TransactionEntity>> {
    let response = config.execute(config.request(Method::Get, PATH_API_TRANSACTION))?;
    let envelope: TransactionListEnvelope = config.codec().decode(response.body())?;
    Ok(envelope.transactions)
}

fn transaction_call(config: &DocLinkConfig, method: Method, id: &str) -> DocLinkResult<TransactionEntity> {
    let path = format!("{}/{}", PATH_API_TRANSACTION, id);
    let response = config.execute(config.request(method, &path))?;
    let envelope: TransactionEnvelope = config.codec().decode(response.body())?;
    Ok(envelope.result)
}
