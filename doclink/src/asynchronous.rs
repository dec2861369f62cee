//! Non-blocking surface.
//!
//! Every method moves its arguments into a blocking task on the tokio runtime and
//! awaits it, so each call is its own future with its own result. The types are
//! thin wrappers; the blocking types they wrap do the work.
//!
//! ```rust,ignore
//! let db = AsyncDatabase::new(Database::builder().transport(server).open()?);
//! let users = db.collection("users")?;
//! let meta = users.create_document(doc! { name: "Alice" }, DocumentCreateOptions::new()).await?;
//! let mut cursor = db.query::<Document>("FOR u IN users RETURN u", None, QueryOptions::new()).await?;
//! while let Some(user) = cursor.advance().await? {
//!     println!("{}", user);
//! }
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::collection::operation::{BulkResult, DocumentEntity};
use crate::collection::{
    Document, DocumentCollection, DocumentCreateOptions, DocumentDeleteOptions, DocumentReadOptions,
    DocumentReplaceOptions, DocumentUpdateOptions,
};
use crate::cursor::{Cursor, CursorState, CursorStats, QueryOptions};
use crate::database::Database;
use crate::errors::{DocLinkError, DocLinkResult, ErrorKind};
use crate::transaction::{
    StreamTransaction, StreamTransactionOptions, StreamTransactionStatus, TransactionEntity,
};

async fn run_blocking<R, F>(task: F) -> DocLinkResult<R>
where
    F: FnOnce() -> DocLinkResult<R> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(task).await.map_err(|err| {
        log::error!("Blocking task failed: {}", err);
        DocLinkError::new(&format!("Blocking task failed: {}", err), ErrorKind::InternalError)
    })?
}

/// Non-blocking counterpart of [Database].
#[derive(Clone)]
pub struct AsyncDatabase {
    db: Database,
}

impl From<Database> for AsyncDatabase {
    fn from(db: Database) -> Self {
        AsyncDatabase::new(db)
    }
}

impl AsyncDatabase {
    pub fn new(db: Database) -> Self {
        AsyncDatabase { db }
    }

    /// The blocking database this wraps.
    pub fn blocking(&self) -> &Database {
        &self.db
    }

    pub fn name(&self) -> &str {
        self.db.name()
    }

    /// Gets a handle to a collection; no request is sent.
    pub fn collection(&self, name: &str) -> DocLinkResult<AsyncDocumentCollection> {
        Ok(AsyncDocumentCollection {
            collection: self.db.collection(name)?,
        })
    }

    pub async fn query<T>(
        &self,
        query: &str,
        bind_vars: Option<Document>,
        options: QueryOptions,
    ) -> DocLinkResult<AsyncCursor<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let db = self.db.clone();
        let query = query.to_string();
        let cursor = run_blocking(move || db.query::<T>(&query, bind_vars, &options)).await?;
        Ok(AsyncCursor {
            cursor: Some(cursor),
        })
    }

    pub async fn begin_stream_transaction(
        &self,
        options: StreamTransactionOptions,
    ) -> DocLinkResult<AsyncStreamTransaction> {
        let db = self.db.clone();
        let transaction = run_blocking(move || db.begin_stream_transaction(&options)).await?;
        Ok(AsyncStreamTransaction { transaction })
    }

    pub async fn commit_stream_transaction(&self, id: &str) -> DocLinkResult<TransactionEntity> {
        let db = self.db.clone();
        let id = id.to_string();
        run_blocking(move || db.commit_stream_transaction(&id)).await
    }

    pub async fn abort_stream_transaction(&self, id: &str) -> DocLinkResult<TransactionEntity> {
        let db = self.db.clone();
        let id = id.to_string();
        run_blocking(move || db.abort_stream_transaction(&id)).await
    }

    pub async fn stream_transaction(&self, id: &str) -> DocLinkResult<TransactionEntity> {
        let db = self.db.clone();
        let id = id.to_string();
        run_blocking(move || db.stream_transaction(&id)).await
    }

    pub async fn stream_transactions(&self) -> DocLinkResult<Vec<TransactionEntity>> {
        let db = self.db.clone();
        run_blocking(move || db.stream_transactions()).await
    }
}

/// Non-blocking counterpart of [DocumentCollection].
///
/// Inputs are taken by value since they move into the blocking task.
#[derive(Clone)]
pub struct AsyncDocumentCollection {
    collection: DocumentCollection,
}

impl AsyncDocumentCollection {
    pub fn name(&self) -> &str {
        self.collection.name()
    }

    pub async fn create_document<T>(
        &self,
        document: T,
        options: DocumentCreateOptions,
    ) -> DocLinkResult<DocumentEntity<T>>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        let collection = self.collection.clone();
        run_blocking(move || collection.create_document(&document, &options)).await
    }

    pub async fn create_documents<T>(
        &self,
        documents: Vec<T>,
        options: DocumentCreateOptions,
    ) -> DocLinkResult<BulkResult<DocumentEntity<T>>>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        let collection = self.collection.clone();
        run_blocking(move || collection.create_documents(&documents, &options)).await
    }

    pub async fn read_document<T>(&self, key: &str, options: DocumentReadOptions) -> DocLinkResult<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let collection = self.collection.clone();
        let key = key.to_string();
        run_blocking(move || collection.read_document(&key, &options)).await
    }

    pub async fn read_documents<T>(
        &self,
        keys: Vec<String>,
        options: DocumentReadOptions,
    ) -> DocLinkResult<BulkResult<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let collection = self.collection.clone();
        run_blocking(move || collection.read_documents(&keys, &options)).await
    }

    pub async fn update_document<T>(
        &self,
        key: &str,
        document: T,
        options: DocumentUpdateOptions,
    ) -> DocLinkResult<DocumentEntity<T>>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        let collection = self.collection.clone();
        let key = key.to_string();
        run_blocking(move || collection.update_document(&key, &document, &options)).await
    }

    pub async fn update_documents<T>(
        &self,
        documents: Vec<T>,
        options: DocumentUpdateOptions,
    ) -> DocLinkResult<BulkResult<DocumentEntity<T>>>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        let collection = self.collection.clone();
        run_blocking(move || collection.update_documents(&documents, &options)).await
    }

    pub async fn replace_document<T>(
        &self,
        key: &str,
        document: T,
        options: DocumentReplaceOptions,
    ) -> DocLinkResult<DocumentEntity<T>>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        let collection = self.collection.clone();
        let key = key.to_string();
        run_blocking(move || collection.replace_document(&key, &document, &options)).await
    }

    pub async fn replace_documents<T>(
        &self,
        documents: Vec<T>,
        options: DocumentReplaceOptions,
    ) -> DocLinkResult<BulkResult<DocumentEntity<T>>>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        let collection = self.collection.clone();
        run_blocking(move || collection.replace_documents(&documents, &options)).await
    }

    pub async fn delete_document<T>(&self, key: &str, options: DocumentDeleteOptions) -> DocLinkResult<DocumentEntity<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let collection = self.collection.clone();
        let key = key.to_string();
        run_blocking(move || collection.delete_document(&key, &options)).await
    }

    pub async fn delete_documents<T>(
        &self,
        keys: Vec<String>,
        options: DocumentDeleteOptions,
    ) -> DocLinkResult<BulkResult<DocumentEntity<T>>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let collection = self.collection.clone();
        run_blocking(move || collection.delete_documents(&keys, &options)).await
    }
}

/// Non-blocking counterpart of [Cursor].
///
/// The cursor moves into the blocking task for each fetch and comes back with the
/// result. If that task is lost the cursor is gone with it, and later calls fail
/// with [ErrorKind::InvalidOperation].
pub struct AsyncCursor<T> {
    cursor: Option<Cursor<T>>,
}

impl<T> AsyncCursor<T> {
    pub fn id(&self) -> Option<&str> {
        self.cursor.as_ref().and_then(Cursor::id)
    }

    pub fn state(&self) -> CursorState {
        self.cursor
            .as_ref()
            .map(Cursor::state)
            .unwrap_or(CursorState::Closed)
    }

    pub fn count(&self) -> Option<u64> {
        self.cursor.as_ref().and_then(Cursor::count)
    }

    pub fn stats(&self) -> Option<&CursorStats> {
        self.cursor.as_ref().and_then(Cursor::stats)
    }

    pub fn is_potential_dirty_read(&self) -> bool {
        self.cursor
            .as_ref()
            .map(Cursor::is_potential_dirty_read)
            .unwrap_or(false)
    }

    pub fn has_next(&self) -> bool {
        self.cursor.as_ref().map(Cursor::has_next).unwrap_or(false)
    }
}

impl<T: DeserializeOwned + Send + 'static> AsyncCursor<T> {
    /// Returns the next element, fetching a batch when the buffer is empty.
    pub async fn advance(&mut self) -> DocLinkResult<Option<T>> {
        self.with_cursor(|cursor| cursor.advance()).await
    }

    /// Drains the cursor.
    pub async fn collect_remaining(&mut self) -> DocLinkResult<Vec<T>> {
        self.with_cursor(|cursor| cursor.collect_remaining()).await
    }

    /// Releases the server-side cursor; best-effort like [Cursor::close].
    pub async fn close(&mut self) -> DocLinkResult<()> {
        self.with_cursor(|cursor| {
            cursor.close();
            Ok(())
        })
        .await
    }

    async fn with_cursor<R, F>(&mut self, operation: F) -> DocLinkResult<R>
    where
        F: FnOnce(&mut Cursor<T>) -> DocLinkResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let mut cursor = self.cursor.take().ok_or_else(lost_cursor)?;
        let (cursor, result) = run_blocking(move || {
            let result = operation(&mut cursor);
            Ok((cursor, result))
        })
        .await?;
        self.cursor = Some(cursor);
        result
    }
}

fn lost_cursor() -> DocLinkError {
    log::error!("Cursor is no longer available");
    DocLinkError::new("Cursor is no longer available", ErrorKind::InvalidOperation)
}

/// Non-blocking counterpart of [StreamTransaction].
#[derive(Clone)]
pub struct AsyncStreamTransaction {
    transaction: StreamTransaction,
}

impl AsyncStreamTransaction {
    pub fn id(&self) -> &str {
        self.transaction.id()
    }

    pub fn status(&self) -> StreamTransactionStatus {
        self.transaction.status()
    }

    pub fn is_running(&self) -> bool {
        self.transaction.is_running()
    }

    pub async fn commit(&self) -> DocLinkResult<()> {
        let transaction = self.transaction.clone();
        run_blocking(move || transaction.commit()).await
    }

    pub async fn abort(&self) -> DocLinkResult<()> {
        let transaction = self.transaction.clone();
        run_blocking(move || transaction.abort()).await
    }

    pub async fn refresh(&self) -> DocLinkResult<StreamTransactionStatus> {
        let transaction = self.transaction.clone();
        run_blocking(move || transaction.refresh()).await
    }
}
