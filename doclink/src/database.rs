use serde::de::DeserializeOwned;

use crate::collection::{Document, DocumentCollection};
use crate::cursor::{open_cursor, Cursor, QueryOptions};
use crate::doclink_builder::DocLinkBuilder;
use crate::doclink_config::DocLinkConfig;
use crate::errors::{DocLinkError, DocLinkResult, ErrorKind};
use crate::transaction::{self, StreamTransaction, StreamTransactionOptions, TransactionEntity};

/// Entry point of the client.
///
/// A `Database` addresses one named database through the configured transport and
/// hands out collections, query cursors and stream transactions. It holds no
/// connection state of its own; clones share the same configuration.
///
/// # Examples
///
/// ```rust,ignore
/// use doclink::Database;
/// use doclink::memory::MemoryServer;
/// use doclink::collection::DocumentCreateOptions;
///
/// let server = MemoryServer::new();
/// server.create_collection("users")?;
///
/// let db = Database::builder().transport(server).open()?;
/// let users = db.collection("users")?;
/// let meta = users.create_document(&doc! { "name": "Alice" }, &DocumentCreateOptions::new())?;
///
/// let mut cursor = db.query::<Document>("FOR u IN users RETURN u", None, &QueryOptions::new())?;
/// while let Some(user) = cursor.advance()? {
///     println!("{}", user);
/// }
/// ```
#[derive(Clone)]
pub struct Database {
    config: DocLinkConfig,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.config.database_name())
            .finish()
    }
}

impl Database {
    /// Creates a new [DocLinkBuilder] for configuring and opening a database.
    pub fn builder() -> DocLinkBuilder {
        DocLinkBuilder::new()
    }

    pub(crate) fn new(config: DocLinkConfig) -> Self {
        Database { config }
    }

    /// The configuration this database was opened with.
    pub fn config(&self) -> &DocLinkConfig {
        &self.config
    }

    /// The database name every request addresses.
    pub fn name(&self) -> &str {
        self.config.database_name()
    }

    /// Gets a handle to a collection.
    ///
    /// No request is sent; whether the collection exists is discovered by the
    /// first operation on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or contains a path separator or
    /// whitespace.
    pub fn collection(&self, name: &str) -> DocLinkResult<DocumentCollection> {
        validate_collection_name(name)?;
        Ok(DocumentCollection::new(self.config.clone(), name))
    }

    /// Runs a query and returns a cursor over its results.
    ///
    /// Elements are deserialized into `T` as they are consumed.
    ///
    /// # Errors
    ///
    /// Returns the server's error when the query is rejected, or a transport error.
    pub fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        bind_vars: Option<Document>,
        options: &QueryOptions,
    ) -> DocLinkResult<Cursor<T>> {
        open_cursor(&self.config, query, bind_vars, options)
    }

    /// Begins a stream transaction.
    pub fn begin_stream_transaction(
        &self,
        options: &StreamTransactionOptions,
    ) -> DocLinkResult<StreamTransaction> {
        transaction::begin(&self.config, options)
    }

    /// Commits the stream transaction with the given id.
    pub fn commit_stream_transaction(&self, id: &str) -> DocLinkResult<TransactionEntity> {
        transaction::commit(&self.config, id)
    }

    /// Aborts the stream transaction with the given id.
    pub fn abort_stream_transaction(&self, id: &str) -> DocLinkResult<TransactionEntity> {
        transaction::abort(&self.config, id)
    }

    /// Looks up the status of a stream transaction.
    pub fn stream_transaction(&self, id: &str) -> DocLinkResult<TransactionEntity> {
        transaction::status_of(&self.config, id)
    }

    /// Lists the running stream transactions.
    pub fn stream_transactions(&self) -> DocLinkResult<Vec<TransactionEntity>> {
        transaction::list(&self.config)
    }
}

fn validate_collection_name(name: &str) -> DocLinkResult<()> {
    if name.is_empty() {
        log::error!("Collection name cannot be empty");
        return Err(DocLinkError::new(
            "Collection name cannot be empty",
            ErrorKind::InvalidOperation,
        ));
    }
    if name.contains('/') || name.chars().any(char::is_whitespace) {
        log::error!("Invalid collection name {}", name);
        return Err(DocLinkError::new(
            &format!("Invalid collection name {}", name),
            ErrorKind::InvalidOperation,
        ));
    }
    Ok(())
}
