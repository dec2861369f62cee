use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::{
    HEADER_ALLOW_DIRTY_READ, HEADER_POTENTIAL_DIRTY_READ, HEADER_TRANSACTION_ID, PARAM_ONLY_GET,
    SYSTEM_DATABASE,
};
use crate::errors::{error_codes, DocLinkError, DocLinkResult, ErrorKind};
use crate::memory::collections::{Scope, StoredCollection};
use crate::memory::cursors::{self, ServerCursor};
use crate::memory::documents;
use crate::memory::transactions::{self, ServerTransaction};
use crate::memory::MemoryServerConfig;
use crate::policy::MutationKind;
use crate::transport::{error_body, Method, Request, Response, TransportProvider};

/// An in-process document server.
///
/// `MemoryServer` answers the requests of the client the way a real server
/// would: document endpoints resolved through the revision and overwrite policy,
/// paged cursors over a small query language, and stream transactions whose
/// writes stay invisible to other requests until committed. Everything lives in
/// memory behind one lock; nothing runs in the background and cursor lifetimes are
/// checked when cursors are touched.
///
/// Clones share the same data, so a test can keep a handle to inspect state while
/// the client owns another.
///
/// Supported queries have the form
/// `FOR v IN <collection | @@collection | @values> [LIMIT [offset,] count] RETURN v`.
///
/// # Examples
///
/// ```rust,ignore
/// use doclink::Database;
/// use doclink::memory::MemoryServer;
///
/// let server = MemoryServer::new();
/// server.create_collection("users")?;
/// let db = Database::builder().transport(server.clone()).open()?;
/// ```
#[derive(Clone)]
pub struct MemoryServer {
    inner: Arc<MemoryServerInner>,
}

impl Default for MemoryServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryServer {
    /// Creates a server with default limits and an empty `_system` database.
    pub fn new() -> Self {
        Self::with_config(MemoryServerConfig::new())
    }

    pub fn with_config(config: MemoryServerConfig) -> Self {
        MemoryServer {
            inner: Arc::new(MemoryServerInner::new(config)),
        }
    }

    pub fn config(&self) -> &MemoryServerConfig {
        &self.inner.config
    }

    /// Creates a collection in the `_system` database.
    ///
    /// # Errors
    ///
    /// Returns error if the name is empty or the collection already exists.
    pub fn create_collection(&self, name: &str) -> DocLinkResult<()> {
        self.create_collection_in(SYSTEM_DATABASE, name)
    }

    /// Creates a collection, creating the database too if needed.
    pub fn create_collection_in(&self, database: &str, name: &str) -> DocLinkResult<()> {
        if name.is_empty() || database.is_empty() {
            log::error!("Database and collection names cannot be empty");
            return Err(DocLinkError::new(
                "Database and collection names cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }

        let mut state = self.inner.state.lock();
        let db = state.databases.entry(database.to_string()).or_default();
        if db.collections.contains_key(name) {
            return Err(DocLinkError::server(
                409,
                Some(error_codes::DUPLICATE_NAME),
                &format!("duplicate name: collection {} already exists", name),
            ));
        }
        db.collections.insert(name.to_string(), StoredCollection::new());
        Ok(())
    }

    /// Number of committed documents in a collection of the `_system` database.
    pub fn document_count(&self, collection: &str) -> DocLinkResult<usize> {
        let state = self.inner.state.lock();
        let db = state.database(SYSTEM_DATABASE)?;
        match db.collections.get(collection) {
            Some(stored) => Ok(stored.len()),
            None => Err(collection_not_found(collection)),
        }
    }

    /// Number of server-side cursors still held, across databases.
    pub fn open_cursor_count(&self) -> usize {
        let mut state = self.inner.state.lock();
        state
            .databases
            .values_mut()
            .map(|db| {
                cursors::expire(db);
                db.cursors.len()
            })
            .sum()
    }
}

impl TransportProvider for MemoryServer {
    fn execute(&self, request: Request) -> DocLinkResult<Response> {
        let response = {
            let mut state = self.inner.state.lock();
            match state.route(&self.inner.config, &request) {
                Ok(response) => response,
                Err(err) => error_response(&err),
            }
        };
        log::debug!("{} -> {}", request, response.status());

        if request.header(HEADER_ALLOW_DIRTY_READ) == Some("true") {
            Ok(response.with_header(HEADER_POTENTIAL_DIRTY_READ, "true"))
        } else {
            Ok(response)
        }
    }
}

struct MemoryServerInner {
    config: MemoryServerConfig,
    state: Mutex<ServerState>,
}

impl MemoryServerInner {
    fn new(config: MemoryServerConfig) -> Self {
        let mut databases = HashMap::new();
        databases.insert(SYSTEM_DATABASE.to_string(), DatabaseState::default());
        MemoryServerInner {
            config,
            state: Mutex::new(ServerState {
                databases,
                ids: IdGenerator::default(),
            }),
        }
    }
}

/// Source of cursor and transaction ids.
#[derive(Default)]
pub(crate) struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    pub(crate) fn next_id(&mut self) -> String {
        self.last += 1;
        self.last.to_string()
    }
}

struct ServerState {
    databases: HashMap<String, DatabaseState>,
    ids: IdGenerator,
}

impl ServerState {
    fn database(&self, name: &str) -> DocLinkResult<&DatabaseState> {
        self.databases
            .get(name)
            .ok_or_else(|| database_not_found(name))
    }

    fn route(&mut self, config: &MemoryServerConfig, request: &Request) -> DocLinkResult<Response> {
        let ServerState { databases, ids } = self;
        let db = databases
            .get_mut(request.database())
            .ok_or_else(|| database_not_found(request.database()))?;

        let segments = request.path_segments();
        let method = request.method();
        match segments.as_slice() {
            ["_api", "document", collection] => {
                let mut scope = db.scope(collection, request)?;
                match method {
                    Method::Post => documents::create(&mut scope, config, request),
                    Method::Put if request.query_flag(PARAM_ONLY_GET, false) => {
                        documents::read_many(&mut scope, request)
                    }
                    Method::Put => documents::mutate(&mut scope, config, request, MutationKind::Replace),
                    Method::Patch => documents::mutate(&mut scope, config, request, MutationKind::Update),
                    Method::Delete => documents::delete(&mut scope, request),
                    _ => Err(method_not_allowed(request)),
                }
            }
            ["_api", "document", collection, key] => match method {
                Method::Get | Method::Head => {
                    let scope = db.scope(collection, request)?;
                    documents::read_one(&scope, request, key)
                }
                _ => Err(method_not_allowed(request)),
            },
            ["_api", "cursor"] => match method {
                Method::Post => cursors::create(db, ids, config, request),
                _ => Err(method_not_allowed(request)),
            },
            ["_api", "cursor", id] => match method {
                Method::Post | Method::Put => cursors::next(db, id, None),
                Method::Delete => cursors::delete(db, id),
                _ => Err(method_not_allowed(request)),
            },
            ["_api", "cursor", id, batch_id] => match method {
                Method::Post | Method::Put => cursors::next(db, id, Some(*batch_id)),
                _ => Err(method_not_allowed(request)),
            },
            ["_api", "transaction"] => match method {
                Method::Get => transactions::list(db),
                _ => Err(method_not_allowed(request)),
            },
            ["_api", "transaction", "begin"] if method == Method::Post => {
                transactions::begin(db, ids, request)
            }
            ["_api", "transaction", id] => match method {
                Method::Get => transactions::status(db, id),
                Method::Put => transactions::commit(db, id),
                Method::Delete => transactions::abort(db, id),
                _ => Err(method_not_allowed(request)),
            },
            _ => Err(DocLinkError::server(
                404,
                None,
                &format!("unknown path {}", request.path()),
            )),
        }
    }
}

/// Collections, cursors and transactions of one database.
#[derive(Default)]
pub(crate) struct DatabaseState {
    pub(crate) collections: HashMap<String, StoredCollection>,
    pub(crate) cursors: HashMap<String, ServerCursor>,
    pub(crate) transactions: HashMap<String, ServerTransaction>,
}

impl DatabaseState {
    pub(crate) fn collection(&self, name: &str) -> DocLinkResult<&StoredCollection> {
        self.collections
            .get(name)
            .ok_or_else(|| collection_not_found(name))
    }

    /// Opens the view of a collection a request works on, inside the request's
    /// transaction if it names one.
    pub(crate) fn scope<'a>(&'a mut self, name: &'a str, request: &Request) -> DocLinkResult<Scope<'a>> {
        self.scope_in(name, request.header(HEADER_TRANSACTION_ID))
    }

    pub(crate) fn scope_in<'a>(
        &'a mut self,
        name: &'a str,
        transaction_id: Option<&str>,
    ) -> DocLinkResult<Scope<'a>> {
        let DatabaseState {
            collections,
            transactions,
            ..
        } = self;
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| collection_not_found(name))?;

        let overlay = match transaction_id {
            None => None,
            Some(id) => {
                let transaction = transactions::running(transactions, id)?;
                transaction.check_collection(name)?;
                Some(transaction.overlay(name))
            }
        };
        Ok(Scope::new(name, collection, overlay))
    }
}

pub(crate) fn json_response<T: Serialize + ?Sized>(status: u16, value: &T) -> DocLinkResult<Response> {
    Ok(Response::new(status)
        .with_header("content-type", "application/json")
        .with_body(serde_json::to_vec(value)?))
}

pub(crate) fn parse_body<T: DeserializeOwned>(request: &Request) -> DocLinkResult<T> {
    match request.body() {
        Some(body) => Ok(serde_json::from_slice(body)?),
        None => Err(DocLinkError::server(
            400,
            Some(error_codes::BAD_PARAMETER),
            "request body is missing",
        )),
    }
}

pub(crate) fn collection_not_found(name: &str) -> DocLinkError {
    DocLinkError::server(
        404,
        Some(error_codes::DATA_SOURCE_NOT_FOUND),
        &format!("collection or view not found: {}", name),
    )
}

fn database_not_found(name: &str) -> DocLinkError {
    DocLinkError::server(
        404,
        Some(error_codes::DATABASE_NOT_FOUND),
        &format!("database not found: {}", name),
    )
}

fn method_not_allowed(request: &Request) -> DocLinkError {
    DocLinkError::server(
        405,
        None,
        &format!("method {} not supported on {}", request.method(), request.path()),
    )
}

fn error_response(err: &DocLinkError) -> Response {
    let status = err.status().unwrap_or(400);
    let error_num = err.error_num().unwrap_or(match err.status() {
        Some(status) => status as u32,
        None => error_codes::BAD_PARAMETER,
    });
    Response::new(status)
        .with_header("content-type", "application/json")
        .with_body(error_body(status, error_num, err.message()))
}
