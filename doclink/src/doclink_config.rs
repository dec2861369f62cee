//! Configuration shared by a database handle and everything it hands out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::codec::DocumentCodec;
use crate::common::{DEFAULT_CURSOR_RETRY_BUDGET, SYSTEM_DATABASE};
use crate::errors::{DocLinkError, DocLinkResult, ErrorKind};
use crate::transport::{Method, Request, Response, Transport};

/// Public interface for the client configuration.
///
/// Every setting can be set once, and only until the configuration is frozen by
/// opening the database. Clones share the same settings.
///
/// # Examples
///
/// ```rust,ignore
/// use doclink::Database;
///
/// let db = Database::builder()
///     .transport(MemoryServer::new())
///     .database_name("shop")
///     .cursor_retry_budget(5)
///     .open()?;
/// assert_eq!(db.config().cursor_retry_budget(), 5);
/// ```
#[derive(Clone)]
pub struct DocLinkConfig {
    /// The pointer to implementation. Uses Arc for cheap cloning and thread safety.
    inner: Arc<DocLinkConfigInner>,
}

impl Default for DocLinkConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DocLinkConfig {
    /// Creates a new configuration with default values and no transport.
    pub fn new() -> Self {
        DocLinkConfig {
            inner: Arc::new(DocLinkConfigInner::new()),
        }
    }

    /// Sets the transport used for every request.
    ///
    /// # Errors
    ///
    /// Returns error if already set or if the configuration is frozen.
    pub fn set_transport(&self, transport: Transport) -> DocLinkResult<()> {
        self.inner.set_once(&self.inner.transport, transport, "transport")
    }

    /// Gets the configured transport.
    ///
    /// # Errors
    ///
    /// Returns error if no transport is configured.
    pub fn transport(&self) -> DocLinkResult<Transport> {
        match self.inner.transport.get() {
            Some(transport) => Ok(transport.clone()),
            None => {
                log::error!("No transport is configured");
                Err(DocLinkError::new(
                    "No transport is configured",
                    ErrorKind::InvalidOperation,
                ))
            }
        }
    }

    /// Sets the document codec.
    pub fn set_codec(&self, codec: DocumentCodec) -> DocLinkResult<()> {
        self.inner.set_once(&self.inner.codec, codec, "codec")
    }

    /// Returns the document codec, JSON unless configured otherwise.
    pub fn codec(&self) -> DocumentCodec {
        self.inner.codec.get_or_init(DocumentCodec::default).clone()
    }

    /// Sets the name of the database every request addresses.
    ///
    /// # Errors
    ///
    /// Returns error if already set, frozen, or if the name is empty.
    pub fn set_database_name(&self, name: &str) -> DocLinkResult<()> {
        if name.is_empty() {
            log::error!("Database name cannot be empty");
            return Err(DocLinkError::new(
                "Database name cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }
        self.inner
            .set_once(&self.inner.database_name, name.to_string(), "database name")
    }

    /// Returns the database name, `_system` unless configured otherwise.
    pub fn database_name(&self) -> &str {
        self.inner
            .database_name
            .get()
            .map(String::as_str)
            .unwrap_or(SYSTEM_DATABASE)
    }

    /// Sets how many times a cursor may re-request a batch after a transient failure.
    pub fn set_cursor_retry_budget(&self, budget: u32) -> DocLinkResult<()> {
        self.inner
            .set_once(&self.inner.cursor_retry_budget, budget, "cursor retry budget")
    }

    /// Returns the cursor retry budget, 3 unless configured otherwise.
    pub fn cursor_retry_budget(&self) -> u32 {
        self.inner
            .cursor_retry_budget
            .get()
            .copied()
            .unwrap_or(DEFAULT_CURSOR_RETRY_BUDGET)
    }

    /// Whether the configuration has been frozen by opening a database.
    pub fn is_configured(&self) -> bool {
        self.inner.configured.load(Ordering::Relaxed)
    }

    /// Validates and freezes the configuration.
    pub(crate) fn initialize(&self) -> DocLinkResult<()> {
        self.transport()?;
        self.inner.configured.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Starts a request against the configured database.
    pub(crate) fn request(&self, method: Method, path: &str) -> Request {
        Request::new(method, self.database_name(), path)
    }

    /// Sends a request; any response, successful or not, is `Ok`.
    pub(crate) fn send(&self, request: Request) -> DocLinkResult<Response> {
        self.transport()?.send(request)
    }

    /// Sends a request and turns a non-success response into its error.
    pub(crate) fn execute(&self, request: Request) -> DocLinkResult<Response> {
        let response = self.send(request)?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(response.to_error())
        }
    }
}

/// Private implementation of the configuration.
struct DocLinkConfigInner {
    /// Set once the database has been opened
    configured: AtomicBool,
    transport: OnceLock<Transport>,
    codec: OnceLock<DocumentCodec>,
    database_name: OnceLock<String>,
    cursor_retry_budget: OnceLock<u32>,
}

impl DocLinkConfigInner {
    fn new() -> Self {
        DocLinkConfigInner {
            configured: AtomicBool::from(false),
            transport: OnceLock::new(),
            codec: OnceLock::new(),
            database_name: OnceLock::new(),
            cursor_retry_budget: OnceLock::new(),
        }
    }

    fn set_once<T>(&self, cell: &OnceLock<T>, value: T, setting: &str) -> DocLinkResult<()> {
        if self.configured.load(Ordering::Relaxed) {
            log::error!("The {} cannot be changed after the database is opened", setting);
            return Err(DocLinkError::new(
                &format!("The {} cannot be changed after the database is opened", setting),
                ErrorKind::InvalidOperation,
            ));
        }

        if cell.set(value).is_err() {
            log::error!("The {} is already configured", setting);
            return Err(DocLinkError::new(
                &format!("The {} is already configured", setting),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}
