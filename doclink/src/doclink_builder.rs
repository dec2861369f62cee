use crate::codec::{DocumentCodec, DocumentCodecProvider};
use crate::database::Database;
use crate::doclink_config::DocLinkConfig;
use crate::errors::{DocLinkError, DocLinkResult};
use crate::transport::{Transport, TransportProvider};

/// Builder for opening a [Database].
///
/// `DocLinkBuilder` provides a fluent API for configuring the client before opening
/// it. Errors raised while configuring are captured and returned by
/// [open](DocLinkBuilder::open).
///
/// # Examples
///
/// ```rust,ignore
/// use doclink::{Database, memory::MemoryServer};
///
/// let db = Database::builder()
///     .transport(MemoryServer::new())
///     .database_name("shop")
///     .open()?;
/// ```
#[derive(Default)]
pub struct DocLinkBuilder {
    error: Option<DocLinkError>,
    config: DocLinkConfig,
}

impl DocLinkBuilder {
    /// Creates a new `DocLinkBuilder` with default configuration.
    ///
    /// The default configuration uses the JSON codec, the `_system` database and a
    /// cursor retry budget of 3. A transport must be given before opening.
    pub fn new() -> Self {
        DocLinkBuilder {
            error: None,
            config: DocLinkConfig::new(),
        }
    }

    /// Sets the transport provider.
    pub fn transport<T: TransportProvider + 'static>(self, provider: T) -> Self {
        self.shared_transport(Transport::new(provider))
    }

    /// Sets a transport that is shared with other handles.
    pub fn shared_transport(mut self, transport: Transport) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_transport(transport) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the document codec.
    pub fn codec<T: DocumentCodecProvider + 'static>(mut self, codec: T) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_codec(DocumentCodec::new(codec)) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the database every request addresses.
    ///
    /// An empty name is captured as an error and returned by `open()`.
    pub fn database_name(mut self, name: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_database_name(name) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets how many times a cursor may re-request a batch after a transient
    /// failure. Only cursors opened with `allow_retry` re-request batches.
    pub fn cursor_retry_budget(mut self, budget: u32) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_cursor_retry_budget(budget) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Opens the database with the configured settings.
    ///
    /// # Errors
    ///
    /// Returns the first error captured while configuring, or an error if no
    /// transport was given.
    pub fn open(self) -> DocLinkResult<Database> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.config.initialize()?;
        Ok(Database::new(self.config))
    }
}
