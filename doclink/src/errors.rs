use backtrace::Backtrace;
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

use parking_lot::RwLock;

/// Server error numbers understood by the client.
///
/// The numbers travel in the `errorNum` attribute of an error body, next to the
/// HTTP status in `code`.
pub mod error_codes {
    pub const BAD_PARAMETER: u32 = 10;
    pub const CONFLICT: u32 = 1200;
    pub const DOCUMENT_NOT_FOUND: u32 = 1202;
    pub const DATA_SOURCE_NOT_FOUND: u32 = 1203;
    pub const DUPLICATE_NAME: u32 = 1207;
    pub const UNIQUE_CONSTRAINT_VIOLATED: u32 = 1210;
    pub const DOCUMENT_TOO_LARGE: u32 = 1216;
    pub const DOCUMENT_KEY_BAD: u32 = 1221;
    pub const DOCUMENT_TYPE_INVALID: u32 = 1227;
    pub const DATABASE_NOT_FOUND: u32 = 1228;
    pub const QUERY_PARSE: u32 = 1501;
    pub const QUERY_BIND_PARAMETER_MISSING: u32 = 1551;
    pub const QUERY_BIND_PARAMETER_UNDECLARED: u32 = 1552;
    pub const CURSOR_NOT_FOUND: u32 = 1600;
    pub const VALIDATION_FAILED: u32 = 1620;
    pub const TRANSACTION_UNREGISTERED_COLLECTION: u32 = 1652;
    pub const TRANSACTION_DISALLOWED_OPERATION: u32 = 1653;
    pub const TRANSACTION_ABORTED: u32 = 1654;
    pub const TRANSACTION_NOT_FOUND: u32 = 1655;

    /// Returns the HTTP status the server pairs with an error number.
    ///
    /// Per-item errors of a bulk response only carry the error number, so the
    /// status of such an item is derived from it.
    pub fn http_status_for(error_num: u32) -> u16 {
        match error_num {
            DOCUMENT_NOT_FOUND | DATA_SOURCE_NOT_FOUND | DATABASE_NOT_FOUND | CURSOR_NOT_FOUND
            | TRANSACTION_NOT_FOUND => 404,
            CONFLICT => 412,
            UNIQUE_CONSTRAINT_VIOLATED | DUPLICATE_NAME | TRANSACTION_DISALLOWED_OPERATION => 409,
            DOCUMENT_TOO_LARGE => 413,
            TRANSACTION_ABORTED => 410,
            _ => 400,
        }
    }
}

/// Error kinds for document-access operations.
///
/// The kind is what callers branch on; the numeric server code and the HTTP status
/// (when the error came from the server) are available on [DocLinkError] as well.
///
/// # Examples
///
/// ```rust,ignore
/// use doclink::errors::{DocLinkError, ErrorKind, DocLinkResult};
///
/// fn example() -> DocLinkResult<()> {
///     Err(DocLinkError::new("cursor is closed", ErrorKind::InvalidOperation))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Whole-call failures raised by the transport
    /// The request could not be delivered or its response was lost
    Transport,
    /// The transport gave up waiting for a response
    Timeout,
    /// The server answered 503 and may succeed on a later attempt
    Unavailable,

    // Per-item and per-call failures reported by the server
    /// Document, collection, cursor or transaction does not exist
    NotFound,
    /// Duplicate key on create or a write-write conflict
    Conflict,
    /// An `if_match` / `if_none_match` / `_rev` precondition did not hold
    PreconditionFailed,
    /// Malformed key, non-object document or bad request parameter
    Invalid,
    /// Schema or size violation
    ServerRejected,
    /// Collection used inside a stream transaction without being declared
    UnregisteredCollection,
    /// Stream transaction is no longer running
    TransactionState,
    /// Authentication or authorization failure
    Unauthorized,
    /// Any other server side failure
    ServerError,

    // Client side failures
    /// Error encoding or decoding a payload
    EncodingError,
    /// The operation is not valid in the current client state
    InvalidOperation,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "Transport error"),
            ErrorKind::Timeout => write!(f, "Timeout"),
            ErrorKind::Unavailable => write!(f, "Service unavailable"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::Conflict => write!(f, "Conflict"),
            ErrorKind::PreconditionFailed => write!(f, "Precondition failed"),
            ErrorKind::Invalid => write!(f, "Invalid request"),
            ErrorKind::ServerRejected => write!(f, "Rejected by server"),
            ErrorKind::UnregisteredCollection => write!(f, "Unregistered collection"),
            ErrorKind::TransactionState => write!(f, "Transaction state error"),
            ErrorKind::Unauthorized => write!(f, "Unauthorized"),
            ErrorKind::ServerError => write!(f, "Server error"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

impl ErrorKind {
    /// Classifies a server error from its HTTP status and error number.
    ///
    /// The error number wins when it is specific; the status decides otherwise.
    pub fn classify(status: u16, error_num: Option<u32>) -> ErrorKind {
        use error_codes::*;

        if let Some(num) = error_num {
            match num {
                DOCUMENT_NOT_FOUND | DATA_SOURCE_NOT_FOUND | DATABASE_NOT_FOUND
                | CURSOR_NOT_FOUND | TRANSACTION_NOT_FOUND => return ErrorKind::NotFound,
                UNIQUE_CONSTRAINT_VIOLATED | DUPLICATE_NAME => return ErrorKind::Conflict,
                CONFLICT if status == 409 => return ErrorKind::Conflict,
                CONFLICT => return ErrorKind::PreconditionFailed,
                DOCUMENT_KEY_BAD | DOCUMENT_TYPE_INVALID | BAD_PARAMETER | QUERY_PARSE
                | QUERY_BIND_PARAMETER_MISSING | QUERY_BIND_PARAMETER_UNDECLARED => {
                    return ErrorKind::Invalid
                }
                DOCUMENT_TOO_LARGE | VALIDATION_FAILED => return ErrorKind::ServerRejected,
                TRANSACTION_UNREGISTERED_COLLECTION => return ErrorKind::UnregisteredCollection,
                TRANSACTION_DISALLOWED_OPERATION | TRANSACTION_ABORTED => {
                    return ErrorKind::TransactionState
                }
                _ => {}
            }
        }

        match status {
            400 => ErrorKind::Invalid,
            401 | 403 => ErrorKind::Unauthorized,
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            409 => ErrorKind::Conflict,
            412 => ErrorKind::PreconditionFailed,
            413 => ErrorKind::ServerRejected,
            503 => ErrorKind::Unavailable,
            _ => ErrorKind::ServerError,
        }
    }
}

/// The error type of the document-access layer.
///
/// `DocLinkError` carries a message and an [ErrorKind], and, for errors reported by
/// the server, the HTTP status and the server error number. Errors may be chained
/// through a cause; a backtrace is captured on creation.
///
/// Per-item failures of a bulk call are `DocLinkError` values too, stored in the
/// result next to the successes.
#[derive(Clone)]
pub struct DocLinkError {
    message: String,
    error_kind: ErrorKind,
    status: Option<u16>,
    error_num: Option<u32>,
    cause: Option<Box<DocLinkError>>,
    backtrace: Arc<RwLock<Backtrace>>,
}

impl DocLinkError {
    /// Creates a new `DocLinkError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        DocLinkError {
            message: message.to_string(),
            error_kind,
            status: None,
            error_num: None,
            cause: None,
            backtrace: Arc::new(RwLock::new(Backtrace::new_unresolved())),
        }
    }

    /// Creates a new `DocLinkError` with a cause error.
    ///
    /// The status and error number of the cause are carried over so callers can
    /// still branch on them after wrapping.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: DocLinkError) -> Self {
        DocLinkError {
            message: message.to_string(),
            error_kind,
            status: cause.status,
            error_num: cause.error_num,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(RwLock::new(Backtrace::new_unresolved())),
        }
    }

    /// Creates an error reported by the server.
    ///
    /// The kind is derived from the status and the error number.
    pub fn server(status: u16, error_num: Option<u32>, message: &str) -> Self {
        DocLinkError {
            message: message.to_string(),
            error_kind: ErrorKind::classify(status, error_num),
            status: Some(status),
            error_num,
            cause: None,
            backtrace: Arc::new(RwLock::new(Backtrace::new_unresolved())),
        }
    }

    /// Creates a transport failure.
    pub fn transport(message: &str) -> Self {
        DocLinkError::new(message, ErrorKind::Transport)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    /// HTTP status of a server-reported error.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Server error number of a server-reported error.
    pub fn error_num(&self) -> Option<u32> {
        self.error_num
    }

    pub fn cause(&self) -> Option<&DocLinkError> {
        self.cause.as_deref()
    }

    /// Whether repeating the same request may succeed.
    ///
    /// Only the cursor batch re-fetch acts on this; every other failure is reported
    /// once.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.error_kind,
            ErrorKind::Transport | ErrorKind::Timeout | ErrorKind::Unavailable
        )
    }
}

impl Display for DocLinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.status, self.error_num) {
            (Some(status), Some(num)) => write!(f, "{} (status {}, code {})", self.message, status, num),
            (Some(status), None) => write!(f, "{} (status {})", self.message, status),
            _ => write!(f, "{}", self.message),
        }
    }
}

impl Debug for DocLinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{} [{}]\nCaused by: {:?}", self, self.error_kind, cause),
            None => {
                let mut backtrace = self.backtrace.write();
                backtrace.resolve();
                write!(f, "{} [{}]\n{:?}", self, self.error_kind, *backtrace)
            }
        }
    }
}

impl PartialEq for DocLinkError {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
            && self.error_kind == other.error_kind
            && self.status == other.status
            && self.error_num == other.error_num
    }
}

impl Error for DocLinkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for document-access operations.
pub type DocLinkResult<T> = Result<T, DocLinkError>;

impl de::Error for DocLinkError {
    fn custom<T: Display>(msg: T) -> Self {
        DocLinkError::new(&msg.to_string(), ErrorKind::EncodingError)
    }
}

impl ser::Error for DocLinkError {
    fn custom<T: Display>(msg: T) -> Self {
        DocLinkError::new(&msg.to_string(), ErrorKind::EncodingError)
    }
}

impl From<serde_json::Error> for DocLinkError {
    fn from(err: serde_json::Error) -> Self {
        DocLinkError::new(&format!("JSON error: {}", err), ErrorKind::EncodingError)
    }
}

impl From<std::io::Error> for DocLinkError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::TimedOut => ErrorKind::Timeout,
            _ => ErrorKind::Transport,
        };
        DocLinkError::new(&format!("IO error: {}", err), error_kind)
    }
}

impl From<std::string::FromUtf8Error> for DocLinkError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        DocLinkError::new(
            &format!("UTF-8 encoding error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<anyhow::Error> for DocLinkError {
    fn from(err: anyhow::Error) -> Self {
        DocLinkError::new(&format!("{:#}", err), ErrorKind::Transport)
    }
}
