use std::ops::Deref;
use std::sync::Arc;

use crate::errors::DocLinkResult;
use crate::transport::{Request, Response};

/// The network boundary of the document-access layer.
///
/// # Purpose
/// Executes one request and returns the server's response, or a transport error
/// when no response was received. Implementations own connection setup,
/// authentication, pooling, timeouts and cancellation.
///
/// # Error contract
/// - Any response the server produced, including 4xx and 5xx statuses, is `Ok`.
/// - `Err` means the request may or may not have reached the server; the error kind
///   should be [ErrorKind::Transport](crate::errors::ErrorKind::Transport) or
///   [ErrorKind::Timeout](crate::errors::ErrorKind::Timeout).
///
/// # Implementations
/// - [MemoryServer](crate::memory::MemoryServer): in-process server emulator
///
/// # Thread Safety
/// Implementers must be `Send + Sync`; one transport is shared by every collection,
/// cursor and transaction handle of a database.
pub trait TransportProvider: Send + Sync {
    /// Executes the request.
    fn execute(&self, request: Request) -> DocLinkResult<Response>;
}

/// Shared handle to a [TransportProvider].
///
/// Cloning is cheap; all clones use the same provider.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<dyn TransportProvider>,
}

impl Transport {
    /// Wraps a provider implementation.
    pub fn new<T: TransportProvider + 'static>(inner: T) -> Self {
        Transport { inner: Arc::new(inner) }
    }

    /// Wraps a provider that is already shared, e.g. to keep a handle to it.
    pub fn from_arc(inner: Arc<dyn TransportProvider>) -> Self {
        Transport { inner }
    }

    /// Executes the request, logging its routing.
    pub fn send(&self, request: Request) -> DocLinkResult<Response> {
        log::debug!("Sending {}", request);
        let response = self.inner.execute(request)?;
        log::debug!("Received status {}", response.status());
        Ok(response)
    }
}

impl Deref for Transport {
    type Target = Arc<dyn TransportProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DocLinkError, ErrorKind};
    use crate::transport::Method;
    use parking_lot::Mutex;

    struct Recorder {
        requests: Mutex<Vec<Request>>,
    }

    impl TransportProvider for Recorder {
        fn execute(&self, request: Request) -> DocLinkResult<Response> {
            self.requests.lock().push(request);
            Ok(Response::new(200))
        }
    }

    struct Broken;

    impl TransportProvider for Broken {
        fn execute(&self, _request: Request) -> DocLinkResult<Response> {
            Err(DocLinkError::transport("connection reset"))
        }
    }

    #[test]
    fn test_send_forwards_request() {
        let recorder = Arc::new(Recorder {
            requests: Mutex::new(Vec::new()),
        });
        let transport = Transport::from_arc(recorder.clone());
        let response = transport
            .send(Request::new(Method::Get, "_system", "/_api/version"))
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(recorder.requests.lock().len(), 1);
    }

    #[test]
    fn test_send_propagates_transport_error() {
        let transport = Transport::new(Broken);
        let err = transport
            .send(Request::new(Method::Get, "_system", "/_api/version"))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::Transport);
        assert!(err.is_transient());
    }

    #[test]
    fn test_clone_shares_provider() {
        let transport = Transport::new(Broken);
        let clone = transport.clone();
        assert!(Arc::ptr_eq(&*transport, &*clone));
    }
}
