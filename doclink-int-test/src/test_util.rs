use doclink::errors::{DocLinkError, DocLinkResult};
use doclink::memory::MemoryServer;
use doclink::transport::{Method, Request, Response, TransportProvider};
use doclink::Database;
use parking_lot::Mutex;
use std::backtrace::Backtrace;
use std::thread;
use std::time::{Duration, Instant};

/// Collections every test context starts with.
pub const TEST_COLLECTIONS: [&str; 2] = ["users", "orders"];

/// Runs a test with retry logic and error handling.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> DocLinkResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> DocLinkResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> DocLinkResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;
    let mut last_backtrace: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            match before() {
                Ok(ctx) => match test(ctx.clone()) {
                    Ok(_) => after(ctx)
                        .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                    Err(e) => {
                        let _ = after(ctx);
                        Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                    }
                },
                Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
            }
        });

        let elapsed = start_time.elapsed();

        match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => {
                last_error = Some(e.clone());
                last_backtrace = Some(bt);
                if attempt < MAX_RETRIES {
                    eprintln!(
                        "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                        attempt, MAX_RETRIES, elapsed
                    );
                    eprintln!("Error: {}", e);
                    thread::sleep(Duration::from_millis(50 * attempt as u64));
                }
            }
            Err(panic_err) => {
                let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };

                last_error = Some(format!("Panic: {}", err_msg));
                last_backtrace = Some(Backtrace::capture().to_string());

                if attempt < MAX_RETRIES {
                    eprintln!(
                        "\n========== Test Attempt {}/{} Panicked (took {:?}) ==========",
                        attempt, MAX_RETRIES, elapsed
                    );
                    eprintln!("Panic: {}", err_msg);
                    thread::sleep(Duration::from_millis(50 * attempt as u64));
                }
            }
        }
    }

    panic!(
        "Test failed after {} attempts\nLast error: {}\nBacktrace:\n{}",
        MAX_RETRIES,
        last_error.unwrap_or_default(),
        last_backtrace.unwrap_or_default()
    );
}

/// A fresh in-memory server and a database opened against it.
#[derive(Clone)]
pub struct TestContext {
    server: MemoryServer,
    db: Database,
}

impl TestContext {
    pub fn new(server: MemoryServer, db: Database) -> Self {
        TestContext { server, db }
    }

    pub fn server(&self) -> &MemoryServer {
        &self.server
    }

    pub fn db(&self) -> &Database {
        &self.db
    }
}

pub fn create_test_context() -> DocLinkResult<TestContext> {
    let server = MemoryServer::new();
    for name in TEST_COLLECTIONS {
        server.create_collection(name)?;
    }
    let db = Database::builder().transport(server.clone()).open()?;
    Ok(TestContext::new(server, db))
}

/// Builds a context whose transport loses the matching requests described by `fault`.
pub fn create_flaky_test_context(fault: Fault) -> DocLinkResult<(TestContext, FlakyTransport)> {
    let ctx = create_test_context()?;
    let flaky = FlakyTransport::new(ctx.server().clone(), fault);
    let db = Database::builder().transport(flaky.clone()).open()?;
    Ok((TestContext::new(ctx.server().clone(), db), flaky))
}

/// Verifies the server holds no open cursors once a test finishes.
pub fn cleanup(ctx: TestContext) -> DocLinkResult<()> {
    let open = ctx.server().open_cursor_count();
    if open != 0 {
        eprintln!("Warning: {} cursors still open at the end of the test", open);
    }
    Ok(())
}

/// Where a simulated network failure strikes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    /// The request never reaches the server.
    BeforeDelivery,
    /// The server handles the request but the response is lost.
    AfterDelivery,
}

/// Which requests fail and how.
#[derive(Debug, Clone)]
pub struct Fault {
    method: Method,
    path_prefix: String,
    failures: Vec<usize>,
    point: FaultPoint,
}

impl Fault {
    /// Fails the requests matching `method` and `path_prefix` whose 1-based ordinal
    /// among matching requests is listed in `failures`.
    pub fn new(method: Method, path_prefix: &str, failures: &[usize], point: FaultPoint) -> Self {
        Fault {
            method,
            path_prefix: path_prefix.to_string(),
            failures: failures.to_vec(),
            point,
        }
    }
}

/// Wraps a [MemoryServer] and injects transient transport failures.
#[derive(Clone)]
pub struct FlakyTransport {
    server: MemoryServer,
    fault: Fault,
    state: std::sync::Arc<Mutex<FlakyState>>,
}

#[derive(Default)]
struct FlakyState {
    matched: usize,
    injected: usize,
}

impl FlakyTransport {
    pub fn new(server: MemoryServer, fault: Fault) -> Self {
        FlakyTransport {
            server,
            fault,
            state: Default::default(),
        }
    }

    /// Number of failures injected so far.
    pub fn injected(&self) -> usize {
        self.state.lock().injected
    }

    /// Number of requests that matched the fault's method and path.
    pub fn matched(&self) -> usize {
        self.state.lock().matched
    }
}

impl TransportProvider for FlakyTransport {
    fn execute(&self, request: Request) -> DocLinkResult<Response> {
        let fail = if request.method() == self.fault.method
            && request.path().starts_with(&self.fault.path_prefix)
        {
            let mut state = self.state.lock();
            state.matched += 1;
            let fail = self.fault.failures.contains(&state.matched);
            if fail {
                state.injected += 1;
            }
            fail
        } else {
            false
        };

        if !fail {
            return self.server.execute(request);
        }

        log::debug!("Injecting {:?} failure for {}", self.fault.point, request.path());
        match self.fault.point {
            FaultPoint::BeforeDelivery => Err(DocLinkError::transport("connection refused")),
            FaultPoint::AfterDelivery => {
                let _ = self.server.execute(request)?;
                Err(DocLinkError::transport("connection reset by peer"))
            }
        }
    }
}
