//! # DocLink - Document Access for a Distributed Document Database
//!
//! DocLink is the document-access layer of a client for an ArangoDB-style
//! document database. It speaks the server's HTTP resource model through a
//! pluggable transport and gives typed access to documents, query cursors and
//! stream transactions.
//!
//! ## Key Features
//!
//! - **Revisions**: every stored document carries a server-assigned `_rev`; writes can be
//!   guarded by a revision precondition or a client version attribute
//! - **Overwrite Policies**: insert-or-conflict, ignore, replace, update and a strict conflict mode
//! - **Bulk Operations**: one request for many documents, with per-item results in input order
//! - **Cursors**: lazily paginated query results, with idempotent batch retry
//! - **Stream Transactions**: server-side transactions spanning several requests
//! - **In-Memory Server**: a complete emulator for tests and embedded use
//! - **Async**: a non-blocking surface behind the `async` feature
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use doclink::collection::{Document, DocumentCreateOptions, DocumentReadOptions};
//! use doclink::memory::MemoryServer;
//! use doclink::{doc, Database};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let server = MemoryServer::new();
//! server.create_collection("users")?;
//!
//! let db = Database::builder().transport(server).open()?;
//! let users = db.collection("users")?;
//!
//! let meta = users.create_document(&doc! { "_key": "alice", "age": 30 }, &DocumentCreateOptions::new())?;
//! let alice: Option<Document> = users.read_document("alice", &DocumentReadOptions::new())?;
//! assert_eq!(alice.and_then(|d| d.rev().map(String::from)), Some(meta.rev().to_string()));
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Pattern
//!
//! Handles such as [Database], [collection::DocumentCollection] and
//! [transaction::StreamTransaction] are cheap to clone. Clones share their state
//! through an `Arc`, so they can be handed to other threads freely.
//!
//! ## Module Organization
//!
//! - [`collection`] - Documents, collection handles and bulk results
//! - [`common`] - Values, constants and shared helpers
//! - [`codec`] - Document serialization
//! - [`cursor`] - Query options and result cursors
//! - [`database`] - Database facade
//! - [`doclink_builder`] - Builder for a [Database]
//! - [`doclink_config`] - Client configuration
//! - [`errors`] - Error types and result definitions
//! - [`memory`] - In-memory server emulator
//! - [`policy`] - Overwrite modes and revision preconditions
//! - [`transaction`] - Stream transactions
//! - [`transport`] - Request, response and transport abstractions
//! - `asynchronous` - Non-blocking surface (feature `async`)

pub mod codec;
pub mod collection;
pub mod common;
pub mod cursor;
pub mod database;
pub mod doclink_builder;
pub mod doclink_config;
pub mod errors;
pub mod memory;
pub mod policy;
pub mod transaction;
pub mod transport;

#[cfg(feature = "async")]
pub mod asynchronous;

pub use database::Database;
pub use doclink_builder::DocLinkBuilder;
pub use doclink_config::DocLinkConfig;
