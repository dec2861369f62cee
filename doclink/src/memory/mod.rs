//! An in-process server speaking the document, cursor and transaction API.
//!
//! [MemoryServer] implements [TransportProvider](crate::transport::TransportProvider),
//! so a [Database](crate::Database) can be opened against it without a network.

mod collections;
mod config;
mod cursors;
mod documents;
mod query;
mod server;
mod transactions;

pub use config::*;
pub use server::MemoryServer;
