//! Stream transactions: server-side transactions spanning independent requests,
//! referenced by id.

mod stream_transaction;
mod transaction_options;

pub use stream_transaction::{StreamTransaction, StreamTransactionStatus, TransactionEntity};
pub(crate) use stream_transaction::{
    abort, begin, commit, list, status_of, TransactionEnvelope, TransactionListEnvelope,
};
pub use transaction_options::StreamTransactionOptions;
pub(crate) use transaction_options::BeginTransactionRequest;
