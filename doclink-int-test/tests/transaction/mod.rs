mod stream_transaction_test;

use doclink::transaction::StreamTransactionOptions;

/// Options declaring `users` for writing, with implicit collections disallowed.
pub fn users_only() -> StreamTransactionOptions {
    StreamTransactionOptions::new()
        .write_collections(&["users"])
        .allow_implicit(false)
}
