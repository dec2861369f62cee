mod cursor_retry_test;
mod cursor_test;

use doclink::collection::{DocumentCollection, DocumentCreateOptions};
use doclink::doc;
use doclink::errors::DocLinkResult;

/// Inserts `count` documents numbered from zero.
pub fn seed(collection: &DocumentCollection, count: usize) -> DocLinkResult<()> {
    let documents = (0..count).map(|n| doc! { "n": n }).collect::<Vec<_>>();
    let result = collection.create_documents(&documents, &DocumentCreateOptions::new())?;
    assert!(!result.has_errors());
    Ok(())
}
