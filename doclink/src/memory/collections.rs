use std::collections::BTreeMap;

use crate::collection::Document;

/// A stored document with its insertion sequence number.
///
/// The sequence number keeps query results in insertion order; replacing a
/// document keeps its number.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StoredDocument {
    pub(crate) seq: u64,
    pub(crate) document: Document,
}

/// Uncommitted writes of one transaction to one collection; `None` marks a delete.
pub(crate) type Overlay = BTreeMap<String, Option<StoredDocument>>;

#[derive(Debug, Default)]
pub(crate) struct StoredCollection {
    documents: BTreeMap<String, StoredDocument>,
    sequence: u64,
    key_counter: u64,
}

impl StoredCollection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.documents.len()
    }

    /// Applies the writes of a committed transaction.
    pub(crate) fn apply(&mut self, overlay: Overlay) {
        for (key, entry) in overlay {
            match entry {
                Some(stored) => {
                    self.documents.insert(key, stored);
                }
                None => {
                    self.documents.remove(&key);
                }
            }
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

/// The documents of a collection as one request sees them.
///
/// Without a transaction the scope reads and writes the committed documents. Inside
/// a transaction, reads see the transaction's own writes on top of the committed
/// state and writes go to the transaction's overlay only.
pub(crate) struct Scope<'a> {
    name: &'a str,
    collection: &'a mut StoredCollection,
    overlay: Option<&'a mut Overlay>,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(
        name: &'a str,
        collection: &'a mut StoredCollection,
        overlay: Option<&'a mut Overlay>,
    ) -> Self {
        Scope {
            name,
            collection,
            overlay,
        }
    }

    pub(crate) fn name(&self) -> &str {
        self.name
    }

    pub(crate) fn get(&self, key: &str) -> Option<&Document> {
        self.stored(key).map(|stored| &stored.document)
    }

    /// Stores a document under `key`, inserting or overwriting.
    pub(crate) fn put(&mut self, key: &str, document: Document) {
        let seq = match self.stored(key) {
            Some(stored) => stored.seq,
            None => self.collection.next_seq(),
        };
        let stored = StoredDocument { seq, document };
        match self.overlay.as_deref_mut() {
            Some(overlay) => {
                overlay.insert(key.to_string(), Some(stored));
            }
            None => {
                self.collection.documents.insert(key.to_string(), stored);
            }
        }
    }

    pub(crate) fn remove(&mut self, key: &str) {
        match self.overlay.as_deref_mut() {
            Some(overlay) => {
                overlay.insert(key.to_string(), None);
            }
            None => {
                self.collection.documents.remove(key);
            }
        }
    }

    /// Visible documents in insertion order.
    pub(crate) fn documents(&self) -> Vec<&Document> {
        let mut visible: BTreeMap<&str, &StoredDocument> = self
            .collection
            .documents
            .iter()
            .map(|(key, stored)| (key.as_str(), stored))
            .collect();

        if let Some(overlay) = self.overlay.as_deref() {
            for (key, entry) in overlay {
                match entry {
                    Some(stored) => {
                        visible.insert(key.as_str(), stored);
                    }
                    None => {
                        visible.remove(key.as_str());
                    }
                }
            }
        }

        let mut documents: Vec<&StoredDocument> = visible.into_values().collect();
        documents.sort_by_key(|stored| stored.seq);
        documents.into_iter().map(|stored| &stored.document).collect()
    }

    /// Generates a numeric key unused in committed and uncommitted state.
    pub(crate) fn generate_key(&mut self) -> String {
        loop {
            self.collection.key_counter += 1;
            let key = self.collection.key_counter.to_string();
            let pending = self
                .overlay
                .as_deref()
                .map(|overlay| overlay.contains_key(&key))
                .unwrap_or(false);
            if !pending && !self.collection.documents.contains_key(&key) {
                return key;
            }
        }
    }

    fn stored(&self, key: &str) -> Option<&StoredDocument> {
        if let Some(overlay) = self.overlay.as_deref() {
            if let Some(entry) = overlay.get(key) {
                return entry.as_ref();
            }
        }
        self.collection.documents.get(key)
    }
}
