use crate::error::{Result, SearchError};
use crate::DocId;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Source of full document bodies, keyed by id.
///
/// Implementations return documents in the order requested and skip ids
/// they have no document for. Any other failure is [`SearchError::Fetch`].
pub trait DocumentStore: Send + Sync {
    fn fetch(&self, ids: &[DocId]) -> Result<Vec<Value>>;
}

/// Documents stored as one JSON file per id: `{root}/docs/{id}.json`.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    dir: PathBuf,
}

impl FsDocumentStore {
    pub fn new<P: AsRef<Path>>(index_root: P) -> Self {
        Self { dir: index_root.as_ref().join("docs") }
    }

    pub fn path_for(&self, doc_id: DocId) -> PathBuf {
        self.dir.join(format!("{doc_id}.json"))
    }

    /// A single document, `None` if it is not stored.
    pub fn get(&self, doc_id: DocId) -> Result<Option<Value>> {
        let path = self.path_for(doc_id);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SearchError::Fetch(format!("{}: {e}", path.display()))),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| SearchError::Fetch(format!("{}: {e}", path.display())))
    }
}

impl DocumentStore for FsDocumentStore {
    fn fetch(&self, ids: &[DocId]) -> Result<Vec<Value>> {
        let mut docs = Vec::with_capacity(ids.len());
        for &doc_id in ids {
            match self.get(doc_id)? {
                Some(doc) => docs.push(doc),
                None => tracing::debug!(doc_id, "document not found in store"),
            }
        }
        Ok(docs)
    }
}
