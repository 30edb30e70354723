use crate::DocId;
use thiserror::Error;

/// Every way a query can fail. No variant carries a partial result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Tokenizer or evaluator rejected the expression.
    #[error("malformed query: {0}")]
    MalformedQuery(String),

    /// Unsupported `sort_by` / `sort_order` value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A matched document has no entry in the date lookup.
    #[error("index inconsistency: document {doc_id} has no date")]
    StoreInconsistency { doc_id: DocId },

    /// The document store failed or timed out.
    #[error("document store failure: {0}")]
    Fetch(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        SearchError::MalformedQuery(msg.into())
    }

    /// Short message handed back to API callers.
    pub fn public_message(&self) -> String {
        match self {
            SearchError::MalformedQuery(_) => "invalid query".to_string(),
            SearchError::InvalidConfig(_) | SearchError::StoreInconsistency { .. } => self.to_string(),
            SearchError::Fetch(_) => "document store failure".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_messages_separate_query_and_store_failures() {
        assert_eq!(SearchError::malformed("x").public_message(), "invalid query");
        assert_eq!(SearchError::Fetch("timeout".into()).public_message(), "document store failure");
        assert_eq!(
            SearchError::StoreInconsistency { doc_id: 7 }.public_message(),
            "index inconsistency: document 7 has no date"
        );
    }
}
