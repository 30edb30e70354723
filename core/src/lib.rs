pub mod dates;
pub mod docstore;
pub mod error;
pub mod eval;
pub mod index;
pub mod persist;
pub mod query;
pub mod tokenizer;
pub mod window;

pub use dates::DateLookup;
pub use docstore::{DocumentStore, FsDocumentStore};
pub use error::{Result, SearchError};
pub use eval::evaluate;
pub use index::PostingStore;
pub use query::{run_query, SearchIndex, SearchRequest, SortBy, SortOrder};
pub use tokenizer::{tokenize, Token};
pub use window::{window, ResultPage, WindowParams};

pub type DocId = u32;
