use crate::error::{Result, SearchError};
use crate::DocId;

/// Immutable doc id -> date table, stored densely by id.
///
/// Dates are kept as strings in a lexicographically sortable format
/// (`YYYY-MM-DD`), so string order is chronological order.
#[derive(Debug, Default)]
pub struct DateLookup {
    dates: Vec<Option<Box<str>>>,
}

impl DateLookup {
    /// Table covering ids `[0, num_docs)` with every entry absent.
    pub fn with_universe(num_docs: u32) -> Self {
        Self { dates: vec![None; num_docs as usize] }
    }

    pub fn from_entries<I, S>(num_docs: u32, entries: I) -> Self
    where
        I: IntoIterator<Item = (DocId, S)>,
        S: Into<Box<str>>,
    {
        let mut lookup = Self::with_universe(num_docs);
        for (doc_id, date) in entries {
            lookup.set(doc_id, date);
        }
        lookup
    }

    /// Only used while the table is being built; ids outside the universe are ignored.
    pub(crate) fn set(&mut self, doc_id: DocId, date: impl Into<Box<str>>) {
        if let Some(slot) = self.dates.get_mut(doc_id as usize) {
            *slot = Some(date.into());
        }
    }

    pub fn get(&self, doc_id: DocId) -> Option<&str> {
        self.dates.get(doc_id as usize).and_then(|d| d.as_deref())
    }

    /// Date of a matched document. A missing entry means the offline build
    /// produced an index and date table that disagree.
    pub fn require(&self, doc_id: DocId) -> Result<&str> {
        self.get(doc_id).ok_or(SearchError::StoreInconsistency { doc_id })
    }

    /// Number of ids that have a date.
    pub fn len(&self) -> usize {
        self.dates.iter().filter(|d| d.is_some()).count()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn universe(&self) -> usize { self.dates.len() }

    pub fn iter(&self) -> impl Iterator<Item = (DocId, &str)> {
        self.dates
            .iter()
            .enumerate()
            .filter_map(|(id, d)| d.as_deref().map(|d| (id as DocId, d)))
    }
}
