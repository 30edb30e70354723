use roaring::RoaringBitmap;
use std::collections::HashMap;

/// Immutable term -> document-set mapping over the universe `[0, num_docs)`.
///
/// Keys are case-folded the same way the query tokenizer folds terms, so a
/// lookup with a tokenizer-produced term always hits the right entry.
#[derive(Debug, Default)]
pub struct PostingStore {
    postings: HashMap<String, RoaringBitmap>,
    num_docs: u32,
}

impl PostingStore {
    /// Build a store from raw `(term, set)` pairs. Terms that fold to the same
    /// key are unioned. Ids at or above `num_docs` are dropped.
    pub fn new<I, S>(num_docs: u32, terms: I) -> Self
    where
        I: IntoIterator<Item = (S, RoaringBitmap)>,
        S: AsRef<str>,
    {
        let mut postings: HashMap<String, RoaringBitmap> = HashMap::new();
        for (term, mut set) in terms {
            set.remove_range(num_docs..);
            *postings.entry(fold_term(term.as_ref())).or_default() |= set;
        }
        Self { postings, num_docs }
    }

    pub fn num_docs(&self) -> u32 { self.num_docs }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    /// Posting set for an already-folded term, `None` if the term never occurs.
    pub fn get(&self, term: &str) -> Option<&RoaringBitmap> {
        self.postings.get(term)
    }

    /// Like [`get`](Self::get) but maps an absent term to the empty set.
    pub fn lookup(&self, term: &str) -> RoaringBitmap {
        self.get(term).cloned().unwrap_or_default()
    }

    /// Every id in the universe.
    pub fn universe(&self) -> RoaringBitmap {
        let mut all = RoaringBitmap::new();
        all.insert_range(0..self.num_docs);
        all
    }

    /// `[0, num_docs) \ set`
    pub fn complement(&self, set: &RoaringBitmap) -> RoaringBitmap {
        self.universe() - set
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &RoaringBitmap)> {
        self.postings.iter().map(|(t, s)| (t.as_str(), s))
    }
}

/// Case folding shared by the store and the query tokenizer.
pub fn fold_term(term: &str) -> String {
    term.to_uppercase()
}
