//! Request validation and the query pipeline:
//! tokenize -> evaluate -> window.

use crate::dates::DateLookup;
use crate::error::{Result, SearchError};
use crate::eval::evaluate;
use crate::index::PostingStore;
use crate::tokenizer::tokenize;
use crate::window::{window, ResultPage, WindowParams};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    Date,
}

impl FromStr for SortBy {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "date" => Ok(SortBy::Date),
            other => Err(SearchError::InvalidConfig(format!("unsupported sort_by: {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(SearchError::InvalidConfig(format!("unsupported sort_order: {other:?}"))),
        }
    }
}

/// A search request as supplied by a caller, before validation.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub min_index: usize,
    pub max_index: Option<usize>,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), ..Default::default() }
    }

    /// Check the sort options and turn the request into window parameters.
    pub fn validate(&self) -> Result<WindowParams> {
        let SortBy::Date = self.sort_by.as_deref().map_or(Ok(SortBy::default()), SortBy::from_str)?;
        let sort_order = self.sort_order.as_deref().map_or(Ok(SortOrder::default()), SortOrder::from_str)?;
        Ok(WindowParams {
            min_date: self.min_date.clone(),
            max_date: self.max_date.clone(),
            sort_order,
            min_index: self.min_index,
            max_index: self.max_index,
        })
    }
}

/// The immutable data every query runs against. Built once, shared by reference.
#[derive(Debug, Default)]
pub struct SearchIndex {
    pub postings: PostingStore,
    pub dates: DateLookup,
}

impl SearchIndex {
    pub fn new(postings: PostingStore, dates: DateLookup) -> Self {
        Self { postings, dates }
    }

    pub fn num_docs(&self) -> u32 { self.postings.num_docs() }
}

/// Run one request end to end and return the page of ids to fetch.
pub fn run_query(index: &SearchIndex, request: &SearchRequest) -> Result<ResultPage> {
    let params = request.validate()?;
    let tokens = tokenize(&request.query);
    tracing::debug!(query = %request.query, tokens = tokens.len(), "evaluating boolean query");
    let matches = evaluate(&tokens, &index.postings)?;
    let page = window(&matches, &index.dates, &params)?;
    tracing::debug!(matched = matches.len(), total = page.total, page = page.ids.len(), "query windowed");
    Ok(page)
}
