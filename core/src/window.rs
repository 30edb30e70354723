use crate::dates::DateLookup;
use crate::error::Result;
use crate::query::SortOrder;
use crate::DocId;
use roaring::RoaringBitmap;
use serde::Serialize;

/// Date bounds, ordering and page bounds applied to a matched set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowParams {
    /// Inclusive lower date bound.
    pub min_date: Option<String>,
    /// Inclusive upper date bound.
    pub max_date: Option<String>,
    pub sort_order: SortOrder,
    pub min_index: usize,
    /// Exclusive; `None` means through the end.
    pub max_index: Option<usize>,
}

/// One page of date-ordered ids plus the number of matches before paging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultPage {
    pub ids: Vec<DocId>,
    pub total: usize,
}

/// Filter `matches` by date, sort by date and cut out `[min_index, max_index)`.
///
/// Ties on date keep ascending id order in both directions, so the same
/// query always produces the same page. Every matched id must have a date;
/// a missing one fails the whole call.
pub fn window(matches: &RoaringBitmap, dates: &DateLookup, params: &WindowParams) -> Result<ResultPage> {
    let mut dated: Vec<(&str, DocId)> = Vec::with_capacity(matches.len() as usize);
    for doc_id in matches.iter() {
        let date = dates.require(doc_id)?;
        if params.min_date.as_deref().is_some_and(|min| date < min) {
            continue;
        }
        if params.max_date.as_deref().is_some_and(|max| date > max) {
            continue;
        }
        dated.push((date, doc_id));
    }

    // Ids come out of the bitmap ascending; a stable sort on date alone keeps that order for ties.
    match params.sort_order {
        SortOrder::Asc => dated.sort_by(|a, b| a.0.cmp(b.0)),
        SortOrder::Desc => dated.sort_by(|a, b| b.0.cmp(a.0)),
    }

    let total = dated.len();
    let end = params.max_index.map_or(total, |max| max.min(total));
    let start = params.min_index.min(end);
    let ids = dated[start..end].iter().map(|&(_, id)| id).collect();
    Ok(ResultPage { ids, total })
}
