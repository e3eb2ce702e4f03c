use std::collections::BTreeSet;

use crate::state::{
    saved_url_key, JobPhase, Notice, SavedRecord, SearchFailure, SearchJob, SearchProgress,
    SearchResult,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub query_input: String,
    pub search: SearchStatusView,
    pub results: Vec<ResultCardView>,
    pub saved: SavedListView,
    pub notice: Option<NoticeBanner>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchStatusView {
    /// `None` until the first submission.
    pub phase: Option<JobPhase>,
    pub query: Option<String>,
    pub progress: Option<SearchProgress>,
    pub failure: Option<SearchFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCardView {
    pub result: SearchResult,
    pub is_saved: bool,
    pub is_saving: bool,
    pub is_flagged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedRowView {
    pub record: SavedRecord,
    pub is_removing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SavedListView {
    pub loading: bool,
    pub rows: Vec<SavedRowView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeBanner {
    pub seq: u64,
    pub notice: Notice,
}

/// Pure presentation adapter: maps a job's results plus the saved-URL set
/// and the mid-flight sets to renderable cards. Results keep backend order.
pub fn result_cards(
    job: Option<&SearchJob>,
    saved_urls: &BTreeSet<String>,
    pending_saves: &BTreeSet<String>,
    flagged: &BTreeSet<String>,
) -> Vec<ResultCardView> {
    let Some(results) = job.and_then(|job| job.results.as_ref()) else {
        return Vec::new();
    };
    results
        .iter()
        .map(|result| {
            let key = saved_url_key(&result.image_url);
            ResultCardView {
                result: result.clone(),
                is_saved: saved_urls.contains(&key),
                is_saving: pending_saves.contains(&key),
                is_flagged: flagged.contains(&result.source_url),
            }
        })
        .collect()
}
