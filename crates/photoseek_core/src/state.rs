use std::collections::{BTreeMap, BTreeSet};

use crate::view_model::{
    result_cards, AppViewModel, NoticeBanner, SavedListView, SavedRowView, SearchStatusView,
};

pub type JobId = u64;

/// Fixed page size sent with every search submission.
pub const DEFAULT_RESULT_COUNT: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub id: String,
    pub image_url: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub author: Author,
    pub source_url: String,
    pub provider: String,
}

/// Latest progress report for the active job. Last write wins; the feed is
/// trusted as-is, including percent regressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchProgress {
    pub percent: u8,
    pub tag: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Pending,
    Streaming,
    Completed,
    Failed,
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFailure {
    /// Empty query, rejected before any network call.
    InvalidQuery,
    /// The job could not be created.
    Submission { message: String },
    /// The stream reported an error or the transport dropped.
    Stream { message: String },
}

/// One server-side search execution, tracked by a locally assigned id.
/// The server's opaque job identifier lives in `stream_key` once known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchJob {
    pub id: JobId,
    pub query: String,
    pub phase: JobPhase,
    pub stream_key: Option<String>,
    pub progress: Option<SearchProgress>,
    pub results: Option<Vec<SearchResult>>,
    pub failure: Option<SearchFailure>,
}

impl SearchJob {
    fn new(id: JobId, query: String) -> Self {
        Self {
            id,
            query,
            phase: JobPhase::Pending,
            stream_key: None,
            progress: None,
            results: None,
            failure: None,
        }
    }

    fn is_active(&self) -> bool {
        matches!(self.phase, JobPhase::Pending | JobPhase::Streaming)
    }
}

/// A photo the signed-in principal has persisted. `id` is `None` for a
/// record recovered from a 409 conflict; the next list fetch fills it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedRecord {
    pub id: Option<u64>,
    pub image_url: String,
    pub description: Option<String>,
    pub provider: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PhotoSaveFailed { message: String },
    PhotoRemoveFailed { message: String },
    PostSuspended,
    SuspendFailed,
}

/// Membership key for the saved-photo set. Saved photos are keyed by image
/// URL (an external contract), so semantically equal URLs must collapse to
/// one key: scheme and host are case-insensitive per the URL standard.
/// Unparseable input falls back to the trimmed string.
pub fn saved_url_key(image_url: &str) -> String {
    let trimmed = image_url.trim();
    match url::Url::parse(trimmed) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct SavedState {
    records: BTreeMap<String, SavedRecord>,
    pending_saves: BTreeSet<String>,
    pending_removes: BTreeSet<u64>,
    loading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    query_input: String,
    next_job_id: JobId,
    current: Option<SearchJob>,
    previous: Option<SearchJob>,
    last_rejection: Option<SearchFailure>,
    saved: SavedState,
    flagged: BTreeSet<String>,
    notice: Option<(u64, Notice)>,
    next_notice_seq: u64,
    dirty: bool,
}

pub(crate) struct NewSearch {
    pub job_id: JobId,
    pub close_stream: Option<JobId>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let search = SearchStatusView {
            phase: self.current.as_ref().map(|job| job.phase),
            query: self.current.as_ref().map(|job| job.query.clone()),
            progress: self.current.as_ref().and_then(|job| job.progress.clone()),
            failure: self
                .last_rejection
                .clone()
                .or_else(|| self.current.as_ref().and_then(|job| job.failure.clone())),
        };
        let saved_urls = self.saved_photo_urls();
        AppViewModel {
            query_input: self.query_input.clone(),
            search,
            results: result_cards(
                self.current.as_ref(),
                &saved_urls,
                &self.saved.pending_saves,
                &self.flagged,
            ),
            saved: SavedListView {
                loading: self.saved.loading,
                rows: self
                    .saved
                    .records
                    .values()
                    .map(|record| SavedRowView {
                        record: record.clone(),
                        is_removing: record
                            .id
                            .is_some_and(|id| self.saved.pending_removes.contains(&id)),
                    })
                    .collect(),
            },
            notice: self
                .notice
                .as_ref()
                .map(|(seq, notice)| NoticeBanner {
                    seq: *seq,
                    notice: notice.clone(),
                }),
            dirty: self.dirty,
        }
    }

    pub fn query_input(&self) -> &str {
        &self.query_input
    }

    /// The visible job, whatever its phase.
    pub fn current_job(&self) -> Option<&SearchJob> {
        self.current.as_ref()
    }

    /// The most recently superseded (or otherwise displaced) job.
    pub fn previous_job(&self) -> Option<&SearchJob> {
        self.previous.as_ref()
    }

    pub fn is_saved(&self, image_url: &str) -> bool {
        self.saved.records.contains_key(&saved_url_key(image_url))
    }

    /// Derived set of saved image-URL keys, the only shape the UI needs.
    pub fn saved_photo_urls(&self) -> BTreeSet<String> {
        self.saved.records.keys().cloned().collect()
    }

    pub fn consume_dirty(&mut self) -> bool {
        let was_dirty = self.dirty;
        self.dirty = false;
        was_dirty
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    // --- search orchestration ---

    pub(crate) fn edit_query(&mut self, text: String) {
        if self.query_input != text {
            self.query_input = text;
            self.mark_dirty();
        }
    }

    pub(crate) fn reject_invalid_query(&mut self) {
        self.last_rejection = Some(SearchFailure::InvalidQuery);
        self.mark_dirty();
    }

    /// Supersede whatever job is in flight and open a fresh one in `Pending`.
    /// Returns the id of a stream that must be closed, if one was open.
    pub(crate) fn begin_search(&mut self, query: String) -> NewSearch {
        self.last_rejection = None;
        let close_stream = self.displace_current();
        self.next_job_id += 1;
        let job_id = self.next_job_id;
        self.current = Some(SearchJob::new(job_id, query));
        self.mark_dirty();
        NewSearch {
            job_id,
            close_stream,
        }
    }

    fn displace_current(&mut self) -> Option<JobId> {
        let mut job = self.current.take()?;
        // Only a Streaming job holds an open stream handle.
        let close_stream = matches!(job.phase, JobPhase::Streaming).then_some(job.id);
        if job.is_active() {
            job.phase = JobPhase::Superseded;
        }
        self.previous = Some(job);
        close_stream
    }

    /// Apply a submission ack. Returns false for a stale ack (the job was
    /// superseded while the request was in flight); no stream may be opened
    /// for a stale ack.
    pub(crate) fn accept_submission(&mut self, job_id: JobId, stream_key: String) -> bool {
        match self.current.as_mut() {
            Some(job) if job.id == job_id && job.phase == JobPhase::Pending => {
                job.stream_key = Some(stream_key);
                job.phase = JobPhase::Streaming;
                self.mark_dirty();
                true
            }
            _ => false,
        }
    }

    pub(crate) fn reject_submission(&mut self, job_id: JobId, message: String) -> bool {
        match self.current.as_mut() {
            Some(job) if job.id == job_id && job.phase == JobPhase::Pending => {
                job.phase = JobPhase::Failed;
                job.failure = Some(SearchFailure::Submission { message });
                self.mark_dirty();
                true
            }
            _ => false,
        }
    }

    pub(crate) fn apply_progress(&mut self, job_id: JobId, progress: SearchProgress) {
        if let Some(job) = self.current.as_mut() {
            if job.id == job_id && job.phase == JobPhase::Streaming {
                job.progress = Some(progress);
                self.mark_dirty();
            }
        }
    }

    /// Apply a `done` event. Returns true when the event belonged to the
    /// active job (the caller then closes the stream).
    pub(crate) fn complete_search(&mut self, job_id: JobId, results: Vec<SearchResult>) -> bool {
        match self.current.as_mut() {
            Some(job) if job.id == job_id && job.phase == JobPhase::Streaming => {
                job.results = Some(results);
                job.progress = None;
                job.phase = JobPhase::Completed;
                self.mark_dirty();
                true
            }
            _ => false,
        }
    }

    /// Apply a stream `error` event or transport failure. Last-known results
    /// are kept; progress is cleared.
    pub(crate) fn fail_stream(&mut self, job_id: JobId, message: String) -> bool {
        match self.current.as_mut() {
            Some(job) if job.id == job_id && job.phase == JobPhase::Streaming => {
                job.failure = Some(SearchFailure::Stream { message });
                job.progress = None;
                job.phase = JobPhase::Failed;
                self.mark_dirty();
                true
            }
            _ => false,
        }
    }

    // --- saved-resource store ---

    /// Start the one-per-sign-in list fetch. Returns false when a fetch is
    /// already in flight.
    pub(crate) fn begin_saved_load(&mut self) -> bool {
        if self.saved.loading {
            return false;
        }
        self.saved.loading = true;
        self.mark_dirty();
        true
    }

    /// Replace the entire membership set with the server's list.
    pub(crate) fn replace_saved(&mut self, records: Vec<SavedRecord>) {
        self.saved.records = records
            .into_iter()
            .map(|record| (saved_url_key(&record.image_url), record))
            .collect();
        self.saved.loading = false;
        self.mark_dirty();
    }

    /// List fetch failed: degrade to an empty set, no error surfaced.
    pub(crate) fn clear_saved_after_load_failure(&mut self) {
        self.saved.records.clear();
        self.saved.loading = false;
        self.mark_dirty();
    }

    /// Admit a save request. Returns false (no server call) when the photo
    /// is already a member or a save for it is already in flight.
    pub(crate) fn begin_save(&mut self, image_url: &str) -> bool {
        let key = saved_url_key(image_url);
        if self.saved.records.contains_key(&key) || self.saved.pending_saves.contains(&key) {
            return false;
        }
        self.saved.pending_saves.insert(key);
        self.mark_dirty();
        true
    }

    pub(crate) fn confirm_save(&mut self, requested_url: &str, record: SavedRecord) {
        self.saved.pending_saves.remove(&saved_url_key(requested_url));
        self.saved
            .records
            .insert(saved_url_key(&record.image_url), record);
        self.mark_dirty();
    }

    /// A create hit 409: the photo already exists server-side. Recorded as
    /// saved with an unknown id; not an error.
    pub(crate) fn recover_save_conflict(&mut self, image_url: &str) {
        let key = saved_url_key(image_url);
        self.saved.pending_saves.remove(&key);
        self.saved.records.entry(key).or_insert_with(|| SavedRecord {
            id: None,
            image_url: image_url.trim().to_string(),
            description: None,
            provider: None,
            created_at: None,
        });
        self.mark_dirty();
    }

    pub(crate) fn fail_save(&mut self, image_url: &str) {
        self.saved.pending_saves.remove(&saved_url_key(image_url));
        self.mark_dirty();
    }

    /// Admit a remove request. Returns false when no such record exists or
    /// a remove for it is already in flight.
    pub(crate) fn begin_remove(&mut self, resource_id: u64) -> bool {
        let known = self
            .saved
            .records
            .values()
            .any(|record| record.id == Some(resource_id));
        if !known || self.saved.pending_removes.contains(&resource_id) {
            return false;
        }
        self.saved.pending_removes.insert(resource_id);
        self.mark_dirty();
        true
    }

    pub(crate) fn confirm_remove(&mut self, resource_id: u64) {
        self.saved.pending_removes.remove(&resource_id);
        self.saved
            .records
            .retain(|_, record| record.id != Some(resource_id));
        self.mark_dirty();
    }

    pub(crate) fn fail_remove(&mut self, resource_id: u64) {
        self.saved.pending_removes.remove(&resource_id);
        self.mark_dirty();
    }

    /// Sign-out teardown: the saved store belongs to the principal.
    pub(crate) fn clear_saved(&mut self) {
        self.saved = SavedState::default();
        self.mark_dirty();
    }

    // --- moderation flags ---

    pub(crate) fn is_flagged(&self, source_url: &str) -> bool {
        self.flagged.contains(source_url)
    }

    pub(crate) fn mark_flagged(&mut self, source_url: String) {
        self.flagged.insert(source_url);
        self.mark_dirty();
    }

    // --- transient notices ---

    pub(crate) fn raise_notice(&mut self, notice: Notice) -> u64 {
        self.next_notice_seq += 1;
        let seq = self.next_notice_seq;
        self.notice = Some((seq, notice));
        self.mark_dirty();
        seq
    }

    /// Dismiss a notice by sequence number; a stale timer firing after a
    /// newer notice was raised is ignored.
    pub(crate) fn dismiss_notice(&mut self, seq: u64) {
        if self.notice.as_ref().is_some_and(|(current, _)| *current == seq) {
            self.notice = None;
            self.mark_dirty();
        }
    }
}
