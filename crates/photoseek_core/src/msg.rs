use crate::state::{JobId, SavedRecord, SearchResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the query input box (debounced text).
    QueryEdited(String),
    /// User submitted the current query for a fresh search job.
    SearchSubmitted,
    /// Backend acknowledged a submission and named its event stream.
    SearchAccepted { job_id: JobId, stream_key: String },
    /// The submission call failed; no job was created server-side.
    SearchRejected { job_id: JobId, message: String },
    /// Progress event from a job's stream.
    StreamProgress {
        job_id: JobId,
        percent: u8,
        tag: String,
    },
    /// Completion event carrying the backend-ranked results.
    StreamCompleted {
        job_id: JobId,
        results: Vec<SearchResult>,
    },
    /// Error event on the stream, or the transport dropped.
    StreamFailed { job_id: JobId, message: String },
    /// Principal signed in; the saved list is fetched once per transition.
    SignedIn,
    /// Principal signed out; per-user state is torn down.
    SignedOut,
    /// User asked for a fresh copy of the saved list.
    SavedRefreshRequested,
    SavedListLoaded(Vec<SavedRecord>),
    SavedListFailed { message: String },
    /// User asked to save a search result to their collection.
    SaveRequested { result: SearchResult },
    SaveConfirmed {
        image_url: String,
        record: SavedRecord,
    },
    /// The create hit a 409: already saved, treated as success.
    SaveConflicted { image_url: String },
    SaveFailed { image_url: String, message: String },
    RemoveRequested { resource_id: u64 },
    RemoveConfirmed { resource_id: u64 },
    RemoveFailed { resource_id: u64, message: String },
    /// User flagged a result for moderation.
    FlagSubmitted {
        source_url: String,
        provider: String,
    },
    FlagAccepted { source_url: String },
    FlagFailed { source_url: String },
    /// Auto-dismiss timer fired for a transient notice.
    NoticeDismissed { seq: u64 },
    /// Fallback for placeholder wiring.
    NoOp,
}
