//! Photoseek core: pure state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    saved_url_key, AppState, Author, JobId, JobPhase, Notice, SavedRecord, SearchFailure,
    SearchJob, SearchProgress, SearchResult, DEFAULT_RESULT_COUNT,
};
pub use update::update;
pub use view_model::{
    result_cards, AppViewModel, NoticeBanner, ResultCardView, SavedListView, SavedRowView,
    SearchStatusView,
};
