//! Photoseek client: backend IO and the search progress stream.
mod api;
mod handle;
mod stream;
mod types;

pub use api::{ApiSettings, Backend, CreateOutcome, CreateSavedRequest, FlagRequest, ReqwestBackend};
pub use handle::ClientHandle;
pub use stream::{ChannelEventSink, EventSink, SseDecoder};
pub use types::{
    ApiError, ApiErrorKind, Author, ClientEvent, JobId, JobTicket, SavedResource, SearchResult,
    StreamEvent, StreamProgress,
};
