use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::stream::{run_event_stream, EventSink};
use crate::types::{
    ApiError, ApiErrorKind, ClientEvent, JobId, JobTicket, SavedResource, StreamEvent,
};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    /// Bearer credential from the external auth collaborator; saved-photo
    /// and moderation calls go out unauthenticated without it.
    pub bearer_token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            bearer_token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateSavedRequest {
    pub image_url: String,
    pub description: Option<String>,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagRequest {
    pub source_url: String,
    pub provider: String,
    pub reason: Option<String>,
}

/// Outcome of a create call; a 409 is a distinct success-shaped case, not
/// an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(SavedResource),
    AlreadySaved,
}

#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn submit_search(&self, query: &str, result_count: u32) -> Result<JobTicket, ApiError>;

    async fn list_saved(&self) -> Result<Vec<SavedResource>, ApiError>;

    async fn create_saved(&self, request: &CreateSavedRequest) -> Result<CreateOutcome, ApiError>;

    async fn delete_saved(&self, resource_id: u64) -> Result<(), ApiError>;

    async fn submit_flag(&self, request: &FlagRequest) -> Result<(), ApiError>;

    /// Consume the job's event stream, emitting every decoded event into
    /// `sink` until the transport ends or `cancel` fires. All failures are
    /// reported through the sink; retry policy belongs to the caller.
    async fn stream_events(
        &self,
        job_id: JobId,
        stream_key: &str,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    );
}

pub struct ReqwestBackend {
    settings: ApiSettings,
    client: reqwest::Client,
    /// Separate client for the event stream: no total request timeout, the
    /// stream stays open for the whole job.
    stream_client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(ApiErrorKind::Network, err.to_string()))?;
        let stream_client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ApiError::new(ApiErrorKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            client,
            stream_client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Url::parse(&self.settings.base_url)
            .and_then(|base| base.join(path))
            .map_err(|err| ApiError::new(ApiErrorKind::InvalidBaseUrl, err.to_string()))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.settings.bearer_token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn submit_search(&self, query: &str, result_count: u32) -> Result<JobTicket, ApiError> {
        let url = self.endpoint("/api/search")?;
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "query": query, "result_count": result_count }))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response)?;
        response
            .json::<JobTicket>()
            .await
            .map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string()))
    }

    async fn list_saved(&self) -> Result<Vec<SavedResource>, ApiError> {
        let url = self.endpoint("/api/user/photos")?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response)?;
        response
            .json::<Vec<SavedResource>>()
            .await
            .map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string()))
    }

    async fn create_saved(&self, request: &CreateSavedRequest) -> Result<CreateOutcome, ApiError> {
        let url = self.endpoint("/api/user/photos")?;
        let response = self
            .authorize(self.client.post(url).json(request))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        if response.status() == reqwest::StatusCode::CONFLICT {
            return Ok(CreateOutcome::AlreadySaved);
        }
        let response = check_status(response)?;
        let resource = response
            .json::<SavedResource>()
            .await
            .map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string()))?;
        Ok(CreateOutcome::Created(resource))
    }

    async fn delete_saved(&self, resource_id: u64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/api/user/photos/{resource_id}"))?;
        let response = self
            .authorize(self.client.delete(url))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response).map(|_| ())
    }

    async fn submit_flag(&self, request: &FlagRequest) -> Result<(), ApiError> {
        let url = self.endpoint("/api/blacklist/suspend")?;
        let response = self
            .authorize(self.client.post(url).json(request))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response).map(|_| ())
    }

    async fn stream_events(
        &self,
        job_id: JobId,
        stream_key: &str,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) {
        let url = match self.endpoint(&format!("/api/search/{stream_key}/events")) {
            Ok(url) => url,
            Err(error) => {
                sink.emit(ClientEvent::Stream {
                    job_id,
                    event: StreamEvent::Failed {
                        message: error.to_string(),
                    },
                });
                return;
            }
        };
        run_event_stream(&self.stream_client, url, job_id, sink, cancel).await;
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::new(
            ApiErrorKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ))
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(ApiErrorKind::Timeout, err.to_string());
    }
    ApiError::new(ApiErrorKind::Network, err.to_string())
}
