pub mod stream;
pub mod traits;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{
    config::FalConfig,
    error::{FluxError, Result},
    models::{GenerationResult, QueueStatus, RequestHandle, RequestPayload},
};

pub use traits::{EventStream, GenerationService};

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    request_id: String,
    #[serde(default)]
    status_url: Option<String>,
    #[serde(default)]
    response_url: Option<String>,
}

/// reqwest-backed client for the fal run and queue APIs.
#[derive(Clone)]
pub struct FalClient {
    client: Client,
    api_key: String,
    run_url: String,
    queue_url: String,
}

impl FalClient {
    pub fn new(config: &FalConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        Ok(Self {
            client: Client::new(),
            api_key,
            run_url: config.run_url.trim_end_matches('/').to_string(),
            queue_url: config.queue_url.trim_end_matches('/').to_string(),
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(header::AUTHORIZATION, format!("Key {}", self.api_key))
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(FluxError::ResponseError(format!(
            "service returned {}: {}",
            status, body
        )))
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let response = Self::check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| FluxError::ResponseError(e.to_string()))
    }

    /// Queue URLs address the app (`owner/app`), not the full endpoint path.
    fn app_id(endpoint: &str) -> String {
        endpoint.splitn(3, '/').take(2).collect::<Vec<_>>().join("/")
    }

    fn handle_for(&self, endpoint: &str, submitted: SubmitResponse) -> RequestHandle {
        let base = format!(
            "{}/{}/requests/{}",
            self.queue_url,
            Self::app_id(endpoint),
            submitted.request_id
        );

        RequestHandle {
            status_url: submitted
                .status_url
                .unwrap_or_else(|| format!("{}/status", base)),
            response_url: submitted.response_url.unwrap_or(base),
            request_id: submitted.request_id,
        }
    }

    async fn fetch_result(&self, handle: &RequestHandle) -> Result<GenerationResult> {
        let response = self
            .authorized(self.client.get(&handle.response_url))
            .send()
            .await?;
        Self::read_json(response).await
    }
}

#[async_trait]
impl GenerationService for FalClient {
    async fn run(&self, endpoint: &str, payload: &RequestPayload) -> Result<GenerationResult> {
        log::debug!("Running {} synchronously", endpoint);

        let response = self
            .authorized(self.client.post(format!("{}/{}", self.run_url, endpoint)))
            .json(payload)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn submit(&self, endpoint: &str, payload: &RequestPayload) -> Result<RequestHandle> {
        let response = self
            .authorized(self.client.post(format!("{}/{}", self.queue_url, endpoint)))
            .json(payload)
            .send()
            .await?;
        let submitted: SubmitResponse = Self::read_json(response).await?;
        let handle = self.handle_for(endpoint, submitted);

        log::debug!("Submitted request {} to {}", handle.request_id, endpoint);
        Ok(handle)
    }

    async fn status(&self, handle: &RequestHandle) -> Result<QueueStatus> {
        let response = self
            .authorized(self.client.get(&handle.status_url))
            .query(&[("logs", "1")])
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn result(&self, handle: &RequestHandle) -> Result<GenerationResult> {
        self.fetch_result(handle).await
    }

    async fn stream_status(&self, handle: &RequestHandle) -> Result<EventStream> {
        self.follow_status_stream(handle.clone()).await
    }
}
