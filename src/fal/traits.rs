use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::Stream;

use crate::{
    error::Result,
    models::{GenerationResult, QueueEvent, QueueStatus, RequestHandle, RequestPayload},
};

pub type EventStream = Pin<Box<dyn Stream<Item = Result<QueueEvent>> + Send>>;

/// The three call shapes a generation endpoint offers.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn run(&self, endpoint: &str, payload: &RequestPayload) -> Result<GenerationResult>;

    async fn submit(&self, endpoint: &str, payload: &RequestPayload) -> Result<RequestHandle>;
    async fn status(&self, handle: &RequestHandle) -> Result<QueueStatus>;
    async fn result(&self, handle: &RequestHandle) -> Result<GenerationResult>;

    /// Follows an accepted request: yields log lines as they arrive and ends
    /// with the completed result.
    async fn stream_status(&self, handle: &RequestHandle) -> Result<EventStream>;

    async fn subscribe(&self, endpoint: &str, payload: &RequestPayload) -> Result<EventStream> {
        let handle = self.submit(endpoint, payload).await?;
        self.stream_status(&handle).await
    }
}
