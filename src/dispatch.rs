use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use crate::{
    error::{FluxError, Result},
    fal::GenerationService,
    models::{GenerationResult, QueueEvent, QueueMode, RequestPayload},
};

/// Executes single requests over the protocol selected by [`QueueMode`].
#[derive(Clone)]
pub struct Dispatcher {
    service: Arc<dyn GenerationService>,
    poll_interval: Duration,
    poll_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self {
            service,
            poll_interval: crate::models::DEFAULT_POLL_INTERVAL,
            poll_timeout: Some(crate::config::DEFAULT_POLL_TIMEOUT),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub async fn dispatch(
        &self,
        endpoint: &str,
        payload: &RequestPayload,
        mode: QueueMode,
    ) -> Result<GenerationResult> {
        match mode {
            QueueMode::Run => self.service.run(endpoint, payload).await,
            QueueMode::Submit => self.poll(endpoint, payload).await,
            QueueMode::Subscribe => self.stream(endpoint, payload).await,
        }
    }

    async fn poll(&self, endpoint: &str, payload: &RequestPayload) -> Result<GenerationResult> {
        let handle = self.service.submit(endpoint, payload).await?;

        let wait = async {
            loop {
                let status = self.service.status(&handle).await?;
                if status.is_completed() {
                    return self.service.result(&handle).await;
                }
                if let Some(position) = status.queue_position {
                    log::debug!("Request {} queued at position {}", handle.request_id, position);
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        with_deadline(self.poll_timeout, &handle.request_id, wait).await
    }

    async fn stream(&self, endpoint: &str, payload: &RequestPayload) -> Result<GenerationResult> {
        let handle = self.service.submit(endpoint, payload).await?;

        let wait = async {
            let mut events = self.service.stream_status(&handle).await?;
            while let Some(event) = events.next().await {
                match event? {
                    QueueEvent::Log(line) => log::info!("📜 {}", line),
                    QueueEvent::Completed(result) => return Ok(result),
                }
            }
            Err(FluxError::TransportError(format!(
                "subscription for request {} closed before a result arrived",
                handle.request_id
            )))
        };

        with_deadline(self.poll_timeout, &handle.request_id, wait).await
    }
}

async fn with_deadline<F>(deadline: Option<Duration>, request_id: &str, wait: F) -> Result<GenerationResult>
where
    F: std::future::Future<Output = Result<GenerationResult>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, wait)
            .await
            .map_err(|_| FluxError::Timeout {
                request_id: request_id.to_string(),
                waited: limit,
            })?,
        None => wait.await,
    }
}
