use std::path::PathBuf;

use futures::{stream, StreamExt};

use crate::{
    dispatch::Dispatcher,
    download::MediaDownloader,
    error::Result,
    models::{GenerationResult, QueueMode, RequestPayload},
};

/// `count` homogeneous requests for one prompt.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub endpoint: String,
    pub payload: RequestPayload,
    pub count: usize,
    pub seed: Option<i64>,
    pub mode: QueueMode,
    /// Media is downloaded here as each request completes; `None` skips downloads.
    pub output_dir: Option<PathBuf>,
}

impl BatchPlan {
    /// Payload for the request at `index`, with its derived seed.
    pub fn payload_for(&self, index: usize) -> RequestPayload {
        match self.seed {
            Some(seed) => self.payload.with_seed(seed.wrapping_add(index as i64)),
            None => self.payload.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Successful results in completion order.
    pub results: Vec<GenerationResult>,
    pub failed: usize,
}

/// Runs every request of `plan` with at most `max_concurrency` in flight.
/// A failed request is logged and counted; it never stops its siblings.
pub async fn generate_batch(
    dispatcher: &Dispatcher,
    downloader: &MediaDownloader,
    plan: &BatchPlan,
    max_concurrency: usize,
) -> BatchOutcome {
    let total = plan.count;
    let mut pending = stream::iter(0..total)
        .map(|index| {
            let payload = plan.payload_for(index);
            async move {
                let outcome = run_one(dispatcher, downloader, plan, &payload).await;
                (index, outcome)
            }
        })
        .buffer_unordered(max_concurrency.max(1));

    let mut outcome = BatchOutcome::default();
    let mut settled = 0;

    while let Some((index, result)) = pending.next().await {
        settled += 1;
        match result {
            Ok(result) => {
                log::info!("✅ [{}/{}] Request #{} completed", settled, total, index + 1);
                outcome.results.push(result);
            }
            Err(e) => {
                log::error!("❌ [{}/{}] Error generating image #{}: {}", settled, total, index + 1, e);
                outcome.failed += 1;
            }
        }
    }

    if outcome.failed > 0 {
        log::warn!("⚠️  Failed to generate {} of {} images", outcome.failed, total);
    }

    outcome
}

async fn run_one(
    dispatcher: &Dispatcher,
    downloader: &MediaDownloader,
    plan: &BatchPlan,
    payload: &RequestPayload,
) -> Result<GenerationResult> {
    let result = dispatcher.dispatch(&plan.endpoint, payload, plan.mode).await?;

    if let Some(dir) = &plan.output_dir {
        match downloader.save_result(&result, dir).await? {
            Some(path) => log::debug!("Representative download: {}", path.display()),
            None if !result.images().is_empty() => {
                log::warn!("⚠️  None of the {} media files could be downloaded", result.images().len())
            }
            None => {}
        }
    }

    Ok(result)
}
