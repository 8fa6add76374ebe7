use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    batch::{generate_batch, BatchPlan},
    builder::build_payload,
    config::FalConfig,
    dispatch::Dispatcher,
    download::MediaDownloader,
    error::Result,
    fal::{FalClient, GenerationService},
    finalize::finalize_run,
    logger,
    models::{GenerationOptions, GenerationResult},
    validation::{advisories, validate},
};

/// What one invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub results: Vec<GenerationResult>,
    pub failed: usize,
    pub metadata_path: PathBuf,
    pub removed_files: Vec<PathBuf>,
}

/// Validates, fans out, downloads and finalizes one batch per call.
#[derive(Clone)]
pub struct FluxGenerator {
    config: FalConfig,
    service: Arc<dyn GenerationService>,
    downloader: MediaDownloader,
}

impl FluxGenerator {
    /// Generator backed by the fal HTTP API.
    pub fn new(config: FalConfig) -> Result<Self> {
        let service = Arc::new(FalClient::new(&config)?);
        Ok(Self::with_service(config, service))
    }

    pub fn with_service(config: FalConfig, service: Arc<dyn GenerationService>) -> Self {
        let downloader = MediaDownloader::new(config.max_concurrent_downloads);
        Self {
            config,
            service,
            downloader,
        }
    }

    pub fn config(&self) -> &FalConfig {
        &self.config
    }

    pub async fn generate(&self, options: &GenerationOptions) -> Result<RunSummary> {
        for advisory in advisories(options) {
            log::warn!("⚠️  {}", advisory);
        }
        validate(options, &self.config.limits)?;

        let endpoint = self.config.endpoints.endpoint(options.variant).to_string();
        let plan = BatchPlan {
            endpoint,
            payload: build_payload(options),
            count: options.count,
            seed: options.seed,
            mode: options.queue_mode,
            output_dir: Some(options.output_dir.clone()),
        };
        log::debug!("Request payload: {}", serde_json::to_string(&plan.payload)?);
        log::info!(
            "🎨 Generating {} image(s) with {} via {:?}",
            plan.count,
            plan.endpoint,
            plan.mode
        );

        let dispatcher = Dispatcher::new(self.service.clone())
            .with_poll_interval(options.poll_interval)
            .with_poll_timeout(self.config.poll_timeout);

        let outcome = {
            let _timer = logger::timer("Batch");
            generate_batch(
                &dispatcher,
                &self.downloader,
                &plan,
                self.config.max_concurrent_requests,
            )
            .await
        };

        let report = finalize_run(&outcome.results, &options.output_dir).await?;

        Ok(RunSummary {
            results: outcome.results,
            failed: outcome.failed,
            metadata_path: report.metadata_path,
            removed_files: report.removed_files,
        })
    }
}
