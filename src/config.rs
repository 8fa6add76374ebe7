use std::env;
use std::time::Duration;

use crate::error::{FluxError, Result};
use crate::models::ModelVariant;

pub const DEFAULT_RUN_URL: &str = "https://fal.run";
pub const DEFAULT_QUEUE_URL: &str = "https://queue.fal.run";
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 4;
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 8;

pub const MISSING_KEY_MESSAGE: &str = "Error: FAL_KEY environment variable not set.\n\
Please set your Fal.ai API key:\n\
export FAL_KEY=your_api_key_here";

/// Endpoint id used for each model variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub pro: String,
    pub ultra: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        EndpointConfig {
            pro: "fal-ai/flux-pro/new".to_string(),
            ultra: "fal-ai/flux-pro/v1.1-ultra".to_string(),
        }
    }
}

impl EndpointConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(&self, variant: ModelVariant) -> &str {
        match variant {
            ModelVariant::Pro => &self.pro,
            ModelVariant::Ultra => &self.ultra,
        }
    }

    pub fn with_pro(mut self, endpoint: impl Into<String>) -> Self {
        self.pro = endpoint.into();
        self
    }

    pub fn with_ultra(mut self, endpoint: impl Into<String>) -> Self {
        self.ultra = endpoint.into();
        self
    }
}

/// Inclusive ranges accepted by the option validator.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionLimits {
    pub guidance: (f64, f64),
    pub steps: (u32, u32),
    pub dimension: (u32, u32),
    pub safety: (u8, u8),
}

impl Default for OptionLimits {
    fn default() -> Self {
        OptionLimits {
            guidance: (1.0, 20.0),
            steps: (1, 50),
            dimension: (256, 14142),
            safety: (1, 6),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FalConfig {
    pub api_key: Option<String>,
    pub run_url: String,
    pub queue_url: String,
    pub endpoints: EndpointConfig,
    pub limits: OptionLimits,
    /// Deadline for queue-based requests; `None` waits forever.
    pub poll_timeout: Option<Duration>,
    pub max_concurrent_requests: usize,
    pub max_concurrent_downloads: usize,
}

impl Default for FalConfig {
    fn default() -> Self {
        FalConfig {
            api_key: None,
            run_url: DEFAULT_RUN_URL.to_string(),
            queue_url: DEFAULT_QUEUE_URL.to_string(),
            endpoints: EndpointConfig::default(),
            limits: OptionLimits::default(),
            poll_timeout: Some(DEFAULT_POLL_TIMEOUT),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
        }
    }
}

impl FalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = env::var("FAL_KEY").ok().filter(|key| !key.trim().is_empty());
        let run_url = env::var("FAL_RUN_URL").unwrap_or(defaults.run_url);
        let queue_url = env::var("FAL_QUEUE_URL").unwrap_or(defaults.queue_url);
        let poll_timeout = match env::var("FLUXGEN_POLL_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.poll_timeout,
        };
        let max_concurrent_requests = env::var("FLUXGEN_MAX_REQUESTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.max_concurrent_requests);
        let max_concurrent_downloads = env::var("FLUXGEN_MAX_DOWNLOADS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.max_concurrent_downloads);

        FalConfig {
            api_key,
            run_url,
            queue_url,
            endpoints: defaults.endpoints,
            limits: defaults.limits,
            poll_timeout,
            max_concurrent_requests,
            max_concurrent_downloads,
        }
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| FluxError::ConfigError("FAL_KEY environment variable not set".into()))
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_urls(mut self, run_url: impl Into<String>, queue_url: impl Into<String>) -> Self {
        self.run_url = run_url.into();
        self.queue_url = queue_url.into();
        self
    }

    pub fn with_endpoints(mut self, endpoints: EndpointConfig) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_limits(mut self, limits: OptionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, requests: usize, downloads: usize) -> Self {
        self.max_concurrent_requests = requests.max(1);
        self.max_concurrent_downloads = downloads.max(1);
        self
    }
}
