//! Drives the fal.ai FLUX image endpoints: option validation, payload
//! building, request dispatch over three queue protocols, batched fan-out
//! with partial-failure tolerance, concurrent media download and run
//! finalization.

pub mod batch;
pub mod builder;
pub mod config;
pub mod dispatch;
pub mod download;
pub mod error;
pub mod fal;
pub mod finalize;
pub mod generator;
pub mod logger;
pub mod models;
pub mod validation;

pub use batch::{generate_batch, BatchOutcome, BatchPlan};
pub use config::{EndpointConfig, FalConfig, OptionLimits};
pub use dispatch::Dispatcher;
pub use download::{DownloadTask, MediaDownloader};
pub use error::{FluxError, Result, ValidationError, ValidationErrorKind};
pub use fal::{FalClient, GenerationService};
pub use finalize::{finalize_run, FinalizeReport, METADATA_FILE};
pub use generator::{FluxGenerator, RunSummary};
pub use models::*;
