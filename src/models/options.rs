use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// The two FLUX configurations the service exposes.
///
/// `Pro` is the standard model with explicit sizing and sampling controls;
/// `Ultra` is the high-fidelity model driven by aspect ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    #[default]
    Pro,
    Ultra,
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelVariant::Pro => f.write_str("pro"),
            ModelVariant::Ultra => f.write_str("ultra"),
        }
    }
}

/// Protocol used to submit a single request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QueueMode {
    /// One blocking call that returns the result.
    Run,
    /// Submit, then poll the status until completion.
    Submit,
    /// Submit, then follow the status stream and surface its logs.
    #[default]
    Subscribe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum AspectRatio {
    #[serde(rename = "21:9")]
    #[value(name = "21:9")]
    Ultrawide,
    #[serde(rename = "16:9")]
    #[value(name = "16:9")]
    Widescreen,
    #[serde(rename = "4:3")]
    #[value(name = "4:3")]
    Standard,
    #[serde(rename = "3:2")]
    #[value(name = "3:2")]
    Classic,
    #[serde(rename = "1:1")]
    #[value(name = "1:1")]
    Square,
    #[serde(rename = "2:3")]
    #[value(name = "2:3")]
    ClassicPortrait,
    #[serde(rename = "3:4")]
    #[value(name = "3:4")]
    StandardPortrait,
    #[serde(rename = "9:16")]
    #[value(name = "9:16")]
    WidescreenPortrait,
    #[serde(rename = "9:21")]
    #[value(name = "9:21")]
    UltrawidePortrait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ImageSizePreset {
    #[value(name = "square_hd")]
    SquareHd,
    #[value(name = "square")]
    Square,
    #[value(name = "portrait_4_3")]
    #[serde(rename = "portrait_4_3")]
    Portrait4x3,
    #[value(name = "portrait_16_9")]
    #[serde(rename = "portrait_16_9")]
    Portrait16x9,
    #[value(name = "landscape_4_3")]
    #[serde(rename = "landscape_4_3")]
    Landscape4x3,
    #[value(name = "landscape_16_9")]
    #[serde(rename = "landscape_16_9")]
    Landscape16x9,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
        }
    }
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Ultrawide => "21:9",
            AspectRatio::Widescreen => "16:9",
            AspectRatio::Standard => "4:3",
            AspectRatio::Classic => "3:2",
            AspectRatio::Square => "1:1",
            AspectRatio::ClassicPortrait => "2:3",
            AspectRatio::StandardPortrait => "3:4",
            AspectRatio::WidescreenPortrait => "9:16",
            AspectRatio::UltrawidePortrait => "9:21",
        }
    }
}

impl ImageSizePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSizePreset::SquareHd => "square_hd",
            ImageSizePreset::Square => "square",
            ImageSizePreset::Portrait4x3 => "portrait_4_3",
            ImageSizePreset::Portrait16x9 => "portrait_16_9",
            ImageSizePreset::Landscape4x3 => "landscape_4_3",
            ImageSizePreset::Landscape16x9 => "landscape_16_9",
        }
    }
}

/// Everything one invocation needs to produce a batch for a single prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub prompt: String,
    pub variant: ModelVariant,
    pub output_format: Option<OutputFormat>,
    pub safety_tolerance: Option<u8>,
    pub enable_safety_checker: Option<bool>,
    pub sync_mode: Option<bool>,
    pub count: usize,
    pub queue_mode: QueueMode,
    pub poll_interval: Duration,
    pub output_dir: PathBuf,
    pub seed: Option<i64>,

    // ultra only
    pub aspect_ratio: Option<AspectRatio>,
    pub raw: bool,

    // pro only
    pub image_size: Option<ImageSizePreset>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub guidance_scale: Option<f64>,
    pub num_inference_steps: Option<u32>,
}

impl GenerationOptions {
    pub fn new(prompt: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            prompt: prompt.into(),
            variant: ModelVariant::default(),
            output_format: None,
            safety_tolerance: None,
            enable_safety_checker: None,
            sync_mode: None,
            count: 1,
            queue_mode: QueueMode::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            output_dir: output_dir.into(),
            seed: None,
            aspect_ratio: None,
            raw: false,
            image_size: None,
            width: None,
            height: None,
            guidance_scale: None,
            num_inference_steps: None,
        }
    }

    pub fn with_variant(mut self, variant: ModelVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_queue_mode(mut self, mode: QueueMode) -> Self {
        self.queue_mode = mode;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}
