use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;
use sha2::{Digest, Sha256};

use fluxgen::{
    config::MISSING_KEY_MESSAGE,
    logger::{self, LogLevel, LoggerConfig},
    AspectRatio, FalConfig, FluxGenerator, GenerationOptions, ImageSizePreset, ModelVariant,
    OutputFormat, QueueMode, Result, ValidationError,
};

#[derive(Parser, Debug)]
#[command(name = "fluxgen", version, about = "Generate images using the fal.ai FLUX API")]
struct Cli {
    /// Text prompt
    #[arg(short = 'p', long = "prompt")]
    prompt: Option<String>,

    /// File with one prompt per line
    #[arg(short = 'f', long = "file")]
    file: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "pro")]
    model: ModelVariant,

    /// Number of images
    #[arg(short = 'n', default_value_t = 1)]
    count: usize,

    #[arg(short = 'o', value_enum)]
    format: Option<OutputFormat>,

    /// Safety tolerance 1-6
    #[arg(short = 's')]
    safety: Option<u8>,

    /// Disable the safety checker
    #[arg(long = "no-safety")]
    no_safety: bool,

    #[arg(long)]
    seed: Option<i64>,

    /// Ask the service to return media inline
    #[arg(long)]
    sync: bool,

    /// Output directory (defaults to ./generated/<prompt hash>)
    #[arg(long = "od", alias = "output-dir")]
    output_dir: Option<PathBuf>,

    /// Aspect ratio (ultra, defaults to 16:9)
    #[arg(short = 'a', value_enum)]
    aspect_ratio: Option<AspectRatio>,

    /// Less processed output (ultra)
    #[arg(long)]
    raw: bool,

    /// Size preset (pro, defaults to landscape_16_9)
    #[arg(long, value_enum)]
    size: Option<ImageSizePreset>,

    /// Width 256-14142 (pro)
    #[arg(short = 'w')]
    width: Option<u32>,

    /// Height 256-14142 (pro)
    #[arg(long)]
    height: Option<u32>,

    /// Guidance 1-20 (pro)
    #[arg(short = 'g')]
    guidance: Option<f64>,

    /// Inference steps 1-50 (pro)
    #[arg(short = 'i')]
    steps: Option<u32>,

    #[arg(short = 'q', value_enum, default_value = "subscribe")]
    queue: QueueMode,

    /// Poll interval in seconds
    #[arg(long, default_value_t = 2)]
    poll: u64,

    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let _ = dotenv::dotenv();
    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    if let Err(e) = logger::init_with_config(LoggerConfig::new().with_level(level)) {
        eprintln!("{}", e);
    }

    let config = FalConfig::from_env();
    if config.api_key.is_none() {
        println!("{}", MISSING_KEY_MESSAGE);
        process::exit(1);
    }

    if let Err(e) = run(cli, config).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli, config: FalConfig) -> Result<()> {
    let prompts = resolve_prompts(cli.prompt.as_deref(), cli.file.as_deref()).await?;
    let generator = FluxGenerator::new(config)?;

    let total = prompts.len();
    if cli.file.is_some() {
        log::info!("📄 Found {} prompts to process", total);
    }

    for (i, prompt) in prompts.iter().enumerate() {
        if total > 1 {
            log::info!("🔄 Processing prompt {}/{}: {}", i + 1, total, prompt);
        }

        let out_dir = output_dir_for(prompt, cli.output_dir.as_deref());
        log::info!("📁 Saving results to folder: {}", out_dir.display());

        let options = options_for(&cli, prompt, out_dir);
        let summary = generator.generate(&options).await?;
        log::info!(
            "🎉 Generation completed ({} ok, {} failed). Results saved to '{}'",
            summary.results.len(),
            summary.failed,
            options.output_dir.display()
        );
    }

    if total > 1 {
        log::info!("🏁 All prompts processed");
    }
    Ok(())
}

/// Exactly one of a prompt or a prompt file must be given.
async fn resolve_prompts(prompt: Option<&str>, file: Option<&Path>) -> Result<Vec<String>> {
    match (prompt, file) {
        (Some(prompt), None) => Ok(vec![prompt.to_string()]),
        (None, Some(path)) => {
            let contents = tokio::fs::read_to_string(path).await?;
            let prompts: Vec<String> = contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
            if prompts.is_empty() {
                return Err(ValidationError::empty_prompt("No valid prompts found in the file").into());
            }
            Ok(prompts)
        }
        (Some(_), Some(_)) => {
            Err(ValidationError::conflict("use either a prompt (-p) or a prompt file (-f), not both").into())
        }
        (None, None) => Err(ValidationError::conflict("a prompt (-p) or a prompt file (-f) is required").into()),
    }
}

fn prompt_hash(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    hex::encode(digest)[..8].to_string()
}

fn output_dir_for(prompt: &str, custom: Option<&Path>) -> PathBuf {
    match custom {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from("generated").join(prompt_hash(prompt)),
    }
}

/// Applies the per-variant CLI defaults so they never trigger cross-model warnings.
fn options_for(cli: &Cli, prompt: &str, output_dir: PathBuf) -> GenerationOptions {
    let mut options = GenerationOptions::new(prompt, output_dir)
        .with_variant(cli.model)
        .with_count(cli.count)
        .with_queue_mode(cli.queue)
        .with_poll_interval(Duration::from_secs(cli.poll));

    options.output_format = cli.format;
    options.safety_tolerance = cli.safety;
    options.enable_safety_checker = cli.no_safety.then_some(false);
    options.sync_mode = cli.sync.then_some(true);
    options.seed = cli.seed;
    options.raw = cli.raw;
    options.width = cli.width;
    options.height = cli.height;
    options.guidance_scale = cli.guidance;
    options.num_inference_steps = cli.steps;

    match cli.model {
        ModelVariant::Ultra => {
            options.aspect_ratio = cli.aspect_ratio.or(Some(AspectRatio::Widescreen));
            options.image_size = cli.size;
        }
        ModelVariant::Pro => {
            options.aspect_ratio = cli.aspect_ratio;
            options.image_size = match (cli.width, cli.height) {
                (None, None) => cli.size.or(Some(ImageSizePreset::Landscape16x9)),
                _ => cli.size,
            };
        }
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxgen::{FluxError, ValidationErrorKind};

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("fluxgen").chain(args.iter().copied()))
    }

    fn kind(err: FluxError) -> ValidationErrorKind {
        match err {
            FluxError::ValidationError(e) => e.kind,
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_prompts() {
        assert_eq!(resolve_prompts(Some("a cat"), None).await.unwrap(), vec!["a cat"]);
        assert_eq!(
            kind(resolve_prompts(None, None).await.unwrap_err()),
            ValidationErrorKind::Conflict
        );

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("prompts.txt");
        std::fs::write(&file, "first\n\n  second  \n").unwrap();
        assert_eq!(
            resolve_prompts(None, Some(&file)).await.unwrap(),
            vec!["first", "second"]
        );
        assert_eq!(
            kind(resolve_prompts(Some("x"), Some(&file)).await.unwrap_err()),
            ValidationErrorKind::Conflict
        );

        std::fs::write(&file, "\n   \n").unwrap();
        assert_eq!(
            kind(resolve_prompts(None, Some(&file)).await.unwrap_err()),
            ValidationErrorKind::EmptyPrompt
        );
    }

    #[test]
    fn test_output_dir() {
        let hash = prompt_hash("Test prompt");
        assert_eq!(hash.len(), 8);
        assert_eq!(hash, prompt_hash("Test prompt"));
        assert_ne!(hash, prompt_hash("Another prompt"));
        assert_eq!(
            output_dir_for("Test prompt", None),
            PathBuf::from("generated").join(&hash)
        );
        assert_eq!(
            output_dir_for("Test prompt", Some(Path::new("/tmp/x"))),
            PathBuf::from("/tmp/x")
        );
    }

    #[test]
    fn test_variant_defaults() {
        let cli = parse(&["-p", "x"]);
        let options = options_for(&cli, "x", PathBuf::from("out"));
        assert_eq!(options.variant, ModelVariant::Pro);
        assert_eq!(options.queue_mode, QueueMode::Subscribe);
        assert_eq!(options.image_size, Some(ImageSizePreset::Landscape16x9));
        assert_eq!(options.aspect_ratio, None);
        assert_eq!(options.enable_safety_checker, None);
        assert_eq!(options.sync_mode, None);
        assert!(fluxgen::validation::advisories(&options).is_empty());

        let cli = parse(&["-p", "x", "--model", "ultra", "--raw", "--no-safety", "--sync"]);
        let options = options_for(&cli, "x", PathBuf::from("out"));
        assert_eq!(options.aspect_ratio, Some(AspectRatio::Widescreen));
        assert_eq!(options.image_size, None);
        assert!(options.raw);
        assert_eq!(options.enable_safety_checker, Some(false));
        assert_eq!(options.sync_mode, Some(true));
        assert!(fluxgen::validation::advisories(&options).is_empty());
    }

    #[test]
    fn test_explicit_dimensions_skip_preset_default() {
        let cli = parse(&["-p", "x", "-w", "512", "--height", "768", "-q", "submit", "--poll", "5"]);
        let options = options_for(&cli, "x", PathBuf::from("out"));
        assert_eq!(options.image_size, None);
        assert_eq!((options.width, options.height), (Some(512), Some(768)));
        assert_eq!(options.queue_mode, QueueMode::Submit);
        assert_eq!(options.poll_interval, Duration::from_secs(5));
    }
}
