use fluxgen::{FalConfig, FluxGenerator, GenerationOptions, ModelVariant, QueueMode};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded"),
        Err(_) => log::warn!("⚠️  No .env file found"),
    }
    fluxgen::logger::init()?;

    let config = FalConfig::from_env();
    config.require_api_key()?;

    let generator = FluxGenerator::new(config)?;
    let mut options = GenerationOptions::new(
        "an isometric diorama of a lighthouse on a rocky island, soft morning light",
        "generated/demo",
    )
    .with_variant(ModelVariant::Ultra)
    .with_queue_mode(QueueMode::Submit)
    .with_count(2)
    .with_seed(42);
    options.raw = true;

    let summary = generator.generate(&options).await?;
    println!(
        "{} images generated, {} failed, metadata at {}",
        summary.results.len(),
        summary.failed,
        summary.metadata_path.display()
    );

    Ok(())
}
