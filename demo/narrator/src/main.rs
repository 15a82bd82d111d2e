mod config;
use config::NarratorConfig;

use std::io::Read;
use std::sync::Arc;

use chorus_core::{
    AssetGuard, AssetRegistry, AssetStore, Combiner, CombinerConfig, SilenceFactory, SpeakOptions,
    TtsWorker,
};
use serde_json::json;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging / tracing
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,chorus_core=info,narrator=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        target = "narrator",
        "Starting narrator demo: text → TTS worker → combine → WAV"
    );

    // Load configuration (defaults + env + optional TOML overlay)
    let cfg = NarratorConfig::load();

    // Text from a file argument or stdin, one clip per non-empty line
    let text = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return Err("no text to narrate".into());
    }

    // Synthesis worker; the engine loads lazily on the first line
    let factory = Arc::new(SilenceFactory {
        sample_rate: Some(cfg.sample_rate),
    });
    let worker = TtsWorker::spawn(factory, cfg.tts.clone());

    let options = SpeakOptions {
        voice: cfg.voice.clone(),
        speed: cfg.speed,
    };
    let mut clips = Vec::with_capacity(lines.len());
    for line in &lines {
        info!(target = "narrator", chars = line.len(), "Synthesizing line");
        clips.push(worker.synthesize(line, options.clone()).await?);
    }
    worker.shutdown().await;

    // Combine into one asset and write it out
    let store = Arc::new(AssetStore::new());
    let registry: Arc<dyn AssetRegistry> = Arc::clone(&store) as _;
    let combiner = Combiner::new(
        Arc::clone(&registry),
        CombinerConfig {
            sample_rate: cfg.sample_rate,
            ..CombinerConfig::default()
        },
    );
    let merged = combiner.combine_clips(clips).await?;
    let guard = AssetGuard::new(registry, merged);

    let bytes = store.resolve(guard.handle()).await?;
    std::fs::write(&cfg.output, bytes.as_slice())?;

    info!(
        target = "narrator",
        summary = %json!({
            "lines": lines.len(),
            "bytes": bytes.len(),
            "sample_rate": cfg.sample_rate,
            "output": cfg.output,
        }),
        "Wrote combined narration"
    );
    Ok(())
}
