//! Background synthesis worker.
//!
//! The inference model is stateful and expensive to load, so it lives on a
//! dedicated task that owns it exclusively. Callers talk to it through a
//! bounded request channel; each request carries a oneshot reply sender.
//! The engine is loaded on the first request, and a failed load is reported
//! to that caller and retried on the next request instead of taking the
//! worker down.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use super::{Device, EngineFactory, SpeakOptions, TtsEngine};
use crate::clip::AudioClip;
use crate::{ChorusError, Result};

#[derive(Debug, Clone)]
pub struct TtsWorkerConfig {
    /// Per-request deadline covering engine load plus synthesis.
    pub timeout_ms: u64,
    /// Bounded depth of the request queue.
    pub queue_depth: usize,
    /// Skip device detection and force a backend.
    pub device: Option<Device>,
}

impl Default for TtsWorkerConfig {
    fn default() -> Self {
        let timeout_ms = std::env::var("TTS_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60_000);
        Self {
            timeout_ms,
            queue_depth: 32,
            device: None,
        }
    }
}

struct SynthesisRequest {
    text: String,
    options: SpeakOptions,
    reply: oneshot::Sender<Result<AudioClip>>,
}

/// Handle to the synthesis service task.
pub struct TtsWorker {
    tx: mpsc::Sender<SynthesisRequest>,
    task: JoinHandle<()>,
    timeout_ms: u64,
}

impl TtsWorker {
    /// Start the worker task. The engine is not loaded until the first
    /// synthesis request arrives.
    pub fn spawn(factory: Arc<dyn EngineFactory>, cfg: TtsWorkerConfig) -> Self {
        let (tx, rx) = mpsc::channel(cfg.queue_depth);
        let device = cfg.device.unwrap_or_else(Device::detect);
        let timeout_ms = cfg.timeout_ms;
        let task = tokio::spawn(run(factory, device, rx));
        Self {
            tx,
            task,
            timeout_ms,
        }
    }

    /// Synthesize one clip. Empty or whitespace-only text short-circuits to
    /// an empty clip without touching the engine.
    pub async fn synthesize(&self, text: &str, options: SpeakOptions) -> Result<AudioClip> {
        if text.trim().is_empty() {
            return Ok(AudioClip::Samples(Vec::new()));
        }
        let options = SpeakOptions {
            speed: options.speed.clamp(0.5, 2.0),
            ..options
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        let request = SynthesisRequest {
            text: text.to_string(),
            options,
            reply: reply_tx,
        };
        self.tx
            .send(request)
            .await
            .map_err(|_| ChorusError::Worker("synthesis worker is gone".into()))?;

        match timeout(Duration::from_millis(self.timeout_ms), reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ChorusError::Worker("synthesis reply dropped".into())),
            Err(_) => Err(ChorusError::Worker(format!(
                "synthesis timed out after {} ms",
                self.timeout_ms
            ))),
        }
    }

    /// Close the request channel and wait for the task to drain and exit.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.task.await;
    }
}

async fn run(
    factory: Arc<dyn EngineFactory>,
    device: Device,
    mut rx: mpsc::Receiver<SynthesisRequest>,
) {
    let mut engine: Option<Box<dyn TtsEngine>> = None;

    while let Some(request) = rx.recv().await {
        if engine.is_none() {
            let start = Instant::now();
            match factory.load(device).await {
                Ok(loaded) => {
                    info!(
                        target = "tts",
                        engine = loaded.name(),
                        device = device.as_str(),
                        load_ms = start.elapsed().as_millis() as u64,
                        "Loaded TTS engine"
                    );
                    engine = Some(loaded);
                }
                Err(e) => {
                    warn!(target = "tts", error = %e, "Engine load failed");
                    let _ = request.reply.send(Err(e));
                    continue;
                }
            }
        }

        let Some(loaded) = engine.as_ref() else {
            continue;
        };
        let start = Instant::now();
        let result = loaded.generate(&request.text, &request.options).await;
        debug!(
            target = "tts",
            chars = request.text.len(),
            synthesis_ms = start.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Synthesis request served"
        );
        // The caller may have timed out and dropped the receiver.
        let _ = request.reply.send(result);
    }
    info!(target = "tts", "Synthesis worker shutting down");
}
