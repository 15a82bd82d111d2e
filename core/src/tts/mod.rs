//! Text-to-speech engine seam and worker service.
//!
//! The inference model is a black box behind [`TtsEngine`]: one `generate`
//! call yields one clip. Engines are loaded lazily through an
//! [`EngineFactory`] by the worker in [`worker`], which owns the engine
//! exclusively and serves synthesis requests over a channel.

pub mod worker;

pub use worker::{TtsWorker, TtsWorkerConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::clip::AudioClip;
use crate::Result;

/// Inference backend selection.
///
/// Mirrors the usual accelerated-with-CPU-fallback split; which accelerator
/// backs `Accelerated` is the engine's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Accelerated,
    Cpu,
}

impl Device {
    /// Pick a device from the `TTS_DEVICE` env override, falling back to CPU.
    pub fn detect() -> Self {
        match std::env::var("TTS_DEVICE").as_deref() {
            Ok("accelerated") | Ok("gpu") => Device::Accelerated,
            Ok("cpu") => Device::Cpu,
            // No capability probe available here; CPU always works.
            _ => Device::Cpu,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Accelerated => "accelerated",
            Device::Cpu => "cpu",
        }
    }
}

/// Per-request synthesis options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakOptions {
    pub voice: String,
    pub speed: f32,
}

impl Default for SpeakOptions {
    fn default() -> Self {
        Self {
            voice: String::new(),
            speed: 1.0,
        }
    }
}

/// A loaded text-to-speech model.
#[async_trait]
pub trait TtsEngine: Send + Sync {
    /// A static identifier for the engine implementation
    fn name(&self) -> &'static str;

    /// Synthesize one clip for `text`.
    async fn generate(&self, text: &str, opts: &SpeakOptions) -> Result<AudioClip>;
}

/// Deferred engine construction; model loading happens on first use.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn load(&self, device: Device) -> Result<Box<dyn TtsEngine>>;
}

/// A no-op placeholder engine producing silence.
///
/// Behavior:
/// - Emits roughly a quarter second of silence per word, scaled by speed
/// - Never fails; used as the default factory and in tests
#[derive(Debug, Clone)]
pub struct SilenceEngine {
    pub sample_rate: u32,
}

impl Default for SilenceEngine {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
        }
    }
}

#[async_trait]
impl TtsEngine for SilenceEngine {
    fn name(&self) -> &'static str {
        "silence"
    }

    async fn generate(&self, text: &str, opts: &SpeakOptions) -> Result<AudioClip> {
        let words = text.split_whitespace().count();
        let per_word = self.sample_rate as f32 / 4.0;
        let len = (words as f32 * per_word / opts.speed).round() as usize;
        Ok(AudioClip::Samples(vec![0.0; len]))
    }
}

/// Factory for the placeholder engine.
#[derive(Debug, Clone, Default)]
pub struct SilenceFactory {
    pub sample_rate: Option<u32>,
}

#[async_trait]
impl EngineFactory for SilenceFactory {
    async fn load(&self, _device: Device) -> Result<Box<dyn TtsEngine>> {
        let mut engine = SilenceEngine::default();
        if let Some(rate) = self.sample_rate {
            engine.sample_rate = rate;
        }
        Ok(Box::new(engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn silence_engine_scales_with_text_and_speed() {
        let engine = SilenceEngine::default();
        let opts = SpeakOptions::default();

        let short = engine.generate("hello", &opts).await.unwrap();
        let long = engine.generate("hello there world", &opts).await.unwrap();
        let (short, long) = (short.into_samples().unwrap(), long.into_samples().unwrap());
        assert!(short.len() < long.len());

        let fast = SpeakOptions {
            speed: 2.0,
            ..Default::default()
        };
        let quick = engine.generate("hello", &fast).await.unwrap();
        assert!(quick.into_samples().unwrap().len() < short.len());
    }

    #[tokio::test]
    async fn empty_text_yields_empty_clip() {
        let engine = SilenceEngine::default();
        let clip = engine.generate("", &SpeakOptions::default()).await.unwrap();
        assert!(clip.is_empty());
    }
}
