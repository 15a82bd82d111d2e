//! Audio combiner: merges an ordered list of speech clips into one WAV asset.
//!
//! Inputs are resolved and decoded sequentially in caller order, empty clips
//! are skipped, and the surviving sample buffers are concatenated into one
//! contiguous buffer before re-encoding. Order preservation is the core
//! correctness invariant: the output is exactly the input sequence, no
//! interleaving, gaps, or reordering. Each call owns its own accumulator, so
//! concurrent combines never share mutable state.

use std::sync::Arc;

use tracing::{debug, info};

use crate::assets::AssetRegistry;
use crate::clip::AudioClip;
use crate::wav::{self, WavFormat};
use crate::{ChorusError, Result};

/// Shared output format and lifecycle policy for a combiner.
#[derive(Debug, Clone)]
pub struct CombinerConfig {
    /// Sample rate every input must match; also the output rate.
    pub sample_rate: u32,
    /// Release input handles after a successful combine.
    pub release_inputs: bool,
}

impl Default for CombinerConfig {
    fn default() -> Self {
        let sample_rate = std::env::var("CHORUS_SAMPLE_RATE")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(24_000);
        Self {
            sample_rate,
            release_inputs: true,
        }
    }
}

pub struct Combiner {
    registry: Arc<dyn AssetRegistry>,
    cfg: CombinerConfig,
}

impl Combiner {
    pub fn new(registry: Arc<dyn AssetRegistry>, cfg: CombinerConfig) -> Self {
        Self { registry, cfg }
    }

    /// Merge the assets behind `handles`, in order, into one new asset.
    ///
    /// Fails with `EmptyInput` when nothing decodable remains, `Decode` on a
    /// malformed or format-mismatched container, and `Transport` when a
    /// handle cannot be resolved. No failure is retried and no partial
    /// result is ever registered. On success the input handles are released
    /// (unless configured off) and the merged asset's handle returned.
    pub async fn combine(&self, handles: &[String]) -> Result<String> {
        let mut chunks: Vec<Vec<f32>> = Vec::with_capacity(handles.len());

        for handle in handles {
            let bytes = self.registry.resolve(handle).await?;
            let (samples, format) = wav::decode(&bytes)?;
            if format.sample_rate != self.cfg.sample_rate {
                return Err(ChorusError::Decode(format!(
                    "sample rate mismatch: clip {} is {} Hz, expected {} Hz",
                    handle, format.sample_rate, self.cfg.sample_rate
                )));
            }
            if samples.is_empty() {
                debug!(target = "combine", handle = %handle, "Skipping empty clip");
                continue;
            }
            chunks.push(samples);
        }

        let clip_count = chunks.len();
        let merged = self.merge_chunks(chunks)?;

        if self.cfg.release_inputs {
            for handle in handles {
                self.registry.release(handle);
            }
        }
        info!(
            target = "combine",
            inputs = handles.len(),
            clips = clip_count,
            output = %merged,
            "Combined audio assets"
        );
        Ok(merged)
    }

    /// Same pipeline for in-memory clips, e.g. straight from a TTS worker.
    pub async fn combine_clips(&self, clips: Vec<AudioClip>) -> Result<String> {
        let mut chunks: Vec<Vec<f32>> = Vec::with_capacity(clips.len());
        for clip in clips {
            let (samples, format) = clip.into_samples_with_format()?;
            if let Some(format) = format {
                if format.sample_rate != self.cfg.sample_rate {
                    return Err(ChorusError::Decode(format!(
                        "sample rate mismatch: clip is {} Hz, expected {} Hz",
                        format.sample_rate, self.cfg.sample_rate
                    )));
                }
            }
            if !samples.is_empty() {
                chunks.push(samples);
            }
        }
        let clip_count = chunks.len();
        let merged = self.merge_chunks(chunks)?;
        info!(
            target = "combine",
            clips = clip_count,
            output = %merged,
            "Combined audio clips"
        );
        Ok(merged)
    }

    fn merge_chunks(&self, chunks: Vec<Vec<f32>>) -> Result<String> {
        if chunks.is_empty() {
            return Err(ChorusError::EmptyInput);
        }

        let total: usize = chunks.iter().map(|c| c.len()).sum();
        let mut samples = Vec::with_capacity(total);
        for chunk in &chunks {
            samples.extend_from_slice(chunk);
        }

        let bytes = wav::encode(&samples, WavFormat::mono(self.cfg.sample_rate));
        Ok(self.registry.register(bytes))
    }
}
