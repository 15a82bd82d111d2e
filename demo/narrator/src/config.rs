use std::fs;
use std::path::{Path, PathBuf};

use chorus_core::TtsWorkerConfig;

/// High-level configuration for the narrator demo
#[derive(Clone, Debug)]
pub struct NarratorConfig {
    /// Shared format for every synthesized clip and the combined output
    pub sample_rate: u32,
    pub voice: String,
    pub speed: f32,
    /// Where the combined WAV is written
    pub output: PathBuf,
    pub tts: TtsWorkerConfig,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            sample_rate: std::env::var("CHORUS_SAMPLE_RATE")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(24_000),
            voice: std::env::var("NARRATOR_VOICE").unwrap_or_default(),
            speed: std::env::var("NARRATOR_SPEED")
                .ok()
                .and_then(|v| v.parse::<f32>().ok())
                .unwrap_or(1.0),
            output: std::env::var("NARRATOR_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("narration.wav")),
            tts: TtsWorkerConfig::default(),
        }
    }
}

impl NarratorConfig {
    /// Load configuration from a TOML file (path via NARRATOR_CONFIG or
    /// ./narrator.toml), overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let default = Self::default();
        let path = std::env::var("NARRATOR_CONFIG").unwrap_or_else(|_| "narrator.toml".into());
        let p = Path::new(&path);
        if !p.exists() {
            tracing::info!(target = "narrator", path = %path, "No TOML config found; using defaults/env");
            return default;
        }
        match fs::read_to_string(p) {
            Ok(s) => match toml::from_str::<NarratorToml>(&s) {
                Ok(t) => t.overlay(default),
                Err(e) => {
                    tracing::warn!(target = "narrator", error = %e, "Failed to parse TOML; using defaults");
                    default
                }
            },
            Err(e) => {
                tracing::warn!(target = "narrator", error = %e, "Failed to read TOML; using defaults");
                default
            }
        }
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct NarratorToml {
    pub sample_rate: Option<u32>,
    pub voice: Option<String>,
    pub speed: Option<f32>,
    pub output: Option<PathBuf>,
    pub tts: Option<TtsToml>,
}

impl NarratorToml {
    fn overlay(self, mut base: NarratorConfig) -> NarratorConfig {
        if let Some(v) = self.sample_rate {
            base.sample_rate = v;
        }
        if let Some(v) = self.voice {
            base.voice = v;
        }
        if let Some(v) = self.speed {
            base.speed = v;
        }
        if let Some(v) = self.output {
            base.output = v;
        }
        if let Some(t) = self.tts {
            t.apply(&mut base.tts);
        }
        base
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct TtsToml {
    pub timeout_ms: Option<u64>,
    pub queue_depth: Option<usize>,
}
impl TtsToml {
    fn apply(self, t: &mut TtsWorkerConfig) {
        if let Some(v) = self.timeout_ms {
            t.timeout_ms = v;
        }
        if let Some(v) = self.queue_depth {
            t.queue_depth = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overlay_applies_over_defaults() {
        let toml = r#"
            sample_rate = 16000
            voice = "warm"
            [tts]
            timeout_ms = 5000
        "#;
        let parsed: NarratorToml = toml::from_str(toml).unwrap();
        let cfg = parsed.overlay(NarratorConfig::default());
        assert_eq!(cfg.sample_rate, 16_000);
        assert_eq!(cfg.voice, "warm");
        assert_eq!(cfg.tts.timeout_ms, 5_000);
        // Untouched fields keep their defaults.
        assert_eq!(cfg.tts.queue_depth, 32);
    }
}
