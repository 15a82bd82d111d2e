// Chorus Core Library
// Speech clip combining and background TTS synthesis

pub mod assets;
pub mod clip;
pub mod combine;
pub mod tts;
pub mod wav;

// Export core types
pub use assets::{AssetGuard, AssetRegistry, AssetStore};
pub use clip::AudioClip;
pub use combine::{Combiner, CombinerConfig};
pub use tts::{Device, EngineFactory, SilenceEngine, SilenceFactory, SpeakOptions, TtsEngine};
pub use tts::{TtsWorker, TtsWorkerConfig};
pub use wav::WavFormat;

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChorusError {
    #[error("no valid audio to combine")]
    EmptyInput,

    #[error("decode error: {0}")]
    Decode(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("engine error: {0}")]
    Engine(String),

    #[error("worker error: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
pub type Result<T> = std::result::Result<T, ChorusError>;
