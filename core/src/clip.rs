//! Tagged clip representation.
//!
//! Inference engines hand back raw samples; the registry hands back encoded
//! containers. Downstream code used to sniff which one it had — the tag
//! makes the case analysis explicit.

use crate::wav::{self, WavFormat};
use crate::Result;

/// One speech clip, either raw mono samples or an encoded WAV buffer.
#[derive(Debug, Clone)]
pub enum AudioClip {
    /// Raw mono f32 samples straight from an inference call.
    Samples(Vec<f32>),
    /// A complete WAV container.
    Wav(Vec<u8>),
}

impl AudioClip {
    /// Extract the raw samples, decoding the container variant.
    pub fn into_samples(self) -> Result<Vec<f32>> {
        self.into_samples_with_format().map(|(samples, _)| samples)
    }

    /// Extract the raw samples plus the container's declared format.
    ///
    /// Raw samples carry no format of their own, so that arm yields `None`;
    /// callers holding a shared-format invariant check the `Some` case.
    pub fn into_samples_with_format(self) -> Result<(Vec<f32>, Option<WavFormat>)> {
        match self {
            AudioClip::Samples(samples) => Ok((samples, None)),
            AudioClip::Wav(bytes) => {
                let (samples, format) = wav::decode(&bytes)?;
                Ok((samples, Some(format)))
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            AudioClip::Samples(samples) => samples.is_empty(),
            // A bare header is an empty clip.
            AudioClip::Wav(bytes) => bytes.len() <= 44,
        }
    }
}
