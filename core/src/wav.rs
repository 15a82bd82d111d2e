//! WAV container codec for 32-bit float PCM.
//!
//! The encoder is the one bit-exact external contract of this crate: a fixed
//! 44-byte header (RIFF/WAVE, "fmt " with format tag 3 = IEEE float, "data")
//! followed by the samples serialized little-endian. The decoder is its
//! inverse and walks chunks rather than assuming a fixed layout, so assets
//! produced by other writers still parse.

use tracing::debug;

use crate::{ChorusError, Result};

/// Format parameters shared by every clip in a combine call.
///
/// Bits per sample is fixed at 32 and the encoding at IEEE float; neither is
/// negotiable, so they are not fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl WavFormat {
    pub fn mono(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
        }
    }
}

const HEADER_LEN: usize = 44;
const BYTES_PER_SAMPLE: usize = 4;
const FORMAT_IEEE_FLOAT: u16 = 3;
const BITS_PER_SAMPLE: u16 = 32;

/// Serialize samples into a complete WAV byte buffer.
///
/// Pure and infallible: any input, including an empty one, yields a
/// structurally valid container of exactly `44 + samples.len() * 4` bytes.
pub fn encode(samples: &[f32], format: WavFormat) -> Vec<u8> {
    let data_len = (samples.len() * BYTES_PER_SAMPLE) as u32;
    let block_align = format.channels * BITS_PER_SAMPLE / 8;
    let byte_rate = format.sample_rate * block_align as u32;

    let mut wav = Vec::with_capacity(HEADER_LEN + samples.len() * BYTES_PER_SAMPLE);

    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVEfmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    wav.extend_from_slice(&FORMAT_IEEE_FLOAT.to_le_bytes());
    wav.extend_from_slice(&format.channels.to_le_bytes());
    wav.extend_from_slice(&format.sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        wav.extend_from_slice(&s.to_le_bytes());
    }
    wav
}

/// Parse a WAV buffer back into samples and format.
///
/// Only mono 32-bit IEEE-float content is accepted; anything else is a
/// `Decode` error. The declared `data` size must fit inside the buffer —
/// a header that over-promises is treated as malformed, not truncated.
pub fn decode(bytes: &[u8]) -> Result<(Vec<f32>, WavFormat)> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(ChorusError::Decode("not a RIFF/WAVE buffer".into()));
    }

    let mut format: Option<WavFormat> = None;
    let mut data: Option<&[u8]> = None;

    let mut idx = 12;
    while idx + 8 <= bytes.len() {
        let chunk_id = &bytes[idx..idx + 4];
        let sz = u32::from_le_bytes([
            bytes[idx + 4],
            bytes[idx + 5],
            bytes[idx + 6],
            bytes[idx + 7],
        ]) as usize;
        let body_start = idx + 8;
        let body_end = body_start.checked_add(sz).filter(|&e| e <= bytes.len());

        match chunk_id {
            b"fmt " => {
                let end = body_end
                    .filter(|&e| e - body_start >= 16)
                    .ok_or_else(|| ChorusError::Decode("truncated fmt chunk".into()))?;
                let fmt = &bytes[body_start..end];
                let tag = u16::from_le_bytes([fmt[0], fmt[1]]);
                let channels = u16::from_le_bytes([fmt[2], fmt[3]]);
                let sample_rate = u32::from_le_bytes([fmt[4], fmt[5], fmt[6], fmt[7]]);
                let bits = u16::from_le_bytes([fmt[14], fmt[15]]);
                if tag != FORMAT_IEEE_FLOAT || bits != BITS_PER_SAMPLE {
                    return Err(ChorusError::Decode(format!(
                        "unsupported sample encoding (format tag {}, {} bits)",
                        tag, bits
                    )));
                }
                if channels != 1 {
                    // Mono only; multi-channel input is rejected rather than
                    // silently truncated to the first channel.
                    return Err(ChorusError::Decode(format!(
                        "multi-channel audio not supported ({} channels)",
                        channels
                    )));
                }
                format = Some(WavFormat {
                    sample_rate,
                    channels,
                });
            }
            b"data" => {
                let end = body_end
                    .ok_or_else(|| ChorusError::Decode("data chunk exceeds buffer".into()))?;
                data = Some(&bytes[body_start..end]);
            }
            _ => {}
        }
        // Chunk bodies are padded to even length; skip the pad byte.
        idx = body_start + sz + (sz & 1);
    }

    let format = format.ok_or_else(|| ChorusError::Decode("missing fmt chunk".into()))?;
    let data = data.ok_or_else(|| ChorusError::Decode("missing data chunk".into()))?;
    if data.len() % BYTES_PER_SAMPLE != 0 {
        return Err(ChorusError::Decode(format!(
            "data length {} not a multiple of sample size",
            data.len()
        )));
    }

    let samples: Vec<f32> = data
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    debug!(
        target = "wav",
        samples = samples.len(),
        sample_rate = format.sample_rate,
        "Decoded WAV buffer"
    );
    Ok((samples, format))
}
