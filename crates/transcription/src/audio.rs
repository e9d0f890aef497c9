use std::path::Path;

use hound::{SampleFormat, WavReader};

/// Sample rate every backend expects.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to read WAV: {0}")]
    Wav(#[from] hound::Error),
    #[error("unsupported sample rate {0} Hz (expected 16000 Hz)")]
    SampleRate(u32),
    #[error("unsupported sample format: {bits}-bit {format:?}")]
    Format { bits: u16, format: SampleFormat },
    #[error("audio contains no samples")]
    Empty,
}

/// Reads a WAV file into 16kHz mono f32 PCM normalized to [-1.0, 1.0].
///
/// Multi-channel input is downmixed by averaging. Resampling is the
/// downloader's job, so anything other than 16kHz is rejected.
pub fn decode_wav(path: &Path) -> Result<Vec<f32>, DecodeError> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();

    if spec.sample_rate != TARGET_SAMPLE_RATE {
        return Err(DecodeError::SampleRate(spec.sample_rate));
    }

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
        (SampleFormat::Int, bits @ (8 | 16 | 24 | 32)) => {
            let scale = (1i64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
        (format, bits) => return Err(DecodeError::Format { bits, format }),
    };

    let channels = spec.channels.max(1) as usize;
    let mono = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    if mono.is_empty() {
        return Err(DecodeError::Empty);
    }

    Ok(mono)
}
