//! WAV encoding for resampled output and WAV / MP3 decoding into mono
//! buffers. Built with the `codec` feature.

use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::AudioError;

/// A decoded mono buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f64>,
    pub sample_rate: f64,
}

/// Encode mono samples in [-1, 1] as a 16-bit PCM WAV file.
pub fn encode_wav_mono(samples: &[f64], sample_rate: u32) -> Result<Vec<u8>, AudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &s in samples {
            writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f64).round() as i16)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

pub fn write_wav_mono(
    path: impl AsRef<Path>,
    samples: &[f64],
    sample_rate: u32,
) -> Result<(), AudioError> {
    std::fs::write(path, encode_wav_mono(samples, sample_rate)?)?;
    Ok(())
}

/// Decode a WAV stream, keeping the first channel.
pub fn read_wav<R: Read>(reader: R) -> Result<DecodedAudio, AudioError> {
    let reader = hound::WavReader::new(reader)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .step_by(channels)
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.max(1) - 1)) as f64;
            reader
                .into_samples::<i32>()
                .step_by(channels)
                .map(|s| s.map(|v| v as f64 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    debug!(
        channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        frames = samples.len(),
        "decoded wav"
    );
    non_empty(samples, spec.sample_rate as f64)
}

/// Decode an MP3 stream, keeping the first channel.
pub fn read_mp3<R: Read>(reader: R) -> Result<DecodedAudio, AudioError> {
    let mut decoder = minimp3::Decoder::new(reader);
    let mut samples = Vec::new();
    let mut sample_rate = 0;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                let channels = frame.channels.max(1);
                sample_rate = frame.sample_rate;
                samples.extend(
                    frame
                        .data
                        .iter()
                        .step_by(channels)
                        .map(|&s| s as f64 / 32768.0),
                );
            }
            Err(minimp3::Error::Eof) | Err(minimp3::Error::InsufficientData) => break,
            Err(minimp3::Error::SkippedData) => continue,
            Err(minimp3::Error::Io(e)) => return Err(AudioError::Io(e)),
        }
    }

    debug!(sample_rate, frames = samples.len(), "decoded mp3");
    non_empty(samples, sample_rate as f64)
}

pub fn load_wav(path: impl AsRef<Path>) -> Result<DecodedAudio, AudioError> {
    read_wav(std::io::BufReader::new(std::fs::File::open(path)?))
}

pub fn load_mp3(path: impl AsRef<Path>) -> Result<DecodedAudio, AudioError> {
    read_mp3(std::io::BufReader::new(std::fs::File::open(path)?))
}

/// Decode by file extension (`.wav` or `.mp3`).
pub fn load_audio(path: impl AsRef<Path>) -> Result<DecodedAudio, AudioError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "wav" | "wave" => load_wav(path),
        "mp3" => load_mp3(path),
        _ => Err(AudioError::UnsupportedFormat(path.display().to_string())),
    }
}

fn non_empty(samples: Vec<f64>, sample_rate: f64) -> Result<DecodedAudio, AudioError> {
    if samples.is_empty() || sample_rate <= 0.0 {
        return Err(AudioError::Empty);
    }
    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_valid() {
        let wav = encode_wav_mono(&[0.0, 0.5, -0.5], 16000).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(wav.len(), 44 + 6);
        assert_eq!(u32::from_le_bytes(wav[4..8].try_into().unwrap()), 36 + 6);
        assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 1);
        assert_eq!(u32::from_le_bytes(wav[24..28].try_into().unwrap()), 16000);
        assert_eq!(u32::from_le_bytes(wav[28..32].try_into().unwrap()), 32000);
    }

    #[test]
    fn samples_are_clamped() {
        let wav = encode_wav_mono(&[2.0, -2.0, 1.0], 8000).unwrap();
        let pcm: Vec<i16> = wav[44..]
            .chunks(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(pcm, vec![i16::MAX, -i16::MAX, i16::MAX]);
    }

    #[test]
    fn encoded_wav_decodes() {
        let input: Vec<f64> = (0..100).map(|n| (n as f64 / 50.0) - 1.0).collect();
        let wav = encode_wav_mono(&input, 22050).unwrap();
        let decoded = read_wav(std::io::Cursor::new(wav)).unwrap();
        assert_eq!(decoded.sample_rate, 22050.0);
        assert_eq!(decoded.samples.len(), 100);
        for (a, b) in decoded.samples.iter().zip(&input) {
            assert!((a - b).abs() < 1e-4, "{a} vs {b}");
        }
    }

    #[test]
    fn stereo_float_wav_keeps_first_channel() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for n in 0..10 {
                writer.write_sample(n as f32 * 0.1).unwrap();
                writer.write_sample(-1.0f32).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.set_position(0);
        let decoded = read_wav(cursor).unwrap();
        assert_eq!(decoded.samples.len(), 10);
        assert!((decoded.samples[3] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn empty_wav_is_an_error() {
        let wav = encode_wav_mono(&[], 16000).unwrap();
        assert!(matches!(
            read_wav(std::io::Cursor::new(wav)),
            Err(AudioError::Empty)
        ));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            load_audio("song.flac"),
            Err(AudioError::UnsupportedFormat(_))
        ));
    }
}
