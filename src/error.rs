use thiserror::Error;

/// Top-level error for everything the crate can fail at outside the
/// per-sample hot path.
#[derive(Debug, Error)]
pub enum PitchscopeError {
    #[error("Resampler error: {0}")]
    Resample(#[from] ResampleError),
    #[error("Spectral error: {0}")]
    Spectral(#[from] SpectralError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),
    #[error("Pitch error: {0}")]
    Pitch(#[from] PitchError),
}

pub type Result<T> = std::result::Result<T, PitchscopeError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResampleError {
    #[error("sample rate must be positive and finite, got {rate}")]
    InvalidRate { rate: f64 },
    #[error("table resolution must be at least 1")]
    ZeroTableResolution,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpectralError {
    #[error("transform size must be non-zero")]
    ZeroSize,
    #[error("transform size must be even, got {size}")]
    OddSize { size: usize },
    #[error("frame length {found} does not match transform size {expected}")]
    FrameLength { expected: usize, found: usize },
    #[error("spectrum buffer holds {found} values, expected {expected}")]
    SpectrumLength { expected: usize, found: usize },
    #[error("transform failed: {0}")]
    Transform(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "codec")]
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("MP3 decode error: {0}")]
    Mp3(String),
    #[error("audio stream contains no samples")]
    Empty,
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PitchError {
    #[error("frame length {found} does not match detector frame length {expected}")]
    FrameLength { expected: usize, found: usize },
    #[error("pitch inference failed: {0}")]
    Inference(String),
}
