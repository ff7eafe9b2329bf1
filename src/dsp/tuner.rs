//! Pitch detection: the contract for pitch collaborators plus a
//! built-in YIN detector.
//!
//! Model-based detectors (e.g. an ONNX pitch network) plug in through
//! [`PitchDetector`]; they may return several estimates per frame, and
//! [`most_confident`] picks the one worth displaying. The YIN detector
//! serves when no model is available.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::PitchError;

/// One pitch estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchEstimate {
    /// Estimated fundamental frequency in Hz (0 when unvoiced).
    pub frequency: f64,
    /// Confidence in [0, 1], higher is better.
    pub confidence: f64,
}

impl PitchEstimate {
    pub const UNVOICED: PitchEstimate = PitchEstimate {
        frequency: 0.0,
        confidence: 0.0,
    };
}

/// A pitch collaborator consuming fixed-size mono frames at a fixed rate.
pub trait PitchDetector {
    /// Sample rate the detector expects its input at.
    fn sample_rate(&self) -> f64;

    /// Frame length the detector expects.
    fn frame_len(&self) -> usize;

    /// Estimates for one frame; sub-frame detectors return several.
    fn detect(&mut self, frame: &[f64]) -> Result<Vec<PitchEstimate>, PitchError>;
}

/// Highest-confidence frequency among `estimates`, if it beats `threshold`.
pub fn most_confident(estimates: &[PitchEstimate], threshold: f64) -> Option<f64> {
    let best = estimates
        .iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))?;
    if best.confidence > threshold && best.frequency > 0.0 {
        Some(best.frequency)
    } else {
        trace!(confidence = best.confidence, threshold, "pitch below confidence threshold");
        None
    }
}

/// YIN fundamental-frequency detector.
///
/// - difference function over lags,
/// - cumulative mean normalised difference,
/// - first dip below the absolute threshold (global minimum fallback),
/// - parabolic interpolation for sub-sample lag.
#[derive(Debug, Clone)]
pub struct YinDetector {
    sample_rate: f64,
    frame_len: usize,
    min_freq: f64,
    max_freq: f64,
    threshold: f64,
    diff: Vec<f64>,
    cmnd: Vec<f64>,
}

impl YinDetector {
    pub fn new(sample_rate: f64, frame_len: usize) -> Self {
        Self::with_range(sample_rate, frame_len, 50.0, 2000.0)
    }

    pub fn with_range(sample_rate: f64, frame_len: usize, min_freq: f64, max_freq: f64) -> Self {
        YinDetector {
            sample_rate,
            frame_len,
            min_freq,
            max_freq,
            threshold: 0.15,
            diff: Vec::new(),
            cmnd: Vec::new(),
        }
    }

    pub fn estimate(&mut self, samples: &[f64]) -> PitchEstimate {
        let min_lag = (self.sample_rate / self.max_freq).ceil() as usize;
        let max_lag = (self.sample_rate / self.min_freq).floor() as usize;

        if samples.is_empty() || samples.len() < max_lag * 2 || min_lag == 0 {
            return PitchEstimate::UNVOICED;
        }

        let window = max_lag.min(samples.len() / 2);

        self.diff.clear();
        self.diff.resize(window + 1, 0.0);
        for tau in 1..=window {
            self.diff[tau] = (0..window)
                .map(|j| {
                    let d = samples[j] - samples[j + tau];
                    d * d
                })
                .sum();
        }

        self.cmnd.clear();
        self.cmnd.resize(window + 1, 1.0);
        let mut running = 0.0;
        for tau in 1..=window {
            running += self.diff[tau];
            if running > 0.0 {
                self.cmnd[tau] = self.diff[tau] * tau as f64 / running;
            }
        }

        let upper = window.min(max_lag);
        let mut best_tau = 0usize;
        let mut best_val = 1.0f64;

        for tau in min_lag..=upper {
            if self.cmnd[tau] < self.threshold {
                let mut t = tau;
                while t < upper && self.cmnd[t + 1] < self.cmnd[t] {
                    t += 1;
                }
                best_tau = t;
                best_val = self.cmnd[t];
                break;
            }
        }

        if best_tau == 0 {
            for tau in min_lag..=upper {
                if self.cmnd[tau] < best_val {
                    best_val = self.cmnd[tau];
                    best_tau = tau;
                }
            }
        }

        if best_tau == 0 {
            return PitchEstimate::UNVOICED;
        }

        let refined = if best_tau < window {
            let alpha = self.cmnd[best_tau - 1];
            let beta = self.cmnd[best_tau];
            let gamma = self.cmnd[best_tau + 1];
            let denom = alpha - 2.0 * beta + gamma;
            if denom.abs() > 1e-12 {
                best_tau as f64 + 0.5 * (alpha - gamma) / denom
            } else {
                best_tau as f64
            }
        } else {
            best_tau as f64
        };

        PitchEstimate {
            frequency: self.sample_rate / refined,
            confidence: (1.0 - best_val).clamp(0.0, 1.0),
        }
    }
}

impl PitchDetector for YinDetector {
    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn frame_len(&self) -> usize {
        self.frame_len
    }

    fn detect(&mut self, frame: &[f64]) -> Result<Vec<PitchEstimate>, PitchError> {
        if frame.len() != self.frame_len {
            return Err(PitchError::FrameLength {
                expected: self.frame_len,
                found: frame.len(),
            });
        }
        Ok(vec![self.estimate(frame)])
    }
}

/// Convert a frequency to the nearest MIDI note + fine-tune cents.
pub fn freq_to_midi_cents(freq: f64, a4_freq: f64) -> (u8, f64) {
    if freq <= 0.0 {
        return (0, 0.0);
    }
    let midi_float = 69.0 + 12.0 * (freq / a4_freq).log2();
    let midi_note = midi_float.round() as i32;
    let cents = (midi_float - midi_note as f64) * 100.0;

    (midi_note.clamp(0, 127) as u8, cents)
}
