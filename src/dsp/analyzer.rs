//! Offline and live analysis pipeline.
//!
//! Offline: resample to the analysis rate, slice into hopped frames, run
//! the reassignment estimator on each, and attach a confident pitch from
//! an optional detector. Live: the same per-frame work on a snapshot of a
//! [`CaptureRing`].

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::AnalysisConfig;
use crate::error::{PitchError, PitchscopeError, ResampleError, SpectralError};

use super::capture::CaptureRing;
use super::reassignment::ReassignmentEstimator;
use super::resampler::Resampler;
use super::slice::FrameSlicer;
use super::spectrum::{fold_reassigned, gain_to_db, normalize_db, LogFrequencyAxis, SpectrumColumn};
use super::tuner::{most_confident, PitchDetector};

/// Result of an offline analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Rate the columns were computed at.
    pub sample_rate: f64,
    pub fft_size: usize,
    pub hop_size: usize,
    pub columns: Vec<SpectrumColumn>,
}

#[derive(Debug)]
pub struct Analyzer {
    config: AnalysisConfig,
    estimator: ReassignmentEstimator,
    frame: Vec<f64>,
    pitch_frame: Vec<f64>,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self, PitchscopeError> {
        config.validate()?;
        let estimator = ReassignmentEstimator::new(config.fft_size)?;
        debug!(
            target_rate = config.target_rate,
            fft_size = config.fft_size,
            hop_size = config.hop_size,
            quality = ?config.quality,
            "analyzer ready"
        );
        Ok(Analyzer {
            frame: vec![0.0; config.fft_size],
            pitch_frame: Vec::new(),
            estimator,
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Bring `samples` to the analysis rate. Buffers already at the target
    /// rate are copied through unfiltered.
    pub fn resample(&self, samples: &[f64], source_rate: f64) -> Result<Vec<f64>, ResampleError> {
        if source_rate == self.config.target_rate {
            return Ok(samples.to_vec());
        }
        let mut resampler = Resampler::from_config(source_rate, &self.config)?;
        Ok(resampler.process(samples))
    }

    /// Analyse a whole buffer recorded at `source_rate`.
    pub fn analyse(
        &mut self,
        samples: &[f64],
        source_rate: f64,
        mut detector: Option<&mut dyn PitchDetector>,
    ) -> Result<Analysis, PitchscopeError> {
        let resampled = self.resample(samples, source_rate)?;
        let rate = self.config.target_rate;
        let hop = self.config.hop_size;

        if let Some(d) = detector.as_deref() {
            if d.sample_rate() != rate {
                warn!(
                    detector_rate = d.sample_rate(),
                    analysis_rate = rate,
                    "pitch detector rate differs from analysis rate, skipping pitch"
                );
                detector = None;
            }
        }
        if let Some(d) = detector.as_deref() {
            self.pitch_frame.resize(d.frame_len(), 0.0);
        }

        let frame_count = FrameSlicer::<f64>::frame_count(resampled.len(), hop);
        debug!(
            source_rate,
            input_len = samples.len(),
            resampled_len = resampled.len(),
            frame_count,
            "analysing buffer"
        );

        let mut spectral = FrameSlicer::new(&resampled);
        let mut pitched = FrameSlicer::new(&resampled);
        let mut columns = Vec::with_capacity(frame_count);
        for index in 0..frame_count {
            spectral.read(hop, &mut self.frame);
            let pitch = match detector.as_deref_mut() {
                Some(d) => {
                    pitched.read(hop, &mut self.pitch_frame);
                    pitch_of(d, &self.pitch_frame, self.config.confidence_threshold)?
                }
                None => None,
            };
            let time = (index * hop) as f64 / rate;
            trace!(index, time, ?pitch, "frame");
            columns.push(self.column(time, pitch)?);
        }

        Ok(Analysis {
            sample_rate: rate,
            fft_size: self.config.fft_size,
            hop_size: hop,
            columns,
        })
    }

    /// Analyse the newest samples of a live capture. The ring is assumed
    /// to hold audio at the analysis rate.
    pub fn analyse_live(
        &mut self,
        ring: &CaptureRing,
        detector: Option<&mut dyn PitchDetector>,
    ) -> Result<SpectrumColumn, PitchscopeError> {
        if self.frame.len() > ring.capacity() {
            return Err(SpectralError::FrameLength {
                expected: self.frame.len(),
                found: ring.capacity(),
            }
            .into());
        }
        ring.snapshot(&mut self.frame);

        let pitch = match detector {
            Some(d) => {
                if d.frame_len() > ring.capacity() {
                    return Err(PitchError::FrameLength {
                        expected: d.frame_len(),
                        found: ring.capacity(),
                    }
                    .into());
                }
                self.pitch_frame.resize(d.frame_len(), 0.0);
                ring.snapshot(&mut self.pitch_frame);
                pitch_of(d, &self.pitch_frame, self.config.confidence_threshold)?
            }
            None => None,
        };
        let time = ring.written() as f64 / self.config.target_rate;
        self.column(time, pitch)
    }

    /// Display intensities in [0, 1] for `column`, one per axis row.
    pub fn render_column(&self, column: &SpectrumColumn, axis: &LogFrequencyAxis) -> Vec<f64> {
        let (floor, top) = (self.config.floor_db, self.config.top_db);
        fold_reassigned(&column.gains, &column.frequencies, self.config.target_rate, axis)
            .into_iter()
            .map(|g| normalize_db(gain_to_db(g, floor), floor, top))
            .collect()
    }

    fn column(&mut self, time: f64, pitch: Option<f64>) -> Result<SpectrumColumn, PitchscopeError> {
        self.estimator.process(&self.frame)?;
        let bins = self.estimator.bin_count();
        let mut gains = vec![0.0; bins];
        let mut frequencies = vec![0.0; bins];
        self.estimator.gains(&mut gains);
        self.estimator.frequencies(&mut frequencies);
        Ok(SpectrumColumn {
            time,
            gains,
            frequencies,
            pitch,
        })
    }
}

fn pitch_of(
    detector: &mut dyn PitchDetector,
    frame: &[f64],
    threshold: f64,
) -> Result<Option<f64>, PitchError> {
    let estimates = detector.detect(frame)?;
    Ok(most_confident(&estimates, threshold))
}
