//! Arbitrary-ratio resampler built on the continuous pole bank.
//!
//! Every source sample is injected into the bank as an impulse; output
//! samples are read between source samples with the bank's fractional
//! evaluation. The elliptic prototype supplies the anti-aliasing, so no
//! per-output convolution is needed.

use tracing::debug;

use crate::config::AnalysisConfig;
use crate::error::ResampleError;

use super::coeffs::{FilterDesign, Quality};
use super::pole_bank::{PoleBank, DEFAULT_TABLE_RESOLUTION};

/// Which Nyquist frequency the stopband edge is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    TargetNyquist,
    LowerNyquist,
}

#[derive(Debug, Clone)]
pub struct Resampler {
    bank: PoleBank,
    source_rate: f64,
    target_rate: f64,
    /// Source samples consumed per output sample.
    phase_increment: f64,
}

impl Resampler {
    pub fn new(source_rate: f64, target_rate: f64, quality: Quality) -> Result<Self, ResampleError> {
        Self::with_design(
            source_rate,
            target_rate,
            &quality.design(),
            DEFAULT_TABLE_RESOLUTION,
        )
    }

    /// Like [`Resampler::new`], but when upsampling the stopband is pinned
    /// to the source Nyquist so spectral images above it are removed.
    pub fn with_image_rejection(
        source_rate: f64,
        target_rate: f64,
        quality: Quality,
    ) -> Result<Self, ResampleError> {
        Self::build(
            source_rate,
            target_rate,
            &quality.design(),
            DEFAULT_TABLE_RESOLUTION,
            Band::LowerNyquist,
        )
    }

    pub fn from_config(source_rate: f64, config: &AnalysisConfig) -> Result<Self, ResampleError> {
        let band = if config.image_rejection {
            Band::LowerNyquist
        } else {
            Band::TargetNyquist
        };
        Self::build(
            source_rate,
            config.target_rate,
            &config.quality.design(),
            config.table_resolution,
            band,
        )
    }

    /// Cutoff at `target_rate / 2 · passband / stopband`.
    pub fn with_design(
        source_rate: f64,
        target_rate: f64,
        design: &FilterDesign,
        table_resolution: usize,
    ) -> Result<Self, ResampleError> {
        Self::build(
            source_rate,
            target_rate,
            design,
            table_resolution,
            Band::TargetNyquist,
        )
    }

    fn build(
        source_rate: f64,
        target_rate: f64,
        design: &FilterDesign,
        table_resolution: usize,
        band: Band,
    ) -> Result<Self, ResampleError> {
        for rate in [source_rate, target_rate] {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(ResampleError::InvalidRate { rate });
            }
        }
        if table_resolution == 0 {
            return Err(ResampleError::ZeroTableResolution);
        }

        let nyquist = match band {
            Band::TargetNyquist => target_rate / 2.0,
            Band::LowerNyquist => source_rate.min(target_rate) / 2.0,
        };
        let cutoff = nyquist * design.passband_edge() / design.stopband_edge();

        let mut bank = PoleBank::new(design, source_rate, table_resolution);
        bank.set_cutoff(cutoff);
        let phase_increment = source_rate / target_rate;

        debug!(
            source_rate,
            target_rate,
            cutoff,
            phase_increment,
            ?band,
            poles = bank.pole_count(),
            "resampler configured"
        );

        Ok(Resampler {
            bank,
            source_rate,
            target_rate,
            phase_increment,
        })
    }

    /// Resample a complete, finite input sequence.
    ///
    /// The bank is reset first, so each call is independent. The output
    /// ends once the read cursor reaches the last input sample.
    pub fn process(&mut self, input: &[f64]) -> Vec<f64> {
        let mut output = Vec::with_capacity(self.expected_len(input.len()));
        self.process_into(input, &mut output);
        output
    }

    /// Like [`Resampler::process`] but appends into a caller-owned buffer.
    pub fn process_into(&mut self, input: &[f64], output: &mut Vec<f64>) {
        self.bank.reset();
        let Some(&first) = input.first() else {
            return;
        };
        self.bank.inject(first);

        let last = input.len() - 1;
        let mut phase = 0.0_f64;
        let mut rpos = 0usize;
        while rpos < last {
            output.push(self.bank.evaluate_at(phase));

            phase += self.phase_increment;
            let whole = phase.floor();
            phase -= whole;
            let new_rpos = (rpos + whole as usize).min(last);

            for &sample in &input[rpos + 1..=new_rpos] {
                self.bank.step();
                self.bank.inject(sample);
            }
            rpos = new_rpos;
        }
    }

    /// Convenience for `f32` buffers coming from decoders or the browser.
    pub fn process_f32(&mut self, input: &[f32]) -> Vec<f32> {
        let wide: Vec<f64> = input.iter().map(|&s| s as f64).collect();
        self.process(&wide).into_iter().map(|s| s as f32).collect()
    }

    /// Number of samples [`Resampler::process`] will emit for `input_len`
    /// samples (up to floating-point rounding of the phase accumulator).
    pub fn expected_len(&self, input_len: usize) -> usize {
        if input_len < 2 {
            return 0;
        }
        ((input_len - 1) as f64 / self.phase_increment).ceil() as usize
    }

    pub fn source_rate(&self) -> f64 {
        self.source_rate
    }

    pub fn target_rate(&self) -> f64 {
        self.target_rate
    }

    pub fn ratio(&self) -> f64 {
        self.phase_increment
    }

    pub fn cutoff(&self) -> f64 {
        self.bank.cutoff()
    }
}
