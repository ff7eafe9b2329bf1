//! Real-input forward transform with a packed output layout.
//!
//! Output for an `N`-point transform is `N/2 + 1` complex bins stored as
//! `N + 2` interleaved `re, im` values. Bin 0 and the Nyquist bin carry a
//! zero imaginary part.

use std::fmt;
use std::sync::Arc;

use num_complex::Complex64;
use realfft::{RealFftPlanner, RealToComplex};

use crate::error::SpectralError;

/// The spectral transform the reassignment estimator runs on.
pub trait RealTransform {
    fn size(&self) -> usize;

    /// Transform `input` (length `size()`) into `output` (length
    /// `size() + 2`). `input` may be used as scratch space.
    fn forward(&mut self, input: &mut [f64], output: &mut [f64]) -> Result<(), SpectralError>;
}

pub struct RealFft {
    size: usize,
    plan: Arc<dyn RealToComplex<f64>>,
    spectrum: Vec<Complex64>,
    scratch: Vec<Complex64>,
}

impl RealFft {
    pub fn new(size: usize) -> Result<Self, SpectralError> {
        if size == 0 {
            return Err(SpectralError::ZeroSize);
        }
        if size % 2 != 0 {
            return Err(SpectralError::OddSize { size });
        }
        let plan = RealFftPlanner::<f64>::new().plan_fft_forward(size);
        let spectrum = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();
        Ok(RealFft {
            size,
            plan,
            spectrum,
            scratch,
        })
    }
}

impl RealTransform for RealFft {
    fn size(&self) -> usize {
        self.size
    }

    fn forward(&mut self, input: &mut [f64], output: &mut [f64]) -> Result<(), SpectralError> {
        if input.len() != self.size {
            return Err(SpectralError::FrameLength {
                expected: self.size,
                found: input.len(),
            });
        }
        if output.len() != self.size + 2 {
            return Err(SpectralError::SpectrumLength {
                expected: self.size + 2,
                found: output.len(),
            });
        }

        self.plan
            .process_with_scratch(input, &mut self.spectrum, &mut self.scratch)
            .map_err(|e| SpectralError::Transform(e.to_string()))?;

        for (bin, pair) in self.spectrum.iter().zip(output.chunks_exact_mut(2)) {
            pair[0] = bin.re;
            pair[1] = bin.im;
        }
        // realfft may leave rounding noise here; the layout promises zero.
        output[1] = 0.0;
        output[self.size + 1] = 0.0;
        Ok(())
    }
}

impl fmt::Debug for RealFft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealFft").field("size", &self.size).finish()
    }
}
