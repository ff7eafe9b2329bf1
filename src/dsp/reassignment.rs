//! Time-frequency reassignment spectral estimator.
//!
//! Three transforms of the same frame are taken: with the analysis window,
//! with its time derivative, and with a time-ramped window. The phase
//! relation between the plain and derivative transforms moves each bin's
//! reported frequency to the instantaneous frequency of the component that
//! dominates it, well below bin resolution.
//!
//! The ramp transform is kept for time reassignment (where within the
//! frame a bin's energy sits) and is exposed read-only.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::error::SpectralError;

use super::fft::{RealFft, RealTransform};
use super::window::{fill_time_ramp, normalize_gain, Hamming};

#[derive(Debug)]
pub struct ReassignmentEstimator<T = RealFft> {
    transform: T,
    buffer: Vec<f64>,
    window: Vec<f64>,
    derivative: Vec<f64>,
    ramp: Vec<f64>,
    plain_spectrum: Vec<f64>,
    derivative_spectrum: Vec<f64>,
    ramp_spectrum: Vec<f64>,
    window_gain: f64,
    derivative_gain: f64,
}

impl ReassignmentEstimator<RealFft> {
    /// Estimator over `fft_size`-sample frames with a periodic Hamming window.
    pub fn new(fft_size: usize) -> Result<Self, SpectralError> {
        Self::with_transform(RealFft::new(fft_size)?)
    }
}

impl<T: RealTransform> ReassignmentEstimator<T> {
    pub fn with_transform(transform: T) -> Result<Self, SpectralError> {
        let size = transform.size();
        if size == 0 {
            return Err(SpectralError::ZeroSize);
        }
        let mut estimator = ReassignmentEstimator {
            transform,
            buffer: vec![0.0; size],
            window: vec![0.0; size],
            derivative: vec![0.0; size],
            ramp: vec![0.0; size],
            plain_spectrum: vec![0.0; size + 2],
            derivative_spectrum: vec![0.0; size + 2],
            ramp_spectrum: vec![0.0; size + 2],
            window_gain: 0.0,
            derivative_gain: 0.0,
        };
        estimator.change_window(Hamming::generator);
        Ok(estimator)
    }

    /// Replace the analysis window. `generator` fills the window and its
    /// derivative with respect to normalised time `n / N`.
    pub fn change_window<F>(&mut self, generator: F)
    where
        F: FnOnce(&mut [f64], &mut [f64]),
    {
        generator(&mut self.window, &mut self.derivative);
        fill_time_ramp(&mut self.ramp, &self.window);
        self.window_gain = normalize_gain(&self.window);
        self.derivative_gain = self.window_gain / (2.0 * PI);
    }

    /// Analyse one frame of exactly `fft_size` samples.
    pub fn process(&mut self, frame: &[f64]) -> Result<(), SpectralError> {
        let size = self.transform.size();
        if frame.len() != size {
            return Err(SpectralError::FrameLength {
                expected: size,
                found: frame.len(),
            });
        }

        for (b, (x, w)) in self.buffer.iter_mut().zip(frame.iter().zip(&self.window)) {
            *b = x * w;
        }
        self.transform
            .forward(&mut self.buffer, &mut self.plain_spectrum)?;

        for (b, (x, w)) in self.buffer.iter_mut().zip(frame.iter().zip(&self.derivative)) {
            *b = x * w;
        }
        self.transform
            .forward(&mut self.buffer, &mut self.derivative_spectrum)?;

        for (b, (x, w)) in self.buffer.iter_mut().zip(frame.iter().zip(&self.ramp)) {
            *b = x * w;
        }
        self.transform.forward(&mut self.buffer, &mut self.ramp_spectrum)
    }

    /// Reassigned frequency of `bin`, normalised to the sample rate
    /// (cycles per sample). Non-finite when the bin holds no energy.
    pub fn frequency(&self, bin: usize) -> f64 {
        self.check_bin(bin);
        let xh = bin_value(&self.plain_spectrum, bin) * self.window_gain;
        let xdh = bin_value(&self.derivative_spectrum, bin) * self.derivative_gain;
        let cross = xdh.im * xh.re - xdh.re * xh.im;
        let correction = -cross / xh.norm_sqr();
        (bin as f64 + correction) / self.transform.size() as f64
    }

    pub fn frequencies(&self, out: &mut [f64]) {
        for (bin, f) in out.iter_mut().enumerate() {
            *f = self.frequency(bin);
        }
    }

    /// Amplitude of `bin`; a full-scale sinusoid centred on the bin reads 1.0.
    pub fn gain(&self, bin: usize) -> f64 {
        self.check_bin(bin);
        bin_value(&self.plain_spectrum, bin).norm() * self.window_gain
    }

    pub fn gains(&self, out: &mut [f64]) {
        for (bin, g) in out.iter_mut().enumerate() {
            *g = self.gain(bin);
        }
    }

    pub fn fft_size(&self) -> usize {
        self.transform.size()
    }

    pub fn bin_count(&self) -> usize {
        self.transform.size() / 2 + 1
    }

    pub fn window(&self) -> &[f64] {
        &self.window
    }

    pub fn window_gain(&self) -> f64 {
        self.window_gain
    }

    pub fn derivative_gain(&self) -> f64 {
        self.derivative_gain
    }

    /// Packed ramp-windowed spectrum from the last [`process`](Self::process).
    pub fn ramp_spectrum(&self) -> &[f64] {
        &self.ramp_spectrum
    }

    /// Normalisation for the ramp spectrum; equal to the window gain.
    pub fn ramp_gain(&self) -> f64 {
        self.window_gain
    }

    fn check_bin(&self, bin: usize) {
        assert!(
            bin < self.bin_count(),
            "bin {bin} out of range for {} bins",
            self.bin_count()
        );
    }
}

fn bin_value(packed: &[f64], bin: usize) -> Complex64 {
    Complex64::new(packed[2 * bin], packed[2 * bin + 1])
}
