//! Analysis windows and window helpers.

use std::f64::consts::PI;

/// Raised-cosine window with Hamming's optimal coefficients.
pub struct Hamming;

impl Hamming {
    /// Main-lobe half width, in bins.
    pub const MAINLOBE_WIDTH: f64 = 2.0;
    /// Highest side lobe, dB.
    pub const SIDELOBE_DB: f64 = -43.7547;
    /// Side-lobe roll-off, dB per octave.
    pub const SIDELOBE_ROLLOFF_DB: f64 = -6.0;
    /// First side lobe after windowed-sinc FIR design, dB.
    pub const FIR_STOPBAND_DB: f64 = -53.0;
    /// FIR transition width factor.
    pub const FIR_TRANSITION: f64 = 3.3;

    const A0: f64 = 0.53836;
    const A1: f64 = 0.46164;

    /// Fill `out` with the window. `periodic` selects the analysis form
    /// (period `N`, peak at `N/2`); otherwise the symmetric FIR form.
    pub fn fill(out: &mut [f64], periodic: bool) {
        let period = Self::period(out.len(), periodic);
        for (n, w) in out.iter_mut().enumerate() {
            *w = Self::value(n as f64 / period - 0.5);
        }
    }

    pub fn apply(buffer: &mut [f64], periodic: bool) {
        let period = Self::period(buffer.len(), periodic);
        for (n, x) in buffer.iter_mut().enumerate() {
            *x *= Self::value(n as f64 / period - 0.5);
        }
    }

    /// Derivative of the periodic window with respect to normalised time
    /// `t = n / N`.
    pub fn fill_derivative(out: &mut [f64]) {
        let len = out.len() as f64;
        for (n, d) in out.iter_mut().enumerate() {
            let t = n as f64 / len - 0.5;
            *d = -Self::A1 * 2.0 * PI * (2.0 * PI * t).sin();
        }
    }

    /// Generator usable with `ReassignmentEstimator::change_window`.
    pub fn generator(window: &mut [f64], derivative: &mut [f64]) {
        Self::fill(window, true);
        Self::fill_derivative(derivative);
    }

    fn value(t: f64) -> f64 {
        Self::A0 + Self::A1 * (2.0 * PI * t).cos()
    }

    fn period(len: usize, periodic: bool) -> f64 {
        if periodic || len < 2 {
            len as f64
        } else {
            (len - 1) as f64
        }
    }
}

/// Amplitude normalisation `2 / Σw`: a full-scale sinusoid reads 1.0.
pub fn normalize_gain(window: &[f64]) -> f64 {
    2.0 / window.iter().sum::<f64>()
}

pub fn normalize(window: &mut [f64]) {
    let gain = normalize_gain(window);
    window.iter_mut().for_each(|w| *w *= gain);
}

/// Time-ramp window `w[n] · (n − N/2)`.
pub fn fill_time_ramp(out: &mut [f64], window: &[f64]) {
    assert_eq!(out.len(), window.len(), "ramp window length mismatch");
    let offset = 0.5 * window.len() as f64;
    for (n, (t, w)) in out.iter_mut().zip(window).enumerate() {
        *t = w * (n as f64 - offset);
    }
}

/// Place an odd-length, centred kernel into `output` with its centre at
/// index 0 and the left half wrapped to the end.
pub fn zero_phase_pad(output: &mut [f64], input: &[f64]) {
    assert!(input.len() % 2 == 1, "zero-phase input must have odd length");
    assert!(output.len() >= input.len(), "zero-phase output too short");
    let half = (input.len() - 1) / 2;
    output.fill(0.0);
    let tail = output.len() - half;
    output[tail..].copy_from_slice(&input[..half]);
    output[..input.len() - half].copy_from_slice(&input[half..]);
}

pub fn zero_pad(output: &mut [f64], input: &[f64]) {
    assert!(output.len() >= input.len(), "zero-pad output too short");
    let (head, rest) = output.split_at_mut(input.len());
    head.copy_from_slice(input);
    rest.fill(0.0);
}
