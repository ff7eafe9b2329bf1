//! Continuous pole bank. A filter's impulse response held as a set of
//! complex exponential modes that can be queried or advanced by any
//! real-valued time offset.
//!
//! This is the band-limited impulse insertion core: injecting an impulse
//! adds each mode's residue to the state, stepping rotates/decays every
//! mode, and evaluating sums the real parts. Fractional offsets go
//! through a lookup table of per-pole fractional powers, linearly
//! interpolated between adjacent rows.

use std::f64::consts::PI;

use num_complex::Complex64;

use super::coeffs::FilterDesign;

/// Default number of fractional steps per sample in the lookup table.
pub const DEFAULT_TABLE_RESOLUTION: usize = 127;

#[derive(Debug, Clone)]
pub struct PoleBank {
    design: FilterDesign,
    /// `2π / sample_rate`.
    angular_scale: f64,
    cutoff: f64,
    resolution: usize,

    poles: Vec<Complex64>,
    synthesis: Vec<Complex64>,
    impulse: Vec<Complex64>,
    state: Vec<Complex64>,

    /// `(resolution + 1) × pole_count`, row-major. Row `s` holds
    /// `exp(pole * angular_scale * s / resolution)`.
    table: Vec<Complex64>,
}

impl PoleBank {
    /// Create a bank running at `sample_rate` with its cutoff at the
    /// design's passband edge.
    pub fn new(design: &FilterDesign, sample_rate: f64, resolution: usize) -> Self {
        assert!(resolution > 0, "pole bank table resolution must be non-zero");
        let count = design.pole_count();
        let mut bank = PoleBank {
            design: design.clone(),
            angular_scale: 0.0,
            cutoff: design.passband_edge(),
            resolution,
            poles: vec![Complex64::new(0.0, 0.0); count],
            synthesis: vec![Complex64::new(0.0, 0.0); count],
            impulse: vec![Complex64::new(0.0, 0.0); count],
            state: vec![Complex64::new(0.0, 0.0); count],
            table: vec![Complex64::new(1.0, 0.0); (resolution + 1) * count],
        };
        bank.init(sample_rate);
        bank
    }

    /// Set the sample rate, rebuild the table for the current cutoff and
    /// clear the state.
    pub fn init(&mut self, sample_rate: f64) {
        assert!(
            sample_rate.is_finite() && sample_rate > 0.0,
            "pole bank sample rate must be positive, got {sample_rate}"
        );
        self.angular_scale = 2.0 * PI / sample_rate;
        self.set_cutoff(self.cutoff);
        self.reset();
    }

    /// Move the passband edge to `cutoff` Hz by scaling every pole and
    /// coefficient by `cutoff / passband_edge`, then rebuild the
    /// fractional-step table. State is left untouched.
    pub fn set_cutoff(&mut self, cutoff: f64) {
        self.cutoff = cutoff;
        let scale = cutoff / self.design.passband_edge();
        let count = self.poles.len();

        for (i, pole) in self.design.poles().iter().enumerate() {
            self.poles[i] = pole.location * scale;
            self.synthesis[i] = pole.coefficient * scale;
            self.impulse[i] = pole.impulse_coefficient * scale * self.angular_scale;
        }

        for s in 0..=self.resolution {
            let partial = s as f64 / self.resolution as f64 * self.angular_scale;
            let row = &mut self.table[s * count..(s + 1) * count];
            for (slot, pole) in row.iter_mut().zip(&self.poles) {
                *slot = (*pole * partial).exp();
            }
        }
    }

    pub fn reset(&mut self) {
        self.state.fill(Complex64::new(0.0, 0.0));
    }

    /// Instantaneous filter output.
    pub fn evaluate(&self) -> f64 {
        self.state.iter().map(|s| s.re).sum()
    }

    /// Output `delta` samples in the future without advancing the state.
    pub fn evaluate_at(&self, delta: f64) -> f64 {
        assert!(
            (0.0..1.0).contains(&delta),
            "evaluate offset must be in [0, 1), got {delta}"
        );
        let (low, high, frac) = self.rows(delta * self.resolution as f64);
        self.state
            .iter()
            .zip(low.iter().zip(high))
            .map(|(s, (lo, hi))| (*s * (*lo + (*hi - *lo) * frac)).re)
            .sum()
    }

    /// Add an impulse of `amount` at the current instant.
    pub fn inject(&mut self, amount: f64) {
        for (s, c) in self.state.iter_mut().zip(&self.impulse) {
            *s += *c * amount;
        }
    }

    /// Add an impulse that happened `past` samples ago, advanced to now.
    pub fn inject_past(&mut self, amount: f64, past: f64) {
        assert!(
            (0.0..1.0).contains(&past),
            "impulse offset must be in [0, 1), got {past}"
        );
        let count = self.poles.len();
        let (index, frac) = split_index(past * self.resolution as f64);
        for i in 0..count {
            let lo = self.table[index * count + i];
            let hi = self.table[(index + 1) * count + i];
            self.state[i] += self.impulse[i] * (lo + (hi - lo) * frac) * amount;
        }
    }

    /// Advance exactly one sample.
    pub fn step(&mut self) {
        let count = self.poles.len();
        let last = &self.table[self.resolution * count..];
        for (s, p) in self.state.iter_mut().zip(last) {
            *s *= *p;
        }
    }

    /// Advance by `delta` samples; whole samples are taken one at a time.
    pub fn step_by(&mut self, delta: f64) {
        assert!(
            delta.is_finite() && delta >= 0.0,
            "step must be a non-negative finite offset, got {delta}"
        );
        let (mut index, frac) = split_index(delta * self.resolution as f64);
        while index >= self.resolution {
            self.step();
            index -= self.resolution;
        }

        let count = self.poles.len();
        for i in 0..count {
            let lo = self.table[index * count + i];
            let hi = self.table[(index + 1) * count + i];
            self.state[i] *= lo + (hi - lo) * frac;
        }
    }

    fn rows(&self, table_index: f64) -> (&[Complex64], &[Complex64], f64) {
        let count = self.poles.len();
        let (index, frac) = split_index(table_index);
        (
            &self.table[index * count..(index + 1) * count],
            &self.table[(index + 1) * count..(index + 2) * count],
            frac,
        )
    }

    pub fn pole_count(&self) -> usize {
        self.poles.len()
    }

    pub fn table_resolution(&self) -> usize {
        self.resolution
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn design(&self) -> &FilterDesign {
        &self.design
    }

    pub fn state(&self) -> &[Complex64] {
        &self.state
    }

    /// Scaled pole locations, per-sample units are `pole * angular_scale`.
    pub fn poles(&self) -> &[Complex64] {
        &self.poles
    }

    /// Direct-synthesis coefficients at the current cutoff.
    pub fn synthesis_coefficients(&self) -> &[Complex64] {
        &self.synthesis
    }

    pub fn impulse_coefficients(&self) -> &[Complex64] {
        &self.impulse
    }

    pub fn angular_scale(&self) -> f64 {
        self.angular_scale
    }
}

fn split_index(table_index: f64) -> (usize, f64) {
    let floor = table_index.floor();
    (floor as usize, table_index - floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::coeffs::Quality;

    fn bank(quality: Quality) -> PoleBank {
        let design = quality.design();
        let mut bank = PoleBank::new(&design, 48000.0, DEFAULT_TABLE_RESOLUTION);
        bank.set_cutoff(8000.0 * design.passband_edge() / design.stopband_edge());
        bank
    }

    /// Closed-form impulse response: Σ Re(c_i · exp(p_i · ω · t)).
    fn closed_form(bank: &PoleBank, t: f64) -> f64 {
        bank.poles()
            .iter()
            .zip(bank.impulse_coefficients())
            .map(|(p, c)| (*c * (*p * bank.angular_scale() * t).exp()).re)
            .sum()
    }

    #[test]
    fn table_row_zero_is_identity() {
        let b = bank(Quality::Median);
        let (low, _, _) = b.rows(0.0);
        assert!(low.iter().all(|&m| m == Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn evaluate_now_equals_evaluate_zero() {
        let mut b = bank(Quality::Fast);
        b.inject(1.0);
        b.step();
        b.step();
        b.inject(-0.3);
        assert_eq!(b.evaluate(), b.evaluate_at(0.0));
    }

    #[test]
    fn evaluate_at_does_not_mutate() {
        let mut b = bank(Quality::Fast);
        b.inject(1.0);
        b.step();
        let before = b.state().to_vec();
        let _ = b.evaluate_at(0.6);
        assert_eq!(before, b.state());
    }

    #[test]
    fn integer_steps_match_repeated_step() {
        for q in [Quality::Fast, Quality::Median, Quality::Best] {
            for k in 0..5usize {
                let mut a = bank(q);
                let mut b = bank(q);
                a.inject(1.0);
                b.inject(1.0);
                for _ in 0..k {
                    a.step();
                }
                b.step_by(k as f64);
                for (x, y) in a.state().iter().zip(b.state()) {
                    assert!((*x - *y).norm() < 1e-12, "{q:?} k={k}: {x} vs {y}");
                }
            }
        }
    }

    #[test]
    fn impulse_response_matches_closed_form() {
        let mut b = bank(Quality::Fast);
        b.inject(1.0);
        for n in 0..32 {
            let expected = closed_form(&b, n as f64);
            assert!(
                (b.evaluate() - expected).abs() < 1e-12,
                "sample {n}: {} vs {expected}",
                b.evaluate()
            );
            b.step();
        }
    }

    #[test]
    fn impulse_response_matches_direct_recursion() {
        // Independent first-order recursion per mode: y_i[n+1] = a_i · y_i[n].
        let mut b = bank(Quality::Best);
        let mut modes: Vec<Complex64> = b.impulse_coefficients().to_vec();
        let decay: Vec<Complex64> = b
            .poles()
            .iter()
            .map(|p| (*p * b.angular_scale()).exp())
            .collect();
        b.inject(2.5);
        for m in modes.iter_mut() {
            *m *= 2.5;
        }
        for n in 0..64 {
            let direct: f64 = modes.iter().map(|m| m.re).sum();
            assert!((b.evaluate() - direct).abs() < 1e-12, "sample {n}");
            b.step();
            for (m, a) in modes.iter_mut().zip(&decay) {
                *m *= *a;
            }
        }
    }

    #[test]
    fn fractional_evaluation_tracks_closed_form() {
        let mut b = bank(Quality::Fast);
        b.inject(1.0);
        b.step();
        b.step();
        for frac in [0.1, 0.37, 0.5, 0.93] {
            let expected = closed_form(&b, 2.0 + frac);
            let got = b.evaluate_at(frac);
            assert!((got - expected).abs() < 1e-6, "frac {frac}: {got} vs {expected}");
        }
    }

    #[test]
    fn fractional_step_matches_fractional_evaluate() {
        let mut b = bank(Quality::Median);
        b.inject(1.0);
        b.step_by(3.0);
        let predicted = b.evaluate_at(0.25);
        b.step_by(0.25);
        assert!((b.evaluate() - predicted).abs() < 1e-15);
    }

    #[test]
    fn multi_sample_step_crosses_whole_samples() {
        let mut a = bank(Quality::Fast);
        let mut b = bank(Quality::Fast);
        a.inject(1.0);
        b.inject(1.0);
        a.step_by(2.5);
        b.step();
        b.step();
        b.step_by(0.5);
        for (x, y) in a.state().iter().zip(b.state()) {
            assert!((*x - *y).norm() < 1e-12);
        }
    }

    #[test]
    fn past_impulse_equals_impulse_then_step() {
        let mut a = bank(Quality::Fast);
        let mut b = bank(Quality::Fast);
        a.inject_past(0.8, 0.4);
        b.inject(0.8);
        b.step_by(0.4);
        for (x, y) in a.state().iter().zip(b.state()) {
            assert!((*x - *y).norm() < 1e-12);
        }
    }

    #[test]
    fn impulse_train_settles_to_unity() {
        let mut b = bank(Quality::Median);
        for _ in 0..4000 {
            b.inject(1.0);
            b.step();
        }
        let out = b.evaluate();
        assert!((out - 1.0).abs() < 1e-3, "DC output {out}");
    }

    #[test]
    fn reset_clears_state() {
        let mut b = bank(Quality::Best);
        b.inject(1.0);
        b.step();
        b.reset();
        assert_eq!(b.evaluate(), 0.0);
        assert!(b.state().iter().all(|s| s.norm() == 0.0));
    }

    #[test]
    fn init_rebuilds_for_new_rate() {
        let mut b = bank(Quality::Fast);
        let cutoff = b.cutoff();
        b.inject(1.0);
        b.init(96000.0);
        assert_eq!(b.evaluate(), 0.0);
        assert_eq!(b.cutoff(), cutoff);
        assert!((b.angular_scale() - 2.0 * PI / 96000.0).abs() < 1e-18);
    }

    #[test]
    fn synthesis_coefficients_scale_with_cutoff() {
        let design = Quality::Fast.design();
        let mut b = PoleBank::new(&design, 48000.0, 16);
        b.set_cutoff(design.passband_edge() / 2.0);
        let expected = design.poles()[0].coefficient * 0.5;
        assert!((b.synthesis_coefficients()[0] - expected).norm() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "evaluate offset")]
    fn evaluate_rejects_full_sample_offset() {
        let b = bank(Quality::Fast);
        b.evaluate_at(1.0);
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    fn step_rejects_negative_offset() {
        let mut b = bank(Quality::Fast);
        b.step_by(-0.5);
    }
}
