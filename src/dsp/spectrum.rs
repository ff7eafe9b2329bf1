//! Display mapping for reassigned spectra.
//!
//! Renderers are sinks: they receive a [`SpectrumColumn`] per frame and
//! use the helpers here to turn gains into normalised dB and reassigned
//! frequencies into rows of a logarithmic frequency axis.

use serde::{Deserialize, Serialize};

/// One analysed frame, ready for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumColumn {
    /// Frame start, in seconds from the beginning of the analysed buffer.
    pub time: f64,
    /// Per-bin amplitude (1.0 = full-scale sinusoid).
    pub gains: Vec<f64>,
    /// Per-bin reassigned frequency, normalised to the sample rate.
    /// Non-finite for silent bins.
    pub frequencies: Vec<f64>,
    /// Confident pitch for this frame, Hz.
    pub pitch: Option<f64>,
}

impl SpectrumColumn {
    /// Bin with the largest gain whose reassigned frequency is finite.
    pub fn loudest_bin(&self) -> Option<usize> {
        self.gains
            .iter()
            .zip(&self.frequencies)
            .enumerate()
            .filter(|(_, (_, f))| f.is_finite())
            .max_by(|a, b| a.1.0.total_cmp(b.1.0))
            .map(|(bin, _)| bin)
    }

    /// Reassigned frequency of the loudest bin, Hz.
    pub fn peak_frequency(&self, sample_rate: f64) -> Option<f64> {
        self.loudest_bin().map(|bin| self.frequencies[bin] * sample_rate)
    }
}

/// Linear gain to dB, pinned to `floor_db` below the floor.
pub fn gain_to_db(gain: f64, floor_db: f64) -> f64 {
    let floor_gain = 10f64.powf(floor_db / 20.0);
    if gain > floor_gain {
        20.0 * gain.log10()
    } else {
        floor_db
    }
}

/// Map `db` into [0, 1] between `floor_db` and `top_db`.
pub fn normalize_db(db: f64, floor_db: f64, top_db: f64) -> f64 {
    ((db - floor_db) / (top_db - floor_db)).clamp(0.0, 1.0)
}

/// Logarithmic frequency axis with `rows` rows, row 0 at `min_hz`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogFrequencyAxis {
    pub min_hz: f64,
    pub max_hz: f64,
    pub rows: usize,
}

impl LogFrequencyAxis {
    pub fn new(min_hz: f64, max_hz: f64, rows: usize) -> Self {
        assert!(
            min_hz > 0.0 && max_hz > min_hz,
            "log axis needs 0 < min_hz < max_hz, got {min_hz}..{max_hz}"
        );
        LogFrequencyAxis { min_hz, max_hz, rows }
    }

    /// Row for `freq_hz`, or `None` outside the axis.
    pub fn row(&self, freq_hz: f64) -> Option<usize> {
        if !freq_hz.is_finite() || freq_hz < self.min_hz || freq_hz > self.max_hz || self.rows == 0 {
            return None;
        }
        let (lo, hi) = (self.min_hz.ln(), self.max_hz.ln());
        let normal = (freq_hz.ln() - lo) / (hi - lo);
        Some(((normal * self.rows as f64) as usize).min(self.rows - 1))
    }
}

impl Default for LogFrequencyAxis {
    fn default() -> Self {
        LogFrequencyAxis::new(20.0, 8000.0, 512)
    }
}

/// Fold per-bin gains onto the rows their reassigned frequencies land in,
/// keeping the loudest contribution per row. Bins with non-finite
/// frequency or outside the axis are skipped.
pub fn fold_reassigned(
    gains: &[f64],
    frequencies: &[f64],
    sample_rate: f64,
    axis: &LogFrequencyAxis,
) -> Vec<f64> {
    let mut rows = vec![0.0; axis.rows];
    for (&gain, &freq) in gains.iter().zip(frequencies) {
        if let Some(row) = axis.row(freq * sample_rate) {
            if gain > rows[row] {
                rows[row] = gain;
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_conversion_respects_floor() {
        assert!((gain_to_db(1.0, -100.0)).abs() < 1e-12);
        assert!((gain_to_db(0.1, -100.0) + 20.0).abs() < 1e-9);
        assert_eq!(gain_to_db(1e-7, -100.0), -100.0);
        assert_eq!(gain_to_db(0.0, -60.0), -60.0);
    }

    #[test]
    fn normalize_db_clamps() {
        assert_eq!(normalize_db(-100.0, -100.0, 10.0), 0.0);
        assert_eq!(normalize_db(10.0, -100.0, 10.0), 1.0);
        assert_eq!(normalize_db(50.0, -100.0, 10.0), 1.0);
        assert!((normalize_db(-45.0, -100.0, 10.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn log_axis_maps_edges_and_octaves() {
        let axis = LogFrequencyAxis::new(20.0, 8000.0, 512);
        assert_eq!(axis.row(20.0), Some(0));
        assert_eq!(axis.row(8000.0), Some(511));
        assert_eq!(axis.row(10.0), None);
        assert_eq!(axis.row(9000.0), None);
        assert_eq!(axis.row(f64::NAN), None);

        let a = axis.row(220.0).unwrap();
        let b = axis.row(440.0).unwrap();
        let c = axis.row(880.0).unwrap();
        assert!(((b - a) as i64 - (c - b) as i64).abs() <= 1);
    }

    #[test]
    fn fold_keeps_loudest_per_row() {
        let axis = LogFrequencyAxis::new(20.0, 8000.0, 64);
        let sr = 16000.0;
        let gains = [0.2, 0.9, 0.5, 0.3];
        let freqs = [440.0 / sr, 440.5 / sr, f64::NAN, 3000.0 / sr];
        let rows = fold_reassigned(&gains, &freqs, sr, &axis);
        assert_eq!(rows.len(), 64);
        assert_eq!(rows[axis.row(440.0).unwrap()], 0.9);
        assert_eq!(rows[axis.row(3000.0).unwrap()], 0.3);
        assert_eq!(rows.iter().filter(|&&g| g > 0.0).count(), 2);
    }

    #[test]
    fn loudest_bin_skips_silent_bins() {
        let column = SpectrumColumn {
            time: 0.0,
            gains: vec![0.1, 5.0, 0.4],
            frequencies: vec![0.01, f64::NAN, 0.03],
            pitch: None,
        };
        assert_eq!(column.loudest_bin(), Some(2));
        assert!((column.peak_frequency(16000.0).unwrap() - 480.0).abs() < 1e-9);
    }
}
