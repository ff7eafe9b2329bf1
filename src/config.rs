use serde::{Deserialize, Serialize};

use crate::dsp::coeffs::Quality;
use crate::dsp::pole_bank::DEFAULT_TABLE_RESOLUTION;
use crate::error::ConfigError;

/// Settings for the offline analysis pipeline. Every field has a default,
/// so a partial (or empty) JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "AnalysisConfig::default_target_rate")]
    pub target_rate: f64,
    #[serde(default = "AnalysisConfig::default_fft_size")]
    pub fft_size: usize,
    #[serde(default = "AnalysisConfig::default_hop_size")]
    pub hop_size: usize,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default = "AnalysisConfig::default_table_resolution")]
    pub table_resolution: usize,
    /// Place the resampler stopband on the lower of the two Nyquist
    /// frequencies, which removes images when upsampling.
    #[serde(default)]
    pub image_rejection: bool,
    #[serde(default = "AnalysisConfig::default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "AnalysisConfig::default_floor_db")]
    pub floor_db: f64,
    #[serde(default = "AnalysisConfig::default_top_db")]
    pub top_db: f64,
}

impl AnalysisConfig {
    fn default_target_rate() -> f64 {
        16_000.0
    }
    fn default_fft_size() -> usize {
        1024
    }
    fn default_hop_size() -> usize {
        256
    }
    fn default_table_resolution() -> usize {
        DEFAULT_TABLE_RESOLUTION
    }
    fn default_confidence_threshold() -> f64 {
        0.9
    }
    fn default_floor_db() -> f64 {
        -100.0
    }
    fn default_top_db() -> f64 {
        10.0
    }

    /// Parse and validate a JSON config.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid {
                field,
                reason: reason.into(),
            })
        }

        if !(self.target_rate.is_finite() && self.target_rate > 0.0) {
            return invalid("target_rate", format!("must be positive, got {}", self.target_rate));
        }
        if self.fft_size == 0 || self.fft_size % 2 != 0 {
            return invalid("fft_size", format!("must be even and non-zero, got {}", self.fft_size));
        }
        if self.hop_size == 0 {
            return invalid("hop_size", "must be non-zero");
        }
        if self.table_resolution == 0 {
            return invalid("table_resolution", "must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return invalid(
                "confidence_threshold",
                format!("must lie in [0, 1], got {}", self.confidence_threshold),
            );
        }
        // partial_cmp also rejects NaN on either side.
        if self.floor_db.partial_cmp(&self.top_db) != Some(std::cmp::Ordering::Less) {
            return invalid(
                "floor_db",
                format!("must be below top_db ({} >= {})", self.floor_db, self.top_db),
            );
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            target_rate: Self::default_target_rate(),
            fft_size: Self::default_fft_size(),
            hop_size: Self::default_hop_size(),
            quality: Quality::default(),
            table_resolution: Self::default_table_resolution(),
            image_rejection: false,
            confidence_threshold: Self::default_confidence_threshold(),
            floor_db: Self::default_floor_db(),
            top_db: Self::default_top_db(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = AnalysisConfig::from_json("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.target_rate, 16_000.0);
        assert_eq!(config.fft_size, 1024);
        assert_eq!(config.hop_size, 256);
        assert_eq!(config.quality, Quality::Median);
        assert_eq!(config.table_resolution, 127);
        assert!(!config.image_rejection);
    }

    #[test]
    fn partial_json_overrides_fields() {
        let config =
            AnalysisConfig::from_json(r#"{ "quality": "best", "fft_size": 2048, "top_db": 0 }"#)
                .unwrap();
        assert_eq!(config.quality, Quality::Best);
        assert_eq!(config.fft_size, 2048);
        assert_eq!(config.top_db, 0.0);
        assert_eq!(config.hop_size, 256);
    }

    #[test]
    fn json_round_trips() {
        let config = AnalysisConfig {
            quality: Quality::Fast,
            hop_size: 128,
            ..AnalysisConfig::default()
        };
        let text = config.to_json().unwrap();
        assert!(text.contains("\"fast\""));
        assert_eq!(AnalysisConfig::from_json(&text).unwrap(), config);
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            AnalysisConfig::from_json("{ fft_size: }"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let cases: [(&str, AnalysisConfig); 6] = [
            ("fft_size", AnalysisConfig { fft_size: 1023, ..Default::default() }),
            ("fft_size", AnalysisConfig { fft_size: 0, ..Default::default() }),
            ("hop_size", AnalysisConfig { hop_size: 0, ..Default::default() }),
            ("target_rate", AnalysisConfig { target_rate: 0.0, ..Default::default() }),
            ("confidence_threshold", AnalysisConfig { confidence_threshold: 1.5, ..Default::default() }),
            ("floor_db", AnalysisConfig { floor_db: 20.0, ..Default::default() }),
        ];
        for (expected, config) in cases {
            match config.validate() {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected invalid {expected}, got {other:?}"),
            }
        }
        let zero_table = AnalysisConfig { table_resolution: 0, ..Default::default() };
        assert!(zero_table.validate().is_err());
    }

    #[test]
    fn nan_db_range_is_rejected() {
        for (floor_db, top_db) in [(f64::NAN, 10.0), (-100.0, f64::NAN), (0.0, 0.0)] {
            let config = AnalysisConfig { floor_db, top_db, ..Default::default() };
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid { field: "floor_db", .. })),
                "floor {floor_db} top {top_db} accepted"
            );
        }
    }
}
