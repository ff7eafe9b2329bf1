pub mod config;
pub mod dsp;
pub mod error;

pub use crate::config::AnalysisConfig;
pub use crate::error::PitchscopeError;

use crate::dsp::analyzer::{Analysis, Analyzer};
use crate::dsp::coeffs::Quality;
use crate::dsp::resampler::Resampler;
use crate::dsp::tuner::YinDetector;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the pitchscope-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Resample a mono buffer from `source_rate` to `target_rate`.
pub fn resample(
    samples: &[f64],
    source_rate: f64,
    target_rate: f64,
    quality: Quality,
) -> error::Result<Vec<f64>> {
    let mut resampler = Resampler::new(source_rate, target_rate, quality)?;
    Ok(resampler.process(samples))
}

/// Analyse a mono buffer with the built-in YIN pitch detector.
pub fn analyse(samples: &[f64], source_rate: f64, config: AnalysisConfig) -> error::Result<Analysis> {
    let mut yin = YinDetector::new(config.target_rate, config.fft_size);
    let mut analyzer = Analyzer::new(config)?;
    analyzer.analyse(samples, source_rate, Some(&mut yin))
}

/// WASM-exposed: resample mono f32 samples for AudioWorklet consumption.
/// `quality` is `"fast"`, `"median"` or `"best"`.
#[wasm_bindgen]
pub fn resample_samples(
    samples: &[f32],
    source_rate: f64,
    target_rate: f64,
    quality: &str,
) -> Result<Vec<f32>, JsValue> {
    let quality = Quality::parse(quality)
        .ok_or_else(|| JsValue::from_str(&format!("unknown quality '{quality}'")))?;
    let mut resampler = Resampler::new(source_rate, target_rate, quality)
        .map_err(|e| JsValue::from_str(&format!("{e}")))?;
    Ok(resampler.process_f32(samples))
}

/// WASM-exposed: analyse mono f32 samples into spectrum columns.
/// `config_json` may be empty for defaults.
#[wasm_bindgen]
pub fn analyse_samples(
    samples: &[f32],
    source_rate: f64,
    config_json: &str,
) -> Result<JsValue, JsValue> {
    let config = if config_json.trim().is_empty() {
        AnalysisConfig::default()
    } else {
        AnalysisConfig::from_json(config_json).map_err(|e| JsValue::from_str(&format!("{e}")))?
    };
    let samples: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
    let analysis =
        analyse(&samples, source_rate, config).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    serde_wasm_bindgen::to_value(&analysis).map_err(|e| JsValue::from_str(&format!("{e}")))
}
