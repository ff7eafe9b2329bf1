//! DSP core: band-limited resampling and reassigned spectral analysis.
//!
//! Everything here is plain Rust over `f64` buffers, so the same code runs
//! natively (CLI, tests) and in the browser through the WASM bindings.

pub mod analyzer;
pub mod capture;
pub mod coeffs;
pub mod fft;
pub mod pole_bank;
pub mod reassignment;
pub mod resampler;
pub mod slice;
pub mod spectrum;
pub mod tuner;
#[cfg(feature = "codec")]
pub mod wav;
pub mod window;
