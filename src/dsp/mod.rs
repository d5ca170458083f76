//! DSP engine — pure Rust generative drone synthesis.
//!
//! All synthesis runs in Rust for deterministic, cross-platform audio
//! output. The same code powers both WebAudio playback (via AudioWorklet +
//! WASM) and offline WAV export.

pub mod chasing;
pub mod engine;
pub mod filter;
pub mod oscillator;
pub mod renderer;
pub mod reverb;
pub mod thick;
pub mod waveshaper;
