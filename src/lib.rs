pub mod dsp;
pub mod error;

use crate::dsp::engine::{DroneEngine, RenderConfig};
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the dronefield version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Deserialize a `RenderConfig` from the JS side; `undefined`/`null`
/// means all defaults.
fn config_from_js(config: JsValue) -> Result<RenderConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(RenderConfig::default());
    }
    serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: render a drone take to interleaved stereo f32 samples.
/// Returns the raw audio buffer for AudioWorklet playback.
#[wasm_bindgen]
pub fn render_drone_samples(config: JsValue) -> Result<Vec<f32>, JsValue> {
    let config = config_from_js(config)?;
    let mut engine =
        DroneEngine::from_config(&config).map_err(|e| JsValue::from_str(&format!("{e}")))?;

    let (left, right) = engine.render(config.num_samples());
    let mut interleaved = Vec::with_capacity(left.len() * 2);
    for i in 0..left.len() {
        interleaved.push(left[i]);
        interleaved.push(right[i]);
    }
    Ok(interleaved)
}

/// WASM-exposed: render a drone take to a WAV byte array.
#[wasm_bindgen]
pub fn render_drone_wav(config: JsValue) -> Result<Vec<u8>, JsValue> {
    let config = config_from_js(config)?;
    dsp::renderer::render_wav(&config).map_err(|e| JsValue::from_str(&format!("{e}")))
}
