//! Drone engine — the per-sample render pipeline.
//!
//! Owns both synth layers plus the filter and reverb, and threads state
//! through them sample by sample: thick layer → cutoff handed to the
//! chasing layer as its target → lowpass retuned from the thick layer's
//! LFOs → static gain staging and panning → stereo sum, with the reverb
//! applied over each rendered block. Everything runs on the caller's
//! thread; nothing here locks, allocates per sample, or blocks.

use serde::{Deserialize, Serialize};

use crate::error::DroneError;

use super::chasing::ChasingSynth;
use super::filter::LowpassFilter;
use super::reverb::Reverb;
use super::thick::ThickSynth;

/// Static gain on the filtered drone bed.
const THICK_GAIN: f32 = 0.6;

/// Static gain on the chasing layer before panning.
const CHASE_GAIN: f32 = 0.09;

/// Block size for the offline render loop.
const RENDER_BLOCK: usize = 512;

/// Offline render parameters, deserializable from the JS side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: f32,
    /// Length of the take in seconds.
    pub seconds: f32,
    /// RNG seed; the same seed always renders the same take.
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            sample_rate: 48000.0,
            seconds: 30.0,
            seed: 0,
        }
    }
}

impl RenderConfig {
    pub fn num_samples(&self) -> usize {
        (self.seconds as f64 * self.sample_rate as f64) as usize
    }

    pub fn validate(&self) -> Result<(), DroneError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(DroneError::InvalidSampleRate(self.sample_rate));
        }
        if !self.seconds.is_finite() || self.seconds <= 0.0 {
            return Err(DroneError::InvalidDuration(self.seconds));
        }
        Ok(())
    }
}

/// The top-level synthesizer. Construct once, then call `render_block`
/// repeatedly from a single thread; `prepare` restarts the piece.
pub struct DroneEngine {
    sample_rate: f32,
    seed: u64,
    thick: ThickSynth,
    chasing: ChasingSynth,
    filter: LowpassFilter,
    reverb: Reverb,
}

impl DroneEngine {
    pub fn new(sample_rate: f32, seed: u64) -> Self {
        debug_assert!(
            sample_rate.is_finite() && sample_rate > 0.0,
            "sample rate must be positive, got {sample_rate}"
        );
        DroneEngine {
            sample_rate,
            seed,
            thick: ThickSynth::new(sample_rate, seed),
            chasing: ChasingSynth::new(sample_rate, seed.wrapping_add(1)),
            filter: LowpassFilter::new(sample_rate, 300.0, 1.0),
            reverb: Reverb::new(sample_rate),
        }
    }

    /// Build an engine from a validated config.
    pub fn from_config(config: &RenderConfig) -> Result<Self, DroneError> {
        config.validate()?;
        Ok(DroneEngine::new(config.sample_rate, config.seed))
    }

    /// Re-initialize every layer for the given sample rate: LFOs re-seeded
    /// from the engine's seed, population back to its initial size, filter
    /// and reverb state cleared. Safe to call any number of times.
    pub fn prepare(&mut self, sample_rate: f32) {
        *self = DroneEngine::new(sample_rate, self.seed);
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Current drone-bed population, for observability and tests.
    pub fn oscillator_count(&self) -> usize {
        self.thick.oscillator_count()
    }

    /// Render the next block, overwriting both channels for
    /// `[0, min(left.len(), right.len()))`. Never fails.
    pub fn render_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        let n = left.len().min(right.len());

        for i in 0..n {
            let raw = self.thick.process();

            // The chasing layer pursues the drone bed's moving cutoff
            self.chasing.set_target(self.thick.cutoff());
            let chase = self.chasing.process() * CHASE_GAIN;

            self.filter.retune(self.thick.cutoff(), self.thick.resonance());
            let thick = self.filter.process(raw) * THICK_GAIN;

            left[i] = thick + chase * self.chasing.gain1();
            right[i] = thick + chase * self.chasing.gain2();
        }

        self.reverb.process_block(&mut left[..n], &mut right[..n]);
    }

    /// Render `num_samples` as separate left/right channel buffers.
    pub fn render(&mut self, num_samples: usize) -> (Vec<f32>, Vec<f32>) {
        let mut left = vec![0.0_f32; num_samples];
        let mut right = vec![0.0_f32; num_samples];

        let mut start = 0;
        while start < num_samples {
            let end = (start + RENDER_BLOCK).min(num_samples);
            self.render_block(&mut left[start..end], &mut right[start..end]);
            start = end;
        }

        (left, right)
    }

    /// Render to interleaved stereo i16 PCM (for WAV export).
    pub fn render_pcm_i16(&mut self, num_samples: usize) -> Vec<i16> {
        let (left, right) = self.render(num_samples);
        let mut stereo = Vec::with_capacity(num_samples * 2);
        for i in 0..num_samples {
            let l = (left[i] as f64 * 32767.0).round().clamp(-32768.0, 32767.0) as i16;
            let r = (right[i] as f64 * 32767.0).round().clamp(-32768.0, 32767.0) as i16;
            stereo.push(l);
            stereo.push(r);
        }
        stereo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_block_is_finite_and_bounded() {
        let mut engine = DroneEngine::new(48000.0, 0);
        let mut left = vec![0.0_f32; 512];
        let mut right = vec![0.0_f32; 512];
        engine.render_block(&mut left, &mut right);

        for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            assert!(l.is_finite() && r.is_finite(), "Non-finite frame at {i}");
            assert!(
                l.abs() < 4.0 && r.abs() < 4.0,
                "Frame out of headroom at {i}: ({l}, {r})"
            );
        }
        // 512 samples is nowhere near the ~70 s growth threshold
        assert_eq!(engine.oscillator_count(), 3);
    }

    #[test]
    fn same_seed_renders_identical_takes() {
        let mut a = DroneEngine::new(8000.0, 77);
        let mut b = DroneEngine::new(8000.0, 77);
        let (al, ar) = a.render(2048);
        let (bl, br) = b.render(2048);
        assert_eq!(al, bl);
        assert_eq!(ar, br);
    }

    #[test]
    fn different_seeds_render_different_takes() {
        let mut a = DroneEngine::new(8000.0, 1);
        let mut b = DroneEngine::new(8000.0, 2);
        let (al, _) = a.render(4096);
        let (bl, _) = b.render(4096);
        assert_ne!(al, bl, "Different seeds should produce different audio");
    }

    #[test]
    fn prepare_restarts_the_piece() {
        let mut engine = DroneEngine::new(8000.0, 5);
        let (first, _) = engine.render(2048);

        engine.prepare(8000.0);
        assert_eq!(engine.oscillator_count(), 3);
        let (again, _) = engine.render(2048);

        assert_eq!(first, again, "prepare() should reset to the same take");
    }

    #[test]
    fn render_covers_every_sample() {
        let mut engine = DroneEngine::new(8000.0, 3);
        // Not a multiple of the internal block size
        let (left, right) = engine.render(1000);
        assert_eq!(left.len(), 1000);
        assert_eq!(right.len(), 1000);
        assert!(
            left.iter().any(|s| s.abs() > 1e-6),
            "Rendered audio should not be silent"
        );
    }

    #[test]
    fn pcm_is_interleaved_stereo() {
        let mut engine = DroneEngine::new(8000.0, 3);
        let pcm = engine.render_pcm_i16(256);
        assert_eq!(pcm.len(), 512);
        assert!(pcm.iter().any(|&s| s != 0), "PCM should not be silent");
    }

    #[test]
    fn renders_at_very_low_validated_rates() {
        // 100 Hz passes validate(); the whole pipeline must cope with it
        let config = RenderConfig {
            sample_rate: 100.0,
            seconds: 0.1,
            seed: 1,
        };
        assert!(config.validate().is_ok());

        let mut engine = DroneEngine::from_config(&config).expect("config is valid");
        let (left, right) = engine.render(config.num_samples());
        assert_eq!(left.len(), 10);
        for (l, r) in left.iter().zip(right.iter()) {
            assert!(l.is_finite() && r.is_finite());
        }
    }

    #[test]
    fn config_defaults_and_validation() {
        let config = RenderConfig::default();
        assert_eq!(config.sample_rate, 48000.0);
        assert_eq!(config.seconds, 30.0);
        assert!(config.validate().is_ok());
        assert_eq!(config.num_samples(), 48000 * 30);

        let bad = RenderConfig {
            sample_rate: 0.0,
            ..RenderConfig::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(DroneError::InvalidSampleRate(_))
        ));

        let bad = RenderConfig {
            seconds: -1.0,
            ..RenderConfig::default()
        };
        assert!(matches!(bad.validate(), Err(DroneError::InvalidDuration(_))));
    }

    #[test]
    fn config_deserializes_from_camel_case_json() {
        let config: RenderConfig =
            serde_json::from_str(r#"{"sampleRate": 22050.0, "seconds": 2.5, "seed": 9}"#)
                .expect("config should deserialize");
        assert_eq!(config.sample_rate, 22050.0);
        assert_eq!(config.seconds, 2.5);
        assert_eq!(config.seed, 9);

        // Missing fields fall back to defaults
        let config: RenderConfig = serde_json::from_str("{}").expect("empty config");
        assert_eq!(config, RenderConfig::default());
    }
}
