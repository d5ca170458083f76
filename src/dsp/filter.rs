//! Lowpass biquad for the thick layer, retuned every sample.
//!
//! Standard RBJ cookbook lowpass in Direct Form II Transposed. The render
//! pipeline feeds it a new cutoff/resonance pair on every sample, so there
//! is no dirty-flag machinery — `retune` just recomputes the coefficients.

use std::f32::consts::PI;

/// The resonance LFO swings down to 0, but the alpha term divides by Q.
const MIN_Q: f32 = 0.05;

/// A 2nd-order lowpass IIR filter.
#[derive(Debug, Clone)]
pub struct LowpassFilter {
    sample_rate: f32,

    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    z1: f32,
    z2: f32,
}

impl LowpassFilter {
    pub fn new(sample_rate: f32, cutoff: f32, q: f32) -> Self {
        let mut f = LowpassFilter {
            sample_rate,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
        };
        f.retune(cutoff, q);
        f
    }

    /// Recompute coefficients for a new cutoff/resonance pair. Cheap enough
    /// to call per sample.
    pub fn retune(&mut self, cutoff: f32, q: f32) {
        // Keep the pole frequency meaningful at low sample rates
        let cutoff = cutoff.min(self.sample_rate * 0.49);
        let q = q.max(MIN_Q);

        let w0 = 2.0 * PI * cutoff / self.sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let b1 = 1.0 - cos_w0;
        let b0 = b1 / 2.0;
        let b2 = b0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    /// Process a single sample.
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    /// Clear the delay-line state.
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}
