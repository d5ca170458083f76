//! Waveshaping distortion — tanh saturation into a hard clipper.
//!
//! The chasing layer drives the threshold from its movement LFO, so
//! distortion intensity tracks sweep progress: hardest right after a catch,
//! easing off as the sweep approaches its target.

/// Fixed ceiling returned once a sample crosses the threshold.
const CLIP_CEILING: f32 = 0.8;

/// Gain applied before the tanh stage.
const DRIVE_GAIN: f32 = 2.0;

/// A nonlinear waveshaping stage with one adjustable threshold.
#[derive(Debug, Clone)]
pub struct Waveshaper {
    threshold: f32,
}

impl Waveshaper {
    pub fn new() -> Self {
        Waveshaper { threshold: 0.0 }
    }

    /// Couple the clipping threshold to an external modulator.
    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }

    /// Hard clip: samples beyond ±threshold are pinned to ±0.8, everything
    /// else passes through unchanged.
    pub fn distort(&self, sample: f32) -> f32 {
        if sample > self.threshold {
            CLIP_CEILING
        } else if sample < -self.threshold {
            -CLIP_CEILING
        } else {
            sample
        }
    }

    /// Drive the sample into tanh soft saturation, then hard clip the
    /// result. This is the entry point the chasing layer uses.
    pub fn tanh_distort(&self, sample: f32) -> f32 {
        self.distort((sample * DRIVE_GAIN).tanh())
    }
}

impl Default for Waveshaper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distort_passes_below_threshold() {
        let mut ws = Waveshaper::new();
        ws.set_threshold(0.9);
        assert_eq!(ws.distort(0.3), 0.3);
        assert_eq!(ws.distort(-0.3), -0.3);
    }

    #[test]
    fn distort_clips_to_ceiling() {
        let mut ws = Waveshaper::new();
        ws.set_threshold(0.5);
        assert_eq!(ws.distort(0.7), 0.8);
        assert_eq!(ws.distort(-0.7), -0.8);
    }

    #[test]
    fn tanh_distort_is_odd() {
        let mut ws = Waveshaper::new();
        ws.set_threshold(0.6);
        for i in 0..200 {
            let x = (i as f32 - 100.0) / 25.0;
            let pos = ws.tanh_distort(x);
            let neg = ws.tanh_distort(-x);
            assert!(
                (pos + neg).abs() < 1e-6,
                "tanh_distort should be odd symmetric: f({x})={pos}, f({})={neg}",
                -x
            );
        }
    }

    #[test]
    fn tanh_distort_bounded() {
        for thresh in [-0.5, 0.0, 0.3, 0.75] {
            let mut ws = Waveshaper::new();
            ws.set_threshold(thresh);
            for i in 0..400 {
                let x = (i as f32 - 200.0) / 10.0;
                let y = ws.tanh_distort(x);
                assert!(
                    y.abs() <= 0.8 + 1e-6,
                    "|tanh_distort({x})| should be <= 0.8 at threshold {thresh}, got {y}"
                );
            }
        }
    }

    #[test]
    fn negative_threshold_pins_everything() {
        // Threshold below zero means every input beats it on one side
        let mut ws = Waveshaper::new();
        ws.set_threshold(-0.2);
        assert_eq!(ws.distort(0.0), 0.8);
        assert_eq!(ws.distort(0.1), 0.8);
        assert_eq!(ws.distort(-0.3), -0.8);
    }
}
