//! Phase-accumulator oscillator — the primitive every layer is built on.
//!
//! One shape per call rather than one shape per instance: both synth layers
//! pick a waveform method per bank index, so a single struct serves sounding
//! oscillators and LFOs alike. Deliberately naive (no band-limiting) — the
//! drone's character comes from the raw shapes.

use std::f32::consts::TAU;

/// A single phase accumulator producing sine/square/triangle waveforms
/// and a raw phasor.
///
/// The sample rate is fixed at construction, so the phase increment is
/// always derived from a valid rate.
#[derive(Debug, Clone)]
pub struct Oscillator {
    sample_rate: f32,
    frequency: f32,
    phase: f32,
    phase_increment: f32,
    pulse_width: f32,
}

impl Oscillator {
    pub fn new(sample_rate: f32) -> Self {
        Oscillator {
            sample_rate,
            frequency: 0.0,
            phase: 0.0,
            phase_increment: 0.0,
            pulse_width: 0.5,
        }
    }

    /// Set frequency and recompute the per-sample phase increment.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
        self.phase_increment = frequency / self.sample_rate;
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Square-wave duty cycle in [0, 1). Defaults to 0.5.
    pub fn set_pulse_width(&mut self, pulse_width: f32) {
        self.pulse_width = pulse_width;
    }

    /// Set phase back to 0 — used to realign a sweep when a chase target
    /// is reached.
    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    /// Step the accumulator once and return the phasor value.
    ///
    /// Every waveform method calls this exactly once, so an oscillator
    /// advances one sample per synthesis call regardless of shape.
    pub fn advance(&mut self) -> f32 {
        self.phase += self.phase_increment;

        if self.phase > 1.0 {
            self.phase -= 1.0;
            // Increments above 1.0 (frequency past the sample rate) need a
            // full wrap, not a single subtraction
            if self.phase > 1.0 {
                self.phase = self.phase.rem_euclid(1.0);
            }
        }

        self.phase
    }

    /// Sine in [-1, 1].
    pub fn sine(&mut self) -> f32 {
        (self.advance() * TAU).sin()
    }

    /// Square in {-0.5, +0.5}, high while the phasor is below the pulse
    /// width.
    pub fn square(&mut self) -> f32 {
        if self.advance() <= self.pulse_width {
            0.5
        } else {
            -0.5
        }
    }

    /// Triangle in [-1.5, 0]: `(|phase - 0.5| - 0.5) * 3`.
    pub fn triangle(&mut self) -> f32 {
        ((self.advance() - 0.5).abs() - 0.5) * 3.0
    }
}
