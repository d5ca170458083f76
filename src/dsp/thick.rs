//! Thick synth — the dynamic-population drone bed.
//!
//! A bank of sounding oscillators (alternating square/sine/triangle shapes)
//! paired one-to-one with a bank of gain LFOs that amplitude-modulate them.
//! The population breathes between 3 and 11 voices over minutes, one step
//! roughly every 70 seconds, and every 30 seconds one gain LFO is thrown to
//! a new random rate from a range that widens for the lifetime of the
//! engine. Two fixed LFOs drive the filter cutoff and resonance the render
//! pipeline reads back out.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::oscillator::Oscillator;

/// Population bounds for the sounding/gain banks.
pub const MIN_OSCILLATORS: usize = 3;
pub const MAX_OSCILLATORS: usize = 11;

/// Base frequency all partials are derived from.
const BASE_FREQUENCY: f32 = 45.0;

/// Duty cycle for the square-wave partials.
const PULSE_WIDTH: f32 = 0.4;

/// Fixed LFO rates: cutoff sweep and the slower resonance/FM sweep.
const CUTOFF_LFO_HZ: f32 = 0.0612;
const MOD_LFO_HZ: f32 = 0.005;

/// Seconds of audio time between structural (population) steps.
const GROWTH_PERIOD_SECS: usize = 70;

/// Seconds of audio time between gain-LFO reassignments.
const JITTER_PERIOD_SECS: usize = 30;

/// The drone layer: produces one mono sample per `process` call and
/// exposes the filter cutoff/resonance pair for the stages above it.
pub struct ThickSynth {
    sample_rate: f32,
    cutoff_lfo: Oscillator,
    mod_lfo: Oscillator,

    /// Sounding oscillators, index-addressed; resized only at checkpoints.
    oscillators: Vec<Oscillator>,
    /// One gain LFO per sounding oscillator.
    gain_lfos: Vec<Oscillator>,

    /// Per-partial gain, rebalanced to `0.9 / population` on every resize.
    partial_gain: f32,

    /// One second of samples; all timing counters are multiples of this.
    counter_max: usize,
    structure_counter: usize,
    jitter_counter: usize,

    /// Upper bound (exclusive) of the random gain-LFO rate draw. Grows by 2
    /// on every jitter event with no ceiling — long-term timbral drift.
    gain_max: u32,
    ascending: bool,

    cutoff: f32,
    resonance: f32,

    rng: StdRng,
}

impl ThickSynth {
    pub fn new(sample_rate: f32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut cutoff_lfo = Oscillator::new(sample_rate);
        cutoff_lfo.set_frequency(CUTOFF_LFO_HZ);
        let mut mod_lfo = Oscillator::new(sample_rate);
        mod_lfo.set_frequency(MOD_LFO_HZ);

        let mut oscillators = Vec::with_capacity(MAX_OSCILLATORS);
        let mut gain_lfos = Vec::with_capacity(MAX_OSCILLATORS);
        for i in 0..MIN_OSCILLATORS {
            let mut osc = Oscillator::new(sample_rate);
            osc.set_pulse_width(PULSE_WIDTH);
            osc.set_frequency(BASE_FREQUENCY * (i + 1) as f32);
            oscillators.push(osc);

            let mut lfo = Oscillator::new(sample_rate);
            lfo.set_frequency(rng.gen_range(0.0..1.0) * (i as f32 + rng.gen_range(0.0..1.0)));
            gain_lfos.push(lfo);
        }

        ThickSynth {
            sample_rate,
            cutoff_lfo,
            mod_lfo,
            oscillators,
            gain_lfos,
            partial_gain: 0.9 / MIN_OSCILLATORS as f32,
            counter_max: sample_rate as usize,
            structure_counter: 0,
            jitter_counter: 0,
            gain_max: 2,
            ascending: true,
            cutoff: 0.0,
            resonance: 0.0,
            rng,
        }
    }

    /// Current lowpass cutoff in Hz, in [650, 3050].
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Current resonance multiplier, in [0, 10].
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    pub fn oscillator_count(&self) -> usize {
        self.oscillators.len()
    }

    pub fn partial_gain(&self) -> f32 {
        self.partial_gain
    }

    /// Produce one mono sample.
    ///
    /// Counters tick once per sample here, before the partial loop, so the
    /// bank never changes size mid-sample.
    pub fn process(&mut self) -> f32 {
        self.advance_counters();

        self.cutoff = self.cutoff_lfo.sine() * 1200.0 + 1850.0;
        self.resonance = (self.mod_lfo.sine() + 1.0) * 5.0;

        let mut raw = 0.0;
        for j in 0..self.oscillators.len() {
            // Shared FM term: the slow mod LFO plus fresh jitter, advanced
            // once per partial.
            let fm = self.mod_lfo.sine() + self.rng.gen_range(0.0..1.0) + 1.1;

            raw += match j % 3 {
                0 => {
                    self.oscillators[j]
                        .set_frequency(BASE_FREQUENCY * (j as f32 + 0.4) * fm);
                    self.oscillators[j].square() * self.partial_gain * 0.5
                }
                1 => {
                    self.oscillators[j]
                        .set_frequency(BASE_FREQUENCY * (j as f32 + 1.2) * fm);
                    self.oscillators[j].sine() * self.partial_gain * 1.2
                }
                _ => {
                    self.oscillators[j]
                        .set_frequency(BASE_FREQUENCY * (j as f32 + 1.8) * fm);
                    self.oscillators[j].triangle() * self.partial_gain
                }
            };

            // The running sum is re-scaled by every partial's gain LFO, not
            // just the partial added this iteration. The cascade is the
            // engine's characteristic amplitude beating — keep it.
            raw *= self.gain_lfos[j].sine();
        }

        raw
    }

    /// Tick the structural and jitter counters and fire whichever events
    /// are due. Direction flips at the population bounds.
    fn advance_counters(&mut self) {
        if self.oscillators.len() == MAX_OSCILLATORS {
            self.ascending = false;
        }
        if self.oscillators.len() == MIN_OSCILLATORS && !self.ascending {
            self.ascending = true;
        }

        self.jitter_counter += 1;
        self.structure_counter += 1;

        if self.jitter_counter == self.counter_max * JITTER_PERIOD_SECS {
            let index = self.rng.gen_range(0..self.gain_lfos.len());
            let rate =
                self.rng.gen_range(0..self.gain_max) as f32 * (self.rng.gen_range(0.0..1.0) + 0.1);
            self.gain_lfos[index].set_frequency(rate);
            self.jitter_counter = 0;
            self.gain_max += 2;
        }

        if self.structure_counter == self.counter_max * GROWTH_PERIOD_SECS {
            if self.ascending {
                self.add_oscillator();
            } else {
                self.remove_oscillator();
            }
            self.structure_counter = 0;
        }
    }

    fn add_oscillator(&mut self) {
        let count = self.oscillators.len() + 1;
        self.partial_gain = 0.9 / count as f32;

        let mut osc = Oscillator::new(self.sample_rate);
        osc.set_pulse_width(PULSE_WIDTH);
        osc.set_frequency(BASE_FREQUENCY * count as f32);
        self.oscillators.push(osc);

        let mut lfo = Oscillator::new(self.sample_rate);
        lfo.set_frequency(self.rng.gen_range(0.0..1.0) * ((count - 1) as f32 + self.rng.gen_range(0.0..1.0)));
        self.gain_lfos.push(lfo);
    }

    fn remove_oscillator(&mut self) {
        self.oscillators.pop();
        self.gain_lfos.pop();
        self.partial_gain = 0.9 / self.oscillators.len() as f32;
    }
}
