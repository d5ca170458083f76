//! Chasing synth — the frequency-pursuit layer.
//!
//! A two-oscillator detuned bank whose lead frequency glides toward a
//! target handed down from the thick layer's filter cutoff. The glide
//! follows a movement LFO's sine, so it accelerates and decelerates rather
//! than ramping linearly. Each time the target is caught the sweep resets:
//! new direction, new base, new random LFO rate and detune, and the stereo
//! pan flips sides. The movement LFO also drives the waveshaper threshold,
//! so distortion is hardest right after a catch and relaxes as the sweep
//! converges.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::oscillator::Oscillator;
use super::waveshaper::Waveshaper;

/// Fixed bank size: lead oscillator plus one detuned partner.
const BANK_SIZE: usize = 2;

/// Frequency the very first sweep chases, before any cutoff arrives.
const INITIAL_TARGET: f32 = 700.0;

/// Movement LFO rate for the first sweep; re-randomized on every catch.
const INITIAL_LFO_HZ: f32 = 0.05;

/// Relative convergence tolerance for catch detection. The sweep peaks at
/// exactly the target only when the LFO's f32 sine rounds to 1.0; at coarse
/// sample rates the phase grid can step over that window, so the catch
/// fires within this margin instead.
const CATCH_TOLERANCE: f32 = 1e-4;

/// The pursuit layer: one mono sample plus a stereo pan-gain pair per call.
pub struct ChasingSynth {
    oscillators: Vec<Oscillator>,
    movement_lfo: Oscillator,
    waveshaper: Waveshaper,

    /// `0.9 / BANK_SIZE`.
    bank_gain: f32,
    /// Sweep starting point, reset to half or double the target on catch.
    base_frequency: f32,
    /// Multiplicative detune the odd oscillator applies to its neighbor.
    detune: f32,

    /// Frequency currently being chased.
    target: f32,
    /// Most recent target handed in via `set_target`, adopted on catch.
    pending_target: f32,
    ascending: bool,

    /// Last movement-LFO sine value; shared by the glide, the waveshaper
    /// threshold, and the pan gains.
    movement: f32,
    pan_flipped: bool,
    gain1: f32,
    gain2: f32,

    catch_count: u64,
    rng: StdRng,
}

impl ChasingSynth {
    pub fn new(sample_rate: f32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut movement_lfo = Oscillator::new(sample_rate);
        movement_lfo.set_frequency(INITIAL_LFO_HZ);

        let base_frequency = INITIAL_TARGET / 2.0;
        let detune = rng.gen_range(0.0..1.0) + 1.0;

        let mut oscillators: Vec<Oscillator> = Vec::with_capacity(BANK_SIZE);
        for i in 0..BANK_SIZE {
            let mut osc = Oscillator::new(sample_rate);
            if i == 0 {
                osc.set_frequency(base_frequency);
            } else {
                osc.set_frequency(oscillators[i - 1].frequency() * 1.1);
            }
            oscillators.push(osc);
        }

        ChasingSynth {
            oscillators,
            movement_lfo,
            waveshaper: Waveshaper::new(),
            bank_gain: 0.9 / BANK_SIZE as f32,
            base_frequency,
            detune,
            target: INITIAL_TARGET,
            pending_target: INITIAL_TARGET,
            ascending: true,
            movement: 0.0,
            pan_flipped: false,
            gain1: 0.0,
            gain2: 1.0,
            catch_count: 0,
            rng,
        }
    }

    /// Record a new frequency to chase; adopted at the next catch event.
    pub fn set_target(&mut self, cutoff: f32) {
        self.pending_target = cutoff / 2.0;
    }

    /// Pan gain for the left channel. May leave [0, 1] (the movement sine
    /// is negative half the time) but always sums with `gain2` to 1.
    pub fn gain1(&self) -> f32 {
        self.gain1
    }

    /// Pan gain for the right channel.
    pub fn gain2(&self) -> f32 {
        self.gain2
    }

    /// Current lead-oscillator frequency.
    pub fn lead_frequency(&self) -> f32 {
        self.oscillators[0].frequency()
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    /// Number of catch events so far.
    pub fn catch_count(&self) -> u64 {
        self.catch_count
    }

    /// Produce one mono sample; read the pan pair via `gain1`/`gain2`.
    pub fn process(&mut self) -> f32 {
        self.update_pan();
        self.chase();

        let mut sample = 0.0;
        for i in 0..self.oscillators.len() {
            if i % 2 == 1 {
                // Odd oscillators ride a detuned copy of their neighbor
                let neighbor = self.oscillators[i - 1].frequency();
                self.oscillators[i].set_frequency(neighbor * self.detune);
            }
            sample += self.oscillators[i].triangle();
        }
        sample *= self.bank_gain;

        self.waveshaper.tanh_distort(sample)
    }

    /// One step of the pursuit state machine.
    fn chase(&mut self) {
        let lead = self.oscillators[0].frequency();

        if self.ascending {
            if lead < self.target * (1.0 - CATCH_TOLERANCE) {
                self.movement = self.movement_lfo.sine();
                self.waveshaper.set_threshold(self.movement);
                self.oscillators[0]
                    .set_frequency(self.base_frequency * (self.movement + 1.0));
            } else {
                self.movement_lfo.reset_phase();
                self.retarget();
            }
        } else if lead > self.target * (1.0 + CATCH_TOLERANCE) {
            self.movement = self.movement_lfo.sine();
            self.waveshaper.set_threshold(self.movement);
            self.oscillators[0]
                .set_frequency(self.base_frequency / (self.movement + 1.0));
        } else {
            self.movement_lfo.reset_phase();
            self.retarget();
        }
    }

    /// Catch event: adopt the pending target, pick the next direction and
    /// sweep base, re-randomize movement rate and detune, flip the pan.
    fn retarget(&mut self) {
        self.catch_count += 1;

        self.ascending = self.pending_target > self.target;
        self.target = self.pending_target;
        self.base_frequency = if self.ascending {
            self.target / 2.0
        } else {
            self.target * 2.0
        };

        self.movement_lfo.set_frequency(self.rng.gen_range(0.0..1.0) * 1.1);
        self.detune = self.rng.gen_range(0.0..1.0) + 1.0;
        self.pan_flipped = !self.pan_flipped;
    }

    /// The movement value and its complement, swapped each catch.
    fn update_pan(&mut self) {
        if self.pan_flipped {
            self.gain2 = self.movement;
            self.gain1 = 1.0 - self.movement;
        } else {
            self.gain1 = self.movement;
            self.gain2 = 1.0 - self.movement;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_starts_from_detuned_neighbors() {
        let cs = ChasingSynth::new(48000.0, 0);
        let lead = cs.lead_frequency();
        assert!(
            (lead - INITIAL_TARGET / 2.0).abs() < 1e-3,
            "Lead should start at half the initial target, got {lead}"
        );
        let partner = cs.oscillators[1].frequency();
        assert!(
            (partner - lead * 1.1).abs() < 1e-3,
            "Partner should start 1.1x above the lead, got {partner}"
        );
    }

    #[test]
    fn lead_non_decreasing_until_first_catch() {
        // Initial state is an ascending sweep from 350 toward 700 Hz
        let mut cs = ChasingSynth::new(500.0, 5);
        let mut prev = cs.lead_frequency();

        for _ in 0..20000 {
            cs.process();
            if cs.catch_count() > 0 {
                break;
            }
            let lead = cs.lead_frequency();
            assert!(
                lead >= prev,
                "Lead frequency decreased mid-ascent: {prev} -> {lead}"
            );
            prev = lead;
        }
        assert!(cs.catch_count() > 0, "Sweep should have caught its target");
    }

    #[test]
    fn first_catch_without_new_target_turns_descending() {
        // With no set_target call the pending target equals the old one,
        // which is not strictly greater, so the sweep must turn downward
        let mut cs = ChasingSynth::new(500.0, 5);
        for _ in 0..20000 {
            cs.process();
            if cs.catch_count() > 0 {
                break;
            }
        }
        assert_eq!(cs.catch_count(), 1);
        assert!(!cs.is_ascending(), "Equal target should flip to descending");
    }

    #[test]
    fn higher_pending_target_keeps_ascending() {
        let mut cs = ChasingSynth::new(500.0, 8);
        cs.set_target(3000.0); // pending 1500 > 700
        for _ in 0..20000 {
            cs.process();
            if cs.catch_count() > 0 {
                break;
            }
        }
        assert_eq!(cs.catch_count(), 1);
        assert!(
            cs.is_ascending(),
            "Higher pending target should keep the sweep ascending"
        );
    }

    #[test]
    fn pan_gains_sum_to_one() {
        let mut cs = ChasingSynth::new(1000.0, 2);
        cs.set_target(2000.0);
        for _ in 0..30000 {
            cs.process();
            let sum = cs.gain1() + cs.gain2();
            assert!(
                (sum - 1.0).abs() < 1e-5,
                "Pan gains should sum to 1.0, got {sum}"
            );
        }
    }

    #[test]
    fn output_is_bounded_and_finite() {
        let mut cs = ChasingSynth::new(1000.0, 4);
        for i in 0..30000 {
            let s = cs.process();
            assert!(s.is_finite(), "Non-finite sample at {i}");
            // tanh saturation plus hard clip: nothing should leave ±1
            assert!(s.abs() <= 1.0, "Sample out of bounds at {i}: {s}");
        }
    }

    #[test]
    fn same_seed_is_deterministic() {
        let mut a = ChasingSynth::new(2000.0, 99);
        let mut b = ChasingSynth::new(2000.0, 99);
        for _ in 0..5000 {
            assert_eq!(a.process(), b.process());
            assert_eq!(a.gain1(), b.gain1());
        }
    }
}
