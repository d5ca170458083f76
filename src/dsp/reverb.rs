//! Stereo reverb — Schroeder/Freeverb topology.
//!
//! Parallel comb filters into series allpasses per channel, with the
//! right channel's delay lines offset for stereo spread. Unlike a single
//! dry/wet crossfade, dry and wet levels are independent gains — the drone
//! pipeline runs both at once (dry 0.5, wet 0.3).

/// A comb filter delay line with damped feedback.
#[derive(Debug, Clone)]
struct CombFilter {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
    damp1: f32,
    damp2: f32,
    filterstore: f32,
}

impl CombFilter {
    fn new(size: usize, feedback: f32, damp: f32) -> Self {
        Self {
            buffer: vec![0.0; size],
            index: 0,
            feedback,
            damp1: damp,
            damp2: 1.0 - damp,
            filterstore: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.index];

        // Lowpass the feedback path (damping)
        self.filterstore = output * self.damp2 + self.filterstore * self.damp1;

        self.buffer[self.index] = input + self.filterstore * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();

        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.filterstore = 0.0;
    }
}

/// An allpass filter delay line.
#[derive(Debug, Clone)]
struct AllpassFilter {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
}

impl AllpassFilter {
    fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size],
            index: 0,
            feedback: 0.5,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let bufout = self.buffer[self.index];
        let output = bufout - input;

        self.buffer[self.index] = input + bufout * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();

        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}

// Tuning constants (scaled from 44100 Hz)
const COMB_TUNING: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNING: [usize; 4] = [556, 441, 341, 225];
const STEREO_SPREAD: usize = 23;

/// Input attenuation into the comb bank.
const FIXED_GAIN: f32 = 0.015;

/// A stereo algorithmic reverb with independent dry and wet levels.
#[derive(Debug, Clone)]
pub struct Reverb {
    comb_l: Vec<CombFilter>,
    comb_r: Vec<CombFilter>,
    allpass_l: Vec<AllpassFilter>,
    allpass_r: Vec<AllpassFilter>,

    /// Room size (0.0 to 1.0). Affects decay time.
    room_size: f32,
    /// Damping (0.0 to 1.0). Higher = darker tail.
    damping: f32,
    /// Gain applied to the unprocessed signal.
    dry_level: f32,
    /// Gain applied to the reverberated signal.
    wet_level: f32,
    /// Stereo width (0.0 to 1.0).
    width: f32,
}

impl Reverb {
    /// Create a reverb at the drone pipeline's fixed parameters:
    /// dry 0.5, wet 0.3, room size 0.7.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_params(sample_rate, 0.7, 0.5, 0.3)
    }

    pub fn with_params(sample_rate: f32, room_size: f32, dry_level: f32, wet_level: f32) -> Self {
        let scale = sample_rate as f64 / 44100.0;
        // Delay lines must hold at least one sample, whatever the rate
        let scaled = |t: usize| (((t as f64) * scale) as usize).max(1);

        let comb_l: Vec<_> = COMB_TUNING
            .iter()
            .map(|&t| CombFilter::new(scaled(t), 0.84, 0.5))
            .collect();
        let comb_r: Vec<_> = COMB_TUNING
            .iter()
            .map(|&t| CombFilter::new(scaled(t) + STEREO_SPREAD, 0.84, 0.5))
            .collect();

        let allpass_l: Vec<_> = ALLPASS_TUNING
            .iter()
            .map(|&t| AllpassFilter::new(scaled(t)))
            .collect();
        let allpass_r: Vec<_> = ALLPASS_TUNING
            .iter()
            .map(|&t| AllpassFilter::new(scaled(t) + STEREO_SPREAD))
            .collect();

        let mut reverb = Self {
            comb_l,
            comb_r,
            allpass_l,
            allpass_r,
            room_size: room_size.clamp(0.0, 1.0),
            damping: 0.5,
            dry_level,
            wet_level,
            width: 1.0,
        };
        reverb.update_feedback();
        reverb
    }

    /// Push room size and damping into the comb filters.
    fn update_feedback(&mut self) {
        let feedback = self.room_size * 0.28 + 0.7;
        for comb in self.comb_l.iter_mut().chain(self.comb_r.iter_mut()) {
            comb.feedback = feedback;
            comb.damp1 = self.damping;
            comb.damp2 = 1.0 - self.damping;
        }
    }

    /// Process one stereo sample pair.
    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let input = (left + right) * FIXED_GAIN;

        let mut out_l = 0.0_f32;
        let mut out_r = 0.0_f32;

        for comb in &mut self.comb_l {
            out_l += comb.process(input);
        }
        for comb in &mut self.comb_r {
            out_r += comb.process(input);
        }

        for allpass in &mut self.allpass_l {
            out_l = allpass.process(out_l);
        }
        for allpass in &mut self.allpass_r {
            out_r = allpass.process(out_r);
        }

        let wet1 = self.width / 2.0 + 0.5;
        let wet2 = (1.0 - self.width) / 2.0;
        let wet_l = out_l * wet1 + out_r * wet2;
        let wet_r = out_r * wet1 + out_l * wet2;

        (
            left * self.dry_level + wet_l * self.wet_level,
            right * self.dry_level + wet_r * self.wet_level,
        )
    }

    /// Process a stereo block in place.
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        for i in 0..left.len().min(right.len()) {
            let (out_l, out_r) = self.process(left[i], right[i]);
            left[i] = out_l;
            right[i] = out_r;
        }
    }

    /// Clear all delay lines.
    pub fn clear(&mut self) {
        for comb in self.comb_l.iter_mut().chain(self.comb_r.iter_mut()) {
            comb.clear();
        }
        for allpass in self.allpass_l.iter_mut().chain(self.allpass_r.iter_mut()) {
            allpass.clear();
        }
    }
}
