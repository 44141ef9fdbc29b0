//! Recursive dual-tone oscillator
//!
//! Each channel keeps a unit-magnitude complex state and advances it by one
//! fixed rotation per sample: one complex multiply instead of per-sample
//! trig. A first-order correction pulls the state back onto the unit circle
//! so floating point drift never accumulates.

use std::f32::consts::TAU;

use super::{FULL_SCALE, SAMPLE_RATE};

/// One oscillator channel. Inactive (frequency at or below zero) channels
/// emit silence and park their state at (1, 0).
#[derive(Debug, Clone)]
pub struct ToneChannel {
    freq: f32,
    rot_re: f32,
    rot_im: f32,
    re: f32,
    im: f32,
}

impl Default for ToneChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ToneChannel {
    pub fn new() -> Self {
        Self {
            freq: 0.0,
            rot_re: 1.0,
            rot_im: 0.0,
            re: 1.0,
            im: 0.0,
        }
    }

    /// Retunes the channel; a no-op when the frequency is unchanged
    pub fn set_frequency(&mut self, freq: f32) {
        if freq == self.freq {
            return;
        }
        self.freq = freq;
        if freq > 0.0 {
            let theta = TAU * freq / SAMPLE_RATE;
            self.rot_re = theta.cos();
            self.rot_im = theta.sin();
        } else {
            self.re = 1.0;
            self.im = 0.0;
        }
    }

    pub fn frequency(&self) -> f32 {
        self.freq
    }

    pub fn is_active(&self) -> bool {
        self.freq > 0.0
    }

    /// Advances one sample and returns the new real component, in [-1, 1]
    pub fn advance(&mut self) -> f32 {
        let re = self.re * self.rot_re - self.im * self.rot_im;
        self.im = self.re * self.rot_im + self.im * self.rot_re;
        self.re = re;

        // first-order pull back onto the unit circle
        let correction = 2.0 - (self.re * self.re + self.im * self.im);
        self.re *= correction;
        self.im *= correction;

        self.re
    }

    /// Next PCM sample, silent when inactive
    pub fn sample(&mut self, scale: f32) -> i16 {
        if !self.is_active() {
            return 0;
        }
        (self.advance() * scale * FULL_SCALE) as i16
    }
}

/// Fills one interleaved stereo block from the two tone channels
pub fn synthesize(block: &mut [i16], left: &mut ToneChannel, right: &mut ToneChannel, scale: f32) {
    for frame in block.chunks_exact_mut(2) {
        frame[0] = left.sample(scale);
        frame[1] = right.sample(scale);
    }
}
