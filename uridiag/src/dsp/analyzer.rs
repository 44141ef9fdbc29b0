//! Frequency-selective level analysis
//!
//! One block in, three numbers out: an overall level across the spectrum and
//! a band-limited level around each active probe tone. The band limiting is
//! what lets the two-tone test measure crosstalk and attenuation on each
//! channel while both tones play at once.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::{BIN_WIDTH_HZ, BLOCK_SAMPLES, FFT_SIZE, LEVEL_SCALE, SELECTIVE_BAND};

/// Levels measured over one audio block, in display units
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlockLevels {
    pub overall: f32,
    /// Band-limited level around the first (left channel) target
    pub left: f32,
    /// Band-limited level around the second (right channel) target
    pub right: f32,
}

pub struct SpectralAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    buf: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    capture_scale: f32,
}

impl SpectralAnalyzer {
    /// `capture_scale` must match the playback-side correction of the same
    /// device profile, otherwise loopback measurements are not
    /// self-consistent.
    pub fn new(capture_scale: f32) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(FFT_SIZE);
        let scratch = vec![Complex::default(); fft.get_inplace_scratch_len()];
        Self {
            fft,
            buf: vec![Complex::default(); FFT_SIZE],
            scratch,
            capture_scale,
        }
    }

    /// Analyzes the left channel of one full interleaved stereo block.
    /// Inactive targets (at or below zero) report a zero selective level.
    pub fn analyze(&mut self, block: &[i16], freq1: f32, freq2: f32) -> BlockLevels {
        assert_eq!(block.len(), BLOCK_SAMPLES, "analyze needs one full block");

        for (slot, frame) in self.buf.iter_mut().zip(block.chunks_exact(2)) {
            let corrected = (frame[0] as f32 + 32768.0) * self.capture_scale;
            *slot = Complex {
                re: corrected / 65536.0,
                im: 0.0,
            };
        }
        self.fft.process_with_scratch(&mut self.buf, &mut self.scratch);

        let mut total = 0.0f32;
        let mut sel1 = 0.0f32;
        let mut sel2 = 0.0f32;
        // bin 0 carries the offset introduced above; skip it
        for (i, bin) in self.buf.iter().enumerate().take(FFT_SIZE / 2).skip(1) {
            let power = bin.norm_sqr();
            total += power;

            let center = i as f32 * BIN_WIDTH_HZ;
            if freq1 > 0.0 && (center - freq1).abs() < SELECTIVE_BAND * BIN_WIDTH_HZ {
                sel1 += power;
            }
            if freq2 > 0.0 && (center - freq2).abs() < SELECTIVE_BAND * BIN_WIDTH_HZ {
                sel2 += power;
            }
        }

        let half = (FFT_SIZE / 2) as f32;
        BlockLevels {
            overall: total.sqrt() / half * LEVEL_SCALE,
            left: sel1.sqrt() / half * LEVEL_SCALE,
            right: sel2.sqrt() / half * LEVEL_SCALE,
        }
    }
}
