//! Signal generation and analysis
//!
//! All fixed numeric parameters of the audio path live here. One audio
//! "tick" moves exactly one block in each direction.

pub mod analyzer;
pub mod tone;

/// Fixed sample rate of the adapter's codec
pub const SAMPLE_RATE: f32 = 48_000.0;

/// Frames (stereo sample pairs) per audio block
pub const BLOCK_FRAMES: usize = 1024;

/// Interleaved i16 samples per audio block
pub const BLOCK_SAMPLES: usize = BLOCK_FRAMES * 2;

/// Points in the analysis transform, one per frame of a block
pub const FFT_SIZE: usize = 1024;

/// Width of one analysis bin in Hz
pub const BIN_WIDTH_HZ: f32 = SAMPLE_RATE / FFT_SIZE as f32;

/// Selective levels integrate the bins within this many bin-widths of a
/// target frequency (three bins)
pub const SELECTIVE_BAND: f32 = 1.5;

/// Converts normalized spectral magnitude into display units
pub const LEVEL_SCALE: f32 = 4096.0;

/// Peak amplitude of generated tones
pub const FULL_SCALE: f32 = 32765.0;
