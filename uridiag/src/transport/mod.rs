//! Transport traits for talking to the adapter
//!
//! The engine needs two channels into the hardware: a request/response pair
//! of 4-byte HID control reports, and a full-duplex fixed-block PCM stream.
//! Both are expressed as traits so the whole engine runs against the in
//! memory implementations in [`mock`] as well as against real hardware.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uridiag_protocol::ProtocolError;

#[cfg(feature = "hid")]
pub mod hid;

#[cfg(feature = "hid")]
use hidapi::HidError;

#[cfg(feature = "mock")]
pub mod mock;

#[derive(Error, Debug)]
pub enum DiagError {
    #[error("An HID error has occurred: {0}")]
    #[cfg(feature = "hid")]
    Hid(#[from] HidError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Transport has closed")]
    TransportClosed,

    #[error("eeprom address {0} is outside the physical range")]
    AddressOutOfRange(u8),

    #[error("eeprom address {0} is reserved for manufacturer data")]
    ReservedAddress(u8),

    #[error("short audio write: {written}/{expected} samples")]
    ShortWrite { written: usize, expected: usize },

    #[error("This operation is not supported on this device variant")]
    UnsupportedOperation,

    #[error("A device request timed out")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Blocking 4-byte control-transfer pair, one output report out and
/// optionally one input report back. Implementations own their locking;
/// callers never overlap a send with a receive.
#[async_trait]
pub trait ControlTransport: Send + Sync {
    /// Issues one output report
    async fn send_report(&self, report: Bytes) -> Result<(), DiagError>;

    /// Requests one input report
    async fn recv_report(&self) -> Result<Bytes, DiagError>;
}

/// What the audio stream is ready for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Readable,
    Writable,
}

/// Full-duplex PCM stream moving one fixed block of interleaved stereo
/// samples per call. Blocking; the audio loop runs it on a dedicated
/// blocking task. The stream closes when dropped.
pub trait AudioDuplex: Send {
    /// Blocks until the stream can make progress in either direction
    fn wait(&mut self) -> Result<Readiness, DiagError>;

    /// Reads up to one block, returning the number of samples read
    fn read_block(&mut self, buf: &mut [i16]) -> Result<usize, DiagError>;

    /// Writes one block, returning the number of samples written
    fn write_block(&mut self, buf: &[i16]) -> Result<usize, DiagError>;
}
