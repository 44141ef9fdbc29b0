//! Diagnostic engine for CM1xx-based USB radio interface adapters.
//!
//! The engine drives the adapter's digital control lines over 4-byte HID
//! control transfers, generates and measures tones through the sound-card
//! codec, and reads/writes the small configuration EEPROM behind it.
//! Transports are pluggable: [`transport::hid::HidControl`] talks to real
//! hardware, while the [`transport::mock`] implementations run the whole
//! engine in memory.
//!
//! Device discovery, mixer setup and the interactive front end live outside
//! this crate; they hand over a [`Device`] profile (via [`device::probe`])
//! and an open transport, and render the reports the sequencers return.
//!
//! ```no_run
//! use std::sync::Arc;
//! use uridiag::{device, diag, transport::mock::MockAdapter, UriDiag};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let device = device::probe(0x0013);
//!     let diag = UriDiag::new(Arc::new(MockAdapter::new(device)), device);
//!
//!     let report = diag::digital_test(&diag).await;
//!     println!("digital i/o errors: {}", report.errors);
//!     Ok(())
//! }
//! ```

use std::{sync::Arc, time::Duration};

pub mod audio;
pub mod client;
pub mod diag;
pub mod dsp;
pub mod levels;
pub mod transport;
pub mod utils;

pub use audio::AudioHandle;
pub use client::Client;
pub use levels::{monitor_levels, LevelSnapshot, SharedLevels};
pub use transport::DiagError;
pub use uridiag_protocol::{device, eeprom, mfg, report, Device, ProtocolError};

use transport::{AudioDuplex, ControlTransport};
use utils::ErrInto;

pub type Result<T, E = DiagError> = core::result::Result<T, E>;

/// Minimum wait after a GPIO write before the new state is reliably readable
const GPIO_SETTLE: Duration = Duration::from_millis(100);

/// High-level diagnostic API for one adapter
#[derive(Clone)]
pub struct UriDiag {
    pub client: Client,
    pub device: &'static Device,

    levels: Arc<SharedLevels>,
}

impl UriDiag {
    pub fn new(transport: Arc<dyn ControlTransport>, device: &'static Device) -> Self {
        Self {
            client: Client::new(transport),
            device,
            levels: Arc::new(SharedLevels::new()),
        }
    }

    /// Shared measurement state read by the display loop and the analog
    /// sequencer, written by the audio context
    pub fn levels(&self) -> Arc<SharedLevels> {
        self.levels.clone()
    }

    /// Publishes new tone targets for the audio loop; zero silences a channel
    pub fn set_tones(&self, freq1: f32, freq2: f32) {
        self.levels.set_targets(freq1, freq2);
    }

    /// Starts the background audio context on `stream`. Shut the returned
    /// handle down before releasing the transport.
    pub fn start_audio(&self, stream: Box<dyn AudioDuplex>) -> AudioHandle {
        audio::spawn_audio_loop(stream, self.levels.clone(), self.device)
    }

    /// Drives the output-capable GPIO lines and waits out the settle time
    pub async fn set_outputs(&self, pattern: u8) -> Result<()> {
        self.client
            .send_report(report::Report::GpioWrite {
                pattern,
                direction: self.device.direction_mask,
            })
            .await?;
        tokio::time::sleep(GPIO_SETTLE).await;
        Ok(())
    }

    /// Reads and decodes the GPIO status byte
    pub async fn read_inputs(&self) -> Result<u8> {
        let raw = self.client.read_report().await?;
        self.device.decode_inputs(&raw).err_into()
    }

    /// Reads the user block, failing on checksum or magic problems
    pub async fn verify_user_block(&self) -> Result<eeprom::UserBlock> {
        let (block, _) = self.client.read_user_block().await?;
        block.validate()?;
        Ok(block)
    }

    /// Programs the factory manufacturer table, 51 words written verbatim in
    /// order. Only variants carrying a table support this; everything else
    /// is rejected before any transfer is issued.
    pub async fn write_manufacturer_block(&self) -> Result<()> {
        let table = self
            .device
            .mfg_table
            .ok_or(DiagError::UnsupportedOperation)?;
        for (addr, value) in table.iter().enumerate() {
            self.client.write_word_raw(addr as u8, *value).await?;
        }
        Ok(())
    }

    /// Dumps the EEPROM and decodes the manufacturer fields. `None` means
    /// the block was never programmed.
    pub async fn read_manufacturer_info(&self) -> Result<Option<mfg::MfgInfo>> {
        let words = self.client.dump_eeprom().await?;
        mfg::decode(self.device.mfg_dialect, &words).err_into()
    }
}
