//! In-memory adapter for testing purposes
//!
//! The control half emulates the EEPROM strobes against a 64-word memory and
//! mirrors the GPIO wiring of the factory loopback cable; the audio half
//! hands written blocks straight back to the reader, summed to mono the way
//! the cable feeds both playback channels into the single mic input.

use std::{collections::VecDeque, sync::Mutex, thread, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use uridiag_protocol::{
    device::{Device, DeviceKind},
    eeprom::EEPROM_LEN,
    report::{Report, REPORT_LEN},
};

use super::{AudioDuplex, ControlTransport, DiagError, Readiness};

pub struct MockAdapter {
    device: &'static Device,
    state: Mutex<MockState>,
}

struct MockState {
    eeprom: [u16; EEPROM_LEN],
    outputs: u8,
    direction: u8,
    pending_read: Option<u8>,
    forced_status: Option<u8>,
    flip_once: u8,
    fail_transfers: usize,
}

impl MockAdapter {
    pub fn new(device: &'static Device) -> Self {
        Self {
            device,
            state: Mutex::new(MockState {
                eeprom: [0u16; EEPROM_LEN],
                outputs: 0,
                direction: 0,
                pending_read: None,
                forced_status: None,
                flip_once: 0,
                fail_transfers: 0,
            }),
        }
    }

    /// Copies out the emulated EEPROM for assertions
    pub fn eeprom(&self) -> [u16; EEPROM_LEN] {
        self.state.lock().unwrap().eeprom
    }

    pub fn set_eeprom(&self, addr: u8, value: u16) {
        self.state.lock().unwrap().eeprom[addr as usize] = value;
    }

    /// Last direction mask received with a GPIO write
    pub fn direction(&self) -> u8 {
        self.state.lock().unwrap().direction
    }

    /// Overrides the GPIO read-back until cleared
    pub fn force_status(&self, status: Option<u8>) {
        self.state.lock().unwrap().forced_status = status;
    }

    /// Flips the given status bits on the next GPIO read-back only
    pub fn flip_next_status(&self, mask: u8) {
        self.state.lock().unwrap().flip_once = mask;
    }

    /// Makes the next `n` control transfers fail
    pub fn fail_transfers(&self, n: usize) {
        self.state.lock().unwrap().fail_transfers = n;
    }

    // What the loopback cable feeds back for a given output pattern:
    // GPIO1 -> GPIO2, GPIO3 -> CTCSS, GPIO4 (active low) -> COR, and on
    // three-pair parts GPIO5 -> GPIO7 and GPIO6 -> GPIO8.
    fn loopback_status(device: &Device, outputs: u8) -> u8 {
        let mut status = 0u8;
        if outputs & 0x01 != 0 {
            status |= 0x02;
        }
        if outputs & 0x04 != 0 {
            status |= 0x10;
        }
        if outputs & 0x08 == 0 {
            status |= 0x20;
        }
        if device.kind == DeviceKind::C119 {
            if outputs & 0x10 != 0 {
                status |= 0x40;
            }
            if outputs & 0x20 != 0 {
                status |= 0x80;
            }
        }
        status
    }

    // Lays a status byte out the way the real part builds its input report,
    // i.e. the inverse of `Device::decode_inputs`.
    fn encode_status(device: &Device, status: u8) -> [u8; REPORT_LEN] {
        let mut raw = [0u8; REPORT_LEN];
        raw[1] = status & 0x0f;
        raw[0] = (status >> 4) & 0x03;
        match device.kind {
            DeviceKind::C108 => {}
            DeviceKind::C119 => raw[1] |= status & 0xc0,
            DeviceKind::C108Ah => {
                if status & 0x02 == 0 {
                    raw[0] |= 0x10;
                }
            }
        }
        raw
    }
}

#[async_trait]
impl ControlTransport for MockAdapter {
    async fn send_report(&self, report: Bytes) -> Result<(), DiagError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_transfers > 0 {
            state.fail_transfers -= 1;
            return Err(DiagError::TransportClosed);
        }

        match Report::from_bytes(&report)? {
            Report::GpioWrite { pattern, direction } => {
                state.outputs = pattern;
                state.direction = direction;
            }
            Report::EepromRead { addr } => state.pending_read = Some(addr),
            Report::EepromWrite { addr, value } => state.eeprom[addr as usize] = value,
        }
        Ok(())
    }

    async fn recv_report(&self) -> Result<Bytes, DiagError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_transfers > 0 {
            state.fail_transfers -= 1;
            return Err(DiagError::TransportClosed);
        }

        let raw = if let Some(addr) = state.pending_read.take() {
            let value = state.eeprom[addr as usize];
            [0, (value & 0xff) as u8, (value >> 8) as u8, 0]
        } else {
            let mut status = state
                .forced_status
                .unwrap_or_else(|| Self::loopback_status(self.device, state.outputs));
            status ^= std::mem::take(&mut state.flip_once);
            Self::encode_status(self.device, status)
        };
        Ok(Bytes::copy_from_slice(&raw))
    }
}

/// Audio loopback: every written block becomes the next read block, with the
/// two playback channels summed into both capture channels.
pub struct LoopbackAudio {
    queue: VecDeque<Vec<i16>>,
    pace: Duration,
}

impl LoopbackAudio {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            pace: Duration::from_micros(200),
        }
    }
}

impl Default for LoopbackAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDuplex for LoopbackAudio {
    fn wait(&mut self) -> Result<Readiness, DiagError> {
        thread::sleep(self.pace);
        Ok(if self.queue.is_empty() {
            Readiness::Writable
        } else {
            Readiness::Readable
        })
    }

    fn read_block(&mut self, buf: &mut [i16]) -> Result<usize, DiagError> {
        let block = self.queue.pop_front().ok_or(DiagError::TransportClosed)?;
        let n = buf.len().min(block.len());
        buf[..n].copy_from_slice(&block[..n]);
        Ok(n)
    }

    fn write_block(&mut self, buf: &[i16]) -> Result<usize, DiagError> {
        let mut mixed = Vec::with_capacity(buf.len());
        for frame in buf.chunks_exact(2) {
            let mono = ((frame[0] as i32 + frame[1] as i32) / 2) as i16;
            mixed.push(mono);
            mixed.push(mono);
        }
        self.queue.push_back(mixed);
        Ok(buf.len())
    }
}
