//! Word-level EEPROM driver and raw report plumbing
//!
//! Timing matters here: the part needs guard delays around the EEPROM
//! strobes, on top of the per-transfer guard the transport already applies.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use uridiag_protocol::{
    eeprom::{self, UserBlock},
    report::{self, Report},
};

use crate::{
    transport::{ControlTransport, DiagError},
    utils::ErrInto,
};

/// Upper bound on a single control transfer
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(5);

/// Guard before an EEPROM read strobe and before collecting its reply
const EEPROM_READ_GUARD: Duration = Duration::from_micros(500);

/// Guard before an EEPROM write strobe
const EEPROM_WRITE_GUARD: Duration = Duration::from_millis(2);

#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn ControlTransport>,
}

impl Client {
    pub fn new(transport: Arc<dyn ControlTransport>) -> Self {
        Self { transport }
    }

    pub async fn send_report(&self, report: Report) -> Result<(), DiagError> {
        match tokio::time::timeout(
            TRANSFER_TIMEOUT,
            self.transport.send_report(report.to_bytes()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(DiagError::Timeout),
        }
    }

    pub async fn read_report(&self) -> Result<Bytes, DiagError> {
        match tokio::time::timeout(TRANSFER_TIMEOUT, self.transport.recv_report()).await {
            Ok(result) => result,
            Err(_) => Err(DiagError::Timeout),
        }
    }

    /// Reads one EEPROM word
    pub async fn read_word(&self, addr: u8) -> Result<u16, DiagError> {
        check_addr(addr)?;
        tokio::time::sleep(EEPROM_READ_GUARD).await;
        self.send_report(Report::EepromRead { addr }).await?;
        tokio::time::sleep(EEPROM_READ_GUARD).await;
        let raw = self.read_report().await?;
        report::eeprom_word(&raw).err_into()
    }

    /// Writes one user-block word. Addresses below the user block belong to
    /// the manufacturer and are rejected; the manufacturer-block operation
    /// is the only path allowed to touch them.
    pub async fn write_word(&self, addr: u8, value: u16) -> Result<(), DiagError> {
        check_addr(addr)?;
        if addr < eeprom::USER_START {
            return Err(DiagError::ReservedAddress(addr));
        }
        self.write_word_raw(addr, value).await
    }

    pub(crate) async fn write_word_raw(&self, addr: u8, value: u16) -> Result<(), DiagError> {
        check_addr(addr)?;
        tokio::time::sleep(EEPROM_WRITE_GUARD).await;
        self.send_report(Report::EepromWrite { addr, value }).await
    }

    /// Reads the 13-word user block. The returned residue is zero exactly
    /// when the block is valid.
    pub async fn read_user_block(&self) -> Result<(UserBlock, u16), DiagError> {
        let mut block = UserBlock::default();
        for off in 0..eeprom::USER_LEN {
            block.words[off] = self.read_word(eeprom::USER_START + off as u8).await?;
        }
        let residue = block.residue();
        Ok((block, residue))
    }

    /// Writes the user block, forcing the magic sentinel and computing the
    /// checksum word. Returns the block as actually written.
    pub async fn write_user_block(&self, block: &UserBlock) -> Result<UserBlock, DiagError> {
        let mut block = *block;
        block.finalize();
        for off in 0..eeprom::USER_LEN {
            self.write_word(eeprom::USER_START + off as u8, block.words[off])
                .await?;
        }
        Ok(block)
    }

    /// Initializes the user block to a zeroed (but valid) state
    pub async fn init_user_block(&self) -> Result<UserBlock, DiagError> {
        self.write_user_block(&UserBlock::default()).await
    }

    /// Reads all 64 words for diagnostic display; no validation is applied
    pub async fn dump_eeprom(&self) -> Result<[u16; eeprom::EEPROM_LEN], DiagError> {
        let mut words = [0u16; eeprom::EEPROM_LEN];
        for (addr, word) in words.iter_mut().enumerate() {
            *word = self.read_word(addr as u8).await?;
        }
        Ok(words)
    }
}

fn check_addr(addr: u8) -> Result<(), DiagError> {
    if addr as usize >= eeprom::EEPROM_LEN {
        Err(DiagError::AddressOutOfRange(addr))
    } else {
        Ok(())
    }
}
