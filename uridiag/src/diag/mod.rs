//! Test sequencers
//!
//! Each sequencer runs a fixed list of steps, compares observations against
//! expectations, and returns a serializable report with a total error count;
//! zero errors means pass. A transport failure is charged to the step that
//! hit it and the run continues, so one bad transfer cannot mask the results
//! of later steps. Rendering is left entirely to the caller.

mod analog;
mod digital;
mod eeprom;

pub use analog::{
    analog_test, analog_test_with, AnalogReport, CaseOutcome, ChannelOutcome, ToneCase,
    ANALOG_SETTLE, LEVEL_TOLERANCE, PASSBAND_LEVEL, STOPBAND_LEVEL, TONE_CASES,
};
pub use digital::{digital_test, BitMismatch, DigitalReport, VectorOutcome};
pub use eeprom::{eeprom_test, EepromReport, EEPROM_TEST_SENTINEL};
