//! # Battery Monitor Module
//!
//! The battery voltage is measured through a resistive divider by an MCP3221 12-bit ADC on the
//! board bus. [`VoltageMonitor`] samples it in a background thread and keeps an exponentially
//! smoothed estimate which any thread can read.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod filter;
pub mod monitor;
pub mod params;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use filter::ExpFilter;
pub use monitor::{FilteredReader, VoltageMonitor};
pub use params::{Params, ParamsError};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use thiserror::Error;

use crate::{bus::BusError, error::ErrorKind};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default bus address of the MCP3221.
pub const DEFAULT_ADDRESS: u8 = 0x4D;

/// Register the conversion result is read from.
pub const REG_RESULT: u8 = 0x00;

/// Full scale count of the 12-bit converter.
pub const FULL_SCALE_COUNTS: u16 = 4095;

/// Calibration averages below this (in volts, before the divider gain) are treated as a
/// disconnected or shorted input.
pub const MIN_CALIB_AVERAGE_V: f64 = 1e-3;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum BatteryError {
    #[error("Bus error while reading the ADC: {0}")]
    Transport(#[from] BusError),

    #[error("Calibration average of {0:.4} V is too small to derive a gain from")]
    DegenerateCalibration(f64),

    #[error("Calibration target must be a finite positive voltage, got {0}")]
    InvalidTarget(f64),

    #[error("The sampling thread is already running")]
    AlreadyRunning,

    #[error("Could not spawn the sampling thread: {0}")]
    SpawnFailed(std::io::Error),

    #[error("Battery monitor parameters are invalid: {0}")]
    InvalidParams(#[from] ParamsError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl BatteryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BatteryError::Transport(_) => ErrorKind::Transport,
            BatteryError::DegenerateCalibration(_) 
            | BatteryError::InvalidTarget(_) => ErrorKind::Range,
            BatteryError::AlreadyRunning
            | BatteryError::SpawnFailed(_)
            | BatteryError::InvalidParams(_) => ErrorKind::Configuration,
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert the two result bytes of the ADC into a voltage at the ADC pin.
///
/// The result is big-endian with the top nibble unused.
pub fn counts_to_volts(bytes: [u8; 2], v_ref_v: f64) -> f64 {
    let raw = u16::from_be_bytes(bytes) & FULL_SCALE_COUNTS;

    (raw as f64 / FULL_SCALE_COUNTS as f64) * v_ref_v
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_counts_to_volts() {
        assert_eq!(counts_to_volts([0x00, 0x00], 3.3), 0.0);
        assert_eq!(counts_to_volts([0x0f, 0xff], 3.3), 3.3);
        assert_eq!(counts_to_volts([0xff, 0xff], 3.3), 3.3);
        assert!((counts_to_volts([0x08, 0x00], 3.3) - 2048.0 / 4095.0 * 3.3).abs() < 1e-12);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            BatteryError::from(BusError::Poisoned).kind(),
            ErrorKind::Transport
        );
        assert_eq!(BatteryError::DegenerateCalibration(0.0).kind(), ErrorKind::Range);
    }
}
