//! # PWM Controller Module
//!
//! Servos and motor drivers on the board are driven by a PCA9685 16 channel, 12-bit PWM
//! generator. Each channel is first registered with a [`PwmMode`] describing what is connected
//! to it, after which [`PwmController::set_channel`] maps a value in the mode's units (degrees,
//! percent, on/off) onto the chip's tick counter.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod controller;
pub mod mode;
pub mod params;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use controller::{prescale_for, PwmController};
pub use mode::{ChannelValue, PwmMode};
pub use params::{ChannelConfig, Params, ParamsError};

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use thiserror::Error;

use crate::{bus::BusError, error::ErrorKind};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Default bus address of the PCA9685.
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// Number of output channels.
pub const NUM_CHANNELS: u8 = 16;

/// Number of ticks in one PWM cycle.
pub const CYCLE_TICKS: u16 = 4096;

/// Frequency of the chip's internal oscillator.
///
/// Units: hertz
pub const OSC_FREQ_HZ: f64 = 25_000_000.0;

/// PCA9685 registers and mode bits.
pub mod regs {
    pub const MODE1: u8 = 0x00;
    pub const MODE2: u8 = 0x01;
    pub const PRESCALE: u8 = 0xFE;

    /// Channel 0 on-time low byte, each further channel is offset by 4.
    pub const LED0_ON_L: u8 = 0x06;
    pub const LED0_ON_H: u8 = 0x07;
    pub const LED0_OFF_L: u8 = 0x08;
    pub const LED0_OFF_H: u8 = 0x09;

    /// Software reset byte.
    pub const SWRST: u8 = 0x06;

    // MODE1 bits
    pub const RESTART: u8 = 0x80;
    pub const SLEEP: u8 = 0x10;
    pub const SUB1: u8 = 0x08;
    pub const ALLCALL: u8 = 0x01;

    // MODE2 bits
    pub const OUTDRV: u8 = 0x04;

    /// Lowest and highest values the chip accepts in the prescale register.
    pub const PRESCALE_MIN: u8 = 3;
    pub const PRESCALE_MAX: u8 = 255;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PwmError {
    #[error("Bus error while talking to the PWM chip: {0}")]
    Transport(#[from] BusError),

    #[error("Channel number must be from 0 to 15 (inclusive), got {0}")]
    InvalidChannel(i32),

    #[error("Channel {0} hasn't been initialised")]
    ChannelNotInitialised(u8),

    #[error("A {mode:?} channel cannot be set to {value:?}")]
    InvalidValueType { mode: PwmMode, value: ChannelValue },

    #[error("Channel value must be a number, got {0}")]
    InvalidValue(f64),

    #[error("Servo range must be finite and positive, got {0} degrees")]
    InvalidServoRange(f64),

    #[error("PWM frequency must be finite and positive, got {0} Hz")]
    InvalidFrequency(f64),

    #[error("{freq_hz} Hz needs a prescale of {prescale}, outside the chip's range of 3 to 255")]
    PrescaleOutOfRange { freq_hz: f64, prescale: f64 },

    #[error("PWM parameters are invalid: {0}")]
    InvalidParams(#[from] ParamsError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PwmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PwmError::Transport(_) => ErrorKind::Transport,
            PwmError::ChannelNotInitialised(_) 
            | PwmError::InvalidParams(_) => ErrorKind::Configuration,
            PwmError::InvalidValueType { .. } => ErrorKind::Type,
            PwmError::InvalidChannel(_)
            | PwmError::InvalidValue(_)
            | PwmError::InvalidServoRange(_)
            | PwmError::InvalidFrequency(_)
            | PwmError::PrescaleOutOfRange { .. } => ErrorKind::Range,
        }
    }
}
