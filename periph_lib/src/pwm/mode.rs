//! Channel modes and the mapping from channel values to PWM ticks.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use util::maths::{clamp, lin_map};

use super::PwmError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Tick at the end of a 1 ms pulse in a 50 Hz cycle (~4096/20).
pub const TICK_MIN: u16 = 205;

/// Tick at the end of a 2 ms pulse in a 50 Hz cycle (~4096*2/20).
pub const TICK_MAX: u16 = 410;

/// Off tick for a channel which is on for the whole cycle.
pub const TICK_FULL_ON: u16 = 4095;

/// Off tick for a channel which is off for the whole cycle.
pub const TICK_OFF: u16 = 0;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// What is connected to a PWM channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PwmMode {
    /// Positional servo with a travel of `max_angle` degrees, driven with 0..=max_angle.
    Servo { max_angle: f64 },

    /// Motor driver with a single direction, driven with 0..=100 percent.
    ForwardMotor,

    /// Motor driver with both directions, driven with -100..=100 percent, 0 being stopped.
    ReverseMotor,

    /// Plain digital output, driven with a bool.
    OnOff,
}

/// A value to drive a channel with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelValue {
    Number(f64),
    Switch(bool),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PwmMode {
    pub const SERVO_90: PwmMode = PwmMode::Servo { max_angle: 90.0 };
    pub const SERVO_180: PwmMode = PwmMode::Servo { max_angle: 180.0 };
    pub const SERVO_270: PwmMode = PwmMode::Servo { max_angle: 270.0 };

    /// Check the mode's own bounds are usable.
    pub fn validate(&self) -> Result<(), PwmError> {
        match *self {
            PwmMode::Servo { max_angle } if !(max_angle.is_finite() && max_angle > 0.0) => {
                Err(PwmError::InvalidServoRange(max_angle))
            }
            _ => Ok(())
        }
    }

    /// Map a channel value onto the off tick of the cycle.
    ///
    /// Numeric values outside the mode's range are clamped to it.
    pub fn tick(&self, value: ChannelValue) -> Result<u16, PwmError> {
        match (*self, value) {
            (PwmMode::OnOff, ChannelValue::Switch(on)) => {
                Ok(if on { TICK_FULL_ON } else { TICK_OFF })
            }
            (PwmMode::OnOff, _) | (_, ChannelValue::Switch(_)) => {
                Err(PwmError::InvalidValueType { mode: *self, value })
            }
            (_, ChannelValue::Number(n)) if n.is_nan() => Err(PwmError::InvalidValue(n)),
            (PwmMode::Servo { max_angle }, ChannelValue::Number(n)) => {
                Ok(scale_to_window((0.0, max_angle), n))
            }
            (PwmMode::ForwardMotor, ChannelValue::Number(n)) => {
                Ok(scale_to_window((0.0, 100.0), n))
            }
            (PwmMode::ReverseMotor, ChannelValue::Number(n)) => {
                Ok(scale_to_window((-100.0, 100.0), n))
            }
        }
    }
}

impl From<f64> for ChannelValue {
    fn from(value: f64) -> Self {
        ChannelValue::Number(value)
    }
}

impl From<i32> for ChannelValue {
    fn from(value: i32) -> Self {
        ChannelValue::Number(value as f64)
    }
}

impl From<bool> for ChannelValue {
    fn from(value: bool) -> Self {
        ChannelValue::Switch(value)
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Clamp `value` to `range` and map it linearly onto the servo tick window, truncating.
fn scale_to_window(range: (f64, f64), value: f64) -> u16 {
    let value = clamp(&value, &range.0, &range.1);

    lin_map(range, (TICK_MIN as f64, TICK_MAX as f64), value) as u16
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
