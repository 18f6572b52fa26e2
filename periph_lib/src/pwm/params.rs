//! # PWM controller parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use thiserror::Error;

use super::{PwmMode, NUM_CHANNELS};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {

    /// Bus address of the PWM chip.
    pub address: u8,

    /// PWM frequency programmed at start up. The servo tick window assumes 50 Hz.
    ///
    /// Units: hertz
    pub frequency_hz: f64,

    /// Channels to register at start up.
    pub channels: Vec<ChannelConfig>,
}

/// Mode of a single channel.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    pub channel: u8,

    pub mode: PwmMode,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Channel {0} does not exist on the PWM chip")]
    NoSuchChannel(u8),

    #[error("Channel {0} is configured more than once")]
    DuplicateChannel(u8),

    #[error("Channel {0} has an invalid servo range")]
    InvalidServoRange(u8),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            address: super::DEFAULT_ADDRESS,
            frequency_hz: 50.0,
            channels: Vec::new(),
        }
    }
}

impl Params {

    /// Determines if the parameters are valid.
    ///
    /// The frequency is checked when it is programmed.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        for (i, cfg) in self.channels.iter().enumerate() {
            if cfg.channel >= NUM_CHANNELS {
                return Err(ParamsError::NoSuchChannel(cfg.channel));
            }

            if self.channels[..i].iter().any(|c| c.channel == cfg.channel) {
                return Err(ParamsError::DuplicateChannel(cfg.channel));
            }

            if cfg.mode.validate().is_err() {
                return Err(ParamsError::InvalidServoRange(cfg.channel));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_from_toml() -> Result<(), util::params::LoadError> {
        let p: Params = util::params::from_toml_str(r#"
            frequency_hz = 60.0

            [[channels]]
            channel = 0
            mode = { type = "servo", max_angle = 180.0 }

            [[channels]]
            channel = 3
            mode = { type = "reverse_motor" }
        "#)?;

        assert_eq!(p.address, 0x40);
        assert_eq!(p.frequency_hz, 60.0);
        assert_eq!(p.channels.len(), 2);
        assert_eq!(p.channels[0].mode, PwmMode::SERVO_180);
        assert_eq!(p.channels[1].mode, PwmMode::ReverseMotor);
        assert!(p.are_valid().is_ok());

        Ok(())
    }

    #[test]
    fn test_invalid_channels() {
        let mut p = Params::default();
        p.channels = vec![
            ChannelConfig { channel: 1, mode: PwmMode::OnOff },
            ChannelConfig { channel: 1, mode: PwmMode::ForwardMotor },
        ];
        assert!(matches!(p.are_valid(), Err(ParamsError::DuplicateChannel(1))));

        p.channels = vec![ChannelConfig { channel: 16, mode: PwmMode::OnOff }];
        assert!(matches!(p.are_valid(), Err(ParamsError::NoSuchChannel(16))));

        p.channels = vec![ChannelConfig { channel: 2, mode: PwmMode::Servo { max_angle: -1.0 } }];
        assert!(matches!(p.are_valid(), Err(ParamsError::InvalidServoRange(2))));
    }
}
