//! # Board parameters
//!
//! All peripheral parameters are loaded from a single file, `periph.toml`, with one table per
//! peripheral.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use thiserror::Error;

use crate::{battery, display, pwm};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BoardParams {
    pub bus: BusParams,
    pub battery: battery::Params,
    pub pwm: pwm::Params,
    pub display: display::Params,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusParams {

    /// Number of the I2C bus the peripherals are on (`/dev/i2c-N`).
    pub number: u8,
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Battery parameters are invalid: {0}")]
    Battery(#[from] battery::ParamsError),

    #[error("PWM parameters are invalid: {0}")]
    Pwm(#[from] pwm::ParamsError),

    #[error("Display parameters are invalid: {0}")]
    Display(#[from] display::ParamsError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for BusParams {
    fn default() -> Self {
        Self { number: 1 }
    }
}

impl BoardParams {

    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        self.battery.are_valid()?;
        self.pwm.are_valid()?;
        self.display.are_valid()?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_board_params() -> Result<(), util::params::LoadError> {
        let p: BoardParams = util::params::from_toml_str(include_str!("../../params/periph.toml"))?;

        assert_eq!(p.bus.number, 1);
        assert_eq!(p.battery.address, 0x4D);
        assert_eq!(p.pwm.frequency_hz, 50.0);
        assert_eq!(p.display.model, display::PanelKind::Panel128x64);
        assert!(p.are_valid().is_ok());

        Ok(())
    }

    #[test]
    fn test_empty_file_gives_defaults() -> Result<(), util::params::LoadError> {
        let p: BoardParams = util::params::from_toml_str("")?;

        assert_eq!(p.bus.number, 1);
        assert_eq!(p.battery.divider_gain, 7.66);
        assert!(p.pwm.channels.is_empty());
        assert!(p.are_valid().is_ok());

        Ok(())
    }
}
