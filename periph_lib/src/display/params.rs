//! # Display parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use thiserror::Error;

use super::{PanelKind, VccSource, ALT_ADDRESS, DEFAULT_ADDRESS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {

    /// Bus address of the panel, 0x3C or 0x3D depending on the SA0 strap.
    pub address: u8,

    /// Which panel is fitted.
    pub model: PanelKind,

    /// How the panel's driving voltage is generated.
    pub vcc: VccSource,
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Display address must be 0x3C or 0x3D, got 0x{0:02x}")]
    InvalidAddress(u8),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            model: PanelKind::Panel128x64,
            vcc: VccSource::SwitchCap,
        }
    }
}

impl Params {

    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if self.address != DEFAULT_ADDRESS && self.address != ALT_ADDRESS {
            return Err(ParamsError::InvalidAddress(self.address));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_from_toml() -> Result<(), util::params::LoadError> {
        let p: Params = util::params::from_toml_str(
            "address = 61\nmodel = \"128x32\"\nvcc = \"external\"\n"
        )?;

        assert_eq!(p.address, 0x3D);
        assert_eq!(p.model, PanelKind::Panel128x32);
        assert_eq!(p.vcc, VccSource::External);
        assert!(p.are_valid().is_ok());

        Ok(())
    }

    #[test]
    fn test_invalid_address() {
        let mut p = Params::default();
        p.address = 0x40;

        assert!(matches!(p.are_valid(), Err(ParamsError::InvalidAddress(0x40))));
    }
}
