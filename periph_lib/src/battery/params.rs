//! # Battery monitor parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the battery voltage monitor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {

    /// Bus address of the ADC.
    pub address: u8,

    /// Reference voltage of the ADC.
    ///
    /// Units: volts
    pub v_ref_v: f64,

    /// Gain of the voltage divider in front of the ADC, i.e. battery volts per ADC pin volt.
    pub divider_gain: f64,

    /// Smoothing coefficient of the filtered voltage, in (0, 1]. Larger values track the input
    /// faster.
    pub filter_k: f64,

    /// Rate of the background sampling thread.
    ///
    /// Units: hertz
    pub sample_rate_hz: f64,

    /// Number of samples averaged during calibration.
    pub calib_num_samples: usize,

    /// Rate at which calibration samples are taken.
    ///
    /// Units: hertz
    pub calib_rate_hz: f64,
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Reference voltage must be finite and positive, got {0}")]
    InvalidReference(f64),

    #[error("Divider gain must be finite and positive, got {0}")]
    InvalidGain(f64),

    #[error("Filter coefficient must be in (0, 1], got {0}")]
    InvalidFilterCoeff(f64),

    #[error("Sample rates must be finite and positive, got {0}")]
    InvalidRate(f64),

    #[error("At least one calibration sample is required")]
    NoCalibSamples,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            address: super::DEFAULT_ADDRESS,
            v_ref_v: 3.3,
            divider_gain: 7.66,
            filter_k: 0.1,
            sample_rate_hz: 20.0,
            calib_num_samples: 100,
            calib_rate_hz: 100.0,
        }
    }
}

impl Params {

    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if !is_positive(self.v_ref_v) {
            return Err(ParamsError::InvalidReference(self.v_ref_v));
        }

        if !is_positive(self.divider_gain) {
            return Err(ParamsError::InvalidGain(self.divider_gain));
        }

        if !(self.filter_k > 0.0 && self.filter_k <= 1.0) {
            return Err(ParamsError::InvalidFilterCoeff(self.filter_k));
        }

        for &rate in &[self.sample_rate_hz, self.calib_rate_hz] {
            if !is_positive(rate) {
                return Err(ParamsError::InvalidRate(rate));
            }
        }

        if self.calib_num_samples == 0 {
            return Err(ParamsError::NoCalibSamples);
        }

        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        assert!(Params::default().are_valid().is_ok());
    }

    #[test]
    fn test_invalid_params() {
        let mut p = Params::default();
        p.filter_k = 0.0;
        assert!(matches!(p.are_valid(), Err(ParamsError::InvalidFilterCoeff(_))));

        let mut p = Params::default();
        p.filter_k = 1.5;
        assert!(matches!(p.are_valid(), Err(ParamsError::InvalidFilterCoeff(_))));

        let mut p = Params::default();
        p.sample_rate_hz = std::f64::NAN;
        assert!(matches!(p.are_valid(), Err(ParamsError::InvalidRate(_))));

        let mut p = Params::default();
        p.calib_num_samples = 0;
        assert!(matches!(p.are_valid(), Err(ParamsError::NoCalibSamples)));
    }
}
