//! # Controller Board Peripherals Library
//!
//! Drivers for the peripherals of the robotics controller board, all of which share the board's
//! two-wire register bus:
//!
//! - [`battery`] - battery voltage monitoring through an MCP3221 ADC
//! - [`pwm`] - servo and motor outputs through a PCA9685 PWM generator
//! - [`display`] - an SSD1306 monochrome OLED panel
//!
//! The drivers are independent of each other and of the bus hardware, see [`bus`] for how they
//! are connected to a real bus.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod battery;
pub mod bus;
pub mod display;
pub mod error;
pub mod params;
pub mod pwm;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use error::ErrorKind;
