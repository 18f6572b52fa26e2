//! # OLED Display Module
//!
//! The board carries an SSD1306 based monochrome OLED. Three panel sizes are in use, they share
//! one driver ([`Display`]) which is parameterised by a [`PanelModel`] describing the panel's
//! geometry and start up command sequence.
//!
//! Drawing happens off-screen: a [`Bitmap`] is packed into the [`Framebuffer`] with
//! [`Display::load_image`] and the whole buffer is sent to the panel by [`Display::flush`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod bitmap;
pub mod driver;
pub mod framebuffer;
pub mod model;
pub mod params;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use bitmap::Bitmap;
pub use driver::Display;
pub use framebuffer::Framebuffer;
pub use model::{PanelContrast, PanelKind, PanelModel, VccSource};
pub use params::{Params, ParamsError};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use thiserror::Error;

use crate::{bus::BusError, error::ErrorKind};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default bus address of the panel (SA0 low).
pub const DEFAULT_ADDRESS: u8 = 0x3C;

/// Bus address of the panel with SA0 high.
pub const ALT_ADDRESS: u8 = 0x3D;

/// Control byte preceding a command.
pub const CONTROL_COMMAND: u8 = 0x00;

/// Control byte preceding display RAM data.
pub const CONTROL_DATA: u8 = 0x40;

/// Largest panel the controller can drive.
pub const MAX_WIDTH: u32 = 128;
pub const MAX_HEIGHT: u32 = 64;

/// Number of framebuffer bytes sent per data write.
pub const FLUSH_CHUNK_LEN: usize = 16;

/// SSD1306 command bytes.
pub mod cmds {
    pub const SETCONTRAST: u8 = 0x81;
    pub const DISPLAYALLON_RESUME: u8 = 0xA4;
    pub const NORMALDISPLAY: u8 = 0xA6;
    pub const DISPLAYOFF: u8 = 0xAE;
    pub const DISPLAYON: u8 = 0xAF;
    pub const SETDISPLAYOFFSET: u8 = 0xD3;
    pub const SETCOMPINS: u8 = 0xDA;
    pub const SETVCOMDETECT: u8 = 0xDB;
    pub const SETDISPLAYCLOCKDIV: u8 = 0xD5;
    pub const SETPRECHARGE: u8 = 0xD9;
    pub const SETMULTIPLEX: u8 = 0xA8;
    pub const SETSTARTLINE: u8 = 0x40;
    pub const MEMORYMODE: u8 = 0x20;
    pub const COLUMNADDR: u8 = 0x21;
    pub const PAGEADDR: u8 = 0x22;
    pub const COMSCANDEC: u8 = 0xC8;
    pub const SEGREMAP: u8 = 0xA0;
    pub const CHARGEPUMP: u8 = 0x8D;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("Bus error while talking to the display: {0}")]
    Transport(#[from] BusError),

    #[error("Image must be same dimensions as display ({0}x{1}), got {2}x{3}")]
    DimensionMismatch(u32, u32, u32, u32),

    #[error("Image must have a bit depth of 1 (only black or white pixels)")]
    NotOneBit,

    #[error("Contrast must be value from 0 to 255 (inclusive), got {0}")]
    InvalidContrast(i32),

    #[error(
        "Panel of {0}x{1} is not supported, it must fit in 128x64 with a height that is a \
         non-zero multiple of 8"
    )]
    InvalidGeometry(u32, u32),

    #[error("Display parameters are invalid: {0}")]
    InvalidParams(#[from] ParamsError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DisplayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DisplayError::Transport(_) => ErrorKind::Transport,
            DisplayError::DimensionMismatch(..)
            | DisplayError::InvalidGeometry(..)
            | DisplayError::InvalidParams(_) => ErrorKind::Configuration,
            DisplayError::NotOneBit => ErrorKind::Type,
            DisplayError::InvalidContrast(_) => ErrorKind::Range,
        }
    }
}
