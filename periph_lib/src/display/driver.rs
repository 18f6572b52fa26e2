//! SSD1306 panel driver

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info};

use crate::bus::{BusError, BusTransport};
use super::{
    cmds, Bitmap, DisplayError, Framebuffer, Params, PanelModel, VccSource, CONTROL_COMMAND,
    CONTROL_DATA, FLUSH_CHUNK_LEN, MAX_HEIGHT, MAX_WIDTH
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Driver for an SSD1306 panel of any of the supported models.
pub struct Display<B> {
    bus: B,
    address: u8,
    model: PanelModel,
    vcc: VccSource,
    framebuffer: Framebuffer,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<B> Display<B>
where
    B: BusTransport
{
    /// Create a driver for `model` at bus address `address`.
    ///
    /// Nothing is sent to the panel until [`Display::begin`].
    pub fn new(bus: B, model: PanelModel, address: u8) -> Result<Self, DisplayError> {
        if model.width > MAX_WIDTH || model.height > MAX_HEIGHT {
            return Err(DisplayError::InvalidGeometry(model.width, model.height));
        }

        let framebuffer = Framebuffer::new(model.width, model.height)?;

        Ok(Self {
            bus,
            address,
            model,
            vcc: VccSource::SwitchCap,
            framebuffer,
        })
    }

    /// Create a driver from the display parameters.
    pub fn from_params(bus: B, params: &Params) -> Result<Self, DisplayError> {
        params.are_valid()?;

        let mut display = Self::new(bus, params.model.into(), params.address)?;
        display.vcc = params.vcc;

        Ok(display)
    }

    /// Run the panel's start up sequence and switch it on.
    pub fn begin(&mut self, vcc: VccSource) -> Result<(), DisplayError> {
        self.vcc = vcc;

        let address = self.address;
        let mut sequence = self.model.init_sequence(vcc);
        sequence.push(cmds::DISPLAYON);

        self.bus.transaction(|bus| send_commands(bus, address, &sequence))?;

        info!("{} display at 0x{:02x} started ({:?})", self.model.name, self.address, vcc);

        Ok(())
    }

    /// Send a single command byte.
    pub fn command(&mut self, c: u8) -> Result<(), DisplayError> {
        Ok(self.bus.write_byte(self.address, CONTROL_COMMAND, c)?)
    }

    /// Send a single display RAM byte.
    pub fn data(&mut self, c: u8) -> Result<(), DisplayError> {
        Ok(self.bus.write_byte(self.address, CONTROL_DATA, c)?)
    }

    /// Blank the framebuffer. The panel is not updated until [`Display::flush`].
    pub fn clear(&mut self) {
        self.framebuffer.clear();
    }

    /// Pack an image into the framebuffer. It must match the panel's size.
    pub fn load_image(&mut self, bitmap: &Bitmap) -> Result<(), DisplayError> {
        self.framebuffer.load_bitmap(bitmap)
    }

    /// Send the whole framebuffer to the panel.
    ///
    /// The address window and the data are sent as one bus transaction, so other drivers on a
    /// shared bus can't split the stream.
    pub fn flush(&mut self) -> Result<(), DisplayError> {
        let address = self.address;
        let last_col = (self.model.width - 1) as u8;
        let last_page = (self.framebuffer.pages() - 1) as u8;
        let framebuffer = &self.framebuffer;

        self.bus.transaction(|bus| {
            send_commands(
                bus, address, &[cmds::COLUMNADDR, 0, last_col, cmds::PAGEADDR, 0, last_page]
            )?;

            for chunk in framebuffer.as_bytes().chunks(FLUSH_CHUNK_LEN) {
                bus.write_block(address, CONTROL_DATA, chunk)?;
            }

            Ok(())
        })?;

        Ok(())
    }

    /// Set the panel contrast, from 0 to 255.
    pub fn set_contrast(&mut self, level: i32) -> Result<(), DisplayError> {
        if level < 0 || level > 255 {
            return Err(DisplayError::InvalidContrast(level));
        }

        let address = self.address;
        self.bus.transaction(|bus| {
            send_commands(bus, address, &[cmds::SETCONTRAST, level as u8])
        })?;

        debug!("Display contrast set to {}", level);

        Ok(())
    }

    /// Dim the panel, or restore the normal contrast for the panel's supply.
    pub fn dim(&mut self, dim: bool) -> Result<(), DisplayError> {
        let contrast = match (dim, self.vcc) {
            (true, _) => 0x00,
            (false, VccSource::External) => 0x9F,
            (false, VccSource::SwitchCap) => 0xCF,
        };

        self.set_contrast(contrast)
    }

    pub fn model(&self) -> &PanelModel {
        &self.model
    }

    pub fn vcc(&self) -> VccSource {
        self.vcc
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Give back the bus.
    pub fn release(self) -> B {
        self.bus
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn send_commands(bus: &mut dyn BusTransport, addr: u8, commands: &[u8]) -> Result<(), BusError> {
    for &c in commands {
        bus.write_byte(addr, CONTROL_COMMAND, c)?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
