//! Paged display buffer
//!
//! The SSD1306 display RAM is split into pages, each 8 pixels tall. Every byte covers one column
//! of one page, the least significant bit being the top row of the page. The framebuffer holds
//! the pages in order with the columns of each page left to right, so it can be streamed to the
//! panel in a single pass with horizontal addressing.

use super::{Bitmap, DisplayError};

/// Off-screen copy of the display RAM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl Framebuffer {
    /// A blank framebuffer. `height` must be a non-zero multiple of 8.
    pub fn new(width: u32, height: u32) -> Result<Self, DisplayError> {
        if width == 0 || height == 0 || height % 8 != 0 {
            return Err(DisplayError::InvalidGeometry(width, height));
        }

        Ok(Self {
            width,
            height,
            buffer: vec![0; (width * (height / 8)) as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pages(&self) -> u32 {
        self.height / 8
    }

    /// The packed bytes, page by page.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Turn every pixel off.
    pub fn clear(&mut self) {
        for b in self.buffer.iter_mut() {
            *b = 0;
        }
    }

    /// Pack a bitmap into the buffer.
    ///
    /// The bitmap must be the same size as the buffer, otherwise the buffer is left untouched.
    pub fn load_bitmap(&mut self, bitmap: &Bitmap) -> Result<(), DisplayError> {
        if bitmap.dimensions() != (self.width, self.height) {
            return Err(DisplayError::DimensionMismatch(
                self.width, self.height, bitmap.width(), bitmap.height()
            ));
        }

        for page in 0..self.pages() {
            for x in 0..self.width {
                // Bottom row of the page is shifted in first and ends up as the MSB
                let mut bits = 0u8;
                for bit in 0..8 {
                    bits <<= 1;
                    bits |= bitmap.get(x, page * 8 + 7 - bit) as u8;
                }

                self.buffer[(page * self.width + x) as usize] = bits;
            }
        }

        Ok(())
    }

    /// Whether the pixel at `(x, y)` is lit. Pixels outside the buffer are unlit.
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }

        let byte = self.buffer[((y / 8) * self.width + x) as usize];

        (byte >> (y % 8)) & 1 == 1
    }

    /// Unpack the buffer back into a bitmap.
    pub fn to_bitmap(&self) -> Bitmap {
        Bitmap::from_fn(self.width, self.height, |x, y| self.pixel(x, y))
    }
}
