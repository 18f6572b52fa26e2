//! One bit per pixel images

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use image::{DynamicImage, GrayImage};
use std::convert::TryFrom;

use super::DisplayError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A monochrome image, stored row by row with `true` for a lit pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<bool>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Bitmap {
    /// A blank bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![false; (width * height) as usize],
        }
    }

    /// Build a bitmap by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Self
    where
        F: Fn(u32, u32) -> bool
    {
        let mut bitmap = Self::new(width, height);

        for y in 0..height {
            for x in 0..width {
                bitmap.set(x, y, f(x, y));
            }
        }

        bitmap
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether the pixel at `(x, y)` is lit. Pixels outside the bitmap are unlit.
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.index(x, y)
            .map(|i| self.pixels[i])
            .unwrap_or(false)
    }

    /// Set the pixel at `(x, y)`, ignored outside the bitmap.
    pub fn set(&mut self, x: u32, y: u32, on: bool) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = on;
        }
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some((y * self.width + x) as usize)
        }
        else {
            None
        }
    }
}

/// Greyscale images must be strictly black (0) or white (255).
impl TryFrom<&GrayImage> for Bitmap {
    type Error = DisplayError;

    fn try_from(image: &GrayImage) -> Result<Self, Self::Error> {
        let mut bitmap = Bitmap::new(image.width(), image.height());

        for (x, y, pixel) in image.enumerate_pixels() {
            match pixel.0[0] {
                0 => (),
                255 => bitmap.set(x, y, true),
                _ => return Err(DisplayError::NotOneBit),
            }
        }

        Ok(bitmap)
    }
}

impl TryFrom<&DynamicImage> for Bitmap {
    type Error = DisplayError;

    fn try_from(image: &DynamicImage) -> Result<Self, Self::Error> {
        match image {
            DynamicImage::ImageLuma8(grey) => Bitmap::try_from(grey),
            _ => Err(DisplayError::NotOneBit),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use image::Luma;

    #[test]
    fn test_get_set() {
        let mut bitmap = Bitmap::new(4, 3);

        bitmap.set(3, 2, true);
        assert!(bitmap.get(3, 2));
        assert!(!bitmap.get(2, 3));

        // Out of bounds is ignored
        bitmap.set(4, 0, true);
        assert!(!bitmap.get(4, 0));
    }

    #[test]
    fn test_from_grey_image() -> Result<(), DisplayError> {
        let image = GrayImage::from_fn(8, 8, |x, y| if x == y { Luma([255]) } else { Luma([0]) });
        let bitmap = Bitmap::try_from(&image)?;

        assert_eq!(bitmap.dimensions(), (8, 8));
        assert_eq!(bitmap, Bitmap::from_fn(8, 8, |x, y| x == y));

        Ok(())
    }

    #[test]
    fn test_rejects_grey_levels() {
        let image = GrayImage::from_pixel(4, 4, Luma([128]));
        assert!(matches!(Bitmap::try_from(&image), Err(DisplayError::NotOneBit)));

        let image = DynamicImage::new_rgb8(4, 4);
        assert!(matches!(Bitmap::try_from(&image), Err(DisplayError::NotOneBit)));
    }
}
