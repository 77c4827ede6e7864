use anyhow::Result;
use bytes::Bytes;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use png::{BitDepth, ColorType, Encoder};
use std::convert::Infallible;

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 480;

const ROW_BYTES: usize = WIDTH as usize / 8;

/// 1-bit frame buffer. Rows are packed MSB first and a set bit is a white
/// pixel; `BinaryColor::On` is ink.
pub struct Canvas {
    frame: Vec<u8>,
}

impl Canvas {
    pub fn new() -> Self {
        Self {
            frame: vec![0xFF; ROW_BYTES * HEIGHT as usize],
        }
    }

    #[cfg(test)]
    pub fn pixel(&self, point: Point) -> Option<BinaryColor> {
        let (index, mask) = locate(point)?;
        Some(if self.frame[index] & mask == 0 {
            BinaryColor::On
        } else {
            BinaryColor::Off
        })
    }

    fn set_pixel(&mut self, point: Point, color: BinaryColor) {
        if let Some((index, mask)) = locate(point) {
            match color {
                BinaryColor::On => self.frame[index] &= !mask,
                BinaryColor::Off => self.frame[index] |= mask,
            }
        }
    }

    pub fn ink_count(&self) -> usize {
        self.frame.iter().map(|byte| byte.count_zeros() as usize).sum()
    }

    /// Packed frame as consumed by the panel driver.
    pub fn raw(&self) -> &[u8] {
        &self.frame
    }

    /// Encode the frame as a 1-bit grayscale PNG. The packed layout already
    /// matches PNG scanlines, white being 1.
    pub fn encode_png(&self) -> Result<Bytes> {
        let mut buffer = Vec::new();
        {
            let mut encoder = Encoder::new(&mut buffer, WIDTH, HEIGHT);
            encoder.set_color(ColorType::Grayscale);
            encoder.set_depth(BitDepth::One);

            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.frame)?;
        }

        Ok(Bytes::from(buffer))
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

fn locate(point: Point) -> Option<(usize, u8)> {
    if point.x < 0 || point.y < 0 || point.x >= WIDTH as i32 || point.y >= HEIGHT as i32 {
        return None;
    }
    let (x, y) = (point.x as usize, point.y as usize);
    Some((y * ROW_BYTES + x / 8, 0x80 >> (x % 8)))
}

impl DrawTarget for Canvas {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point, color);
        }
        Ok(())
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }
}
