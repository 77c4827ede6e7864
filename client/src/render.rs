use anyhow::{anyhow, Result};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use u8g2_fonts::types::FontColor;

use crate::canvas::Canvas;
use crate::fonts::FontSet;
use crate::layout::DrawOp;

/// Execute a draw plan against the canvas, in order.
pub fn rasterize(ops: &[DrawOp], fonts: &FontSet, canvas: &mut Canvas) -> Result<()> {
    for op in ops {
        match op {
            DrawOp::FillRect { area, color } => {
                area.into_styled(PrimitiveStyle::with_fill(*color)).draw(canvas)?;
            }
            DrawOp::Line { start, end, width } => {
                Line::new(*start, *end)
                    .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, *width))
                    .draw(canvas)?;
            }
            DrawOp::Text {
                origin,
                text,
                font,
                color,
            } => {
                let placement = fonts.placement(*font, *origin);
                let mut target = Scaled {
                    target: &mut *canvas,
                    anchor: placement.anchor,
                    factor: placement.scale,
                };
                fonts
                    .renderer(*font)
                    .render(
                        &*fonts.glyphs(*font, text),
                        placement.anchor,
                        placement.position,
                        FontColor::Transparent(*color),
                        &mut target,
                    )
                    .map_err(|err| anyhow!("Failed to draw {:?} with {:?}: {:?}", text, font, err))?;
            }
        }
    }
    Ok(())
}

/// Draws every pixel as a `factor`-sized square, growing away from `anchor`.
struct Scaled<'a, D> {
    target: &'a mut D,
    anchor: Point,
    factor: u32,
}

impl<D: DrawTarget> Dimensions for Scaled<'_, D> {
    fn bounding_box(&self) -> Rectangle {
        self.target.bounding_box()
    }
}

impl<D: DrawTarget> DrawTarget for Scaled<'_, D> {
    type Color = D::Color;
    type Error = D::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        if self.factor == 1 {
            return self.target.draw_iter(pixels);
        }
        let size = Size::new_equal(self.factor);
        for Pixel(point, color) in pixels {
            let top_left = self.anchor + (point - self.anchor) * self.factor as i32;
            self.target.fill_solid(&Rectangle::new(top_left, size), color)?;
        }
        Ok(())
    }
}
