//! Raster surface a label block is composed on.
use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{imageops, DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::Error;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// The drawing operations needed to compose a label.
pub trait Canvas {
    fn width(&self) -> u32;

    /// Copy `image` onto the canvas with its top-left corner at `(x, y)`, replacing what is there.
    fn paste(&mut self, image: &DynamicImage, x: u32, y: u32);

    /// Horizontal extent of `text` in pixels, as [`Canvas::draw_text`] would draw it.
    fn text_width(&self, text: &str) -> u32;

    /// Draw `text` in black, `(x, y)` being the top-left of its layout box.
    fn draw_text(&mut self, text: &str, x: i32, y: i32);

    /// Outline the canvas edge with a black frame `thickness` pixels wide.
    fn draw_border(&mut self, thickness: u32);
}

/// A TrueType/OpenType font at a fixed pixel size.
pub struct LabelFont {
    font: FontVec,
    scale: PxScale,
}

impl LabelFont {
    pub fn load(path: &Path, size: f32) -> Result<Self, Error> {
        let data = std::fs::read(path).map_err(|err| {
            Error::ResourceUnavailable(path.to_path_buf(), err.to_string())
        })?;

        Self::from_bytes(path, data, size)
    }

    pub fn from_bytes(path: &Path, data: Vec<u8>, size: f32) -> Result<Self, Error> {
        let font = FontVec::try_from_vec(data).map_err(|err| {
            Error::ResourceUnavailable(path.to_path_buf(), err.to_string())
        })?;

        Ok(LabelFont {
            font,
            scale: PxScale::from(size),
        })
    }
}

/// An RGB image in memory, saved as PNG.
pub struct RasterCanvas<'f> {
    image: RgbImage,
    font: &'f LabelFont,
}

impl<'f> RasterCanvas<'f> {
    /// A square white canvas.
    pub fn new(size_px: u32, font: &'f LabelFont) -> Self {
        RasterCanvas {
            image: RgbImage::from_pixel(size_px, size_px, WHITE),
            font,
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), image::ImageError> {
        self.image.save_with_format(path, ImageFormat::Png)
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

impl Canvas for RasterCanvas<'_> {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn paste(&mut self, image: &DynamicImage, x: u32, y: u32) {
        imageops::replace(&mut self.image, &image.to_rgb8(), x.into(), y.into());
    }

    fn text_width(&self, text: &str) -> u32 {
        text_size(self.font.scale, &self.font.font, text).0
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32) {
        draw_text_mut(
            &mut self.image,
            BLACK,
            x,
            y,
            self.font.scale,
            &self.font.font,
            text,
        );
    }

    fn draw_border(&mut self, thickness: u32) {
        let (w, h) = self.image.dimensions();

        for inset in 0..thickness.min(w / 2).min(h / 2) {
            let rect = Rect::at(inset as i32, inset as i32)
                .of_size(w - 2 * inset, h - 2 * inset);
            draw_hollow_rect_mut(&mut self.image, rect, BLACK);
        }
    }
}
