//! Scannable code images.
use image::DynamicImage;
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};

use quick_error::quick_error;

use crate::util;

quick_error! {
    #[derive(Debug)]
    pub enum CodeError {
        Qr(err: qrcode::types::QrError) {
            from()
            display("QR encoding failed: {}", err)
        }
        Raster(err: util::svg::Error) {
            from()
            display("{}", err)
        }
    }
}

/// Turns a string into a square bitmap a scanner can read back.
pub trait CodeImageGenerator {
    /// Render `data` into an image of exactly `size_px` by `size_px` pixels.
    fn generate(&self, data: &str, size_px: u32) -> Result<DynamicImage, CodeError>;
}

/// QR codes, drawn as SVG and rasterized at the target size.
#[derive(Clone, Debug)]
pub struct QrCodeGenerator {
    pub ec_level: EcLevel,
    pub dark_color: String,
    pub light_color: String,
    /// Whether to keep the four-module blank border scanners expect around the code.
    pub quiet_zone: bool,
}

impl Default for QrCodeGenerator {
    fn default() -> Self {
        QrCodeGenerator {
            ec_level: EcLevel::M,
            dark_color: "#000000".to_string(),
            light_color: "#ffffff".to_string(),
            quiet_zone: true,
        }
    }
}

impl QrCodeGenerator {
    pub fn with_colors(dark: &str, light: &str) -> Self {
        QrCodeGenerator {
            dark_color: dark.to_string(),
            light_color: light.to_string(),
            ..Default::default()
        }
    }

    pub fn to_svg(&self, data: &str) -> Result<String, CodeError> {
        let qr = QrCode::with_error_correction_level(data.as_bytes(), self.ec_level)?;

        Ok(qr
            .render()
            .quiet_zone(self.quiet_zone)
            .dark_color(svg::Color(&self.dark_color))
            .light_color(svg::Color(&self.light_color))
            .build())
    }
}

impl CodeImageGenerator for QrCodeGenerator {
    fn generate(&self, data: &str, size_px: u32) -> Result<DynamicImage, CodeError> {
        let svg = self.to_svg(data)?;
        Ok(util::svg::render_svg(&svg, size_px, size_px)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_has_exact_size() {
        let generator = QrCodeGenerator::default();

        for size in [100, 360, 361] {
            let image = generator
                .generate("https://moving-boxes-ten.vercel.app/b000001", size)
                .unwrap();
            assert_eq!((image.width(), image.height()), (size, size));
        }
    }

    #[test]
    fn quiet_zone_is_blank_and_modules_are_dark() {
        let image = QrCodeGenerator::default()
            .generate("https://example.org/b000042", 360)
            .unwrap()
            .into_luma8();

        assert_eq!(image.get_pixel(1, 1).0, [255]);
        assert_eq!(image.get_pixel(358, 358).0, [255]);
        assert!(image.pixels().any(|p| p.0[0] < 128));
    }

    #[test]
    fn decodes_to_the_scan_target() {
        let target = "https://moving-boxes-ten.vercel.app/b000042";
        let image = QrCodeGenerator::default()
            .generate(target, 360)
            .unwrap()
            .into_luma8();

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            image.width() as usize,
            image.height() as usize,
            |x, y| image.get_pixel(x as u32, y as u32).0[0],
        );
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1);

        let (_, content) = grids[0].decode().unwrap();
        assert_eq!(content, target);
    }

    #[test]
    fn svg_uses_configured_colors() {
        let svg = QrCodeGenerator::with_colors("#112233", "#fefefe")
            .to_svg("b000001")
            .unwrap();

        assert!(svg.contains("#112233"));
        assert!(svg.contains("#fefefe"));
    }

    #[test]
    fn oversized_payload_is_an_error() {
        let data = "x".repeat(8000);
        assert!(matches!(
            QrCodeGenerator::default().generate(&data, 100),
            Err(CodeError::Qr(_))
        ));
    }
}
