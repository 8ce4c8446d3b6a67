use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::{debug, info, warn};

use crate::canvas::{Canvas, LabelFont, RasterCanvas};
use crate::code::CodeImageGenerator;
use crate::config::LabelConfig;
use crate::Error;

pub const IMAGE_EXTENSION: &str = "png";

/// Pixel geometry of one label block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BlockGeometry {
    pub block_px: u32,
    pub code_px: u32,
    pub border_px: u32,
}

impl BlockGeometry {
    pub fn from_config(config: &LabelConfig) -> Self {
        BlockGeometry {
            block_px: config.block_px(),
            code_px: config.code_px(),
            border_px: config.border_px,
        }
    }
}

/// Rendered label images in generation order.
#[derive(Clone, Debug, Default)]
pub struct LabelSet {
    entries: Vec<(String, PathBuf)>,
}

impl LabelSet {
    pub fn push(&mut self, id: String, path: PathBuf) {
        self.entries.push((id, path));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(id, path)| (id.as_str(), path.as_path()))
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|(id, _)| id.clone()).collect()
    }
}

/// Where the image for `id` lives in `out_dir`.
pub fn label_path(out_dir: &Path, id: &str) -> PathBuf {
    out_dir.join(format!("{id}.{IMAGE_EXTENSION}"))
}

/// Lay out one block: code top-centered, identifier centered in the band below.
pub fn compose_label(
    canvas: &mut impl Canvas,
    code: &DynamicImage,
    id: &str,
    geometry: &BlockGeometry,
) {
    let width = canvas.width();
    let code_x = width.saturating_sub(code.width()) / 2;
    canvas.paste(code, code_x, 0);

    let text_width = canvas.text_width(id);
    if text_width > width {
        warn!("Identifier {id} is {text_width}px wide, wider than the {width}px block");
    }

    let text_x = (width as i32 - text_width as i32) / 2;
    canvas.draw_text(id, text_x, geometry.code_px as i32);

    if geometry.border_px > 0 {
        canvas.draw_border(geometry.border_px);
    }
}

pub struct LabelRenderer<'c, G> {
    config: &'c LabelConfig,
    generator: G,
    font: LabelFont,
    geometry: BlockGeometry,
}

impl<'c, G: CodeImageGenerator> LabelRenderer<'c, G> {
    pub fn new(config: &'c LabelConfig, generator: G) -> Result<Self, Error> {
        let font = LabelFont::load(&config.font_path, config.font_size)?;
        Ok(Self::with_font(config, generator, font))
    }

    pub fn with_font(config: &'c LabelConfig, generator: G, font: LabelFont) -> Self {
        LabelRenderer {
            config,
            generator,
            font,
            geometry: BlockGeometry::from_config(config),
        }
    }

    /// The string the code for `id` encodes.
    pub fn scan_target(&self, id: &str) -> String {
        format!("{}{}", self.config.base_url, id)
    }

    pub fn render_block(&self, id: &str) -> Result<RasterCanvas<'_>, Error> {
        let code = self
            .generator
            .generate(&self.scan_target(id), self.geometry.code_px)
            .map_err(|err| Error::Encoding(id.to_string(), err.to_string()))?;

        let mut canvas = RasterCanvas::new(self.geometry.block_px, &self.font);
        compose_label(&mut canvas, &code, id, &self.geometry);

        Ok(canvas)
    }

    /// Render `id` and write it into the output directory, returning the file written.
    pub fn render(&self, id: &str) -> Result<PathBuf, Error> {
        let canvas = self.render_block(id)?;
        let path = label_path(&self.config.out_dir, id);

        canvas.save(&path).map_err(|err| match err {
            image::ImageError::IoError(err) => {
                Error::io(format!("writing label {}", path.display()), err)
            }
            other => Error::Encoding(id.to_string(), other.to_string()),
        })?;

        debug!("Rendered {id} to {}", path.display());
        Ok(path)
    }

    /// Render every identifier in order; the first failure aborts the batch.
    pub fn render_all(&self, ids: &[String]) -> Result<LabelSet, Error> {
        let out_dir = &self.config.out_dir;
        std::fs::create_dir_all(out_dir).map_err(|err| {
            Error::io(format!("creating {}", out_dir.display()), err)
        })?;

        let mut labels = LabelSet::default();
        for id in ids {
            let path = self.render(id)?;
            labels.push(id.clone(), path);
        }

        info!("Rendered {} labels into {}", labels.len(), out_dir.display());
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        width: u32,
        pasted: Vec<(u32, u32, u32)>,
        text: Vec<(String, i32, i32)>,
        border: Option<u32>,
    }

    impl Default for Recorder {
        fn default() -> Self {
            Recorder {
                width: 480,
                pasted: vec![],
                text: vec![],
                border: None,
            }
        }
    }

    impl Canvas for Recorder {
        fn width(&self) -> u32 {
            self.width
        }

        fn paste(&mut self, image: &DynamicImage, x: u32, y: u32) {
            self.pasted.push((image.width(), x, y));
        }

        fn text_width(&self, text: &str) -> u32 {
            10 * text.len() as u32
        }

        fn draw_text(&mut self, text: &str, x: i32, y: i32) {
            self.text.push((text.to_string(), x, y));
        }

        fn draw_border(&mut self, thickness: u32) {
            self.border = Some(thickness);
        }
    }

    const GEOMETRY: BlockGeometry = BlockGeometry {
        block_px: 480,
        code_px: 360,
        border_px: 0,
    };

    #[test]
    fn code_on_top_text_centered_below() {
        let mut canvas = Recorder::default();
        let code = DynamicImage::new_luma8(360, 360);

        compose_label(&mut canvas, &code, "b000001", &GEOMETRY);

        assert_eq!(canvas.pasted, vec![(360, 60, 0)]);
        assert_eq!(canvas.text, vec![("b000001".to_string(), 205, 360)]);
        assert_eq!(canvas.border, None);
    }

    #[test]
    fn overlong_text_is_still_centered() {
        let mut canvas = Recorder::default();
        let code = DynamicImage::new_luma8(360, 360);
        let id = "x".repeat(60);

        compose_label(&mut canvas, &code, &id, &GEOMETRY);

        assert_eq!(canvas.text[0].1, -60);
    }

    #[test]
    fn centering_follows_the_canvas_width() {
        let mut canvas = Recorder {
            width: 600,
            ..Default::default()
        };
        let code = DynamicImage::new_luma8(360, 360);

        compose_label(&mut canvas, &code, "b000001", &GEOMETRY);

        assert_eq!(canvas.pasted, vec![(360, 120, 0)]);
        assert_eq!(canvas.text, vec![("b000001".to_string(), 265, 360)]);
    }

    #[test]
    fn border_only_when_asked() {
        let mut canvas = Recorder::default();
        let code = DynamicImage::new_luma8(360, 360);
        let geometry = BlockGeometry {
            border_px: 3,
            ..GEOMETRY
        };

        compose_label(&mut canvas, &code, "b000001", &geometry);

        assert_eq!(canvas.border, Some(3));
    }

    #[test]
    fn label_files_are_named_after_the_identifier() {
        assert_eq!(
            label_path(Path::new("qr_labels"), "b000007"),
            Path::new("qr_labels/b000007.png")
        );
    }

    #[test]
    fn label_set_keeps_order() {
        let mut labels = LabelSet::default();
        labels.push("b000002".into(), "b.png".into());
        labels.push("b000001".into(), "a.png".into());

        assert_eq!(labels.len(), 2);
        assert_eq!(labels.ids(), vec!["b000002", "b000001"]);

        let paths: Vec<_> = labels.iter().map(|(_, path)| path).collect();
        assert_eq!(paths, vec![Path::new("b.png"), Path::new("a.png")]);
    }
}
