use std::collections::HashMap;
use std::path::Path;

use itertools::Itertools;
use log::{debug, info, warn};

use crate::document::{DocumentWriter, ImageId, MmRect};
use crate::label::LabelSet;
use crate::layout::{Grid, PlacementMode};
use crate::Error;

/// What ended up in the document.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ComposeReport {
    pub pages: usize,
    pub placed: usize,
}

pub struct PageComposer<W> {
    grid: Grid,
    mode: PlacementMode,
    writer: W,
}

fn load_label(id: &str, path: &Path) -> Result<image::DynamicImage, Error> {
    image::open(path).map_err(|err| match err {
        image::ImageError::IoError(err) => {
            Error::io(format!("reading label {}", path.display()), err)
        }
        other => Error::Encoding(id.to_string(), other.to_string()),
    })
}

impl<W: DocumentWriter> PageComposer<W> {
    pub fn new(grid: Grid, mode: PlacementMode, writer: W) -> Self {
        PageComposer { grid, mode, writer }
    }

    /// Place every label on the grid and write the document to `out_path`.
    ///
    /// Each image file is read once, no matter how often it is placed.
    pub fn compose(mut self, labels: &LabelSet, out_path: &Path) -> Result<ComposeReport, Error> {
        self.grid.validate()?;

        if labels.is_empty() {
            return Err(Error::invalid("no labels to compose"));
        }

        if self.mode == PlacementMode::ReplicateRow {
            warn!(
                "Replicating every label across its row, {} copies per identifier",
                self.grid.cols
            );
        }

        let mut images: HashMap<&str, ImageId> = HashMap::with_capacity(labels.len());
        for (id, path) in labels.iter() {
            let image = load_label(id, path)?;
            images.insert(id, self.writer.add_image(&image)?);
        }

        let ids = labels.ids();
        let placements = self.grid.placements(&ids, self.mode);
        let mut report = ComposeReport {
            pages: 0,
            placed: 0,
        };

        for (page, on_page) in &placements.iter().chunk_by(|p| p.page) {
            self.writer
                .begin_page(self.grid.page_w_mm, self.grid.page_h_mm)?;
            report.pages += 1;

            for placement in on_page {
                let image = images[placement.id];
                let rect = MmRect {
                    x: placement.x_mm,
                    y: placement.y_mm,
                    w: placement.size_mm,
                    h: placement.size_mm,
                };

                self.writer.place_image(image, rect)?;
                report.placed += 1;
            }

            debug!("Laid out page {}", page + 1);
        }

        self.writer.finish(out_path)?;
        info!(
            "Wrote {} with {} pages and {} placed labels",
            out_path.display(),
            report.pages,
            report.placed
        );

        Ok(report)
    }
}
