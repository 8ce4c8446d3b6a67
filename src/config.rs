use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ids::IdFormat;
use crate::layout::{Grid, PlacementMode};
use crate::Error;

pub const BASE_URL: &str = "https://moving-boxes-ten.vercel.app/";
pub const NUM_IDS: u64 = 49;

// Sizes in mm. A block is the code plus the identifier band below it.
pub const BLOCK_MM: u32 = 40;
pub const CODE_MM: u32 = 30;
pub const LABEL_MM: u32 = 10;
/// 300 dpi is roughly 11.8 dots per mm, rounded up.
pub const MM_TO_PX: u32 = 12;

pub const FONT_SIZE: f32 = 24.0;
/// Largest block edge in pixels a run may ask for.
pub const MAX_BLOCK_PX: u32 = 8192;
pub const FONT_PATH: &str = "/usr/share/fonts/gsfonts/NimbusSans-Regular.otf";

pub const COLS_PER_PAGE: u32 = 5;
pub const ROWS_PER_PAGE: u32 = 7;
pub const MARGIN_MM: u32 = 5;

// A4, portrait.
pub const PAGE_WIDTH_MM: u32 = 210;
pub const PAGE_HEIGHT_MM: u32 = 297;

pub const OUTPUT_FOLDER: &str = "qr_labels";
pub const PDF_OUTPUT: &str = "QR_Labels.pdf";

const _: () = assert!(CODE_MM + LABEL_MM == BLOCK_MM);
const _: () = assert!(MARGIN_MM + COLS_PER_PAGE * BLOCK_MM <= PAGE_WIDTH_MM);
const _: () = assert!(MARGIN_MM + ROWS_PER_PAGE * BLOCK_MM <= PAGE_HEIGHT_MM);

/// Everything a run needs, fixed before the first label is rendered.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LabelConfig {
    pub base_url: String,
    pub id_count: u64,
    pub id_format: IdFormat,
    /// Index of the first identifier, for continuing an earlier batch.
    pub start_index: u64,
    pub block_size_mm: f32,
    pub code_size_mm: f32,
    pub label_size_mm: f32,
    pub mm_to_px: f32,
    pub font_size: f32,
    pub font_path: PathBuf,
    /// Width of a cut guide drawn along the label edge, zero for none.
    pub border_px: u32,
    pub dark_color: String,
    pub light_color: String,
    pub rows_per_page: u32,
    pub cols_per_page: u32,
    pub margin_mm: f32,
    pub page_w_mm: f32,
    pub page_h_mm: f32,
    pub out_dir: PathBuf,
    pub out_path: PathBuf,
    pub placement: PlacementMode,
}

impl Default for LabelConfig {
    fn default() -> Self {
        LabelConfig {
            base_url: BASE_URL.to_string(),
            id_count: NUM_IDS,
            id_format: IdFormat::default(),
            start_index: 1,
            block_size_mm: BLOCK_MM as f32,
            code_size_mm: CODE_MM as f32,
            label_size_mm: LABEL_MM as f32,
            mm_to_px: MM_TO_PX as f32,
            font_size: FONT_SIZE,
            font_path: FONT_PATH.into(),
            border_px: 0,
            dark_color: "#000000".to_string(),
            light_color: "#ffffff".to_string(),
            rows_per_page: ROWS_PER_PAGE,
            cols_per_page: COLS_PER_PAGE,
            margin_mm: MARGIN_MM as f32,
            page_w_mm: PAGE_WIDTH_MM as f32,
            page_h_mm: PAGE_HEIGHT_MM as f32,
            out_dir: OUTPUT_FOLDER.into(),
            out_path: PDF_OUTPUT.into(),
            placement: PlacementMode::default(),
        }
    }
}

impl LabelConfig {
    /// Read a (possibly partial) configuration, missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let data = std::fs::read(path)
            .map_err(|err| Error::io(format!("reading {}", path.display()), err))?;

        serde_json::from_slice(&data).map_err(|err| {
            Error::invalid(format!("configuration {}: {err}", path.display()))
        })
    }

    pub fn block_px(&self) -> u32 {
        mm_to_px(self.block_size_mm, self.mm_to_px)
    }

    pub fn code_px(&self) -> u32 {
        mm_to_px(self.code_size_mm, self.mm_to_px)
    }

    pub fn grid(&self) -> Grid {
        Grid {
            rows: self.rows_per_page,
            cols: self.cols_per_page,
            cell_mm: self.block_size_mm,
            margin_mm: self.margin_mm,
            page_w_mm: self.page_w_mm,
            page_h_mm: self.page_h_mm,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.id_count == 0 {
            return Err(Error::invalid("identifier count must be positive"));
        }

        if self.start_index == 0 {
            return Err(Error::invalid("identifier indices start at 1"));
        }

        for (name, value) in [
            ("block size", self.block_size_mm),
            ("code size", self.code_size_mm),
            ("mm to px factor", self.mm_to_px),
            ("font size", self.font_size),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::invalid(format!("{name} must be positive, got {value}")));
            }
        }

        let block_px = self.block_size_mm * self.mm_to_px;
        if block_px > MAX_BLOCK_PX as f32 {
            return Err(Error::invalid(format!(
                "a {} mm block at {} px/mm is {block_px} px wide, the limit is {MAX_BLOCK_PX} px",
                self.block_size_mm, self.mm_to_px
            )));
        }

        if self.code_size_mm > self.block_size_mm {
            return Err(Error::invalid(format!(
                "code ({} mm) does not fit into the block ({} mm)",
                self.code_size_mm, self.block_size_mm
            )));
        }

        let band = self.block_size_mm - self.code_size_mm;
        if (self.label_size_mm - band).abs() > 1e-3 {
            return Err(Error::invalid(format!(
                "label band is {} mm but block minus code leaves {band} mm",
                self.label_size_mm
            )));
        }

        if self.border_px.saturating_mul(2) >= self.block_px() {
            return Err(Error::invalid(format!(
                "border of {} px leaves nothing of a {} px block",
                self.border_px,
                self.block_px()
            )));
        }

        self.grid().validate()
    }
}

pub fn mm_to_px(mm: f32, factor: f32) -> u32 {
    (mm * factor).round() as u32
}
