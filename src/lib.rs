use std::path::PathBuf;

use clap::Parser;
use log::info;

pub mod canvas;
pub mod code;
pub mod compose;
pub mod config;
pub mod document;
mod error;
pub mod ids;
pub mod label;
pub mod layout;
pub mod util;

pub use config::LabelConfig;
pub use error::{Error, ErrorKind};
pub use layout::PlacementMode;

use code::QrCodeGenerator;
use compose::PageComposer;
use document::PdfDocumentWriter;
use label::LabelRenderer;

/// Render QR code labels and lay them out on printable pages.
///
/// Flags override values from `--config`, which override the built-in defaults.
#[derive(Parser, Clone, Debug, Default)]
pub struct Args {
    #[arg(long = "config", env = "LABELSHEET_CONFIG", help = "JSON configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long = "base-url", env = "LABELSHEET_BASE_URL", help = "URL the identifier is appended to")]
    pub base_url: Option<String>,

    #[arg(long = "count", help = "number of labels")]
    pub count: Option<u64>,

    #[arg(long = "start", help = "index of the first identifier")]
    pub start: Option<u64>,

    #[arg(long = "prefix", help = "identifier prefix")]
    pub prefix: Option<String>,

    #[arg(long = "digits", help = "zero-padded digits per identifier")]
    pub digits: Option<usize>,

    #[arg(long = "font", env = "LABELSHEET_FONT", help = "TrueType/OpenType font for the identifier")]
    pub font: Option<PathBuf>,

    #[arg(long = "font-size", help = "identifier text size in px")]
    pub font_size: Option<f32>,

    #[arg(long = "rows", help = "rows per page")]
    pub rows: Option<u32>,

    #[arg(long = "cols", help = "columns per page")]
    pub cols: Option<u32>,

    #[arg(long = "margin", help = "page margin in mm")]
    pub margin: Option<f32>,

    #[arg(long = "page-width", help = "page width in mm")]
    pub page_width: Option<f32>,

    #[arg(long = "page-height", help = "page height in mm")]
    pub page_height: Option<f32>,

    #[arg(long = "border", help = "cut guide width in px, 0 for none")]
    pub border: Option<u32>,

    #[arg(long = "out-dir", help = "directory for the label images")]
    pub out_dir: Option<PathBuf>,

    #[arg(long = "output", short = 'o', help = "PDF to write")]
    pub output: Option<PathBuf>,

    #[arg(long = "placement", value_enum)]
    pub placement: Option<PlacementMode>,
}

impl Args {
    pub fn into_config(self) -> Result<LabelConfig, Error> {
        let Args {
            config: config_file,
            base_url,
            count,
            start,
            prefix,
            digits,
            font,
            font_size,
            rows,
            cols,
            margin,
            page_width,
            page_height,
            border,
            out_dir,
            output,
            placement,
        } = self;

        let mut config = match config_file {
            Some(path) => LabelConfig::from_file(&path)?,
            None => LabelConfig::default(),
        };

        macro_rules! set {
            ($($arg:ident => $($field:ident).+),* $(,)?) => {
                $(if let Some(value) = $arg {
                    config.$($field).+ = value;
                })*
            };
        }

        set! {
            base_url => base_url,
            count => id_count,
            start => start_index,
            prefix => id_format.prefix,
            digits => id_format.width,
            font => font_path,
            font_size => font_size,
            rows => rows_per_page,
            cols => cols_per_page,
            margin => margin_mm,
            page_width => page_w_mm,
            page_height => page_h_mm,
            border => border_px,
            out_dir => out_dir,
            output => out_path,
            placement => placement,
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Clone, Debug)]
pub struct Summary {
    pub out_path: PathBuf,
    pub ids: usize,
    pub placed: usize,
    pub pages: usize,
    pub placement: PlacementMode,
}

impl core::fmt::Display for Summary {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Done. PDF saved: {} with {} QR codes on {} pages.",
            self.out_path.display(),
            self.placed,
            self.pages
        )
    }
}

/// Generate identifiers, render their labels and compose the PDF.
pub fn run(config: &LabelConfig) -> Result<Summary, Error> {
    config.validate()?;

    let ids = config
        .id_format
        .generate_from(config.start_index, config.id_count)?;
    info!(
        "Generated {} identifiers, {} to {}",
        ids.len(),
        ids[0],
        ids[ids.len() - 1]
    );

    let generator = QrCodeGenerator::with_colors(&config.dark_color, &config.light_color);
    let renderer = LabelRenderer::new(config, generator)?;
    let labels = renderer.render_all(&ids)?;

    let composer = PageComposer::new(config.grid(), config.placement, PdfDocumentWriter::default());
    let report = composer.compose(&labels, &config.out_path)?;

    Ok(Summary {
        out_path: config.out_path.clone(),
        ids: ids.len(),
        placed: report.placed,
        pages: report.pages,
        placement: config.placement,
    })
}

#[test]
fn flags_override_defaults() {
    let args = Args::parse_from([
        "labelsheet",
        "--count",
        "3",
        "--placement",
        "replicate-row",
        "--output",
        "boxes.pdf",
    ]);

    let config = args.into_config().unwrap();
    assert_eq!(config.id_count, 3);
    assert_eq!(config.placement, PlacementMode::ReplicateRow);
    assert_eq!(config.out_path, PathBuf::from("boxes.pdf"));
    assert_eq!(config.base_url, config::BASE_URL);
}

#[test]
fn invalid_flags_are_rejected() {
    let args = Args::parse_from(["labelsheet", "--count", "0"]);
    assert_eq!(args.into_config().unwrap_err().kind(), ErrorKind::InvalidArgument);

    let args = Args::parse_from(["labelsheet", "--rows", "8"]);
    assert_eq!(args.into_config().unwrap_err().kind(), ErrorKind::InvalidArgument);
}

#[test]
fn summary_names_path_and_count() {
    let summary = Summary {
        out_path: "QR_Labels.pdf".into(),
        ids: 49,
        placed: 245,
        pages: 7,
        placement: PlacementMode::ReplicateRow,
    };

    assert_eq!(
        summary.to_string(),
        "Done. PDF saved: QR_Labels.pdf with 245 QR codes on 7 pages."
    );
}
