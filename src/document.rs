//! Paginated output documents.
use std::collections::BTreeSet;
use std::io::Write as _;
use std::path::Path;

use flate2::{write::ZlibEncoder, Compression};
use image::DynamicImage;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, TextStr};

use crate::Error;

/// Points per millimetre.
pub const MM_TO_PT: f32 = 72.0 / 25.4;

/// An image registered with a [`DocumentWriter`], placeable any number of times.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ImageId(pub usize);

/// A rectangle on the page, in millimetres from the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MmRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

pub trait DocumentWriter {
    fn add_image(&mut self, image: &DynamicImage) -> Result<ImageId, Error>;

    /// Start a new page; later placements go onto it.
    fn begin_page(&mut self, width_mm: f32, height_mm: f32) -> Result<(), Error>;

    fn place_image(&mut self, image: ImageId, rect: MmRect) -> Result<(), Error>;

    fn finish(self, path: &Path) -> Result<(), Error>
    where
        Self: Sized;
}

struct PendingPage {
    width_pt: f32,
    height_pt: f32,
    content: Content,
    images: BTreeSet<usize>,
}

/// Writes a PDF with every image embedded once as a deflated RGB XObject.
pub struct PdfDocumentWriter {
    pdf: Pdf,
    next_ref: i32,
    catalog: Ref,
    page_tree: Ref,
    images: Vec<Ref>,
    pages: Vec<PendingPage>,
}

impl Default for PdfDocumentWriter {
    fn default() -> Self {
        Self::new("Labels")
    }
}

impl PdfDocumentWriter {
    pub fn new(title: &str) -> Self {
        let mut writer = PdfDocumentWriter {
            pdf: Pdf::new(),
            next_ref: 1,
            catalog: Ref::new(1),
            page_tree: Ref::new(1),
            images: vec![],
            pages: vec![],
        };

        writer.catalog = writer.alloc();
        writer.page_tree = writer.alloc();

        let info = writer.alloc();
        writer
            .pdf
            .document_info(info)
            .title(TextStr(title))
            .producer(TextStr(concat!("labelsheet ", env!("CARGO_PKG_VERSION"))));

        writer
    }

    fn alloc(&mut self) -> Ref {
        let id = Ref::new(self.next_ref);
        self.next_ref += 1;
        id
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn image_name(index: usize) -> String {
        format!("Im{index}")
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|err| Error::io("compressing PDF stream", err))?;
    encoder
        .finish()
        .map_err(|err| Error::io("compressing PDF stream", err))
}

impl DocumentWriter for PdfDocumentWriter {
    fn add_image(&mut self, image: &DynamicImage) -> Result<ImageId, Error> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let compressed = deflate(rgb.as_raw())?;

        let id = self.alloc();
        let mut xobj = self.pdf.image_xobject(id, &compressed);
        xobj.filter(Filter::FlateDecode);
        xobj.width(width as i32);
        xobj.height(height as i32);
        xobj.color_space().device_rgb();
        xobj.bits_per_component(8);
        xobj.finish();

        self.images.push(id);
        Ok(ImageId(self.images.len() - 1))
    }

    fn begin_page(&mut self, width_mm: f32, height_mm: f32) -> Result<(), Error> {
        if !(width_mm > 0.0 && height_mm > 0.0) {
            return Err(Error::invalid(format!(
                "page of {width_mm}x{height_mm} mm"
            )));
        }

        self.pages.push(PendingPage {
            width_pt: width_mm * MM_TO_PT,
            height_pt: height_mm * MM_TO_PT,
            content: Content::new(),
            images: BTreeSet::new(),
        });

        Ok(())
    }

    fn place_image(&mut self, image: ImageId, rect: MmRect) -> Result<(), Error> {
        if image.0 >= self.images.len() {
            return Err(Error::invalid(format!("unknown image {}", image.0)));
        }

        let Some(page) = self.pages.last_mut() else {
            return Err(Error::invalid("image placed before the first page"));
        };

        // PDF user space starts at the bottom-left corner.
        let w = rect.w * MM_TO_PT;
        let h = rect.h * MM_TO_PT;
        let x = rect.x * MM_TO_PT;
        let y = page.height_pt - rect.y * MM_TO_PT - h;

        let name = Self::image_name(image.0);
        page.content.save_state();
        page.content.transform([w, 0.0, 0.0, h, x, y]);
        page.content.x_object(Name(name.as_bytes()));
        page.content.restore_state();
        page.images.insert(image.0);

        Ok(())
    }

    fn finish(mut self, path: &Path) -> Result<(), Error> {
        let pages = std::mem::take(&mut self.pages);
        let mut page_ids = Vec::with_capacity(pages.len());

        for page in pages {
            let page_id = self.alloc();
            let content_id = self.alloc();
            page_ids.push(page_id);

            let raw = page.content.finish().to_vec();
            self.pdf
                .stream(content_id, &deflate(&raw)?)
                .filter(Filter::FlateDecode);

            let names: Vec<(String, Ref)> = page
                .images
                .iter()
                .map(|&index| (Self::image_name(index), self.images[index]))
                .collect();

            let mut pdf_page = self.pdf.page(page_id);
            pdf_page
                .media_box(Rect::new(0.0, 0.0, page.width_pt, page.height_pt))
                .parent(self.page_tree)
                .contents(content_id);

            {
                let mut resources = pdf_page.resources();
                let mut xobjects = resources.x_objects();
                for (name, id) in &names {
                    xobjects.pair(Name(name.as_bytes()), *id);
                }
            }

            pdf_page.finish();
        }

        self.pdf.catalog(self.catalog).pages(self.page_tree);
        self.pdf
            .pages(self.page_tree)
            .kids(page_ids.iter().copied())
            .count(page_ids.len() as i32);

        std::fs::write(path, self.pdf.finish())
            .map_err(|err| Error::io(format!("writing {}", path.display()), err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn square() -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_pixel(8, 8, image::Rgb([0, 0, 0])))
    }

    #[test]
    fn writes_a_pdf_with_all_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");

        let mut writer = PdfDocumentWriter::default();
        let image = writer.add_image(&square()).unwrap();

        for _ in 0..3 {
            writer.begin_page(210.0, 297.0).unwrap();
            let rect = MmRect {
                x: 5.0,
                y: 5.0,
                w: 40.0,
                h: 40.0,
            };
            writer.place_image(image, rect).unwrap();
        }

        assert_eq!(writer.page_count(), 3);
        DocumentWriter::finish(writer, &path).unwrap();

        let data = std::fs::read(&path).unwrap();
        assert!(data.starts_with(b"%PDF-"));

        let text = String::from_utf8_lossy(&data);
        assert!(text.contains("/Count 3"));
        assert!(text.contains("/Im0"));
    }

    #[test]
    fn placing_needs_a_page_and_a_known_image() {
        let mut writer = PdfDocumentWriter::default();
        let image = writer.add_image(&square()).unwrap();
        let rect = MmRect {
            x: 0.0,
            y: 0.0,
            w: 1.0,
            h: 1.0,
        };

        let err = writer.place_image(image, rect).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        writer.begin_page(210.0, 297.0).unwrap();
        let err = writer.place_image(ImageId(7), rect).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn unwritable_path_is_io() {
        let writer = PdfDocumentWriter::default();
        let err = DocumentWriter::finish(writer, Path::new("/nonexistent/dir/out.pdf")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
