use resvg::tiny_skia::{self, Pixmap};
use resvg::usvg::{Options, Tree};

use quick_error::quick_error;

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        /// The SVG did not parse.
        Svg(err: resvg::usvg::Error) {
            from()
            display("invalid SVG: {}", err)
        }
        /// The requested raster has no area or is too large.
        Canvas(width: u32, height: u32) {
            display("cannot allocate a {}x{} canvas", width, height)
        }
    }
}

pub fn render_svg(
    svg_data: &str,
    canvas_px_width: u32,
    canvas_px_height: u32,
) -> Result<::image::DynamicImage, Error> {
    // Code images carry no text, the font database stays empty.
    let rtree = Tree::from_str(svg_data, &Options::default())?;
    render_svg_tree(&rtree, canvas_px_width, canvas_px_height)
}

/// Rasterize onto an opaque white canvas of exactly the requested size.
///
/// The drawing is scaled uniformly to fit and centered on the axis it does not fill.
pub fn render_svg_tree(
    rtree: &Tree,
    canvas_px_width: u32,
    canvas_px_height: u32,
) -> Result<::image::DynamicImage, Error> {
    let rtree_size = rtree.size();

    let mut pixmap = Pixmap::new(canvas_px_width, canvas_px_height)
        .ok_or(Error::Canvas(canvas_px_width, canvas_px_height))?;
    pixmap.fill(tiny_skia::Color::from_rgba8(255, 255, 255, 255));

    let scale = (canvas_px_width as f32 / rtree_size.width())
        .min(canvas_px_height as f32 / rtree_size.height());

    let image_px_width = rtree_size.width() * scale;
    let image_px_height = rtree_size.height() * scale;

    let offset_x = (canvas_px_width as f32 - image_px_width) / 2.0;
    let offset_y = (canvas_px_height as f32 - image_px_height) / 2.0;

    if offset_x < 0.0 {
        log::warn!("SVG Rendering Offset X non-positive: {offset_x:?}");
    }

    if offset_y < 0.0 {
        log::warn!("SVG Rendering Offset Y non-positive: {offset_y:?}");
    }

    resvg::render(
        rtree,
        tiny_skia::Transform::from_scale(scale, scale)
            .post_translate(offset_x, offset_y),
        &mut pixmap.as_mut(),
    );

    // The canvas is fully opaque, so premultiplied and straight alpha agree.
    let image = image::RgbaImage::from_raw(
        canvas_px_width,
        canvas_px_height,
        pixmap.take(),
    )
    .ok_or(Error::Canvas(canvas_px_width, canvas_px_height))?;

    Ok(image::DynamicImage::ImageRgba8(image))
}

#[test]
fn renders_to_the_requested_size() {
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
        <rect x="0" y="0" width="5" height="10" fill="#000"/>
    </svg>"##;

    let image = render_svg(svg, 40, 40).unwrap().into_rgba8();
    assert_eq!(image.dimensions(), (40, 40));
    assert_eq!(image.get_pixel(5, 20).0, [0, 0, 0, 255]);
    assert_eq!(image.get_pixel(35, 20).0, [255, 255, 255, 255]);
}

#[test]
fn rejects_garbage() {
    assert!(matches!(
        render_svg("not an svg", 10, 10),
        Err(Error::Svg(_))
    ));
    assert!(matches!(
        render_svg(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="1"><rect width="1" height="1"/></svg>"#,
            0,
            10
        ),
        Err(Error::Canvas(0, 10))
    ));
}
