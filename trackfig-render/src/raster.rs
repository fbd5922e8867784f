//! PNG output: the SVG document is rasterized with resvg and written with
//! the `image` crate.

use image::{ImageFormat, RgbaImage};
use resvg::{tiny_skia, usvg};
use std::path::Path;

use crate::error::{RenderError, RenderResult};

/// Rasterize `svg` to exactly `width_px` x `height_px` pixels on a white
/// background. System fonts are loaded for text.
pub fn render_png(svg: &str, width_px: u32, height_px: u32) -> RenderResult<RgbaImage> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &options).map_err(|e| RenderError::Raster(e.to_string()))?;
    let width_px = width_px.max(1);
    let height_px = height_px.max(1);
    let mut pixmap = tiny_skia::Pixmap::new(width_px, height_px)
        .ok_or_else(|| RenderError::Raster(format!("cannot allocate {}x{} canvas", width_px, height_px)))?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        width_px as f32 / size.width(),
        height_px as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    // Opaque background, so premultiplied and straight alpha coincide.
    RgbaImage::from_raw(width_px, height_px, pixmap.take())
        .ok_or_else(|| RenderError::Raster("pixel buffer size mismatch".to_string()))
}

pub fn write_png(svg: &str, width_px: u32, height_px: u32, path: &Path) -> RenderResult<()> {
    let image = render_png(svg, width_px, height_px)?;
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| RenderError::Raster(format!("{}: {}", path.display(), e)))?;
    log::debug!("Wrote {}x{} PNG to {}", width_px, height_px, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::BLACK;
    use crate::scene::{Rect, Scene, Style};
    use crate::svg;

    #[test]
    fn test_png_dimensions_and_pixels() {
        let mut scene = Scene::new(2.54, 1.27, 100.0);
        scene.rect(Rect::new(0.0, 0.0, 50.0, 50.0), Style::fill(BLACK));
        let doc = svg::write(&mut scene);

        let image = render_png(&doc, 100, 50).unwrap();
        assert_eq!(image.dimensions(), (100, 50));
        assert_eq!(image.get_pixel(10, 10).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(90, 10).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_invalid_svg() {
        assert!(matches!(render_png("not svg", 10, 10), Err(RenderError::Raster(_))));
    }
}
