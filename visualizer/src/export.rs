//! Rasterise rendered SVG surfaces to PNG.

use std::path::Path;

use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg::{Options, Tree};
use tracing::debug;

use crate::error::{RenderError, Result};

/// Render `svg` at its intrinsic size onto a white background and save it as
/// a PNG at `path`.
pub fn svg_to_png(svg: &str, path: &Path) -> Result<()> {
    let mut options = Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = Tree::from_data(svg.as_bytes(), &options)
        .map_err(|e| RenderError::Export(format!("SVG parse failed: {e}")))?;

    let size = tree.size().to_int_size();
    let (width, height) = (size.width(), size.height());
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| RenderError::Export(format!("cannot allocate {width}x{height} pixmap")))?;
    pixmap.fill(Color::WHITE);
    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

    debug!("Rasterised {width}x{height} image to {}", path.display());
    pixmap
        .save_png(path)
        .map_err(|e| RenderError::Export(format!("failed to write {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Layout;
    use crate::render::Surface;

    #[test]
    fn writes_png_with_surface_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legend.png");
        let surface = Surface::for_legend("legend", &Layout::default());

        svg_to_png(&surface.to_svg_string(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn malformed_svg_is_an_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = svg_to_png("<svg", &dir.path().join("x.png")).unwrap_err();
        assert!(matches!(err, RenderError::Export(_)));
    }
}
