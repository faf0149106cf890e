use std::path::Path;

use svg::node::element::Group;
use svg::Document;

use crate::error::Result;
use crate::models::Layout;

/// SVG drawing surface bound to a logical container id (`container`,
/// `legend`, ...). Renderers only append layers; the caller owns the value
/// and decides when to clear or serialize it.
#[derive(Debug, Clone)]
pub struct Surface {
    container: String,
    width: f64,
    height: f64,
    layers: Vec<Group>,
}

impl Surface {
    pub fn new(container: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            container: container.into(),
            width,
            height,
            layers: Vec::new(),
        }
    }

    /// Grid canvas plus margins on every side.
    pub fn for_grid(container: impl Into<String>, layout: &Layout) -> Self {
        Self::new(container, layout.outer_width(), layout.outer_height())
    }

    /// Legend strip as tall as the grid surface.
    pub fn for_legend(container: impl Into<String>, layout: &Layout) -> Self {
        Self::new(container, layout.legend_width, layout.outer_height())
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn append(&mut self, layer: Group) {
        self.layers.push(layer);
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    pub fn to_document(&self) -> Document {
        let document = Document::new()
            .set("xmlns", "http://www.w3.org/2000/svg")
            .set("width", self.width)
            .set("height", self.height)
            .set("viewBox", (0.0, 0.0, self.width, self.height))
            .set("font-family", "sans-serif")
            .set("font-size", 10);

        self.layers
            .iter()
            .cloned()
            .fold(document, |doc, layer| doc.add(layer))
    }

    pub fn to_svg_string(&self) -> String {
        self.to_document().to_string()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        svg::save(path, &self.to_document())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_surface_includes_margins() {
        let surface = Surface::for_grid("container", &Layout::default());
        assert_eq!(surface.size(), (400.0, 400.0));
        assert_eq!(surface.container(), "container");
    }

    #[test]
    fn layers_accumulate_until_cleared() {
        let mut surface = Surface::new("legend", 100.0, 400.0);
        surface.append(Group::new().set("class", "a"));
        surface.append(Group::new().set("class", "b"));
        assert_eq!(surface.layer_count(), 2);

        let svg = surface.to_svg_string();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("class=\"a\"") && svg.contains("class=\"b\""));

        surface.clear();
        assert_eq!(surface.layer_count(), 0);
    }

    #[test]
    fn saves_svg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.svg");
        Surface::new("container", 10.0, 10.0).save(&path).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("width=\"10\""));
    }
}
