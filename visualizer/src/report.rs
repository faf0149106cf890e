//! Orchestration: validate the options, compute metrics, draw the grid and
//! legend, tabulate the metrics, and write everything out.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::color::{parse_hex, to_hex};
use crate::error::Result;
use crate::metrics::{compute_metrics, metric_value, per_class_metrics, METRIC_COLUMNS};
use crate::models::{ClassLabels, ConfusionMatrix, Layout, Metrics};
use crate::render::table::html_escape;
use crate::render::{
    draw_grid, draw_legend, render_table, CellMode, Legend, Record, Surface, Table, TableSpec,
};
use crate::scales::ColorScale;

pub const DEFAULT_START_COLOR: RGBColor = RGBColor(0xff, 0xff, 0xff);
pub const DEFAULT_END_COLOR: RGBColor = RGBColor(0xe6, 0x7e, 0x22);

/// Everything one render needs.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixOptions {
    /// Mount point of the heatmap grid.
    pub container: String,
    pub legend_container: String,
    pub table_container: String,
    pub data: ConfusionMatrix,
    pub labels: ClassLabels,
    /// Color of the smallest count.
    pub start_color: RGBColor,
    /// Color of the largest count.
    pub end_color: RGBColor,
    pub layout: Layout,
    pub cell_mode: CellMode,
}

impl Default for MatrixOptions {
    fn default() -> Self {
        Self {
            container: "container".to_string(),
            legend_container: "legend".to_string(),
            table_container: "dataView".to_string(),
            data: ConfusionMatrix::from_validated(vec![vec![169, 10], vec![7, 46]]),
            labels: ClassLabels::new(["Class A", "Class B"]),
            start_color: DEFAULT_START_COLOR,
            end_color: DEFAULT_END_COLOR,
            layout: Layout::default(),
            cell_mode: CellMode::Escaped,
        }
    }
}

impl MatrixOptions {
    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        self.labels.check_against(&self.data)
    }

    /// Serializable view of these options, the inverse of
    /// [`ReportConfig::into_options`].
    pub fn to_config(&self) -> ReportConfig {
        ReportConfig {
            container: Some(self.container.clone()),
            legend_container: Some(self.legend_container.clone()),
            table_container: Some(self.table_container.clone()),
            data: Some(json!(self.data)),
            labels: Some(self.labels.0.clone()),
            start_color: Some(to_hex(self.start_color)),
            end_color: Some(to_hex(self.end_color)),
            layout: Some(self.layout),
            trusted_markup: Some(self.cell_mode == CellMode::TrustedMarkup),
        }
    }
}

/// On-disk form of [`MatrixOptions`]. Every field is optional and falls back
/// to the stock widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_container: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_container: Option<String>,
    /// Matrix as a JSON array of arrays; validated on conversion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    /// Insert string cells of the metrics tables as raw markup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trusted_markup: Option<bool>,
}

/// "Class A", "Class B", ... then "Class 27", "Class 28", ...
fn default_labels(n: usize) -> ClassLabels {
    ClassLabels::new((0..n).map(|i| match u8::try_from(i) {
        Ok(i) if i < 26 => format!("Class {}", (b'A' + i) as char),
        _ => format!("Class {}", i + 1),
    }))
}

impl ReportConfig {
    pub fn load(path: &Path) -> Result<Self> {
        info!("Reading report configuration from {}", path.display());
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn into_options(self) -> Result<MatrixOptions> {
        let defaults = MatrixOptions::default();

        let data = match &self.data {
            Some(value) => ConfusionMatrix::from_json(value)?,
            None => defaults.data,
        };
        let labels = match self.labels {
            Some(labels) => ClassLabels(labels),
            None if self.data.is_none() => defaults.labels,
            None => default_labels(data.dimension()),
        };
        let start_color = match self.start_color {
            Some(s) => parse_hex(&s)?,
            None => defaults.start_color,
        };
        let end_color = match self.end_color {
            Some(s) => parse_hex(&s)?,
            None => defaults.end_color,
        };
        let cell_mode = match self.trusted_markup {
            Some(true) => CellMode::TrustedMarkup,
            _ => CellMode::Escaped,
        };

        let options = MatrixOptions {
            container: self.container.unwrap_or(defaults.container),
            legend_container: self.legend_container.unwrap_or(defaults.legend_container),
            table_container: self.table_container.unwrap_or(defaults.table_container),
            data,
            labels,
            start_color,
            end_color,
            layout: self.layout.unwrap_or(defaults.layout),
            cell_mode,
        };
        options.validate()?;
        Ok(options)
    }
}

/// Per-class precision, recall, F1 and support, one row per label.
pub fn class_report_spec(matrix: &ConfusionMatrix, labels: &ClassLabels) -> TableSpec {
    let rows = per_class_metrics(matrix)
        .into_iter()
        .zip(labels.iter())
        .enumerate()
        .map(|(class, (m, label))| {
            let mut record = Record::new();
            record.insert("CLASS".into(), Value::String(label.clone()));
            record.insert("PRECISION".into(), metric_value(m.precision));
            record.insert("RECALL".into(), metric_value(m.recall));
            record.insert("F1".into(), metric_value(m.f1));
            record.insert("SUPPORT".into(), json!(matrix.support(class)));
            record
        })
        .collect();

    TableSpec::new(["CLASS", "PRECISION", "RECALL", "F1", "SUPPORT"], rows)
}

/// Output of one render: the drawn surfaces and the tables, each tied to
/// its container id.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub metrics: Metrics,
    pub grid: Surface,
    pub legend: Surface,
    pub metrics_table: Table,
    pub class_table: Table,
    table_container: String,
    margin_left: f64,
}

/// Validate, then compute and draw every piece. Validation failures return
/// before any surface is created.
pub fn render_report(options: &MatrixOptions) -> Result<RenderedReport> {
    options.validate()?;
    let data = &options.data;
    info!(
        "Rendering {n}x{n} confusion matrix, values {}..={}",
        data.min_value(),
        data.max_value(),
        n = data.dimension()
    );

    let metrics = compute_metrics(data);
    if !metrics.is_defined() {
        warn!("Some metrics are undefined (zero denominator) and will show as N/A");
    }
    info!(
        "accuracy={:.2} precision={:.2} recall={:.2} f1={:.2}",
        metrics.accuracy, metrics.precision, metrics.recall, metrics.f1
    );

    let colors = ColorScale::for_matrix(data, options.start_color, options.end_color);
    if colors.is_degenerate() {
        info!("All cells hold the same value; every cell uses the end color");
    }

    let mut grid = Surface::for_grid(options.container.as_str(), &options.layout);
    draw_grid(&mut grid, data, &options.labels, &colors, &options.layout)?;

    let mut legend = Surface::for_legend(options.legend_container.as_str(), &options.layout);
    draw_legend(&mut legend, &Legend::new(&colors, &options.layout));

    let metrics_table = render_table(
        &TableSpec::new(METRIC_COLUMNS, vec![metrics.to_record()]),
        options.cell_mode,
    );
    let class_table = render_table(&class_report_spec(data, &options.labels), options.cell_mode);

    Ok(RenderedReport {
        metrics,
        grid,
        legend,
        metrics_table,
        class_table,
        table_container: options.table_container.clone(),
        margin_left: options.layout.margin.left,
    })
}

impl RenderedReport {
    pub fn table_container(&self) -> &str {
        &self.table_container
    }

    /// Metrics table followed by the per-class table.
    pub fn tables_html(&self) -> String {
        format!(
            "{}{}",
            self.metrics_table.to_html(self.margin_left),
            self.class_table.to_html(self.margin_left)
        )
    }

    /// Standalone page with one `<div>` per container.
    pub fn to_html(&self) -> String {
        let mount = |id: &str, body: String| {
            let style = "display: inline-block; vertical-align: top";
            format!("<div id=\"{}\" style=\"{style}\">\n{body}\n</div>\n", html_escape(id))
        };

        let mut page = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        page.push_str("<title>Confusion matrix</title>\n</head>\n<body>\n");
        page.push_str(&mount(self.grid.container(), self.grid.to_svg_string()));
        page.push_str(&mount(self.legend.container(), self.legend.to_svg_string()));
        page.push_str("<br>\n");
        page.push_str(&mount(&self.table_container, self.tables_html()));
        page.push_str("</body>\n</html>\n");
        page
    }

    /// Write every artefact into `dir` and return the paths written.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();

        let grid_path = dir.join("confusion_matrix.svg");
        self.grid.save(&grid_path)?;
        written.push(grid_path);

        let legend_path = dir.join("legend.svg");
        self.legend.save(&legend_path)?;
        written.push(legend_path);

        let table_path = dir.join("metrics.html");
        fs::write(&table_path, self.tables_html())?;
        written.push(table_path);

        let csv_path = dir.join("metrics.csv");
        self.metrics_table.write_csv(File::create(&csv_path)?)?;
        written.push(csv_path);

        let page_path = dir.join("report.html");
        fs::write(&page_path, self.to_html())?;
        written.push(page_path);

        #[cfg(feature = "png_export")]
        {
            let surfaces = [(&self.grid, "confusion_matrix.png"), (&self.legend, "legend.png")];
            for (surface, name) in surfaces {
                let png_path = dir.join(name);
                crate::export::svg_to_png(&surface.to_svg_string(), &png_path)?;
                written.push(png_path);
            }
        }

        for path in &written {
            info!("Wrote {}", path.display());
        }
        Ok(written)
    }
}

/// Shortcut for the common case: render `options` and write the result.
pub fn render_to_dir(options: &MatrixOptions, dir: &Path) -> Result<RenderedReport> {
    let report = render_report(options)?;
    report.write_to(dir)?;
    Ok(report)
}
