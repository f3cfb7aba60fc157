use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::slides::SlidesError;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;
const MIN_DIMENSION: u32 = 200;
const MAX_DIMENSION: u32 = 2000;
const MAX_BINS: u32 = 50;

/// Chart types the renderer can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Scatter,
    Pie,
    Histogram,
    Heatmap,
}

impl ChartType {
    pub const ALL: [ChartType; 6] = [
        ChartType::Bar,
        ChartType::Line,
        ChartType::Scatter,
        ChartType::Pie,
        ChartType::Histogram,
        ChartType::Heatmap,
    ];

    pub fn parse(name: &str) -> Result<Self, SlidesError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(ChartType::Bar),
            "line" => Ok(ChartType::Line),
            "scatter" => Ok(ChartType::Scatter),
            "pie" => Ok(ChartType::Pie),
            "histogram" => Ok(ChartType::Histogram),
            "heatmap" => Ok(ChartType::Heatmap),
            _ => Err(SlidesError::UnsupportedChartType(name.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Scatter => "scatter",
            ChartType::Pie => "pie",
            ChartType::Histogram => "histogram",
            ChartType::Heatmap => "heatmap",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// X-side of a data point: a category label or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointKey {
    Number(f64),
    Category(String),
}

/// Accepted JSON shapes for one point: `["A", 1]`, `{"x": "A", "y": 1}`,
/// `{"label": "A", "value": 1}` or a bare `1`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPoint {
    Pair(PointKey, f64),
    Xy { x: PointKey, y: f64 },
    Labelled { label: PointKey, value: f64 },
    Bare(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPoint")]
pub struct DataPoint {
    pub key: Option<PointKey>,
    pub value: f64,
}

impl From<RawPoint> for DataPoint {
    fn from(raw: RawPoint) -> Self {
        match raw {
            RawPoint::Pair(key, value)
            | RawPoint::Xy { x: key, y: value }
            | RawPoint::Labelled { label: key, value } => DataPoint {
                key: Some(key),
                value,
            },
            RawPoint::Bare(value) => DataPoint { key: None, value },
        }
    }
}

impl DataPoint {
    pub fn category(label: impl Into<String>, value: f64) -> Self {
        Self {
            key: Some(PointKey::Category(label.into())),
            value,
        }
    }

    pub fn numeric(x: f64, value: f64) -> Self {
        Self {
            key: Some(PointKey::Number(x)),
            value,
        }
    }

    pub fn bare(value: f64) -> Self {
        Self { key: None, value }
    }
}

/// Chart description as it arrives from a tool call. Heatmaps carry
/// `matrix` (rows of cells) instead of `data`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartSpecInput {
    #[serde(rename = "type", alias = "chart_type")]
    pub chart_type: String,
    #[serde(default, alias = "series")]
    pub data: Vec<DataPoint>,
    #[serde(default, alias = "z")]
    pub matrix: Vec<Vec<f64>>,
    #[serde(default)]
    pub x_labels: Option<Vec<String>>,
    #[serde(default)]
    pub y_labels: Option<Vec<String>>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub x_label: Option<String>,
    #[serde(default)]
    pub y_label: Option<String>,
    #[serde(default)]
    pub options: BTreeMap<String, serde_json::Value>,
}

/// Declarative chart: type, ordered series (or matrix) and style options.
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub series: Vec<DataPoint>,
    /// Heatmap cells, row 0 drawn at the bottom. Empty for other types.
    pub matrix: Vec<Vec<f64>>,
    pub x_labels: Option<Vec<String>>,
    pub y_labels: Option<Vec<String>>,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub options: BTreeMap<String, serde_json::Value>,
}

impl ChartSpec {
    pub fn new(chart_type: ChartType, series: Vec<DataPoint>) -> Self {
        Self {
            chart_type,
            series,
            matrix: Vec::new(),
            x_labels: None,
            y_labels: None,
            title: None,
            x_label: None,
            y_label: None,
            options: BTreeMap::new(),
        }
    }

    pub fn from_input(input: ChartSpecInput) -> Result<Self, SlidesError> {
        Ok(Self {
            chart_type: ChartType::parse(&input.chart_type)?,
            series: input.data,
            matrix: input.matrix,
            x_labels: input.x_labels,
            y_labels: input.y_labels,
            title: input.title,
            x_label: input.x_label,
            y_label: input.y_label,
            options: input.options,
        })
    }

    pub fn heatmap(matrix: Vec<Vec<f64>>) -> Self {
        Self {
            matrix,
            ..Self::new(ChartType::Heatmap, Vec::new())
        }
    }

    /// Checks the data the chart type draws from: a non-empty finite series,
    /// or for heatmaps a rectangular finite matrix whose labels fit it.
    pub fn validate_data(&self) -> Result<(), SlidesError> {
        if self.chart_type != ChartType::Heatmap {
            if self.series.is_empty() {
                return Err(SlidesError::invalid("chart data series is empty"));
            }
            if self.series.iter().any(|p| !p.value.is_finite()) {
                return Err(SlidesError::invalid("chart values must be finite numbers"));
            }
            return Ok(());
        }

        let columns = self.matrix.first().map(Vec::len).unwrap_or(0);
        if columns == 0 {
            return Err(SlidesError::invalid("heatmap matrix is empty"));
        }
        if self.matrix.iter().any(|row| row.len() != columns) {
            return Err(SlidesError::invalid(format!(
                "heatmap rows must all have {} cells",
                columns
            )));
        }
        if self.matrix.iter().flatten().any(|v| !v.is_finite()) {
            return Err(SlidesError::invalid("heatmap values must be finite numbers"));
        }
        for (axis, labels, expected) in [
            ("x_labels", &self.x_labels, columns),
            ("y_labels", &self.y_labels, self.matrix.len()),
        ] {
            if let Some(labels) = labels {
                if labels.len() != expected {
                    return Err(SlidesError::invalid(format!(
                        "{} has {} entries, the matrix needs {}",
                        axis,
                        labels.len(),
                        expected
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Caption text describing the chart, used when the caller gives none.
    pub fn default_caption(&self) -> String {
        let title = self.title.as_deref().unwrap_or("Chart");
        match (&self.x_label, &self.y_label) {
            (Some(x), Some(y)) => format!("{}: {} by {}", title, y, x),
            _ => title.to_string(),
        }
    }

    /// Resolves style options, rejecting out-of-range values.
    pub fn style(&self) -> Result<ChartStyle, SlidesError> {
        let width = self.dimension_option("width", DEFAULT_WIDTH)?;
        let height = self.dimension_option("height", DEFAULT_HEIGHT)?;

        let color = match self.options.get("color") {
            None => None,
            Some(serde_json::Value::String(hex)) => Some(parse_hex_rgb(hex)?),
            Some(other) => {
                return Err(SlidesError::invalid(format!(
                    "option 'color' must be a #RRGGBB string, got {}",
                    other
                )))
            }
        };

        let bins = match self.options.get("bins") {
            None => None,
            Some(value) => {
                let bins = value
                    .as_u64()
                    .filter(|b| (1..=MAX_BINS as u64).contains(b))
                    .ok_or_else(|| {
                        SlidesError::invalid(format!("option 'bins' must be 1..={}", MAX_BINS))
                    })?;
                Some(bins as u32)
            }
        };

        Ok(ChartStyle {
            width,
            height,
            color,
            bins,
        })
    }

    fn dimension_option(&self, name: &str, default: u32) -> Result<u32, SlidesError> {
        match self.options.get(name) {
            None => Ok(default),
            Some(value) => value
                .as_u64()
                .filter(|v| (MIN_DIMENSION as u64..=MAX_DIMENSION as u64).contains(v))
                .map(|v| v as u32)
                .ok_or_else(|| {
                    SlidesError::invalid(format!(
                        "option '{}' must be an integer in {}..={}",
                        name, MIN_DIMENSION, MAX_DIMENSION
                    ))
                }),
        }
    }
}

/// Resolved rendering options.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub color: Option<[u8; 3]>,
    pub bins: Option<u32>,
}

fn parse_hex_rgb(hex: &str) -> Result<[u8; 3], SlidesError> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SlidesError::invalid(format!("colour '{}' is not #RRGGBB", hex)));
    }
    let mut rgb = [0u8; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        *channel = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
            .map_err(|_| SlidesError::invalid(format!("colour '{}' is not #RRGGBB", hex)))?;
    }
    Ok(rgb)
}

/// Rendered chart image.
#[derive(Debug, Clone)]
pub struct ChartImageArtifact {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl ChartImageArtifact {
    pub fn base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}
