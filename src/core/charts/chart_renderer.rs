// Chart Renderer
//
// Rasterizes a `ChartSpec` onto an RGBA canvas and encodes it as PNG.
// Output depends only on the ChartSpec, so the same chart always yields the same
// bytes. Titles and axis labels are not drawn into the image; they travel
// with the slide as text (see `ChartSpec::default_caption`).

use image::{ImageEncoder, Rgba, RgbaImage};

use super::chart_models::{ChartImageArtifact, ChartSpec, ChartStyle, ChartType, PointKey};
use crate::core::slides::SlidesError;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const PLOT_BACKGROUND: Rgba<u8> = Rgba([229, 236, 246, 255]);
const GRID: Rgba<u8> = Rgba([255, 255, 255, 255]);
const AXIS: Rgba<u8> = Rgba([68, 68, 68, 255]);

/// Sequential ramp for heatmaps, low to high (Viridis stops).
const HEAT_RAMP: [[u8; 3]; 5] = [
    [0x44, 0x01, 0x54],
    [0x3B, 0x52, 0x8B],
    [0x21, 0x91, 0x8C],
    [0x5E, 0xC9, 0x62],
    [0xFD, 0xE7, 0x25],
];

/// Qualitative palette (first colour doubles as the default series colour).
const PALETTE: [[u8; 3]; 10] = [
    [0x63, 0x6E, 0xFA],
    [0xEF, 0x55, 0x3B],
    [0x00, 0xCC, 0x96],
    [0xAB, 0x63, 0xFA],
    [0xFF, 0xA1, 0x5A],
    [0x19, 0xD3, 0xF3],
    [0xFF, 0x66, 0x92],
    [0xB6, 0xE8, 0x80],
    [0xFF, 0x97, 0xFF],
    [0xFE, 0xCB, 0x52],
];

const MARGIN_LEFT: u32 = 70;
const MARGIN_RIGHT: u32 = 30;
const MARGIN_TOP: u32 = 40;
const MARGIN_BOTTOM: u32 = 60;
const GRID_LINES: u32 = 5;

/// Plot rectangle inside the canvas margins.
#[derive(Debug, Clone, Copy)]
struct PlotArea {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl PlotArea {
    fn for_canvas(width: u32, height: u32) -> Self {
        Self {
            left: MARGIN_LEFT as f64,
            top: MARGIN_TOP as f64,
            width: (width - MARGIN_LEFT - MARGIN_RIGHT) as f64,
            height: (height - MARGIN_TOP - MARGIN_BOTTOM) as f64,
        }
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Linear mapping from data values to vertical pixel positions.
#[derive(Debug, Clone, Copy)]
struct ValueScale {
    min: f64,
    max: f64,
}

impl ValueScale {
    /// Always includes zero so bars grow from a visible baseline.
    fn including_zero(values: impl Iterator<Item = f64>) -> Self {
        let (mut min, mut max) = (0.0f64, 0.0f64);
        for v in values {
            min = min.min(v);
            max = max.max(v);
        }
        if (max - min).abs() < f64::EPSILON {
            max = min + 1.0;
        }
        Self { min, max }
    }

    fn to_y(&self, value: f64, area: &PlotArea) -> f64 {
        area.top + (self.max - value) / (self.max - self.min) * area.height
    }
}

/// Renders chart specs to PNG artifacts.
#[derive(Debug, Clone, Default)]
pub struct ChartRenderer;

impl ChartRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, spec: &ChartSpec) -> Result<ChartImageArtifact, SlidesError> {
        let canvas = self.render_canvas(spec)?;
        let (width, height) = canvas.dimensions();
        let bytes = encode_png(&canvas)?;

        tracing::debug!(
            chart_type = %spec.chart_type,
            points = spec.series.len(),
            width,
            height,
            bytes = bytes.len(),
            "Rendered chart"
        );

        Ok(ChartImageArtifact {
            bytes,
            content_type: "image/png",
            width,
            height,
        })
    }

    /// Validates the chart and draws it onto an RGBA canvas.
    pub(crate) fn render_canvas(&self, spec: &ChartSpec) -> Result<RgbaImage, SlidesError> {
        spec.validate_data()?;

        let style = spec.style()?;
        let mut canvas = RgbaImage::from_pixel(style.width, style.height, BACKGROUND);
        let area = PlotArea::for_canvas(style.width, style.height);

        match spec.chart_type {
            ChartType::Bar => {
                let values: Vec<f64> = spec.series.iter().map(|p| p.value).collect();
                draw_bars(&mut canvas, &area, &values, series_color(&style), 0.2);
            }
            ChartType::Histogram => {
                let values: Vec<f64> = spec.series.iter().map(|p| p.value).collect();
                let counts = histogram_counts(&values, style.bins);
                draw_bars(&mut canvas, &area, &counts, series_color(&style), 0.02);
            }
            ChartType::Line => draw_xy(&mut canvas, &area, spec, &style, true),
            ChartType::Scatter => draw_xy(&mut canvas, &area, spec, &style, false),
            ChartType::Pie => draw_pie(&mut canvas, &area, spec)?,
            ChartType::Heatmap => draw_heatmap(&mut canvas, &area, &spec.matrix),
        }

        Ok(canvas)
    }
}

fn series_color(style: &ChartStyle) -> Rgba<u8> {
    let [r, g, b] = style.color.unwrap_or(PALETTE[0]);
    Rgba([r, g, b, 255])
}

fn palette_color(index: usize) -> Rgba<u8> {
    let [r, g, b] = PALETTE[index % PALETTE.len()];
    Rgba([r, g, b, 255])
}

// ============================================================================
// CHART KINDS
// ============================================================================

/// Evenly spaced vertical bars. `gap` is the fraction of each slot left
/// empty on either side of the bar.
fn draw_bars(canvas: &mut RgbaImage, area: &PlotArea, values: &[f64], color: Rgba<u8>, gap: f64) {
    let scale = ValueScale::including_zero(values.iter().copied());
    draw_frame(canvas, area, Some(&scale));

    let slot = area.width / values.len() as f64;
    let baseline = scale.to_y(0.0, area);
    for (i, value) in values.iter().enumerate() {
        let x0 = area.left + slot * (i as f64 + gap);
        let x1 = area.left + slot * (i as f64 + 1.0 - gap);
        let y = scale.to_y(*value, area);
        fill_rect(canvas, x0, y.min(baseline), x1, y.max(baseline), color);
    }

    draw_axes(canvas, area, baseline);
}

/// Counts of values per equal-width bin. Bin count defaults to ⌈√n⌉.
fn histogram_counts(values: &[f64], bins: Option<u32>) -> Vec<f64> {
    let bins = bins
        .unwrap_or_else(|| (values.len() as f64).sqrt().ceil() as u32)
        .clamp(1, 50) as usize;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if max > min { max - min } else { 1.0 };

    let mut counts = vec![0.0; bins];
    for v in values {
        let index = (((v - min) / span) * bins as f64) as usize;
        counts[index.min(bins - 1)] += 1.0;
    }
    counts
}

/// Line or scatter plot. Numeric keys are placed proportionally, anything
/// else is spaced evenly in series order.
fn draw_xy(canvas: &mut RgbaImage, area: &PlotArea, spec: &ChartSpec, style: &ChartStyle, connect: bool) {
    let scale = ValueScale::including_zero(spec.series.iter().map(|p| p.value));
    draw_frame(canvas, area, Some(&scale));

    let xs = x_positions(spec, area);
    let points: Vec<(f64, f64)> = xs
        .into_iter()
        .zip(spec.series.iter())
        .map(|(x, p)| (x, scale.to_y(p.value, area)))
        .collect();
    let color = series_color(style);

    if connect {
        for pair in points.windows(2) {
            draw_line(canvas, pair[0], pair[1], 3, color);
        }
    }
    let radius = if connect { 4.0 } else { 5.0 };
    for (x, y) in &points {
        fill_circle(canvas, *x, *y, radius, color);
    }

    draw_axes(canvas, area, scale.to_y(0.0, area));
}

fn x_positions(spec: &ChartSpec, area: &PlotArea) -> Vec<f64> {
    let numeric: Option<Vec<f64>> = spec
        .series
        .iter()
        .map(|p| match p.key {
            Some(PointKey::Number(x)) if x.is_finite() => Some(x),
            _ => None,
        })
        .collect();

    match numeric {
        Some(xs) => {
            let min = xs.iter().copied().fold(f64::INFINITY, f64::min);
            let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if max > min {
                xs.iter()
                    .map(|x| area.left + (x - min) / (max - min) * area.width)
                    .collect()
            } else {
                vec![area.left + area.width / 2.0; xs.len()]
            }
        }
        None => {
            let n = spec.series.len();
            if n == 1 {
                return vec![area.left + area.width / 2.0];
            }
            (0..n)
                .map(|i| area.left + i as f64 / (n - 1) as f64 * area.width)
                .collect()
        }
    }
}

/// Pie with slices clockwise from twelve o'clock.
fn draw_pie(canvas: &mut RgbaImage, area: &PlotArea, spec: &ChartSpec) -> Result<(), SlidesError> {
    if spec.series.iter().any(|p| p.value < 0.0) {
        return Err(SlidesError::invalid("pie chart values must not be negative"));
    }
    let total: f64 = spec.series.iter().map(|p| p.value).sum();
    if total <= 0.0 {
        return Err(SlidesError::invalid("pie chart values must sum to more than zero"));
    }

    let mut boundaries = Vec::with_capacity(spec.series.len());
    let mut running = 0.0;
    for point in &spec.series {
        running += point.value / total;
        boundaries.push(running);
    }

    let cx = area.left + area.width / 2.0;
    let cy = area.top + area.height / 2.0;
    let radius = area.width.min(area.height) / 2.0 - 10.0;
    let tau = std::f64::consts::TAU;

    for y in (cy - radius).floor() as i64..=(cy + radius).ceil() as i64 {
        for x in (cx - radius).floor() as i64..=(cx + radius).ceil() as i64 {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let fraction = (dx.atan2(-dy) + tau) % tau / tau;
            let slice = boundaries
                .iter()
                .position(|b| fraction < *b)
                .unwrap_or(boundaries.len() - 1);
            put_pixel(canvas, x, y, palette_color(slice));
        }
    }
    Ok(())
}

/// One filled cell per matrix entry. Row 0 is the bottom row.
fn draw_heatmap(canvas: &mut RgbaImage, area: &PlotArea, matrix: &[Vec<f64>]) {
    let rows = matrix.len();
    let columns = matrix.first().map(Vec::len).unwrap_or(0);
    if rows == 0 || columns == 0 {
        return;
    }
    let cells = matrix.iter().flatten().copied();
    let min = cells.clone().fold(f64::INFINITY, f64::min);
    let max = cells.fold(f64::NEG_INFINITY, f64::max);

    let cell_w = area.width / columns as f64;
    let cell_h = area.height / rows as f64;
    for (r, row) in matrix.iter().enumerate() {
        let y1 = area.bottom() - r as f64 * cell_h;
        for (c, value) in row.iter().enumerate() {
            let t = if max > min { (value - min) / (max - min) } else { 0.5 };
            let x0 = area.left + c as f64 * cell_w;
            fill_rect(canvas, x0, y1 - cell_h, x0 + cell_w, y1, heat_color(t));
        }
    }
}

/// Linear interpolation along `HEAT_RAMP` for `t` in `0..=1`.
fn heat_color(t: f64) -> Rgba<u8> {
    let scaled = t.clamp(0.0, 1.0) * (HEAT_RAMP.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(HEAT_RAMP.len() - 2);
    let frac = scaled - lower as f64;
    let (a, b) = (HEAT_RAMP[lower], HEAT_RAMP[lower + 1]);
    let mix = |i: usize| (a[i] as f64 + (b[i] as f64 - a[i] as f64) * frac).round() as u8;
    Rgba([mix(0), mix(1), mix(2), 255])
}

// ============================================================================
// PRIMITIVES
// ============================================================================

fn draw_frame(canvas: &mut RgbaImage, area: &PlotArea, scale: Option<&ValueScale>) {
    fill_rect(canvas, area.left, area.top, area.right(), area.bottom(), PLOT_BACKGROUND);
    if scale.is_some() {
        for i in 0..=GRID_LINES {
            let y = (area.top + area.height * i as f64 / GRID_LINES as f64).round();
            fill_rect(canvas, area.left, y, area.right(), y + 1.0, GRID);
        }
    }
}

fn draw_axes(canvas: &mut RgbaImage, area: &PlotArea, baseline: f64) {
    fill_rect(canvas, area.left - 2.0, area.top, area.left, area.bottom(), AXIS);
    let y = baseline.round();
    fill_rect(canvas, area.left, y, area.right(), y + 2.0, AXIS);
}

fn put_pixel(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}

/// Fills `[x0, x1) × [y0, y1)`, clipped to the canvas.
fn fill_rect(canvas: &mut RgbaImage, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgba<u8>) {
    let (x0, x1) = (x0.round() as i64, x1.round() as i64);
    let (y0, y1) = (y0.round() as i64, y1.round() as i64);
    for y in y0..y1 {
        for x in x0..x1 {
            put_pixel(canvas, x, y, color);
        }
    }
}

fn fill_circle(canvas: &mut RgbaImage, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
    let r = radius.ceil() as i64;
    let (cxi, cyi) = (cx.round() as i64, cy.round() as i64);
    for dy in -r..=r {
        for dx in -r..=r {
            if ((dx * dx + dy * dy) as f64) <= radius * radius {
                put_pixel(canvas, cxi + dx, cyi + dy, color);
            }
        }
    }
}

/// Thick line by stamping squares along the segment.
fn draw_line(canvas: &mut RgbaImage, from: (f64, f64), to: (f64, f64), thickness: u32, color: Rgba<u8>) {
    let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs()).ceil().max(1.0) as u32;
    let half = thickness as f64 / 2.0;
    for step in 0..=steps {
        let t = step as f64 / steps as f64;
        let x = from.0 + (to.0 - from.0) * t;
        let y = from.1 + (to.1 - from.1) * t;
        fill_rect(canvas, x - half, y - half, x + half, y + half, color);
    }
}

fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>, SlidesError> {
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            canvas.as_raw(),
            canvas.width(),
            canvas.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| SlidesError::invalid(format!("PNG encode: {}", e)))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::charts::chart_models::{DataPoint, DEFAULT_HEIGHT, DEFAULT_WIDTH};

    const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    fn sample_series(chart_type: ChartType) -> Vec<DataPoint> {
        match chart_type {
            ChartType::Line | ChartType::Scatter => (0..10)
                .map(|i| DataPoint::numeric(i as f64, (i as f64).sin()))
                .collect(),
            ChartType::Histogram => (0..40).map(|i| DataPoint::bare((i % 7) as f64)).collect(),
            _ => vec![
                DataPoint::category("A", 3.0),
                DataPoint::category("B", 5.0),
                DataPoint::category("C", 2.0),
            ],
        }
    }

    fn sample_spec(chart_type: ChartType) -> ChartSpec {
        match chart_type {
            ChartType::Heatmap => ChartSpec::heatmap(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]),
            _ => ChartSpec::new(chart_type, sample_series(chart_type)),
        }
    }

    #[test]
    fn test_every_supported_type_renders_png() {
        let renderer = ChartRenderer::new();
        for chart_type in ChartType::ALL {
            let spec = sample_spec(chart_type);
            let artifact = renderer.render(&spec).unwrap();
            assert!(!artifact.bytes.is_empty(), "{} produced no bytes", chart_type);
            assert_eq!(&artifact.bytes[..8], &PNG_SIGNATURE);
            assert_eq!(artifact.content_type, "image/png");
            assert_eq!((artifact.width, artifact.height), (DEFAULT_WIDTH, DEFAULT_HEIGHT));
        }
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let renderer = ChartRenderer::new();
        let spec = ChartSpec::new(ChartType::Pie, sample_series(ChartType::Pie));
        assert_eq!(
            renderer.render(&spec).unwrap().bytes,
            renderer.render(&spec).unwrap().bytes
        );
    }

    #[test]
    fn test_empty_series_is_invalid() {
        let spec = ChartSpec::new(ChartType::Bar, vec![]);
        assert!(matches!(
            ChartRenderer::new().render(&spec),
            Err(SlidesError::InvalidSpec(_))
        ));
    }

    #[test]
    fn test_pie_rejects_zero_total() {
        let spec = ChartSpec::new(
            ChartType::Pie,
            vec![DataPoint::category("a", 0.0), DataPoint::category("b", 0.0)],
        );
        assert!(ChartRenderer::new().render(&spec).is_err());
    }

    #[test]
    fn test_non_finite_values_are_invalid() {
        let spec = ChartSpec::new(ChartType::Line, vec![DataPoint::bare(f64::NAN)]);
        assert!(matches!(
            ChartRenderer::new().render(&spec),
            Err(SlidesError::InvalidSpec(_))
        ));
    }

    #[test]
    fn test_two_points_give_two_visible_bars() {
        let spec = ChartSpec::new(
            ChartType::Bar,
            vec![DataPoint::category("A", 1.0), DataPoint::category("B", 2.0)],
        );
        let canvas = ChartRenderer::new().render_canvas(&spec).unwrap();
        let bar = series_color(&spec.style().unwrap());

        // Scan a row just above the baseline and count runs of bar colour.
        let area = PlotArea::for_canvas(canvas.width(), canvas.height());
        let row = (area.bottom() - 10.0) as u32;
        let mut runs = 0;
        let mut inside = false;
        for x in 0..canvas.width() {
            let is_bar = *canvas.get_pixel(x, row) == bar;
            if is_bar && !inside {
                runs += 1;
            }
            inside = is_bar;
        }
        assert_eq!(runs, 2);
    }

    #[test]
    fn test_custom_size_and_colour() {
        let mut spec = ChartSpec::new(ChartType::Bar, vec![DataPoint::bare(4.0)]);
        spec.options
            .insert("width".to_string(), serde_json::json!(400));
        spec.options
            .insert("height".to_string(), serde_json::json!(300));
        spec.options
            .insert("color".to_string(), serde_json::json!("#102030"));
        let canvas = ChartRenderer::new().render_canvas(&spec).unwrap();
        assert_eq!(canvas.dimensions(), (400, 300));
        assert!(canvas.pixels().any(|p| *p == Rgba([0x10, 0x20, 0x30, 255])));
    }

    #[test]
    fn test_heatmap_cells_span_the_ramp() {
        let spec = ChartSpec::heatmap(vec![vec![0.0, 10.0], vec![5.0, 5.0]]);
        let canvas = ChartRenderer::new().render_canvas(&spec).unwrap();
        let area = PlotArea::for_canvas(canvas.width(), canvas.height());

        // Row 0 sits at the bottom: its left cell is the minimum, right the maximum.
        let bottom = (area.bottom() - 5.0) as u32;
        assert_eq!(*canvas.get_pixel((area.left + 5.0) as u32, bottom), heat_color(0.0));
        assert_eq!(*canvas.get_pixel((area.right() - 5.0) as u32, bottom), heat_color(1.0));
        let top = (area.top + 5.0) as u32;
        assert_eq!(*canvas.get_pixel((area.left + 5.0) as u32, top), heat_color(0.5));
    }

    #[test]
    fn test_heatmap_without_matrix_is_invalid() {
        let spec = ChartSpec::new(ChartType::Heatmap, vec![DataPoint::bare(1.0)]);
        assert!(matches!(
            ChartRenderer::new().render(&spec),
            Err(SlidesError::InvalidSpec(_))
        ));
    }

    #[test]
    fn test_histogram_counts() {
        let counts = histogram_counts(&[0.0, 0.1, 0.9, 1.0], Some(2));
        assert_eq!(counts, vec![2.0, 2.0]);
        let single = histogram_counts(&[3.0, 3.0, 3.0], None);
        assert_eq!(single.iter().sum::<f64>(), 3.0);
    }
}
