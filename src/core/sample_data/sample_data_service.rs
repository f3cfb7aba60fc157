// Demo data for charts. Generation is seedable so a given
// (kind, n_points, seed) always produces the same series.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::core::charts::{ChartSpec, ChartType, DataPoint};
use crate::core::slides::SlidesError;

pub const DEFAULT_POINTS: usize = 100;
const MAX_POINTS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleDataKind {
    SineWave,
    Categories,
    Linear,
    Normal,
}

impl SampleDataKind {
    pub fn parse(name: &str) -> Result<Self, SlidesError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sine_wave" | "sine" => Ok(SampleDataKind::SineWave),
            "categories" => Ok(SampleDataKind::Categories),
            "linear" => Ok(SampleDataKind::Linear),
            "normal" => Ok(SampleDataKind::Normal),
            other => Err(SlidesError::invalid(format!(
                "unknown sample data type '{}' (expected sine_wave, categories, linear or normal)",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SampleDataKind::SineWave => "sine_wave",
            SampleDataKind::Categories => "categories",
            SampleDataKind::Linear => "linear",
            SampleDataKind::Normal => "normal",
        }
    }

    /// Chart types that make sense for this shape of data.
    pub fn compatible_charts(self) -> &'static [ChartType] {
        match self {
            SampleDataKind::SineWave | SampleDataKind::Linear => {
                &[ChartType::Line, ChartType::Scatter]
            }
            // Histograms bin the category values.
            SampleDataKind::Categories => &[ChartType::Bar, ChartType::Pie, ChartType::Histogram],
            SampleDataKind::Normal => &[ChartType::Histogram],
        }
    }

    fn title(self) -> &'static str {
        match self {
            SampleDataKind::SineWave => "Sine Wave",
            SampleDataKind::Categories => "Categories",
            SampleDataKind::Linear => "Linear",
            SampleDataKind::Normal => "Normal",
        }
    }
}

/// A generated series.
#[derive(Debug, Clone, Serialize)]
pub struct SampleData {
    pub kind: SampleDataKind,
    pub points: Vec<DataPoint>,
}

#[derive(Debug, Clone, Default)]
pub struct SampleDataService;

impl SampleDataService {
    pub fn new() -> Self {
        Self
    }

    /// Generates `n_points` points (for categories: that many categories),
    /// default 100. Without a seed the output is random.
    pub fn generate(
        &self,
        kind: SampleDataKind,
        n_points: Option<usize>,
        seed: Option<u64>,
    ) -> Result<SampleData, SlidesError> {
        let n = n_points.unwrap_or(DEFAULT_POINTS);
        if n == 0 || n > MAX_POINTS {
            return Err(SlidesError::invalid(format!(
                "n_points must be in 1..={}",
                MAX_POINTS
            )));
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let points = match kind {
            SampleDataKind::SineWave => linspace(0.0, std::f64::consts::TAU, n)
                .map(|x| DataPoint::numeric(x, x.sin() + 0.2 * standard_normal(&mut rng)))
                .collect(),
            SampleDataKind::Categories => (1..=n)
                .map(|i| DataPoint::category(format!("Category {}", i), rng.gen_range(0..100) as f64))
                .collect(),
            SampleDataKind::Linear => linspace(0.0, 10.0, n)
                .map(|x| DataPoint::numeric(x, 2.0 * x + 5.0 + standard_normal(&mut rng)))
                .collect(),
            SampleDataKind::Normal => (0..n)
                .map(|_| DataPoint::bare(standard_normal(&mut rng)))
                .collect(),
        };

        tracing::debug!(kind = kind.as_str(), points = n, seeded = seed.is_some(), "Generated sample data");
        Ok(SampleData { kind, points })
    }

    /// Generates data and wraps it in a chart spec, rejecting pairs such as
    /// a pie chart of a sine wave.
    pub fn chart_spec(
        &self,
        kind: SampleDataKind,
        chart_type: ChartType,
        n_points: Option<usize>,
        seed: Option<u64>,
    ) -> Result<ChartSpec, SlidesError> {
        if !kind.compatible_charts().contains(&chart_type) {
            return Err(SlidesError::invalid(format!(
                "incompatible data type ({}) and chart type ({})",
                kind.as_str(),
                chart_type
            )));
        }
        let data = self.generate(kind, n_points, seed)?;
        let title = match chart_type {
            ChartType::Histogram => format!("Histogram of {} Data", kind.title()),
            ChartType::Bar => format!("Bar Chart of {} Data", kind.title()),
            ChartType::Pie => format!("Pie Chart of {} Data", kind.title()),
            ChartType::Line => format!("Line Plot of {} Data", kind.title()),
            ChartType::Scatter => format!("Scatter Plot of {} Data", kind.title()),
            ChartType::Heatmap => format!("Heatmap of {} Data", kind.title()),
        };
        Ok(ChartSpec::new(chart_type, data.points).with_title(title))
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive.
fn linspace(start: f64, end: f64, n: usize) -> impl Iterator<Item = f64> {
    let step = if n > 1 {
        (end - start) / (n - 1) as f64
    } else {
        0.0
    };
    (0..n).map(move |i| start + step * i as f64)
}

/// Box-Muller transform over two uniform samples.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}
