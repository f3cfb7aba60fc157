pub mod chart_models;
pub mod chart_renderer;

pub use chart_models::{
    ChartImageArtifact, ChartSpec, ChartSpecInput, ChartType, DataPoint, PointKey,
};
pub use chart_renderer::ChartRenderer;
