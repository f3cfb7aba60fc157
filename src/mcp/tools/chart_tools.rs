use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::dispatcher::{parse_args, ToolHandler};
use super::slides_tools::PresentationArgs;
use super::tool_catalog;
use super::tool_models::{ToolDefinition, ToolOutput};
use crate::core::charts::{ChartSpec, ChartSpecInput, ChartType, DataPoint, PointKey};
use crate::core::sample_data::{SampleData, SampleDataKind, SampleDataService};
use crate::core::slides::{
    AssetUploader, PlacedChart, Placement, SlidesApi, SlidesError, SlidesService,
};

#[derive(Debug, Deserialize)]
struct AddChartArgs {
    #[serde(flatten)]
    presentation: PresentationArgs,
    slide_id: String,
    #[serde(alias = "chart")]
    chart_spec: ChartSpecInput,
    #[serde(default)]
    placement: Option<Placement>,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    return_image: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateSampleDataArgs {
    #[serde(default = "default_data_type")]
    data_type: String,
    #[serde(default)]
    n_points: Option<usize>,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SampleChartArgs {
    #[serde(flatten)]
    presentation: PresentationArgs,
    slide_id: String,
    data_type: String,
    chart_type: String,
    #[serde(default)]
    n_points: Option<usize>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    placement: Option<Placement>,
}

fn default_data_type() -> String {
    SampleDataKind::SineWave.as_str().to_string()
}

fn key_number(point: &DataPoint) -> Option<f64> {
    match point.key {
        Some(PointKey::Number(x)) => Some(x),
        _ => None,
    }
}

fn key_label(point: &DataPoint) -> String {
    match &point.key {
        Some(PointKey::Category(label)) => label.clone(),
        Some(PointKey::Number(x)) => x.to_string(),
        None => String::new(),
    }
}

/// Column-oriented payload: `{x, y}` for curves, `{categories, values}`
/// for categories and `{values}` for distributions.
fn sample_payload(data: &SampleData) -> Value {
    let values: Vec<f64> = data.points.iter().map(|p| p.value).collect();
    match data.kind {
        SampleDataKind::SineWave | SampleDataKind::Linear => {
            let x: Vec<Option<f64>> = data.points.iter().map(key_number).collect();
            json!({ "x": x, "y": values })
        }
        SampleDataKind::Categories => {
            let categories: Vec<String> = data.points.iter().map(key_label).collect();
            json!({ "categories": categories, "values": values })
        }
        SampleDataKind::Normal => json!({ "values": values }),
    }
}

fn chart_payload(placed: &PlacedChart, spec: &ChartSpec) -> Value {
    json!({
        "image_id": placed.object_id,
        "chart_type": spec.chart_type.as_str(),
        "file_id": placed.asset.file_id,
        "url": placed.asset.url,
        "width": placed.artifact.width,
        "height": placed.artifact.height,
    })
}

pub struct ChartToolHandler<A: SlidesApi, U: AssetUploader> {
    service: Arc<SlidesService<A, U>>,
    sample_data: SampleDataService,
}

impl<A, U> ChartToolHandler<A, U>
where
    A: SlidesApi,
    U: AssetUploader,
{
    pub fn new(service: Arc<SlidesService<A, U>>) -> Self {
        Self {
            service,
            sample_data: SampleDataService::new(),
        }
    }

    async fn add_chart(&self, args: &Value) -> Result<ToolOutput, SlidesError> {
        let args: AddChartArgs = parse_args(args)?;
        let spec = ChartSpec::from_input(args.chart_spec)?;
        let placed = self
            .service
            .add_chart(
                &args.presentation.presentation_id,
                &args.slide_id,
                &spec,
                args.placement,
                args.caption.as_deref(),
            )
            .await?;

        let output = ToolOutput::json(chart_payload(&placed, &spec));
        Ok(if args.return_image {
            output.with_image(&placed.artifact)
        } else {
            output
        })
    }

    fn generate_sample_data(&self, args: &Value) -> Result<ToolOutput, SlidesError> {
        let args: GenerateSampleDataArgs = parse_args(args)?;
        let kind = SampleDataKind::parse(&args.data_type)?;
        let data = self.sample_data.generate(kind, args.n_points, args.seed)?;
        Ok(ToolOutput::json(sample_payload(&data)))
    }

    async fn create_chart_from_sample_data(&self, args: &Value) -> Result<ToolOutput, SlidesError> {
        let args: SampleChartArgs = parse_args(args)?;
        let kind = SampleDataKind::parse(&args.data_type)?;
        let chart_type = ChartType::parse(&args.chart_type)?;

        let mut spec = self
            .sample_data
            .chart_spec(kind, chart_type, args.n_points, args.seed)?;
        let mut options = BTreeMap::new();
        if let Some(width) = args.width {
            options.insert("width".to_string(), json!(width));
        }
        if let Some(height) = args.height {
            options.insert("height".to_string(), json!(height));
        }
        spec.options = options;

        let placed = self
            .service
            .add_chart(
                &args.presentation.presentation_id,
                &args.slide_id,
                &spec,
                args.placement,
                None,
            )
            .await?;

        let mut payload = chart_payload(&placed, &spec);
        payload["data_type"] = json!(kind.as_str());
        payload["points"] = json!(spec.series.len());
        Ok(ToolOutput::json(payload))
    }
}

#[async_trait]
impl<A, U> ToolHandler for ChartToolHandler<A, U>
where
    A: SlidesApi + 'static,
    U: AssetUploader + 'static,
{
    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            tool_catalog::add_chart(),
            tool_catalog::generate_sample_data(),
            tool_catalog::create_chart_from_sample_data(),
        ]
    }

    async fn call(&self, name: &str, args: &Value) -> Result<ToolOutput, SlidesError> {
        match name {
            tool_catalog::ADD_CHART => self.add_chart(args).await,
            tool_catalog::GENERATE_SAMPLE_DATA => self.generate_sample_data(args),
            tool_catalog::CREATE_CHART_FROM_SAMPLE_DATA => {
                self.create_chart_from_sample_data(args).await
            }
            other => Err(SlidesError::invalid(format!("unknown function: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::core::slides::slides_service::fakes::{FakeSlides, FakeUploader};
    use crate::core::slides::page_requests::PageRequest;
    use crate::core::slides::PresentationRegistry;
    use crate::mcp::tools::tool_models::ToolContent;

    struct Fixture {
        handler: ChartToolHandler<Arc<FakeSlides>, Arc<FakeUploader>>,
        slides: Arc<FakeSlides>,
        uploader: Arc<FakeUploader>,
    }

    fn fixture() -> Fixture {
        let slides = Arc::new(FakeSlides::with_slide("s1", vec![]));
        let uploader = Arc::new(FakeUploader::default());
        let service = SlidesService::new(
            slides.clone(),
            uploader.clone(),
            Arc::new(PresentationRegistry::new()),
        );
        Fixture {
            handler: ChartToolHandler::new(Arc::new(service)),
            slides,
            uploader,
        }
    }

    #[tokio::test]
    async fn test_add_chart_returns_image_on_request() {
        let f = fixture();
        let output = f
            .handler
            .call(
                tool_catalog::ADD_CHART,
                &json!({
                    "presentation_id": "deck1",
                    "slide_id": "s1",
                    "chart_spec": { "type": "bar", "data": [["A", 1], ["B", 2]], "title": "Sales" },
                    "return_image": true
                }),
            )
            .await
            .unwrap();

        assert_eq!(output.value["chart_type"], "bar");
        assert_eq!(output.value["url"], "https://drive.google.com/uc?id=file1");
        assert!(matches!(
            output.image,
            Some(ToolContent::Image { ref mime_type, .. }) if mime_type == "image/png"
        ));
        assert_eq!(f.uploader.count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_add_chart_draws_heatmap_matrix() {
        let f = fixture();
        let output = f
            .handler
            .call(
                tool_catalog::ADD_CHART,
                &json!({
                    "presentation_id": "deck1",
                    "slide_id": "s1",
                    "chart_spec": {
                        "type": "heatmap",
                        "matrix": [[1, 2], [3, 4]],
                        "x_labels": ["Mon", "Tue"],
                        "y_labels": ["AM", "PM"]
                    }
                }),
            )
            .await
            .unwrap();
        assert_eq!(output.value["chart_type"], "heatmap");
        assert_eq!(f.slides.batches().len(), 1);

        let err = f
            .handler
            .call(
                tool_catalog::ADD_CHART,
                &json!({
                    "presentation_id": "deck1",
                    "slide_id": "s1",
                    "chart_spec": { "type": "heatmap", "matrix": [[1, 2], [3]] }
                }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidSpec");
        assert_eq!(f.uploader.count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsupported_chart_type_touches_nothing() {
        let f = fixture();
        let err = f
            .handler
            .call(
                tool_catalog::ADD_CHART,
                &json!({
                    "presentation_id": "deck1",
                    "slide_id": "s1",
                    "chart_spec": { "type": "scatter_matrix", "data": [1, 2] }
                }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "UnsupportedChartType");
        assert!(f.slides.batches().is_empty());
        assert_eq!(f.uploader.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_chart_spec_is_invalid() {
        let f = fixture();
        let err = f
            .handler
            .call(
                tool_catalog::ADD_CHART,
                &json!({ "presentation_id": "deck1", "slide_id": "s1" }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidSpec");
        assert!(f.slides.batches().is_empty());
    }

    #[tokio::test]
    async fn test_sample_data_shapes() {
        let f = fixture();
        let sine = f
            .handler
            .call(tool_catalog::GENERATE_SAMPLE_DATA, &json!({ "n_points": 10, "seed": 7 }))
            .await
            .unwrap();
        assert_eq!(sine.value["x"].as_array().unwrap().len(), 10);
        assert_eq!(sine.value["y"].as_array().unwrap().len(), 10);

        let categories = f
            .handler
            .call(
                tool_catalog::GENERATE_SAMPLE_DATA,
                &json!({ "data_type": "categories", "n_points": 5, "seed": 7 }),
            )
            .await
            .unwrap();
        assert_eq!(categories.value["categories"][0], "Category 1");
        assert_eq!(categories.value["values"].as_array().unwrap().len(), 5);

        let normal = f
            .handler
            .call(
                tool_catalog::GENERATE_SAMPLE_DATA,
                &json!({ "data_type": "normal", "n_points": 3 }),
            )
            .await
            .unwrap();
        assert!(normal.value.get("x").is_none());
        assert_eq!(normal.value["values"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_sample_chart_rejects_incompatible_pair() {
        let f = fixture();
        let err = f
            .handler
            .call(
                tool_catalog::CREATE_CHART_FROM_SAMPLE_DATA,
                &json!({
                    "presentation_id": "deck1",
                    "slide_id": "s1",
                    "data_type": "sine_wave",
                    "chart_type": "pie"
                }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidSpec");
        assert_eq!(f.uploader.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sample_chart_is_placed_with_title_caption() {
        let f = fixture();
        let output = f
            .handler
            .call(
                tool_catalog::CREATE_CHART_FROM_SAMPLE_DATA,
                &json!({
                    "presentation_id": "deck1",
                    "slide_id": "s1",
                    "data_type": "normal",
                    "chart_type": "histogram",
                    "n_points": 50,
                    "seed": 1,
                    "width": 400,
                    "height": 300
                }),
            )
            .await
            .unwrap();
        assert_eq!(output.value["width"], 400);
        assert_eq!(output.value["points"], 50);

        let captions: Vec<String> = f.slides.batches()[0]
            .requests
            .iter()
            .filter_map(|r| match r {
                PageRequest::InsertText { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(captions, vec!["Histogram of Normal Data".to_string()]);
    }
}
