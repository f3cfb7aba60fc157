// Presentation, slide, table, image and background tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::dispatcher::{parse_args, ToolHandler};
use super::tool_catalog;
use super::tool_models::{ToolDefinition, ToolOutput};
use crate::core::slides::{
    AssetUploader, BlockRole, ContentBlock, ImageSource, Placement, RgbColor, SlideKind,
    SlideSnapshot, SlideSpec, SlidesApi, SlidesError, SlidesService,
};

#[derive(Debug, Deserialize)]
struct CreatePresentationArgs {
    #[serde(alias = "name")]
    title: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct PresentationArgs {
    #[serde(alias = "presentation_name", alias = "presentation")]
    pub presentation_id: String,
}

/// A text slot given either as one string or as a list of lines.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextLines {
    One(String),
    Many(Vec<String>),
}

impl TextLines {
    fn joined(self) -> String {
        match self {
            TextLines::One(text) => text,
            TextLines::Many(lines) => lines.join("\n"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SlideContentArgs {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default, alias = "bullets")]
    body: Option<TextLines>,
    #[serde(default, alias = "left_column")]
    left: Option<TextLines>,
    #[serde(default, alias = "right_column")]
    right: Option<TextLines>,
}

impl SlideContentArgs {
    fn into_blocks(self) -> Vec<ContentBlock> {
        let slots = [
            (BlockRole::Title, self.title),
            (BlockRole::Subtitle, self.subtitle),
            (BlockRole::Body, self.body.map(TextLines::joined)),
            (BlockRole::LeftColumn, self.left.map(TextLines::joined)),
            (BlockRole::RightColumn, self.right.map(TextLines::joined)),
        ];
        slots
            .into_iter()
            .filter_map(|(role, text)| {
                text.filter(|t| !t.trim().is_empty())
                    .map(|text| ContentBlock { role, text })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct AddSlideArgs {
    #[serde(flatten)]
    presentation: PresentationArgs,
    #[serde(alias = "slide_type", alias = "layout")]
    kind: String,
    #[serde(default)]
    content: SlideContentArgs,
    #[serde(default)]
    insertion_index: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct AddTableArgs {
    #[serde(flatten)]
    presentation: PresentationArgs,
    slide_id: String,
    rows: Vec<Vec<Value>>,
    #[serde(default = "default_true")]
    header_row: bool,
    #[serde(default)]
    placement: Option<Placement>,
}

#[derive(Debug, Deserialize)]
struct AddImageArgs {
    #[serde(flatten)]
    presentation: PresentationArgs,
    slide_id: String,
    #[serde(alias = "url", alias = "image_url")]
    source: String,
    #[serde(default)]
    placement: Option<Placement>,
    #[serde(default)]
    caption: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BackgroundArgs {
    #[serde(flatten)]
    presentation: PresentationArgs,
    #[serde(default)]
    color: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Table cells arrive as arbitrary JSON scalars; strings are taken verbatim.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn slide_summary(slide: &SlideSnapshot) -> Value {
    let placeholders: Vec<Value> = slide
        .elements
        .iter()
        .filter_map(|element| {
            element.placeholder.as_ref().map(|p| {
                json!({
                    "object_id": element.object_id,
                    "type": p.kind.as_api_str(),
                    "index": p.index,
                    "text": element.text.trim_end(),
                })
            })
        })
        .collect();
    json!({
        "slide_id": slide.slide_id,
        "element_count": slide.elements.len(),
        "placeholders": placeholders,
    })
}

pub struct SlidesToolHandler<A: SlidesApi, U: AssetUploader> {
    service: Arc<SlidesService<A, U>>,
}

impl<A, U> SlidesToolHandler<A, U>
where
    A: SlidesApi,
    U: AssetUploader,
{
    pub fn new(service: Arc<SlidesService<A, U>>) -> Self {
        Self { service }
    }

    async fn create_presentation(&self, args: &Value) -> Result<ToolOutput, SlidesError> {
        let args: CreatePresentationArgs = parse_args(args)?;
        let created = self.service.create_presentation(&args.title).await?;
        Ok(ToolOutput::json(json!({
            "presentation_id": created.handle.as_str(),
            "title": created.title,
            "url": created.url,
        })))
    }

    async fn add_slide(&self, args: &Value) -> Result<ToolOutput, SlidesError> {
        let args: AddSlideArgs = parse_args(args)?;
        let spec = SlideSpec {
            kind: SlideKind::parse(&args.kind)?,
            blocks: args.content.into_blocks(),
            insertion_index: args.insertion_index,
        };
        let created = self
            .service
            .add_slide(&args.presentation.presentation_id, spec)
            .await?;
        let filled: Vec<&str> = created.filled.iter().map(|i| i.object_id.as_str()).collect();
        Ok(ToolOutput::json(json!({
            "slide_id": created.slide_id,
            "filled_placeholders": filled,
        })))
    }

    async fn add_table(&self, args: &Value) -> Result<ToolOutput, SlidesError> {
        let args: AddTableArgs = parse_args(args)?;
        let rows: Vec<Vec<String>> = args
            .rows
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        let table_id = self
            .service
            .add_table(
                &args.presentation.presentation_id,
                &args.slide_id,
                &rows,
                args.header_row,
                args.placement,
            )
            .await?;
        Ok(ToolOutput::json(json!({
            "table_id": table_id,
            "rows": rows.len(),
            "columns": rows.first().map(Vec::len).unwrap_or(0),
        })))
    }

    async fn add_image(&self, args: &Value) -> Result<ToolOutput, SlidesError> {
        let args: AddImageArgs = parse_args(args)?;
        let source = ImageSource::parse(&args.source)?;
        let placed = self
            .service
            .add_image(
                &args.presentation.presentation_id,
                &args.slide_id,
                source,
                args.placement,
                args.caption.as_deref(),
            )
            .await?;
        Ok(ToolOutput::json(json!({
            "image_id": placed.object_id,
            "url": placed.url,
            "uploaded_file_id": placed.uploaded.map(|a| a.file_id),
        })))
    }

    fn get_presentation_url(&self, args: &Value) -> Result<ToolOutput, SlidesError> {
        let args: PresentationArgs = parse_args(args)?;
        let url = self.service.get_presentation_url(&args.presentation_id)?;
        Ok(ToolOutput::json(json!({ "url": url })))
    }

    async fn list_slides(&self, args: &Value) -> Result<ToolOutput, SlidesError> {
        let args: PresentationArgs = parse_args(args)?;
        let slides = self.service.list_slides(&args.presentation_id).await?;
        let summaries: Vec<Value> = slides.iter().map(slide_summary).collect();
        Ok(ToolOutput::json(json!({
            "slide_count": summaries.len(),
            "slides": summaries,
        })))
    }

    async fn apply_background_styling(&self, args: &Value) -> Result<ToolOutput, SlidesError> {
        let args: BackgroundArgs = parse_args(args)?;
        let color = args.color.as_deref().map(RgbColor::from_hex).transpose()?;
        let styled = self
            .service
            .apply_background_styling(&args.presentation.presentation_id, color)
            .await?;
        Ok(ToolOutput::json(json!({ "slides_styled": styled })))
    }
}

#[async_trait]
impl<A, U> ToolHandler for SlidesToolHandler<A, U>
where
    A: SlidesApi + 'static,
    U: AssetUploader + 'static,
{
    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            tool_catalog::create_presentation(),
            tool_catalog::add_slide(),
            tool_catalog::add_table(),
            tool_catalog::add_image(),
            tool_catalog::get_presentation_url(),
            tool_catalog::list_slides(),
            tool_catalog::apply_background_styling(),
        ]
    }

    async fn call(&self, name: &str, args: &Value) -> Result<ToolOutput, SlidesError> {
        match name {
            tool_catalog::CREATE_PRESENTATION => self.create_presentation(args).await,
            tool_catalog::ADD_SLIDE => self.add_slide(args).await,
            tool_catalog::ADD_TABLE => self.add_table(args).await,
            tool_catalog::ADD_IMAGE => self.add_image(args).await,
            tool_catalog::GET_PRESENTATION_URL => self.get_presentation_url(args),
            tool_catalog::LIST_SLIDES => self.list_slides(args).await,
            tool_catalog::APPLY_BACKGROUND_STYLING => self.apply_background_styling(args).await,
            other => Err(SlidesError::invalid(format!("unknown function: {}", other))),
        }
    }
}
