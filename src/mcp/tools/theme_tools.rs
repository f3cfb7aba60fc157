use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::dispatcher::{parse_args, ToolHandler};
use super::slides_tools::PresentationArgs;
use super::tool_catalog;
use super::tool_models::{ToolDefinition, ToolOutput};
use crate::core::slides::{SlidesApi, SlidesError, ThemeApplied, ThemeCatalog, ThemeService};

#[derive(Debug, Deserialize)]
struct ThemeFromPresentationArgs {
    #[serde(flatten)]
    presentation: PresentationArgs,
    #[serde(alias = "source_presentation", alias = "theme_presentation_id")]
    source_presentation_id: String,
}

#[derive(Debug, Deserialize)]
struct ThemeByNameArgs {
    #[serde(flatten)]
    presentation: PresentationArgs,
    #[serde(alias = "theme")]
    theme_name: String,
}

fn applied_payload(applied: &ThemeApplied) -> Value {
    json!({
        "source_presentation_id": applied.source_id,
        "source_name": applied.source_name,
        "masters_updated": applied.masters_updated,
    })
}

pub struct ThemeToolHandler<A: SlidesApi, C: ThemeCatalog> {
    service: ThemeService<A, C>,
}

impl<A, C> ThemeToolHandler<A, C>
where
    A: SlidesApi,
    C: ThemeCatalog,
{
    pub fn new(service: ThemeService<A, C>) -> Self {
        Self { service }
    }

    async fn list_available_themes(&self) -> Result<ToolOutput, SlidesError> {
        let themes = self.service.list_available_themes().await?;
        let themes: Vec<Value> = themes
            .iter()
            .map(|t| {
                json!({
                    "id": t.id,
                    "name": t.name,
                    "modified": t.modified.map(|m| m.to_rfc3339()),
                })
            })
            .collect();
        Ok(ToolOutput::json(json!({ "count": themes.len(), "themes": themes })))
    }

    async fn apply_theme_from_presentation(&self, args: &Value) -> Result<ToolOutput, SlidesError> {
        let args: ThemeFromPresentationArgs = parse_args(args)?;
        let applied = self
            .service
            .apply_theme_from_presentation(
                &args.presentation.presentation_id,
                &args.source_presentation_id,
            )
            .await?;
        Ok(ToolOutput::json(applied_payload(&applied)))
    }

    async fn apply_theme_by_name(&self, args: &Value) -> Result<ToolOutput, SlidesError> {
        let args: ThemeByNameArgs = parse_args(args)?;
        let applied = self
            .service
            .apply_theme_by_name(&args.presentation.presentation_id, &args.theme_name)
            .await?;
        Ok(ToolOutput::json(applied_payload(&applied)))
    }
}

#[async_trait]
impl<A, C> ToolHandler for ThemeToolHandler<A, C>
where
    A: SlidesApi + 'static,
    C: ThemeCatalog + 'static,
{
    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            tool_catalog::list_available_themes(),
            tool_catalog::apply_theme_from_presentation(),
            tool_catalog::apply_theme_by_name(),
        ]
    }

    async fn call(&self, name: &str, args: &Value) -> Result<ToolOutput, SlidesError> {
        match name {
            tool_catalog::LIST_AVAILABLE_THEMES => self.list_available_themes().await,
            tool_catalog::APPLY_THEME_FROM_PRESENTATION => {
                self.apply_theme_from_presentation(args).await
            }
            tool_catalog::APPLY_THEME_BY_NAME => self.apply_theme_by_name(args).await,
            other => Err(SlidesError::invalid(format!("unknown function: {}", other))),
        }
    }
}
