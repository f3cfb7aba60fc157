use std::sync::Arc;

use async_trait::async_trait;

use super::presentation_registry::PresentationRegistry;
use super::request_builder;
use super::slides_error::SlidesError;
use super::slides_models::{PresentationHandle, ThemeTemplate};
use super::slides_service::SlidesApi;

/// Source of presentations that can be used as themes (Drive in production).
#[async_trait]
pub trait ThemeCatalog: Send + Sync {
    /// Presentations whose name mentions "theme" or "template", newest first.
    async fn list_themes(&self) -> Result<Vec<ThemeTemplate>, SlidesError>;

    /// First presentation whose name contains `name`, newest first.
    async fn find_by_name(&self, name: &str) -> Result<Option<ThemeTemplate>, SlidesError>;
}

#[async_trait]
impl<T: ThemeCatalog + ?Sized> ThemeCatalog for Arc<T> {
    async fn list_themes(&self) -> Result<Vec<ThemeTemplate>, SlidesError> {
        (**self).list_themes().await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ThemeTemplate>, SlidesError> {
        (**self).find_by_name(name).await
    }
}

/// Outcome of a theme copy.
#[derive(Debug, Clone)]
pub struct ThemeApplied {
    pub source_id: String,
    pub source_name: Option<String>,
    pub masters_updated: usize,
}

/// Copies master-page styling between presentations.
pub struct ThemeService<A: SlidesApi, C: ThemeCatalog> {
    api: A,
    catalog: C,
    registry: Arc<PresentationRegistry>,
}

impl<A, C> ThemeService<A, C>
where
    A: SlidesApi,
    C: ThemeCatalog,
{
    pub fn new(api: A, catalog: C, registry: Arc<PresentationRegistry>) -> Self {
        Self {
            api,
            catalog,
            registry,
        }
    }

    pub async fn list_available_themes(&self) -> Result<Vec<ThemeTemplate>, SlidesError> {
        self.catalog.list_themes().await
    }

    /// Copies the source's first master background and colour scheme onto
    /// every master of the target.
    pub async fn apply_theme_from_presentation(
        &self,
        presentation: &str,
        source_presentation: &str,
    ) -> Result<ThemeApplied, SlidesError> {
        let target = self.registry.resolve(presentation)?;
        let source = self.registry.resolve(source_presentation)?;
        self.copy_theme(&target, &source, None).await
    }

    pub async fn apply_theme_by_name(
        &self,
        presentation: &str,
        theme_name: &str,
    ) -> Result<ThemeApplied, SlidesError> {
        let target = self.registry.resolve(presentation)?;
        let theme = self
            .catalog
            .find_by_name(theme_name.trim())
            .await?
            .ok_or_else(|| SlidesError::invalid(format!("no theme named '{}' found", theme_name)))?;

        tracing::debug!(theme_id = %theme.id, theme_name = %theme.name, "Resolved theme by name");
        self.copy_theme(&target, &PresentationHandle::new(theme.id), Some(theme.name))
            .await
    }

    async fn copy_theme(
        &self,
        target: &PresentationHandle,
        source: &PresentationHandle,
        source_name: Option<String>,
    ) -> Result<ThemeApplied, SlidesError> {
        let source_details = self.api.get_presentation(source).await?;
        let source_master = source_details.masters.first().ok_or_else(|| {
            SlidesError::invalid(format!("presentation {} has no master pages", source))
        })?;
        let target_details = self.api.get_presentation(target).await?;

        let batch = request_builder::build_theme_copy(source_master, &target_details.masters)?;
        self.api.batch_update(target, &batch).await?;

        tracing::info!(
            presentation_id = %target,
            source_id = %source,
            masters = target_details.masters.len(),
            "Theme applied"
        );
        Ok(ThemeApplied {
            source_id: source.to_string(),
            source_name,
            masters_updated: target_details.masters.len(),
        })
    }
}
