pub mod chart_tools;
pub mod dispatcher;
pub mod slides_tools;
pub mod theme_tools;
pub mod tool_catalog;
pub mod tool_models;

pub use chart_tools::ChartToolHandler;
pub use dispatcher::ToolDispatcher;
pub use slides_tools::SlidesToolHandler;
pub use theme_tools::ThemeToolHandler;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::core::slides::slides_service::fakes::{FakeSlides, FakeUploader};
    use crate::core::slides::{
        PresentationRegistry, SlidesError, SlidesService, ThemeCatalog, ThemeService,
        ThemeTemplate,
    };

    pub struct NoThemes;

    #[async_trait]
    impl ThemeCatalog for NoThemes {
        async fn list_themes(&self) -> Result<Vec<ThemeTemplate>, SlidesError> {
            Ok(Vec::new())
        }

        async fn find_by_name(&self, _name: &str) -> Result<Option<ThemeTemplate>, SlidesError> {
            Ok(None)
        }
    }

    /// Dispatcher over in-memory fakes, wired the way `main` wires the real one.
    pub fn dispatcher(slides: Arc<FakeSlides>) -> ToolDispatcher {
        let registry = Arc::new(PresentationRegistry::new());
        let service = Arc::new(SlidesService::new(
            slides.clone(),
            Arc::new(FakeUploader::default()),
            registry.clone(),
        ));
        let themes = ThemeService::new(slides, NoThemes, registry);
        ToolDispatcher::new(vec![
            Arc::new(SlidesToolHandler::new(service.clone())),
            Arc::new(ChartToolHandler::new(service)),
            Arc::new(ThemeToolHandler::new(themes)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use serde_json::json;

    use super::test_support::dispatcher;
    use crate::core::slides::slides_service::fakes::FakeSlides;

    #[test]
    fn test_every_tool_is_advertised_once() {
        let dispatcher = dispatcher(Arc::new(FakeSlides::default()));
        let names: Vec<&str> = dispatcher.list().iter().map(|t| t.name.as_str()).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), 13);
        assert_eq!(unique.len(), names.len());
        for required in ["create_presentation", "add_slide", "add_table", "add_image", "add_chart"] {
            assert!(unique.contains(required), "{} missing", required);
        }
    }

    #[tokio::test]
    async fn test_every_advertised_tool_is_routed() {
        let slides = Arc::new(FakeSlides::default());
        let dispatcher = dispatcher(slides.clone());
        let names: Vec<String> = dispatcher.list().iter().map(|t| t.name.clone()).collect();
        for name in names {
            // Empty arguments: every tool either runs or reports a tool error,
            // none is an unknown tool.
            let result = dispatcher.dispatch(&name, &json!({})).await;
            assert!(result.is_ok(), "{} not routed", name);
        }
        assert!(slides.batches().is_empty());
    }

    #[tokio::test]
    async fn test_missing_argument_sends_no_batch() {
        let slides = Arc::new(FakeSlides::with_slide("s1", vec![]));
        let dispatcher = dispatcher(slides.clone());
        let result = dispatcher
            .dispatch("add_chart", &json!({ "presentation_id": "deck1", "slide_id": "s1" }))
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(slides.batches().is_empty());
    }
}
