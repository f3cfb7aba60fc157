pub mod page_requests;
pub mod presentation_registry;
pub mod request_builder;
pub mod slides_error;
pub mod slides_models;
pub mod slides_service;
pub mod theme_service;

pub use page_requests::BatchRequest;
pub use presentation_registry::PresentationRegistry;
pub use slides_error::SlidesError;
pub use slides_models::{
    AssetReference, BlockRole, ContentBlock, MasterTheme, PageElementSummary, PlaceholderKind,
    PlaceholderRef, Placement, PresentationDetails, PresentationHandle, RgbColor, SlideKind,
    SlideSnapshot, SlideSpec, ThemeTemplate,
};
pub use slides_service::{
    AssetUploader, ImageSource, PlacedChart, SlidesApi, SlidesService,
};
pub use theme_service::{ThemeApplied, ThemeCatalog, ThemeService};
