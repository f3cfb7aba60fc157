use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;

use super::page_requests::BatchRequest;
use super::presentation_registry::PresentationRegistry;
use super::request_builder::{self, TextInsertion};
use super::slides_error::SlidesError;
use super::slides_models::{
    AssetReference, Placement, PresentationDetails, PresentationHandle, RgbColor, SlideSnapshot,
    SlideSpec,
};
use crate::core::charts::{ChartImageArtifact, ChartRenderer, ChartSpec};

/// Remote presentation operations the service needs. Implemented over HTTP in
/// the infra layer and by in-memory fakes in tests.
#[async_trait]
pub trait SlidesApi: Send + Sync {
    async fn create_presentation(&self, title: &str) -> Result<PresentationDetails, SlidesError>;

    async fn get_presentation(
        &self,
        presentation: &PresentationHandle,
    ) -> Result<PresentationDetails, SlidesError>;

    /// Fetches one slide. `Ok(None)` means the page does not exist.
    async fn get_page(
        &self,
        presentation: &PresentationHandle,
        page_id: &str,
    ) -> Result<Option<SlideSnapshot>, SlidesError>;

    async fn batch_update(
        &self,
        presentation: &PresentationHandle,
        batch: &BatchRequest,
    ) -> Result<(), SlidesError>;
}

#[async_trait]
impl<T: SlidesApi + ?Sized> SlidesApi for Arc<T> {
    async fn create_presentation(&self, title: &str) -> Result<PresentationDetails, SlidesError> {
        (**self).create_presentation(title).await
    }

    async fn get_presentation(
        &self,
        presentation: &PresentationHandle,
    ) -> Result<PresentationDetails, SlidesError> {
        (**self).get_presentation(presentation).await
    }

    async fn get_page(
        &self,
        presentation: &PresentationHandle,
        page_id: &str,
    ) -> Result<Option<SlideSnapshot>, SlidesError> {
        (**self).get_page(presentation, page_id).await
    }

    async fn batch_update(
        &self,
        presentation: &PresentationHandle,
        batch: &BatchRequest,
    ) -> Result<(), SlidesError> {
        (**self).batch_update(presentation, batch).await
    }
}

/// Pushes a binary asset somewhere publicly readable.
///
/// One call is one upload: identical bytes uploaded twice give two distinct
/// references. Failures surface as `UploadFailure` and are not retried.
#[async_trait]
pub trait AssetUploader: Send + Sync {
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<AssetReference, SlidesError>;
}

#[async_trait]
impl<T: AssetUploader + ?Sized> AssetUploader for Arc<T> {
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<AssetReference, SlidesError> {
        (**self).upload(file_name, content_type, bytes).await
    }
}

/// Where an image comes from: a URL the Slides API can fetch itself, or
/// inline bytes that must be uploaded first.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Url(String),
    Inline { content_type: String, bytes: Vec<u8> },
}

impl ImageSource {
    /// Accepts `http(s)://` URLs and `data:image/...;base64,` URIs.
    pub fn parse(source: &str) -> Result<Self, SlidesError> {
        let source = source.trim();
        if source.starts_with("https://") || source.starts_with("http://") {
            return Ok(ImageSource::Url(source.to_string()));
        }

        let Some(rest) = source.strip_prefix("data:") else {
            return Err(SlidesError::invalid(
                "image source must be an http(s) URL or a base64 data: URI",
            ));
        };
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| SlidesError::invalid("data: URI has no payload"))?;
        let content_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| SlidesError::invalid("data: URI must be base64 encoded"))?;
        if !content_type.starts_with("image/") {
            return Err(SlidesError::invalid(format!(
                "data: URI has content type '{}', expected image/*",
                content_type
            )));
        }
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| SlidesError::invalid(format!("data: URI is not valid base64: {}", e)))?;
        if bytes.is_empty() {
            return Err(SlidesError::invalid("data: URI payload is empty"));
        }

        Ok(ImageSource::Inline {
            content_type: content_type.to_string(),
            bytes,
        })
    }
}

/// Result of `create_presentation`.
#[derive(Debug, Clone)]
pub struct CreatedPresentation {
    pub handle: PresentationHandle,
    pub title: String,
    pub url: String,
}

/// Result of `add_slide`.
#[derive(Debug, Clone)]
pub struct SlideCreated {
    pub slide_id: String,
    pub filled: Vec<TextInsertion>,
}

/// Result of `add_image`.
#[derive(Debug, Clone)]
pub struct PlacedImage {
    pub object_id: String,
    pub url: String,
    pub uploaded: Option<AssetReference>,
}

/// Result of `add_chart`. Keeps the artifact so callers can echo it back.
#[derive(Debug, Clone)]
pub struct PlacedChart {
    pub object_id: String,
    pub asset: AssetReference,
    pub artifact: ChartImageArtifact,
}

/// Orchestrates the tool operations against a presentation: validates the
/// intent, builds the batch, submits it and checks the outcome.
pub struct SlidesService<A: SlidesApi, U: AssetUploader> {
    api: A,
    uploader: U,
    renderer: ChartRenderer,
    registry: Arc<PresentationRegistry>,
}

impl<A, U> SlidesService<A, U>
where
    A: SlidesApi,
    U: AssetUploader,
{
    pub fn new(api: A, uploader: U, registry: Arc<PresentationRegistry>) -> Self {
        Self {
            api,
            uploader,
            renderer: ChartRenderer::new(),
            registry,
        }
    }

    pub fn resolve(&self, presentation: &str) -> Result<PresentationHandle, SlidesError> {
        self.registry.resolve(presentation)
    }

    /// Creates an empty presentation and remembers it under its title.
    pub async fn create_presentation(&self, title: &str) -> Result<CreatedPresentation, SlidesError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SlidesError::invalid("presentation title must not be empty"));
        }

        let details = self.api.create_presentation(title).await?;
        let handle = PresentationHandle::new(details.presentation_id);
        self.registry.register(title, handle.clone());

        tracing::info!(presentation_id = %handle, title, "Created presentation");
        Ok(CreatedPresentation {
            url: handle.edit_url(),
            handle,
            title: title.to_string(),
        })
    }

    pub fn get_presentation_url(&self, presentation: &str) -> Result<String, SlidesError> {
        Ok(self.resolve(presentation)?.edit_url())
    }

    pub async fn list_slides(&self, presentation: &str) -> Result<Vec<SlideSnapshot>, SlidesError> {
        let handle = self.resolve(presentation)?;
        Ok(self.api.get_presentation(&handle).await?.slides)
    }

    /// Creates a slide and fills its placeholders.
    ///
    /// Two batches are needed because placeholder IDs only exist once the
    /// slide does. After the content batch the slide is fetched again and
    /// every inserted text must be present, otherwise `SilentNoOp`.
    pub async fn add_slide(
        &self,
        presentation: &str,
        spec: SlideSpec,
    ) -> Result<SlideCreated, SlidesError> {
        let handle = self.resolve(presentation)?;

        let (slide_id, create) = request_builder::build_create_slide(&spec)?;
        self.api.batch_update(&handle, &create).await?;
        tracing::debug!(presentation_id = %handle, slide_id = %slide_id, kind = ?spec.kind, "Slide created");

        let snapshot = self.fetch_slide(&handle, &slide_id).await?;
        let content = request_builder::build_slide_content(&spec, &snapshot)?;
        if content.batch.is_empty() {
            return Ok(SlideCreated {
                slide_id,
                filled: Vec::new(),
            });
        }

        self.api.batch_update(&handle, &content.batch).await?;
        self.verify_insertions(&handle, &slide_id, &content.insertions)
            .await?;

        tracing::info!(
            presentation_id = %handle,
            slide_id = %slide_id,
            requests = content.batch.len(),
            "Slide content inserted"
        );
        Ok(SlideCreated {
            slide_id,
            filled: content.insertions,
        })
    }

    pub async fn add_table(
        &self,
        presentation: &str,
        slide_id: &str,
        rows: &[Vec<String>],
        header_row: bool,
        placement: Option<Placement>,
    ) -> Result<String, SlidesError> {
        let handle = self.resolve(presentation)?;
        let (table_id, batch) = request_builder::build_table(
            slide_id,
            rows,
            header_row,
            placement.unwrap_or(Placement::TABLE_DEFAULT),
        )?;

        self.fetch_slide(&handle, slide_id).await?;
        self.api.batch_update(&handle, &batch).await?;

        tracing::info!(presentation_id = %handle, slide_id, table_id = %table_id, rows = rows.len(), "Table added");
        Ok(table_id)
    }

    /// Places an image. Inline bytes are uploaded first; URLs are used as-is.
    pub async fn add_image(
        &self,
        presentation: &str,
        slide_id: &str,
        source: ImageSource,
        placement: Option<Placement>,
        caption: Option<&str>,
    ) -> Result<PlacedImage, SlidesError> {
        let handle = self.resolve(presentation)?;
        let placement = placement.unwrap_or(Placement::IMAGE_DEFAULT);
        placement.validate()?;
        self.fetch_slide(&handle, slide_id).await?;

        let (url, uploaded) = match source {
            ImageSource::Url(url) => (url, None),
            ImageSource::Inline {
                content_type,
                bytes,
            } => {
                let name = format!("image_{}", request_builder::generate_object_id("asset"));
                let asset = self.uploader.upload(&name, &content_type, &bytes).await?;
                (asset.url.clone(), Some(asset))
            }
        };

        let (object_id, batch) = request_builder::build_image(slide_id, &url, placement, caption)?;
        self.api.batch_update(&handle, &batch).await?;

        tracing::info!(presentation_id = %handle, slide_id, object_id = %object_id, "Image added");
        Ok(PlacedImage {
            object_id,
            url,
            uploaded,
        })
    }

    /// Renders a chart, uploads it and places it in exactly one batch.
    ///
    /// Rendering happens before any remote call, so bad specs never reach
    /// Drive or Slides.
    pub async fn add_chart(
        &self,
        presentation: &str,
        slide_id: &str,
        spec: &ChartSpec,
        placement: Option<Placement>,
        caption: Option<&str>,
    ) -> Result<PlacedChart, SlidesError> {
        let handle = self.resolve(presentation)?;
        let placement = placement.unwrap_or(Placement::IMAGE_DEFAULT);
        placement.validate()?;
        let artifact = self.renderer.render(spec)?;

        self.fetch_slide(&handle, slide_id).await?;

        let file_name = format!("{}_chart_{}.png", spec.chart_type, slide_id);
        let asset = self
            .uploader
            .upload(&file_name, artifact.content_type, &artifact.bytes)
            .await?;

        let caption = match caption {
            Some(text) => Some(text.to_string()),
            None if spec.title.is_some() => Some(spec.default_caption()),
            None => None,
        };
        let (object_id, batch) =
            request_builder::build_image(slide_id, &asset.url, placement, caption.as_deref())?;
        self.api.batch_update(&handle, &batch).await?;

        tracing::info!(
            presentation_id = %handle,
            slide_id,
            chart_type = %spec.chart_type,
            file_id = %asset.file_id,
            "Chart added"
        );
        Ok(PlacedChart {
            object_id,
            asset,
            artifact,
        })
    }

    /// Solid background on every slide. Returns how many slides were styled.
    pub async fn apply_background_styling(
        &self,
        presentation: &str,
        color: Option<RgbColor>,
    ) -> Result<usize, SlidesError> {
        let handle = self.resolve(presentation)?;
        let details = self.api.get_presentation(&handle).await?;
        let slide_ids: Vec<String> = details.slides.into_iter().map(|s| s.slide_id).collect();
        if slide_ids.is_empty() {
            return Ok(0);
        }

        let batch = request_builder::build_background(
            &slide_ids,
            color.unwrap_or(RgbColor::SOFT_BACKGROUND),
        );
        self.api.batch_update(&handle, &batch).await?;

        tracing::info!(presentation_id = %handle, slides = slide_ids.len(), "Background styling applied");
        Ok(slide_ids.len())
    }

    async fn fetch_slide(
        &self,
        handle: &PresentationHandle,
        slide_id: &str,
    ) -> Result<SlideSnapshot, SlidesError> {
        self.api
            .get_page(handle, slide_id)
            .await?
            .ok_or_else(|| SlidesError::SlideNotFound(slide_id.to_string()))
    }

    async fn verify_insertions(
        &self,
        handle: &PresentationHandle,
        slide_id: &str,
        insertions: &[TextInsertion],
    ) -> Result<(), SlidesError> {
        let after = self.fetch_slide(handle, slide_id).await?;
        for insertion in insertions {
            let visible = after
                .element(&insertion.object_id)
                .is_some_and(|e| normalize(&e.text).contains(&normalize(&insertion.text)));
            if !visible {
                tracing::warn!(
                    presentation_id = %handle,
                    slide_id,
                    object_id = %insertion.object_id,
                    "Batch accepted but inserted text is missing"
                );
                return Err(SlidesError::SilentNoOp {
                    slide_id: slide_id.to_string(),
                    object_id: insertion.object_id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Bullets swallow leading tabs and the API appends a final newline, so
/// compare without either.
fn normalize(text: &str) -> String {
    text.replace('\t', "").trim().to_string()
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::core::slides::page_requests::PageRequest;
    use crate::core::slides::slides_models::{
        MasterTheme, PageElementSummary, PlaceholderKind, PlaceholderRef,
    };

    /// In-memory presentation store that applies the subset of requests that
    /// affect placeholders and records every batch it receives.
    #[derive(Default)]
    pub struct FakeSlides {
        pub pages: Mutex<HashMap<String, SlideSnapshot>>,
        pub batches: Mutex<Vec<BatchRequest>>,
        pub masters: Mutex<HashMap<String, Vec<MasterTheme>>>,
        /// Accept `insertText` but do not apply it.
        pub drop_text: bool,
    }

    impl FakeSlides {
        pub fn with_slide(slide_id: &str, elements: Vec<PageElementSummary>) -> Self {
            let fake = Self::default();
            fake.pages.lock().unwrap().insert(
                slide_id.to_string(),
                SlideSnapshot {
                    slide_id: slide_id.to_string(),
                    elements,
                },
            );
            fake
        }

        pub fn batches(&self) -> Vec<BatchRequest> {
            self.batches.lock().unwrap().clone()
        }

        fn layout_elements(slide_id: &str, layout: &str) -> Vec<PageElementSummary> {
            let kinds: Vec<(PlaceholderKind, u32)> = match layout {
                "TITLE" => vec![(PlaceholderKind::CenteredTitle, 0), (PlaceholderKind::Subtitle, 0)],
                "SECTION_HEADER" => vec![(PlaceholderKind::Title, 0), (PlaceholderKind::Body, 0)],
                "TITLE_AND_BODY" => vec![(PlaceholderKind::Title, 0), (PlaceholderKind::Body, 0)],
                "TITLE_AND_TWO_COLUMNS" => vec![
                    (PlaceholderKind::Title, 0),
                    (PlaceholderKind::Body, 1),
                    (PlaceholderKind::Body, 2),
                ],
                _ => vec![(PlaceholderKind::Title, 0)],
            };
            kinds
                .into_iter()
                .enumerate()
                .map(|(i, (kind, index))| PageElementSummary {
                    object_id: format!("{}_ph{}", slide_id, i),
                    placeholder: Some(PlaceholderRef { kind, index }),
                    text: String::new(),
                })
                .collect()
        }
    }

    #[async_trait]
    impl SlidesApi for FakeSlides {
        async fn create_presentation(
            &self,
            title: &str,
        ) -> Result<PresentationDetails, SlidesError> {
            Ok(PresentationDetails {
                presentation_id: format!("pres_{}", title.len()),
                title: title.to_string(),
                ..Default::default()
            })
        }

        async fn get_presentation(
            &self,
            presentation: &PresentationHandle,
        ) -> Result<PresentationDetails, SlidesError> {
            let mut slides: Vec<SlideSnapshot> =
                self.pages.lock().unwrap().values().cloned().collect();
            slides.sort_by(|a, b| a.slide_id.cmp(&b.slide_id));
            Ok(PresentationDetails {
                presentation_id: presentation.to_string(),
                title: "Deck".to_string(),
                slides,
                masters: self
                    .masters
                    .lock()
                    .unwrap()
                    .get(presentation.as_str())
                    .cloned()
                    .unwrap_or_default(),
            })
        }

        async fn get_page(
            &self,
            _presentation: &PresentationHandle,
            page_id: &str,
        ) -> Result<Option<SlideSnapshot>, SlidesError> {
            Ok(self.pages.lock().unwrap().get(page_id).cloned())
        }

        async fn batch_update(
            &self,
            _presentation: &PresentationHandle,
            batch: &BatchRequest,
        ) -> Result<(), SlidesError> {
            let mut pages = self.pages.lock().unwrap();
            for request in &batch.requests {
                match request {
                    PageRequest::CreateSlide {
                        object_id,
                        slide_layout_reference,
                        ..
                    } => {
                        pages.insert(
                            object_id.clone(),
                            SlideSnapshot {
                                slide_id: object_id.clone(),
                                elements: Self::layout_elements(
                                    object_id,
                                    &slide_layout_reference.predefined_layout,
                                ),
                            },
                        );
                    }
                    PageRequest::InsertText {
                        object_id,
                        cell_location: None,
                        text,
                        ..
                    } if !self.drop_text => {
                        for page in pages.values_mut() {
                            if let Some(element) =
                                page.elements.iter_mut().find(|e| &e.object_id == object_id)
                            {
                                element.text.push_str(text);
                                element.text.push('\n');
                            }
                        }
                    }
                    _ => {}
                }
            }
            self.batches.lock().unwrap().push(batch.clone());
            Ok(())
        }
    }

    /// Uploader that hands out a new file ID per call.
    #[derive(Default)]
    pub struct FakeUploader {
        pub count: AtomicUsize,
        pub fail: bool,
    }

    #[async_trait]
    impl AssetUploader for FakeUploader {
        async fn upload(
            &self,
            _file_name: &str,
            _content_type: &str,
            bytes: &[u8],
        ) -> Result<AssetReference, SlidesError> {
            if self.fail {
                return Err(SlidesError::UploadFailure("quota exceeded".to_string()));
            }
            assert!(!bytes.is_empty());
            let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(AssetReference::from_drive_file(format!("file{}", n)))
        }
    }
}
