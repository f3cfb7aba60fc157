// Wire structures for the parts of the Slides v1 and Drive v3 responses we
// read, plus their mapping into core models. Fields we never look at are
// simply not declared.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::core::slides::{
    MasterTheme, PageElementSummary, PlaceholderKind, PlaceholderRef, PresentationDetails,
    SlideSnapshot, ThemeTemplate,
};

// =============================================================================
// SLIDES
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPresentation {
    pub presentation_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slides: Vec<ApiPage>,
    #[serde(default)]
    pub masters: Vec<ApiPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPage {
    pub object_id: String,
    #[serde(default)]
    pub page_elements: Vec<ApiPageElement>,
    #[serde(default)]
    pub page_properties: Option<ApiPageProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPageProperties {
    #[serde(default)]
    pub page_background_fill: Option<serde_json::Value>,
    #[serde(default)]
    pub color_scheme: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPageElement {
    pub object_id: String,
    #[serde(default)]
    pub shape: Option<ApiShape>,
}

#[derive(Debug, Deserialize)]
pub struct ApiShape {
    #[serde(default)]
    pub placeholder: Option<ApiPlaceholder>,
    #[serde(default)]
    pub text: Option<ApiTextContent>,
}

#[derive(Debug, Deserialize)]
pub struct ApiPlaceholder {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub index: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTextContent {
    #[serde(default)]
    pub text_elements: Vec<ApiTextElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTextElement {
    #[serde(default)]
    pub text_run: Option<ApiTextRun>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTextRun {
    #[serde(default)]
    pub content: Option<String>,
}

impl ApiPage {
    pub fn into_snapshot(self) -> SlideSnapshot {
        SlideSnapshot {
            slide_id: self.object_id,
            elements: self
                .page_elements
                .into_iter()
                .map(ApiPageElement::into_summary)
                .collect(),
        }
    }

    pub fn into_master(self) -> MasterTheme {
        let (background_fill, color_scheme) = match self.page_properties {
            Some(props) => (props.page_background_fill, props.color_scheme),
            None => (None, None),
        };
        MasterTheme {
            object_id: self.object_id,
            background_fill,
            color_scheme,
        }
    }
}

impl ApiPageElement {
    fn into_summary(self) -> PageElementSummary {
        let (placeholder, text) = match self.shape {
            Some(shape) => {
                let placeholder = shape.placeholder.map(|p| PlaceholderRef {
                    kind: PlaceholderKind::from(p.kind.as_str()),
                    index: p.index.unwrap_or(0),
                });
                let text = shape
                    .text
                    .map(|t| {
                        t.text_elements
                            .into_iter()
                            .filter_map(|e| e.text_run.and_then(|r| r.content))
                            .collect::<String>()
                    })
                    .unwrap_or_default();
                (placeholder, text)
            }
            None => (None, String::new()),
        };
        PageElementSummary {
            object_id: self.object_id,
            placeholder,
            text,
        }
    }
}

impl From<ApiPresentation> for PresentationDetails {
    fn from(api: ApiPresentation) -> Self {
        PresentationDetails {
            presentation_id: api.presentation_id,
            title: api.title.unwrap_or_default(),
            slides: api.slides.into_iter().map(ApiPage::into_snapshot).collect(),
            masters: api.masters.into_iter().map(ApiPage::into_master).collect(),
        }
    }
}

/// Error envelope shared by Google APIs: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}

/// Best human-readable message from an error response body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .map(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.chars().take(500).collect())
}

// =============================================================================
// DRIVE
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct DriveFile {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct DriveFileList {
    #[serde(default)]
    pub files: Vec<DriveListedFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveListedFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub modified_time: Option<String>,
}

impl From<DriveListedFile> for ThemeTemplate {
    fn from(file: DriveListedFile) -> Self {
        ThemeTemplate {
            id: file.id,
            name: file.name,
            modified: file
                .modified_time
                .as_deref()
                .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_presentation_maps_placeholders_and_text() {
        let api: ApiPresentation = serde_json::from_value(json!({
            "presentationId": "p1",
            "title": "Deck",
            "slides": [{
                "objectId": "s1",
                "pageElements": [
                    {
                        "objectId": "e1",
                        "shape": {
                            "placeholder": { "type": "CENTERED_TITLE" },
                            "text": { "textElements": [
                                { "paragraphMarker": {} },
                                { "textRun": { "content": "Q1 " } },
                                { "textRun": { "content": "Report\n" } }
                            ]}
                        }
                    },
                    { "objectId": "img", "image": {} }
                ]
            }],
            "masters": [{
                "objectId": "m1",
                "pageProperties": { "pageBackgroundFill": { "solidFill": {} } }
            }]
        }))
        .unwrap();

        let details = PresentationDetails::from(api);
        let slide = &details.slides[0];
        let title = slide.element("e1").unwrap();
        assert_eq!(title.text, "Q1 Report\n");
        assert_eq!(
            title.placeholder,
            Some(PlaceholderRef {
                kind: PlaceholderKind::CenteredTitle,
                index: 0
            })
        );
        assert!(slide.element("img").unwrap().placeholder.is_none());
        assert!(details.masters[0].background_fill.is_some());
        assert!(details.masters[0].color_scheme.is_none());
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error": {"code": 400, "message": "Invalid requests[0].insertText", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "Invalid requests[0].insertText");
        assert_eq!(error_message("plain failure"), "plain failure");
    }

    #[test]
    fn test_drive_file_to_theme() {
        let theme = ThemeTemplate::from(DriveListedFile {
            id: "t1".to_string(),
            name: "Blue Theme".to_string(),
            modified_time: Some("2024-03-01T12:00:00.000Z".to_string()),
        });
        assert_eq!(theme.modified.unwrap().to_rfc3339(), "2024-03-01T12:00:00+00:00");
    }
}
