// =============================================================================
// PAGE MUTATION REQUESTS
// =============================================================================
//
// Typed mirror of the subset of `presentations.batchUpdate` request kinds we
// emit. Serializing a `BatchRequest` produces exactly the JSON body the
// Slides API expects:
//
// ```json
// { "requests": [ { "createSlide": { "objectId": "...", ... } } ] }
// ```
//
// See: https://developers.google.com/slides/api/reference/rest/v1/presentations/request

use serde::Serialize;

use super::slides_models::{Placement, RgbColor};

/// Ordered list of atomic page mutations submitted in one API call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchRequest {
    pub requests: Vec<PageRequest>,
}

impl BatchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: PageRequest) {
        self.requests.push(request);
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PageRequest {
    CreateSlide {
        object_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        insertion_index: Option<u32>,
        slide_layout_reference: LayoutReference,
    },
    InsertText {
        object_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        cell_location: Option<TableCellLocation>,
        text: String,
        insertion_index: u32,
    },
    CreateParagraphBullets {
        object_id: String,
        text_range: TextRange,
        bullet_preset: String,
    },
    CreateTable {
        object_id: String,
        element_properties: PageElementProperties,
        rows: u32,
        columns: u32,
    },
    UpdateTextStyle {
        object_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        cell_location: Option<TableCellLocation>,
        style: TextStyle,
        text_range: TextRange,
        fields: String,
    },
    CreateImage {
        object_id: String,
        url: String,
        element_properties: PageElementProperties,
    },
    CreateShape {
        object_id: String,
        shape_type: String,
        element_properties: PageElementProperties,
    },
    UpdatePageProperties {
        object_id: String,
        page_properties: serde_json::Value,
        fields: String,
    },
}

impl PageRequest {
    /// Object the request creates or mutates.
    #[cfg(test)]
    pub fn object_id(&self) -> &str {
        match self {
            PageRequest::CreateSlide { object_id, .. }
            | PageRequest::InsertText { object_id, .. }
            | PageRequest::CreateParagraphBullets { object_id, .. }
            | PageRequest::CreateTable { object_id, .. }
            | PageRequest::UpdateTextStyle { object_id, .. }
            | PageRequest::CreateImage { object_id, .. }
            | PageRequest::CreateShape { object_id, .. }
            | PageRequest::UpdatePageProperties { object_id, .. } => object_id,
        }
    }

    pub fn background_fill(page_id: &str, color: RgbColor) -> Self {
        PageRequest::UpdatePageProperties {
            object_id: page_id.to_string(),
            page_properties: serde_json::json!({
                "pageBackgroundFill": {
                    "solidFill": { "color": { "rgbColor": color } }
                }
            }),
            fields: "pageBackgroundFill".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReference {
    pub predefined_layout: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCellLocation {
    pub row_index: u32,
    pub column_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RangeType {
    FixedRange,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    #[serde(rename = "type")]
    pub range_type: RangeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_index: Option<u32>,
}

impl TextRange {
    pub fn all() -> Self {
        Self {
            range_type: RangeType::All,
            start_index: None,
            end_index: None,
        }
    }

    pub fn fixed(start: u32, end: u32) -> Self {
        Self {
            range_type: RangeType::FixedRange,
            start_index: Some(start),
            end_index: Some(end),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub magnitude: f64,
    pub unit: &'static str,
}

impl Dimension {
    pub fn pt(magnitude: f64) -> Self {
        Self {
            magnitude,
            unit: "PT",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Size {
    pub width: Dimension,
    pub height: Dimension,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffineTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    pub unit: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageElementProperties {
    pub page_object_id: String,
    pub size: Size,
    pub transform: AffineTransform,
}

impl PageElementProperties {
    pub fn placed(page_object_id: &str, placement: Placement) -> Self {
        Self {
            page_object_id: page_object_id.to_string(),
            size: Size {
                width: Dimension::pt(placement.width),
                height: Dimension::pt(placement.height),
            },
            transform: AffineTransform {
                scale_x: 1.0,
                scale_y: 1.0,
                translate_x: placement.x,
                translate_y: placement.y,
                unit: "PT",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_slide_wire_shape() {
        let mut batch = BatchRequest::new();
        batch.push(PageRequest::CreateSlide {
            object_id: "title_abc".to_string(),
            insertion_index: None,
            slide_layout_reference: LayoutReference {
                predefined_layout: "TITLE".to_string(),
            },
        });

        let value = serde_json::to_value(&batch).unwrap();
        assert_eq!(
            value,
            json!({
                "requests": [{
                    "createSlide": {
                        "objectId": "title_abc",
                        "slideLayoutReference": { "predefinedLayout": "TITLE" }
                    }
                }]
            })
        );
    }

    #[test]
    fn test_bullet_range_uses_api_enum_names() {
        let request = PageRequest::CreateParagraphBullets {
            object_id: "body".to_string(),
            text_range: TextRange::fixed(0, 5),
            bullet_preset: "BULLET_DISC_CIRCLE_SQUARE".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value["createParagraphBullets"]["textRange"],
            json!({ "type": "FIXED_RANGE", "startIndex": 0, "endIndex": 5 })
        );
    }

    #[test]
    fn test_image_element_properties() {
        let request = PageRequest::CreateImage {
            object_id: "img".to_string(),
            url: "https://drive.google.com/uc?id=f1".to_string(),
            element_properties: PageElementProperties::placed("slide", Placement::IMAGE_DEFAULT),
        };
        let value = serde_json::to_value(&request).unwrap();
        let props = &value["createImage"]["elementProperties"];
        assert_eq!(props["pageObjectId"], "slide");
        assert_eq!(props["size"]["width"], json!({ "magnitude": 400.0, "unit": "PT" }));
        assert_eq!(props["transform"]["translateY"], 150.0);
    }

    #[test]
    fn test_background_fill_request() {
        let value =
            serde_json::to_value(PageRequest::background_fill("p1", RgbColor::SOFT_BACKGROUND))
                .unwrap();
        let update = &value["updatePageProperties"];
        assert_eq!(update["objectId"], "p1");
        assert_eq!(update["fields"], "pageBackgroundFill");
        assert_eq!(
            update["pageProperties"]["pageBackgroundFill"]["solidFill"]["color"]["rgbColor"]
                ["blue"],
            1.0
        );
    }
}
