// Slide Request Builder
//
// Turns high-level intents into `BatchRequest`s. It is pure: every remote
// fact it needs (placeholder IDs, master pages) is handed in as a snapshot
// fetched by the service just before building.
//
// Placeholder IDs are resolved against that snapshot up front. A missing
// placeholder is an error here rather than an `insertText` the API would
// accept and then ignore.

use rand::distributions::Alphanumeric;
use rand::Rng;

use super::page_requests::{
    BatchRequest, LayoutReference, PageElementProperties, PageRequest, TableCellLocation,
    TextRange, TextStyle,
};
use super::slides_error::SlidesError;
use super::slides_models::{
    BlockRole, MasterTheme, PlaceholderKind, Placement, RgbColor, SlideKind, SlideSnapshot,
    SlideSpec,
};

const BULLET_PRESET: &str = "BULLET_DISC_CIRCLE_SQUARE";
const OBJECT_ID_SUFFIX_LEN: usize = 12;

/// Generates a fresh object ID such as `title_k3J9aQ0zXw1B`.
///
/// Submitting the same intent twice therefore creates two objects, never an
/// update.
pub fn generate_object_id(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(OBJECT_ID_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{}_{}", prefix, suffix)
}

/// A piece of text the builder asked the API to insert. The service checks
/// these after submission to detect silent no-ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInsertion {
    pub object_id: String,
    pub text: String,
}

/// Content batch for a freshly created slide.
#[derive(Debug)]
pub struct SlideContentBatch {
    pub batch: BatchRequest,
    pub insertions: Vec<TextInsertion>,
}

const TITLE_SLOTS: &[PlaceholderKind] = &[PlaceholderKind::Title, PlaceholderKind::CenteredTitle];
const SUBTITLE_SLOTS: &[PlaceholderKind] = &[PlaceholderKind::Subtitle];
const BODY_SLOTS: &[PlaceholderKind] = &[PlaceholderKind::Body];
const SECTION_SUBTITLE_SLOTS: &[PlaceholderKind] =
    &[PlaceholderKind::Body, PlaceholderKind::Subtitle];

/// Builds `createSlide` for a spec. Returns the new slide's object ID.
///
/// Blocks the layout has no slot for are rejected here, before the slide
/// exists remotely.
pub fn build_create_slide(spec: &SlideSpec) -> Result<(String, BatchRequest), SlidesError> {
    if let Some(block) = spec
        .blocks
        .iter()
        .find(|b| !b.text.trim().is_empty() && !spec.kind.accepts(b.role))
    {
        return Err(SlidesError::invalid(format!(
            "a {:?} slide has no '{}' slot (layout {})",
            spec.kind,
            block.role.as_str(),
            spec.kind.layout()
        )));
    }

    let slide_id = generate_object_id(spec.kind.id_prefix());
    let mut batch = BatchRequest::new();
    batch.push(PageRequest::CreateSlide {
        object_id: slide_id.clone(),
        insertion_index: spec.insertion_index,
        slide_layout_reference: LayoutReference {
            predefined_layout: spec.kind.layout().to_string(),
        },
    });
    Ok((slide_id, batch))
}

/// Builds the text (and bullet) requests that fill a slide's placeholders.
pub fn build_slide_content(
    spec: &SlideSpec,
    snapshot: &SlideSnapshot,
) -> Result<SlideContentBatch, SlidesError> {
    let mut batch = BatchRequest::new();
    let mut insertions = Vec::new();
    let mut bullets = Vec::new();

    for block in &spec.blocks {
        if block.text.trim().is_empty() {
            continue;
        }

        let (slots, position) = match (spec.kind, block.role) {
            (_, BlockRole::Title) => (TITLE_SLOTS, 0),
            (SlideKind::Section, BlockRole::Subtitle) => (SECTION_SUBTITLE_SLOTS, 0),
            (_, BlockRole::Subtitle) => (SUBTITLE_SLOTS, 0),
            (_, BlockRole::Body) | (_, BlockRole::LeftColumn) => (BODY_SLOTS, 0),
            (_, BlockRole::RightColumn) => (BODY_SLOTS, 1),
        };

        let candidates = snapshot.placeholders(slots);
        let target = candidates
            .get(position)
            .ok_or_else(|| SlidesError::PlaceholderNotFound {
                slide_id: snapshot.slide_id.clone(),
                placeholder: slots[0].clone(),
            })?;

        let text = block.text.trim_end_matches('\n').to_string();
        batch.push(PageRequest::InsertText {
            object_id: target.object_id.clone(),
            cell_location: None,
            text: text.clone(),
            insertion_index: 0,
        });

        if spec.kind == SlideKind::Content && block.role == BlockRole::Body {
            bullets.extend(bullet_requests(&target.object_id, &text));
        }

        insertions.push(TextInsertion {
            object_id: target.object_id.clone(),
            text,
        });
    }

    // Bullets go after all insertions so their ranges refer to final text.
    for request in bullets {
        batch.push(request);
    }

    Ok(SlideContentBatch { batch, insertions })
}

/// One bullet request per non-blank line, last line first.
///
/// `createParagraphBullets` strips leading tabs (turning them into nesting),
/// which shifts every later index. Emitting in reverse keeps each range valid.
/// Indices count UTF-16 code units, as the Slides API does.
fn bullet_requests(object_id: &str, text: &str) -> Vec<PageRequest> {
    let mut ranges = Vec::new();
    let mut start: u32 = 0;

    for line in text.split('\n') {
        let full_len = utf16_len(line);
        let visible_len = utf16_len(line.trim_end());
        if !line.trim().is_empty() {
            ranges.push((start, start + visible_len));
        }
        start += full_len + 1;
    }

    ranges
        .into_iter()
        .rev()
        .map(|(start, end)| PageRequest::CreateParagraphBullets {
            object_id: object_id.to_string(),
            text_range: TextRange::fixed(start, end),
            bullet_preset: BULLET_PRESET.to_string(),
        })
        .collect()
}

fn utf16_len(s: &str) -> u32 {
    s.encode_utf16().count() as u32
}

/// Builds a table with one `insertText` per non-empty cell.
///
/// With `header_row`, the first row is bolded.
pub fn build_table(
    slide_id: &str,
    rows: &[Vec<String>],
    header_row: bool,
    placement: Placement,
) -> Result<(String, BatchRequest), SlidesError> {
    let columns = rows.first().map(|r| r.len()).unwrap_or(0);
    if rows.is_empty() || columns == 0 {
        return Err(SlidesError::invalid("table needs at least one row and one column"));
    }
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns) {
        return Err(SlidesError::invalid(format!(
            "row {} has {} cells, expected {}",
            i,
            row.len(),
            columns
        )));
    }
    placement.validate()?;

    let table_id = generate_object_id("tbl");
    let mut batch = BatchRequest::new();
    batch.push(PageRequest::CreateTable {
        object_id: table_id.clone(),
        element_properties: PageElementProperties::placed(slide_id, placement),
        rows: rows.len() as u32,
        columns: columns as u32,
    });

    for (row_index, row) in rows.iter().enumerate() {
        for (column_index, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let location = TableCellLocation {
                row_index: row_index as u32,
                column_index: column_index as u32,
            };
            batch.push(PageRequest::InsertText {
                object_id: table_id.clone(),
                cell_location: Some(location),
                text: cell.clone(),
                insertion_index: 0,
            });
            if header_row && row_index == 0 {
                batch.push(PageRequest::UpdateTextStyle {
                    object_id: table_id.clone(),
                    cell_location: Some(location),
                    style: TextStyle { bold: Some(true) },
                    text_range: TextRange::all(),
                    fields: "bold".to_string(),
                });
            }
        }
    }

    Ok((table_id, batch))
}

/// Builds `createImage` (plus an optional caption text box) on a slide.
pub fn build_image(
    slide_id: &str,
    url: &str,
    placement: Placement,
    caption: Option<&str>,
) -> Result<(String, BatchRequest), SlidesError> {
    placement.validate()?;

    let image_id = generate_object_id("img");
    let mut batch = BatchRequest::new();
    batch.push(PageRequest::CreateImage {
        object_id: image_id.clone(),
        url: url.to_string(),
        element_properties: PageElementProperties::placed(slide_id, placement),
    });

    if let Some(caption) = caption.filter(|c| !c.trim().is_empty()) {
        let caption_id = generate_object_id("cap");
        batch.push(PageRequest::CreateShape {
            object_id: caption_id.clone(),
            shape_type: "TEXT_BOX".to_string(),
            element_properties: PageElementProperties::placed(
                slide_id,
                placement.caption_below(),
            ),
        });
        batch.push(PageRequest::InsertText {
            object_id: caption_id,
            cell_location: None,
            text: caption.to_string(),
            insertion_index: 0,
        });
    }

    Ok((image_id, batch))
}

/// Solid background colour on every listed slide.
pub fn build_background(slide_ids: &[String], color: RgbColor) -> BatchRequest {
    let mut batch = BatchRequest::new();
    for slide_id in slide_ids {
        batch.push(PageRequest::background_fill(slide_id, color));
    }
    batch
}

/// Copies the source master's background and colour scheme onto each target master.
pub fn build_theme_copy(
    source: &MasterTheme,
    targets: &[MasterTheme],
) -> Result<BatchRequest, SlidesError> {
    let mut properties = serde_json::Map::new();
    let mut fields = Vec::new();

    if let Some(fill) = &source.background_fill {
        properties.insert("pageBackgroundFill".to_string(), fill.clone());
        fields.push("pageBackgroundFill");
    }
    if let Some(scheme) = &source.color_scheme {
        properties.insert("colorScheme".to_string(), scheme.clone());
        fields.push("colorScheme");
    }

    if fields.is_empty() {
        return Err(SlidesError::invalid(
            "source presentation master has no background or colour scheme to copy",
        ));
    }
    if targets.is_empty() {
        return Err(SlidesError::invalid("target presentation has no master pages"));
    }

    let mut batch = BatchRequest::new();
    for target in targets {
        batch.push(PageRequest::UpdatePageProperties {
            object_id: target.object_id.clone(),
            page_properties: serde_json::Value::Object(properties.clone()),
            fields: fields.join(","),
        });
    }
    Ok(batch)
}
