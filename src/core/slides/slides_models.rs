// Domain models for presentations and slides.
//
// These types know nothing about HTTP or JSON-RPC. The infra layer maps the
// Slides API responses into them and the request builder turns them into
// page mutations.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::slides_error::SlidesError;

// ============================================================================
// PRESENTATIONS
// ============================================================================

/// Opaque identifier of a remote presentation. The remote service owns the
/// presentation; we only reference it for the duration of a call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PresentationHandle(String);

impl PresentationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Extracts the presentation ID from a Slides URL or accepts a bare ID.
    pub fn parse(url_or_id: &str) -> Option<Self> {
        let url_or_id = url_or_id.trim();
        if url_or_id.contains("docs.google.com") {
            let start = url_or_id.find("/presentation/d/")?;
            let after_d = &url_or_id[start + "/presentation/d/".len()..];
            let end = after_d.find(['/', '?', '#']).unwrap_or(after_d.len());
            let id = &after_d[..end];
            if !id.is_empty() {
                return Some(Self::new(id));
            }
        } else if !url_or_id.is_empty() && !url_or_id.contains('/') && !url_or_id.contains(' ') {
            return Some(Self::new(url_or_id));
        }
        None
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn edit_url(&self) -> String {
        format!("https://docs.google.com/presentation/d/{}/edit", self.0)
    }
}

impl fmt::Display for PresentationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Presentation as returned by `presentations.create` / `presentations.get`.
#[derive(Debug, Clone, Default)]
pub struct PresentationDetails {
    pub presentation_id: String,
    pub title: String,
    pub slides: Vec<SlideSnapshot>,
    pub masters: Vec<MasterTheme>,
}

/// The themable parts of a master page, kept as raw API JSON because we only
/// ever copy them from one presentation to another.
#[derive(Debug, Clone, Default)]
pub struct MasterTheme {
    pub object_id: String,
    pub background_fill: Option<serde_json::Value>,
    pub color_scheme: Option<serde_json::Value>,
}

// ============================================================================
// SLIDES AND PLACEHOLDERS
// ============================================================================

/// Placeholder type of a layout region, named as the Slides API names it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    Title,
    CenteredTitle,
    Subtitle,
    Body,
    Other(String),
}

impl PlaceholderKind {
    pub fn as_api_str(&self) -> &str {
        match self {
            PlaceholderKind::Title => "TITLE",
            PlaceholderKind::CenteredTitle => "CENTERED_TITLE",
            PlaceholderKind::Subtitle => "SUBTITLE",
            PlaceholderKind::Body => "BODY",
            PlaceholderKind::Other(name) => name,
        }
    }
}

impl From<&str> for PlaceholderKind {
    fn from(value: &str) -> Self {
        match value {
            "TITLE" => PlaceholderKind::Title,
            "CENTERED_TITLE" => PlaceholderKind::CenteredTitle,
            "SUBTITLE" => PlaceholderKind::Subtitle,
            "BODY" => PlaceholderKind::Body,
            other => PlaceholderKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderRef {
    pub kind: PlaceholderKind,
    pub index: u32,
}

/// One element on a page, reduced to what the builder needs.
#[derive(Debug, Clone)]
pub struct PageElementSummary {
    pub object_id: String,
    pub placeholder: Option<PlaceholderRef>,
    /// Concatenated text runs of the shape (empty for non-text elements).
    pub text: String,
}

/// Current structure of a single slide as seen by the remote service.
#[derive(Debug, Clone)]
pub struct SlideSnapshot {
    pub slide_id: String,
    pub elements: Vec<PageElementSummary>,
}

impl SlideSnapshot {
    /// Placeholders of the given kinds, ordered by placeholder index.
    pub fn placeholders(&self, kinds: &[PlaceholderKind]) -> Vec<&PageElementSummary> {
        let mut found: Vec<&PageElementSummary> = self
            .elements
            .iter()
            .filter(|e| {
                e.placeholder
                    .as_ref()
                    .is_some_and(|p| kinds.contains(&p.kind))
            })
            .collect();
        found.sort_by_key(|e| e.placeholder.as_ref().map(|p| p.index).unwrap_or(0));
        found
    }

    pub fn element(&self, object_id: &str) -> Option<&PageElementSummary> {
        self.elements.iter().find(|e| e.object_id == object_id)
    }
}

/// What kind of slide to create. Each kind maps onto a predefined layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
    Title,
    Section,
    Content,
    TwoColumn,
    Table,
    Chart,
}

impl SlideKind {
    pub fn parse(name: &str) -> Result<Self, SlidesError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(SlideKind::Title),
            "section" | "section_header" => Ok(SlideKind::Section),
            "content" => Ok(SlideKind::Content),
            "two_column" | "two-column" => Ok(SlideKind::TwoColumn),
            "table" => Ok(SlideKind::Table),
            "chart" => Ok(SlideKind::Chart),
            other => Err(SlidesError::invalid(format!(
                "unknown slide kind '{}' (expected title, section, content, two_column, table or chart)",
                other
            ))),
        }
    }

    pub fn layout(self) -> &'static str {
        match self {
            SlideKind::Title => "TITLE",
            SlideKind::Section => "SECTION_HEADER",
            SlideKind::Content => "TITLE_AND_BODY",
            SlideKind::TwoColumn => "TITLE_AND_TWO_COLUMNS",
            SlideKind::Table | SlideKind::Chart => "TITLE_ONLY",
        }
    }

    /// Short prefix used in generated object IDs.
    pub fn id_prefix(self) -> &'static str {
        match self {
            SlideKind::Title => "title",
            SlideKind::Section => "section",
            SlideKind::Content => "content",
            SlideKind::TwoColumn => "twocol",
            SlideKind::Table => "table",
            SlideKind::Chart => "chart",
        }
    }

    /// Whether the kind's layout has a text slot for `role`.
    pub fn accepts(self, role: BlockRole) -> bool {
        match self {
            SlideKind::Title | SlideKind::Section => {
                matches!(role, BlockRole::Title | BlockRole::Subtitle)
            }
            SlideKind::Content => matches!(role, BlockRole::Title | BlockRole::Body),
            SlideKind::TwoColumn => matches!(
                role,
                BlockRole::Title | BlockRole::LeftColumn | BlockRole::RightColumn
            ),
            SlideKind::Table | SlideKind::Chart => role == BlockRole::Title,
        }
    }
}

/// Which slot of the layout a block of text is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRole {
    Title,
    Subtitle,
    Body,
    LeftColumn,
    RightColumn,
}

impl BlockRole {
    /// Name of the matching `content` field in tool arguments.
    pub fn as_str(self) -> &'static str {
        match self {
            BlockRole::Title => "title",
            BlockRole::Subtitle => "subtitle",
            BlockRole::Body => "body",
            BlockRole::LeftColumn => "left",
            BlockRole::RightColumn => "right",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    pub role: BlockRole,
    pub text: String,
}

/// Description of one slide to create.
#[derive(Debug, Clone)]
pub struct SlideSpec {
    pub kind: SlideKind,
    pub blocks: Vec<ContentBlock>,
    pub insertion_index: Option<u32>,
}

// ============================================================================
// PLACEMENT AND STYLE
// ============================================================================

/// Position and size of a page element, in points.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    pub const IMAGE_DEFAULT: Placement = Placement {
        x: 100.0,
        y: 150.0,
        width: 400.0,
        height: 300.0,
    };

    pub const TABLE_DEFAULT: Placement = Placement {
        x: 100.0,
        y: 100.0,
        width: 400.0,
        height: 300.0,
    };

    /// Text box directly underneath this element.
    pub fn caption_below(&self) -> Placement {
        Placement {
            x: self.x,
            y: self.y + self.height + 20.0,
            width: self.width,
            height: 50.0,
        }
    }

    pub fn validate(&self) -> Result<(), SlidesError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(SlidesError::invalid(
                "placement width and height must be positive",
            ));
        }
        if !(self.x.is_finite() && self.y.is_finite()) {
            return Err(SlidesError::invalid("placement x and y must be finite"));
        }
        Ok(())
    }
}

/// Opaque RGB colour with channels in 0.0..=1.0, as the Slides API wants it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RgbColor {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl RgbColor {
    /// Default slide background: a very light blue.
    pub const SOFT_BACKGROUND: RgbColor = RgbColor {
        red: 0.97,
        green: 0.98,
        blue: 1.0,
    };

    /// Parses `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, SlidesError> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SlidesError::invalid(format!(
                "colour '{}' is not in #RRGGBB form",
                hex
            )));
        }
        let channel = |i: usize| -> Result<f32, SlidesError> {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|e| SlidesError::invalid(e.to_string()))
        };
        Ok(Self {
            red: channel(0)?,
            green: channel(2)?,
            blue: channel(4)?,
        })
    }
}

// ============================================================================
// ASSETS AND THEMES
// ============================================================================

/// Publicly readable reference to an uploaded asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetReference {
    pub file_id: String,
    pub url: String,
}

impl AssetReference {
    pub fn from_drive_file(file_id: impl Into<String>) -> Self {
        let file_id = file_id.into();
        let url = format!("https://drive.google.com/uc?id={}", file_id);
        Self { file_id, url }
    }
}

/// A Drive presentation that can serve as a theme source.
#[derive(Debug, Clone, Serialize)]
pub struct ThemeTemplate {
    pub id: String,
    pub name: String,
    pub modified: Option<chrono::DateTime<chrono::Utc>>,
}
