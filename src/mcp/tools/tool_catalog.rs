// Tool descriptions shown to the host agent. Keep argument names in sync with
// the argument structs in the handler modules.

use super::tool_models::{PropertyDef, ToolBuilder, ToolDefinition};
use crate::core::charts::ChartType;

pub const CREATE_PRESENTATION: &str = "create_presentation";
pub const ADD_SLIDE: &str = "add_slide";
pub const ADD_TABLE: &str = "add_table";
pub const ADD_IMAGE: &str = "add_image";
pub const ADD_CHART: &str = "add_chart";
pub const GET_PRESENTATION_URL: &str = "get_presentation_url";
pub const LIST_SLIDES: &str = "list_slides";
pub const APPLY_BACKGROUND_STYLING: &str = "apply_background_styling";
pub const GENERATE_SAMPLE_DATA: &str = "generate_sample_data";
pub const CREATE_CHART_FROM_SAMPLE_DATA: &str = "create_chart_from_sample_data";
pub const LIST_AVAILABLE_THEMES: &str = "list_available_themes";
pub const APPLY_THEME_FROM_PRESENTATION: &str = "apply_theme_from_presentation";
pub const APPLY_THEME_BY_NAME: &str = "apply_theme_by_name";

const SAMPLE_KINDS: &[&str] = &["sine_wave", "categories", "linear", "normal"];

/// Chart types some sample data kind can feed. Heatmaps need a matrix.
fn sample_chart_types() -> Vec<&'static str> {
    ChartType::ALL
        .iter()
        .filter(|c| **c != ChartType::Heatmap)
        .map(|c| c.as_str())
        .collect()
}

fn presentation_arg() -> PropertyDef {
    PropertyDef::new(
        "string",
        "Presentation ID, full Google Slides URL, or the title of a presentation created in this session.",
    )
}

fn slide_arg() -> PropertyDef {
    PropertyDef::new("string", "Object ID of the target slide (see list_slides).")
}

fn placement_arg(default: &str) -> PropertyDef {
    PropertyDef::new(
        "object",
        &format!(
            "Position and size in points: {{\"x\", \"y\", \"width\", \"height\"}}. Default {}.",
            default
        ),
    )
}

fn caption_arg() -> PropertyDef {
    PropertyDef::new("string", "Optional caption placed in a text box under the element.")
}

// ----------------------------------------------------------------------------
// Slides
// ----------------------------------------------------------------------------

pub fn create_presentation() -> ToolDefinition {
    ToolBuilder::new(
        CREATE_PRESENTATION,
        "Creates a new, empty Google Slides presentation and returns its ID and edit URL.",
    )
    .required("title", PropertyDef::new("string", "Presentation title."))
    .build()
}

pub fn add_slide() -> ToolDefinition {
    ToolBuilder::new(
        ADD_SLIDE,
        "Adds a slide with a predefined layout and fills its placeholders. Body text becomes one bullet per line on content slides.",
    )
    .required("presentation_id", presentation_arg())
    .required(
        "kind",
        PropertyDef::new("string", "Slide layout.").with_enum(&[
            "title",
            "section",
            "content",
            "two_column",
            "table",
            "chart",
        ]),
    )
    .optional(
        "content",
        PropertyDef::new(
            "object",
            "Text per slot: {\"title\", \"subtitle\", \"body\", \"left\", \"right\"}. `body`, `left` and `right` accept a string or a list of lines.",
        ),
    )
    .optional(
        "insertion_index",
        PropertyDef::new("integer", "Zero-based position of the new slide. Appended when omitted."),
    )
    .build()
}

pub fn add_table() -> ToolDefinition {
    ToolBuilder::new(ADD_TABLE, "Adds a table to an existing slide.")
        .required("presentation_id", presentation_arg())
        .required("slide_id", slide_arg())
        .required(
            "rows",
            PropertyDef::new("array", "Table rows; every row must have the same number of cells.")
                .with_items(PropertyDef::new("array", "Cells of one row.")),
        )
        .optional(
            "header_row",
            PropertyDef::new("boolean", "Bold the first row. Default true."),
        )
        .optional("placement", placement_arg("x=100 y=100 400x300"))
        .build()
}

pub fn add_image() -> ToolDefinition {
    ToolBuilder::new(
        ADD_IMAGE,
        "Places an image on a slide. A data: URI is uploaded to Drive first; an http(s) URL is used directly.",
    )
    .required("presentation_id", presentation_arg())
    .required("slide_id", slide_arg())
    .required(
        "source",
        PropertyDef::new("string", "Public image URL or data:image/...;base64,... URI."),
    )
    .optional("placement", placement_arg("x=100 y=150 400x300"))
    .optional("caption", caption_arg())
    .build()
}

pub fn get_presentation_url() -> ToolDefinition {
    ToolBuilder::new(GET_PRESENTATION_URL, "Returns the edit URL of a presentation.")
        .required("presentation_id", presentation_arg())
        .build()
}

pub fn list_slides() -> ToolDefinition {
    ToolBuilder::new(
        LIST_SLIDES,
        "Lists the slides of a presentation with their placeholders and current text.",
    )
    .required("presentation_id", presentation_arg())
    .build()
}

pub fn apply_background_styling() -> ToolDefinition {
    ToolBuilder::new(
        APPLY_BACKGROUND_STYLING,
        "Sets a solid background colour on every slide.",
    )
    .required("presentation_id", presentation_arg())
    .optional(
        "color",
        PropertyDef::new("string", "Colour as #RRGGBB. Default #F7FAFF."),
    )
    .build()
}

// ----------------------------------------------------------------------------
// Charts
// ----------------------------------------------------------------------------

pub fn add_chart() -> ToolDefinition {
    ToolBuilder::new(
        ADD_CHART,
        "Renders a chart to PNG, uploads it to Drive and places it on a slide.",
    )
    .required("presentation_id", presentation_arg())
    .required("slide_id", slide_arg())
    .required(
        "chart_spec",
        PropertyDef::new(
            "object",
            "{\"type\": bar|line|scatter|pie|histogram|heatmap, \"data\": [[label, value], ...] or [{\"x\", \"y\"}, ...] or [value, ...], \"matrix\": [[value, ...], ...] (heatmap only, row 0 at the bottom; optional \"x_labels\", \"y_labels\"), \"title\", \"x_label\", \"y_label\", \"options\": {\"width\", \"height\", \"color\", \"bins\"}}",
        ),
    )
    .optional("placement", placement_arg("x=100 y=150 400x300"))
    .optional("caption", caption_arg())
    .optional(
        "return_image",
        PropertyDef::new("boolean", "Also return the rendered PNG as image content."),
    )
    .build()
}

pub fn generate_sample_data() -> ToolDefinition {
    ToolBuilder::new(GENERATE_SAMPLE_DATA, "Generates demo data for charts.")
        .optional(
            "data_type",
            PropertyDef::new("string", "Kind of data. Default sine_wave.").with_enum(SAMPLE_KINDS),
        )
        .optional(
            "n_points",
            PropertyDef::new("integer", "Number of points (categories: number of categories). Default 100."),
        )
        .optional(
            "seed",
            PropertyDef::new("integer", "Seed for reproducible output."),
        )
        .build()
}

pub fn create_chart_from_sample_data() -> ToolDefinition {
    ToolBuilder::new(
        CREATE_CHART_FROM_SAMPLE_DATA,
        "Generates sample data and places it as a chart on a slide. sine_wave/linear pair with line or scatter, categories with bar, pie or histogram, normal with histogram.",
    )
    .required("presentation_id", presentation_arg())
    .required("slide_id", slide_arg())
    .required(
        "data_type",
        PropertyDef::new("string", "Kind of data.").with_enum(SAMPLE_KINDS),
    )
    .required(
        "chart_type",
        PropertyDef::new("string", "Chart type.").with_enum(&sample_chart_types()),
    )
    .optional("n_points", PropertyDef::new("integer", "Number of points."))
    .optional("seed", PropertyDef::new("integer", "Seed for reproducible output."))
    .optional("width", PropertyDef::new("integer", "Image width in pixels (200-2000)."))
    .optional("height", PropertyDef::new("integer", "Image height in pixels (200-2000)."))
    .build()
}

// ----------------------------------------------------------------------------
// Themes
// ----------------------------------------------------------------------------

pub fn list_available_themes() -> ToolDefinition {
    ToolBuilder::new(
        LIST_AVAILABLE_THEMES,
        "Lists Drive presentations whose name contains 'theme' or 'template', newest first.",
    )
    .build()
}

pub fn apply_theme_from_presentation() -> ToolDefinition {
    ToolBuilder::new(
        APPLY_THEME_FROM_PRESENTATION,
        "Copies the master background and colour scheme of another presentation.",
    )
    .required("presentation_id", presentation_arg())
    .required(
        "source_presentation_id",
        PropertyDef::new("string", "Presentation to copy the theme from."),
    )
    .build()
}

pub fn apply_theme_by_name() -> ToolDefinition {
    ToolBuilder::new(
        APPLY_THEME_BY_NAME,
        "Finds a Drive presentation by name and applies its theme.",
    )
    .required("presentation_id", presentation_arg())
    .required(
        "theme_name",
        PropertyDef::new("string", "Name (or part of the name) of the theme presentation."),
    )
    .build()
}
