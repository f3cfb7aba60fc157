use thiserror::Error;

use super::slides_models::PlaceholderKind;

/// Every failure a tool call can surface to the host.
///
/// Nothing here is retried locally. The variants map one-to-one onto the
/// `kind` field of the uniform error payload the MCP layer returns.
#[derive(Debug, Error)]
pub enum SlidesError {
    /// Malformed or missing tool arguments. Raised before any remote mutation.
    #[error("invalid request: {0}")]
    InvalidSpec(String),

    #[error("unsupported chart type '{0}' (supported: bar, line, scatter, pie, histogram)")]
    UnsupportedChartType(String),

    /// Drive upload or permission grant failed.
    #[error("asset upload failed: {0}")]
    UploadFailure(String),

    /// The Slides/Drive API rejected the call.
    #[error("Google API error ({status}): {message}")]
    RemoteApi { status: u16, message: String },

    /// The remote API accepted a mutation that left no visible trace.
    ///
    /// Known defect: the root cause (timing, ID mapping or encoding) has not
    /// been identified. The server reports it and does not try to repair it.
    #[error("slide {slide_id}: object {object_id} accepted the text but it is not visible")]
    SilentNoOp { slide_id: String, object_id: String },

    #[error("slide {slide_id} has no {placeholder} placeholder")]
    PlaceholderNotFound {
        slide_id: String,
        placeholder: PlaceholderKind,
    },

    #[error("slide {0} not found in presentation")]
    SlideNotFound(String),

    #[error("authentication failed: {0}")]
    Auth(String),
}

impl SlidesError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SlidesError::InvalidSpec(_) => "InvalidSpec",
            SlidesError::UnsupportedChartType(_) => "UnsupportedChartType",
            SlidesError::UploadFailure(_) => "UploadFailure",
            SlidesError::RemoteApi { .. } => "RemoteAPIError",
            SlidesError::SilentNoOp { .. } => "SilentNoOp",
            SlidesError::PlaceholderNotFound { .. } => "PlaceholderNotFound",
            SlidesError::SlideNotFound(_) => "SlideNotFound",
            SlidesError::Auth(_) => "AuthError",
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        SlidesError::InvalidSpec(message.into())
    }
}

impl From<serde_json::Error> for SlidesError {
    fn from(err: serde_json::Error) -> Self {
        SlidesError::InvalidSpec(err.to_string())
    }
}
