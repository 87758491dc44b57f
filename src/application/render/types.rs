use thiserror::Error;

/// A heading seen while rendering, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedHeading {
    pub level: u8,
    pub anchor: String,
    pub text: String,
}

/// Deterministic rendering result returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub html: String,
    /// Whether any fenced code block was highlighted.
    pub contains_code: bool,
    pub headings: Vec<RenderedHeading>,
}

/// Whether headings receive anchor ids. Summaries shown next to each other
/// on listing pages skip them so ids stay unique per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Document,
    Fragment,
}

#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("markdown rendering failed: {message}")]
    Markdown { message: String },
    #[error("syntax highlighting failed: {language}: {message}")]
    Highlighting { language: String, message: String },
    #[error("document processing failed: {message}")]
    Document { message: String },
    #[error("syntax theme `{name}` is not available: {message}")]
    Theme { name: String, message: String },
}

/// Markdown to HTML. Implementations must be pure: the same input always
/// gives the same output or error.
pub trait RenderService: Send + Sync {
    fn render(&self, markdown: &str, mode: RenderMode) -> Result<RenderOutput, RenderError>;
}
