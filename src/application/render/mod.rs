//! Markdown rendering: comrak with GFM extensions, syntect class-based
//! highlighting and heading anchors.

mod service;
mod types;

pub use service::{MarkdownRenderer, render_service, syntax_css};
pub use types::{RenderError, RenderMode, RenderOutput, RenderService, RenderedHeading};
