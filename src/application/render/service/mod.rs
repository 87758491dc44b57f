mod anchors;
mod config;
mod highlight;
mod rewrite;

use std::sync::Arc;

use comrak::{Arena, format_html, nodes::AstNode, parse_document};
use once_cell::sync::Lazy;
use syntect::{
    dumps::from_uncompressed_data,
    highlighting::ThemeSet,
    html::{ClassStyle, css_for_theme_with_class_style},
    parsing::SyntaxSet,
};
use tracing::warn;

use crate::application::render::types::{
    RenderError, RenderMode, RenderOutput, RenderService,
};

use anchors::apply_heading_ids;
use config::default_options;
use rewrite::rewrite_ast;

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "syntax-" };

/// Comrak-based renderer with syntect highlighting emitting `syntax-` classes.
pub struct MarkdownRenderer {
    options: comrak::Options<'static>,
    syntax_set: SyntaxSet,
    class_style: ClassStyle,
}

impl MarkdownRenderer {
    fn new() -> Self {
        let syntax_bytes = include_bytes!(env!("SYNTAX_PACK_FILE"));
        let syntax_set = match from_uncompressed_data::<SyntaxSet>(syntax_bytes) {
            Ok(set) => set,
            Err(err) => {
                warn!(
                    target = "stipple::application::render",
                    error = %err,
                    "Bundled syntax pack unreadable; using syntect defaults"
                );
                SyntaxSet::load_defaults_newlines()
            }
        };

        Self {
            options: default_options(),
            syntax_set,
            class_style: CLASS_STYLE,
        }
    }
}

static RENDER_SERVICE: Lazy<Arc<MarkdownRenderer>> =
    Lazy::new(|| Arc::new(MarkdownRenderer::new()));

/// Access the shared renderer, initialised on first use.
pub fn render_service() -> Arc<MarkdownRenderer> {
    Arc::clone(&RENDER_SERVICE)
}

impl RenderService for MarkdownRenderer {
    fn render(&self, markdown: &str, mode: RenderMode) -> Result<RenderOutput, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, markdown, &self.options);

        let outcome = rewrite_ast(root, &self.syntax_set, &self.class_style)?;
        let html = render_html_stage(root, &self.options)?;

        let html = match mode {
            RenderMode::Document => apply_heading_ids(&html, &outcome.headings)?,
            RenderMode::Fragment => html,
        };

        Ok(RenderOutput {
            html,
            contains_code: outcome.contains_code,
            headings: outcome.headings,
        })
    }
}

fn render_html_stage<'a>(
    root: &'a AstNode<'a>,
    options: &comrak::Options<'static>,
) -> Result<String, RenderError> {
    let mut html = String::new();
    format_html(root, options, &mut html).map_err(|err| RenderError::Markdown {
        message: err.to_string(),
    })?;
    Ok(html)
}

/// Stylesheet for the highlighting classes under the named syntect theme.
pub fn syntax_css(theme_name: &str) -> Result<String, RenderError> {
    let themes = ThemeSet::load_defaults();
    let theme = themes.themes.get(theme_name).ok_or_else(|| RenderError::Theme {
        name: theme_name.to_string(),
        message: "unknown theme".to_string(),
    })?;

    css_for_theme_with_class_style(theme, CLASS_STYLE).map_err(|err| RenderError::Theme {
        name: theme_name.to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_render_with_anchors_and_code() {
        let output = render_service()
            .render("# Hello\n\n```\nplain\n```\n", RenderMode::Document)
            .expect("render");

        assert!(output.html.contains("<h1 id=\"hello\">Hello</h1>"));
        assert!(output.contains_code);
        assert_eq!(output.headings.len(), 1);
    }

    #[test]
    fn fragments_skip_anchors() {
        let output = render_service()
            .render("## Teaser", RenderMode::Fragment)
            .expect("render");
        assert_eq!(output.html.trim(), "<h2>Teaser</h2>");
    }

    #[test]
    fn raw_html_passes_through() {
        let output = render_service()
            .render("<canvas data-model=\"duck.glb\"></canvas>\n", RenderMode::Fragment)
            .expect("render");
        assert!(output.html.contains("<canvas data-model=\"duck.glb\"></canvas>"));
    }

    #[test]
    fn gfm_tables_and_strikethrough() {
        let output = render_service()
            .render("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n", RenderMode::Fragment)
            .expect("render");
        assert!(output.html.contains("<table>"));
        assert!(output.html.contains("<del>gone</del>"));
    }

    #[test]
    fn syntax_css_uses_prefixed_classes() {
        let css = syntax_css(crate::config::DEFAULT_SYNTAX_THEME).expect("css");
        assert!(css.contains(".syntax-"));
        assert!(matches!(
            syntax_css("no-such-theme"),
            Err(RenderError::Theme { .. })
        ));
    }
}
