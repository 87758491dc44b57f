//! Turn a content file into a rendered [`Document`].

use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use thiserror::Error;
use tracing::warn;

use crate::{
    application::{
        render::{RenderError, RenderMode, RenderService},
        site::SourceFile,
    },
    domain::{
        document::{Document, PageMeta, SourceKind},
        front_matter::{self, FrontMatterError},
        interpolate::interpolate,
        post_name::{self, PostNameError, capitalize},
        summary::{html_summary, markdown_summary_source},
    },
};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("front matter of `{path}` is invalid: {source}")]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },
    #[error(transparent)]
    PostName(#[from] PostNameError),
    #[error("failed to render `{path}`: {source}")]
    Render {
        path: PathBuf,
        #[source]
        source: RenderError,
    },
}

impl DocumentError {
    /// Build stage that failed, used as a metrics label.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Read { .. } => "read",
            Self::FrontMatter { .. } => "front_matter",
            Self::PostName(_) => "post_name",
            Self::Render { .. } => "render",
        }
    }
}

/// Read, place, interpolate and render one source file. `site` is the
/// `site` placeholder context.
pub fn load_document(
    source: &SourceFile,
    site: &Value,
    renderer: &dyn RenderService,
) -> Result<Document, DocumentError> {
    let raw = std::fs::read_to_string(&source.path).map_err(|err| DocumentError::Read {
        path: source.path.clone(),
        source: err,
    })?;
    parse_document(source, &raw, site, renderer)
}

/// [`load_document`] without the file read.
pub fn parse_document(
    source: &SourceFile,
    raw: &str,
    site: &Value,
    renderer: &dyn RenderService,
) -> Result<Document, DocumentError> {
    let (matter, body) = front_matter::split(raw).map_err(|err| DocumentError::FrontMatter {
        path: source.path.clone(),
        source: err,
    })?;

    let placement = post_name::place(source.section(), &source.relative, matter.date)?;

    let title = matter
        .title
        .clone()
        .or(placement.default_title)
        .unwrap_or_else(|| title_from_stem(&source.relative));
    let layout = matter
        .layout
        .as_deref()
        .map(layout_basename)
        .unwrap_or_else(|| source.kind.default_layout().to_string());

    let mut meta = PageMeta {
        title,
        date: placement.date,
        url: placement.url,
        layout,
        tags: matter.tags.clone(),
        summary: String::new(),
        extra: matter.extra.clone(),
    };

    let context = json!({ "site": site, "page": meta.to_context() });
    let interpolated = interpolate(body, &context);
    if !interpolated.unresolved.is_empty() {
        warn!(
            target = "stipple::application::documents",
            path = %source.path.display(),
            placeholders = ?interpolated.unresolved,
            "Unresolved placeholders left in document"
        );
    }
    let body = interpolated.text;

    let render = |markdown: &str, mode: RenderMode| {
        renderer
            .render(markdown, mode)
            .map_err(|err| DocumentError::Render {
                path: source.path.clone(),
                source: err,
            })
    };

    let (content_html, contains_code) = match source.source_kind {
        SourceKind::Markdown => {
            let output = render(&body, RenderMode::Document)?;
            (output.html, output.contains_code)
        }
        SourceKind::Html => {
            let contains_code = body.contains("<pre");
            (body.clone(), contains_code)
        }
    };

    meta.summary = match (matter.summary.as_deref(), source.source_kind) {
        (Some(summary), SourceKind::Markdown) => render(summary, RenderMode::Fragment)?.html,
        (Some(summary), SourceKind::Html) => summary.to_string(),
        (None, SourceKind::Markdown) => {
            render(&markdown_summary_source(&body), RenderMode::Fragment)?.html
        }
        (None, SourceKind::Html) => html_summary(&body).to_string(),
    };

    Ok(Document {
        kind: source.kind,
        source_kind: source.source_kind,
        source_path: source.relative.clone(),
        output_path: placement.output,
        meta,
        content_html,
        contains_code,
    })
}

/// `layout: layouts/post.html` and `layout: post` both name `post`.
fn layout_basename(layout: &str) -> String {
    Path::new(layout)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(layout)
        .to_string()
}

fn title_from_stem(relative: &Path) -> String {
    let stem = relative
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    capitalize(&stem.replace('-', " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render::render_service;
    use crate::domain::document::DocumentKind;
    use time::macros::datetime;

    fn source(kind: DocumentKind, relative: &str) -> SourceFile {
        SourceFile {
            kind,
            source_kind: SourceKind::from_path(Path::new(relative)).expect("known extension"),
            path: PathBuf::from("content").join(relative),
            relative: PathBuf::from(relative),
        }
    }

    fn parse(kind: DocumentKind, relative: &str, raw: &str) -> Result<Document, DocumentError> {
        let site = json!({ "title": "Stipple", "url": "https://example.com" });
        parse_document(&source(kind, relative), raw, &site, render_service().as_ref())
    }

    #[test]
    fn posts_take_date_url_and_title_from_the_filename() {
        let document = parse(
            DocumentKind::Post,
            "2016-05-03-dithered-webgl.md",
            "Hello **there**\n",
        )
        .expect("document");

        assert_eq!(document.meta.title, "Dithered webgl");
        assert_eq!(document.meta.url, "/posts/2016/05/03/dithered-webgl.html");
        assert_eq!(
            document.output_path,
            PathBuf::from("posts/2016/05/03/dithered-webgl.html")
        );
        assert_eq!(document.meta.date, Some(datetime!(2016-05-03 0:00 UTC)));
        assert_eq!(document.meta.layout, "post");
        assert!(document.content_html.contains("<strong>there</strong>"));
    }

    #[test]
    fn front_matter_overrides_filename_defaults() {
        let document = parse(
            DocumentKind::Post,
            "2016-05-03-slug.md",
            "---\ntitle: Real Title\ndate: 2017-01-02\nlayout: layouts/page.html\ntags: [a, b]\n---\nBody\n",
        )
        .expect("document");

        assert_eq!(document.meta.title, "Real Title");
        assert_eq!(document.meta.url, "/posts/2017/01/02/slug.html");
        assert_eq!(document.meta.layout, "page");
        assert_eq!(document.meta.tags, vec!["a", "b"]);
    }

    #[test]
    fn placeholders_resolve_against_site_and_page() {
        let document = parse(
            DocumentKind::Page,
            "about.md",
            "---\ntitle: About\n---\n{{ site.title }} / {{ page.title }} / {{ page.missing }}\n",
        )
        .expect("document");

        assert!(document.content_html.contains("Stipple / About / {{ page.missing }}"));
        assert_eq!(document.meta.url, "/about.html");
    }

    #[test]
    fn html_summaries_stop_at_the_more_marker() {
        let document = parse(
            DocumentKind::Post,
            "2016-05-03-raw.html",
            "<p>intro</p><!--more--><p>rest</p>",
        )
        .expect("document");

        assert_eq!(document.meta.summary, "<p>intro</p>");
        assert_eq!(document.content_html, "<p>intro</p><!--more--><p>rest</p>");
    }

    #[test]
    fn markdown_summaries_end_before_code() {
        let document = parse(
            DocumentKind::Post,
            "2016-05-03-code.md",
            "First line\n\n```rust\nfn main() {}\n```\n",
        )
        .expect("document");

        assert!(document.meta.summary.contains("First line"));
        assert!(document.meta.summary.contains('…'));
        assert!(!document.meta.summary.contains("fn main"));
        assert!(document.contains_code);
    }

    #[test]
    fn front_matter_summary_is_rendered_for_markdown() {
        let document = parse(
            DocumentKind::Post,
            "2016-05-03-s.md",
            "---\nsummary: \"*short*\"\n---\nLong body\n",
        )
        .expect("document");
        assert!(document.meta.summary.contains("<em>short</em>"));
    }

    #[test]
    fn invalid_filename_dates_are_errors() {
        let err = parse(DocumentKind::Post, "2016-13-03-bad.md", "x").expect_err("bad date");
        assert!(matches!(err, DocumentError::PostName(_)));
        assert_eq!(err.stage(), "post_name");
    }
}
