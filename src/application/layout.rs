//! Wrap rendered documents in their askama layouts.

use std::path::PathBuf;

use tracing::warn;

use crate::{
    application::{
        site::{Site, TagEntry},
        syndication::{SyndicationError, absolute_url, site_base},
    },
    config::SiteSettings,
    domain::{
        dates::{format_human_date, format_rfc3339},
        document::Document,
    },
    presentation::views::{
        ArchiveTemplate, ArchiveView, ArchiveYear, IndexTemplate, IndexView, LayoutContext,
        PageMetaView, PageTemplate, PageView, PostCard, PostTemplate, PostView, SiteView,
        TagSummary, TagTemplate, TagView, TagsTemplate, TagsView, TemplateRenderError,
        build_tag_badges, render_template, tag_href,
    },
};

pub const TAGS_DIR: &str = "tags";

/// Layouts a document can name in its front matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Post,
    Page,
    Index,
    Archive,
    Tags,
}

impl Layout {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "post" => Some(Self::Post),
            "page" => Some(Self::Page),
            "index" => Some(Self::Index),
            "archive" => Some(Self::Archive),
            "tags" => Some(Self::Tags),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Page => "page",
            Self::Index => "index",
            Self::Archive => "archive",
            Self::Tags => "tags",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error(transparent)]
    Template(#[from] TemplateRenderError),
    #[error(transparent)]
    Url(#[from] SyndicationError),
}

/// Layout output for one document. `layout` is `None` when the named layout
/// does not exist and the content was emitted bare.
#[derive(Debug)]
pub struct Applied {
    pub html: String,
    pub layout: Option<Layout>,
}

/// Render `document` through the layout its front matter selected.
pub fn apply(
    settings: &SiteSettings,
    site: &Site,
    document: &Document,
) -> Result<Applied, LayoutError> {
    let Some(layout) = Layout::from_name(&document.meta.layout) else {
        warn!(
            target = "stipple::application::layout",
            path = %document.source_path.display(),
            layout = %document.meta.layout,
            "Templating error: unknown layout, emitting content as-is"
        );
        return Ok(Applied {
            html: document.content_html.clone(),
            layout: None,
        });
    };

    let site_view = site_view(settings);
    let meta = page_meta(settings, document)?;
    let title = document.meta.title.clone();
    let body_html = document.content_html.clone();

    let html = match layout {
        Layout::Post => render_template(PostTemplate {
            view: LayoutContext::new(
                site_view,
                meta,
                PostView {
                    title,
                    iso_date: document.meta.date.map(format_rfc3339).unwrap_or_default(),
                    published: document
                        .meta
                        .date
                        .map(format_human_date)
                        .unwrap_or_default(),
                    badges: build_tag_badges(site.tag_links(document)),
                    body_html,
                },
            ),
        })?,
        Layout::Page => render_template(PageTemplate {
            view: LayoutContext::new(site_view, meta, PageView { title, body_html }),
        })?,
        Layout::Index => render_template(IndexTemplate {
            view: LayoutContext::new(
                site_view,
                meta,
                IndexView {
                    title,
                    body_html,
                    posts: site.posts.iter().map(|post| post_card(site, post)).collect(),
                },
            ),
        })?,
        Layout::Archive => render_template(ArchiveTemplate {
            view: LayoutContext::new(
                site_view,
                meta,
                ArchiveView {
                    title,
                    body_html,
                    years: archive_years(site),
                },
            ),
        })?,
        Layout::Tags => render_template(TagsTemplate {
            view: LayoutContext::new(
                site_view,
                meta,
                TagsView {
                    title,
                    body_html,
                    tags: site
                        .tags
                        .iter()
                        .map(|tag| tag_summary(site, tag))
                        .collect(),
                },
            ),
        })?,
    };

    Ok(Applied {
        html,
        layout: Some(layout),
    })
}

/// Render `tags/<slug>.html` for one tag, returning its output path.
pub fn render_tag_page(
    settings: &SiteSettings,
    site: &Site,
    tag: &TagEntry,
) -> Result<(PathBuf, String), LayoutError> {
    let href = tag_href(&tag.slug);
    let base = site_base(settings)?;
    let meta = PageMetaView {
        title: format!("#{}", tag.name),
        description: settings.description.clone(),
        canonical: absolute_url(&base, &href)?,
        has_code: false,
    };

    let html = render_template(TagTemplate {
        view: LayoutContext::new(
            site_view(settings),
            meta,
            TagView {
                tag: tag_summary(site, tag),
            },
        ),
    })?;

    Ok((PathBuf::from(TAGS_DIR).join(format!("{}.html", tag.slug)), html))
}

fn site_view(settings: &SiteSettings) -> SiteView {
    SiteView {
        title: settings.title.clone(),
        url: settings.url.clone(),
        description: settings.description.clone(),
        author: settings.author.clone(),
        language: settings.language.clone(),
    }
}

fn page_meta(settings: &SiteSettings, document: &Document) -> Result<PageMetaView, LayoutError> {
    let base = site_base(settings)?;
    let description = document
        .meta
        .extra
        .get("description")
        .and_then(|value| value.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| settings.description.clone());

    Ok(PageMetaView {
        title: document.meta.title.clone(),
        description,
        canonical: absolute_url(&base, &document.meta.url)?,
        has_code: document.contains_code,
    })
}

fn post_card(site: &Site, post: &Document) -> PostCard {
    PostCard {
        title: post.meta.title.clone(),
        url: post.meta.url.clone(),
        summary_html: post.meta.summary.clone(),
        iso_date: post.meta.date.map(format_rfc3339).unwrap_or_default(),
        published: post.meta.date.map(format_human_date).unwrap_or_default(),
        badges: build_tag_badges(site.tag_links(post)),
    }
}

fn tag_summary(site: &Site, tag: &TagEntry) -> TagSummary {
    let posts: Vec<PostCard> = site.tagged(tag).map(|post| post_card(site, post)).collect();
    TagSummary {
        label: tag.name.clone(),
        href: tag_href(&tag.slug),
        anchor: tag.slug.clone(),
        count: posts.len(),
        posts,
    }
}

/// Group the newest-first posts by publish year. Undated posts share a
/// trailing group with an empty label.
fn archive_years(site: &Site) -> Vec<ArchiveYear> {
    let mut years: Vec<ArchiveYear> = Vec::new();
    for post in &site.posts {
        let label = post
            .meta
            .date
            .map(|date| date.year().to_string())
            .unwrap_or_default();
        match years.last_mut() {
            Some(year) if year.label == label => year.posts.push(post_card(site, post)),
            _ => years.push(ArchiveYear {
                label,
                posts: vec![post_card(site, post)],
            }),
        }
    }
    years
}
