use askama::{Error as AskamaError, Template};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to render `{template}`: {error}")]
pub struct TemplateRenderError {
    pub template: &'static str,
    #[source]
    pub error: AskamaError,
}

pub fn render_template<T: Template>(template: T) -> Result<String, TemplateRenderError> {
    template.render().map_err(|error| TemplateRenderError {
        template: template_name::<T>(),
        error,
    })
}

fn template_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Site-wide values shared by every layout.
#[derive(Clone)]
pub struct SiteView {
    pub title: String,
    pub url: String,
    pub description: String,
    pub author: String,
    pub language: String,
}

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub has_code: bool,
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub site: SiteView,
    pub meta: PageMetaView,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(site: SiteView, meta: PageMetaView, content: T) -> Self {
        Self {
            site,
            meta,
            content,
        }
    }
}

#[derive(Clone)]
pub struct TagBadge {
    pub label: String,
    pub href: String,
}

#[derive(Clone)]
pub struct PostCard {
    pub title: String,
    pub url: String,
    pub summary_html: String,
    /// Empty when the post is undated.
    pub iso_date: String,
    pub published: String,
    pub badges: Vec<TagBadge>,
}

#[derive(Clone)]
pub struct TagSummary {
    pub label: String,
    pub href: String,
    pub anchor: String,
    pub count: usize,
    pub posts: Vec<PostCard>,
}

#[derive(Clone)]
pub struct ArchiveYear {
    /// Empty for undated posts.
    pub label: String,
    pub posts: Vec<PostCard>,
}

pub struct PostView {
    pub title: String,
    pub iso_date: String,
    pub published: String,
    pub badges: Vec<TagBadge>,
    pub body_html: String,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub view: LayoutContext<PostView>,
}

pub struct PageView {
    pub title: String,
    pub body_html: String,
}

#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate {
    pub view: LayoutContext<PageView>,
}

pub struct IndexView {
    pub title: String,
    pub body_html: String,
    pub posts: Vec<PostCard>,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<IndexView>,
}

pub struct ArchiveView {
    pub title: String,
    pub body_html: String,
    pub years: Vec<ArchiveYear>,
}

#[derive(Template)]
#[template(path = "archive.html")]
pub struct ArchiveTemplate {
    pub view: LayoutContext<ArchiveView>,
}

pub struct TagsView {
    pub title: String,
    pub body_html: String,
    pub tags: Vec<TagSummary>,
}

#[derive(Template)]
#[template(path = "tags.html")]
pub struct TagsTemplate {
    pub view: LayoutContext<TagsView>,
}

pub struct TagView {
    pub tag: TagSummary,
}

#[derive(Template)]
#[template(path = "tag.html")]
pub struct TagTemplate {
    pub view: LayoutContext<TagView>,
}

pub fn build_tag_badges<'a, T>(tags: T) -> Vec<TagBadge>
where
    T: IntoIterator<Item = (&'a str, &'a str)>,
{
    tags.into_iter()
        .map(|(name, slug)| TagBadge {
            label: format!("#{name}"),
            href: tag_href(slug),
        })
        .collect()
}

pub fn tag_href(slug: &str) -> String {
    format!("/tags/{slug}.html")
}
