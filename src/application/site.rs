//! Source discovery and post collation.

use std::{
    collections::HashSet,
    io,
    path::{Path, PathBuf},
};

use serde_json::{Value, json};
use walkdir::WalkDir;

use crate::{
    config::SiteSettings,
    domain::{
        dates::format_rfc3339,
        document::{Document, DocumentKind, SourceKind},
        slug::Slugger,
    },
};

pub use crate::domain::post_name::POSTS_DIR;

/// A content file waiting to be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub kind: DocumentKind,
    pub source_kind: SourceKind,
    pub path: PathBuf,
    /// Path inside the section root: `content/posts` for posts, `content` for pages.
    pub relative: PathBuf,
}

impl SourceFile {
    /// Output directory the document's placement is relative to.
    pub fn section(&self) -> &'static Path {
        match self.kind {
            DocumentKind::Post => Path::new(POSTS_DIR),
            DocumentKind::Page => Path::new(""),
        }
    }
}

/// Find posts or pages below the content directory in path order. Files
/// whose name starts with `_` are drafts and partials, and are skipped.
pub fn discover(content: &Path, kind: DocumentKind) -> io::Result<Vec<SourceFile>> {
    let posts_root = content.join(POSTS_DIR);
    let root = match kind {
        DocumentKind::Post => posts_root.clone(),
        DocumentKind::Page => content.to_path_buf(),
    };
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let walker = WalkDir::new(&root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| kind == DocumentKind::Post || entry.path() != posts_root);

    let mut sources = Vec::new();
    for entry in walker {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if name.starts_with('_') || name.starts_with('.') {
            continue;
        }

        let Some(source_kind) = SourceKind::from_path(entry.path()) else {
            continue;
        };
        let relative = entry
            .path()
            .strip_prefix(&root)
            .map_err(io::Error::other)?
            .to_path_buf();

        sources.push(SourceFile {
            kind,
            source_kind,
            path: entry.path().to_path_buf(),
            relative,
        });
    }

    Ok(sources)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    pub name: String,
    pub slug: String,
    /// Indices into [`Site::posts`], newest first.
    pub posts: Vec<usize>,
}

/// Collated posts and tags, visible to pages and feeds.
#[derive(Debug, Clone, Default)]
pub struct Site {
    pub posts: Vec<Document>,
    pub tags: Vec<TagEntry>,
}

impl Site {
    /// Sort posts newest first and gather tags in first-seen order. Undated
    /// posts sort last in source path order.
    pub fn collate(mut posts: Vec<Document>) -> Self {
        let names: Vec<String> = {
            let mut seen = HashSet::new();
            posts
                .iter()
                .flat_map(|post| post.meta.tags.iter())
                .filter(|tag| seen.insert(tag.as_str()))
                .cloned()
                .collect()
        };

        posts.sort_by(|a, b| match (a.meta.date, b.meta.date) {
            (Some(left), Some(right)) => right
                .cmp(&left)
                .then_with(|| a.source_path.cmp(&b.source_path)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.source_path.cmp(&b.source_path),
        });

        let mut slugger = Slugger::new();
        let tags = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let slug = match slugger.claim(&name) {
                    Ok(slug) => slug,
                    Err(_) => slugger.claim_slug(format!("tag-{}", index + 1)),
                };
                let tagged = posts
                    .iter()
                    .enumerate()
                    .filter(|(_, post)| post.meta.tags.contains(&name))
                    .map(|(position, _)| position)
                    .collect();
                TagEntry {
                    name,
                    slug,
                    posts: tagged,
                }
            })
            .collect();

        Self { posts, tags }
    }

    pub fn tag(&self, name: &str) -> Option<&TagEntry> {
        self.tags.iter().find(|tag| tag.name == name)
    }

    pub fn tagged<'a>(&'a self, tag: &'a TagEntry) -> impl Iterator<Item = &'a Document> + 'a {
        tag.posts.iter().filter_map(|index| self.posts.get(*index))
    }

    /// `(name, slug)` pairs for a post's tags.
    pub fn tag_links<'a>(&'a self, document: &'a Document) -> Vec<(&'a str, &'a str)> {
        document
            .meta
            .tags
            .iter()
            .filter_map(|name| {
                self.tag(name)
                    .map(|tag| (tag.name.as_str(), tag.slug.as_str()))
            })
            .collect()
    }
}

/// The `site` placeholder context. Collated posts and tags are included once
/// known so pages can reference them.
pub fn site_context(settings: &SiteSettings, site: Option<&Site>) -> Value {
    let mut context = json!({
        "title": settings.title,
        "url": settings.url,
        "description": settings.description,
        "author": settings.author,
        "language": settings.language,
    });

    if let (Some(site), Value::Object(map)) = (site, &mut context) {
        let posts = site
            .posts
            .iter()
            .map(|post| {
                json!({
                    "title": post.meta.title,
                    "url": post.meta.url,
                    "date": post.meta.date.map(format_rfc3339),
                    "tags": post.meta.tags,
                })
            })
            .collect();
        let tags = site
            .tags
            .iter()
            .map(|tag| Value::String(tag.name.clone()))
            .collect();
        map.insert("posts".into(), Value::Array(posts));
        map.insert("tags".into(), Value::Array(tags));
    }

    context
}
