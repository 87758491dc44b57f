//! Documents after front matter, placement and rendering have been applied.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use time::OffsetDateTime;

use super::dates::format_rfc3339;

/// Source markup of a document, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Markdown,
    Html,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Post,
    Page,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Page => "page",
        }
    }

    /// Layout used when front matter does not name one.
    pub fn default_layout(self) -> &'static str {
        self.as_str()
    }
}

/// Metadata visible to layouts, feeds and placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct PageMeta {
    pub title: String,
    pub date: Option<OffsetDateTime>,
    pub url: String,
    pub layout: String,
    pub tags: Vec<String>,
    /// Rendered HTML excerpt.
    pub summary: String,
    pub extra: BTreeMap<String, Value>,
}

impl PageMeta {
    /// JSON shape used as the `page` placeholder context. Extra front matter
    /// keys sit next to the typed ones without overriding them.
    pub fn to_context(&self) -> Value {
        let mut map = Map::new();
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }
        map.insert("title".into(), Value::String(self.title.clone()));
        map.insert(
            "date".into(),
            self.date
                .map(|date| Value::String(format_rfc3339(date)))
                .unwrap_or(Value::Null),
        );
        map.insert("url".into(), Value::String(self.url.clone()));
        map.insert("layout".into(), Value::String(self.layout.clone()));
        map.insert(
            "tags".into(),
            Value::Array(self.tags.iter().cloned().map(Value::String).collect()),
        );
        Value::Object(map)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub kind: DocumentKind,
    pub source_kind: SourceKind,
    /// Path relative to the content directory.
    pub source_path: PathBuf,
    /// Path relative to the output directory.
    pub output_path: PathBuf,
    pub meta: PageMeta,
    pub content_html: String,
    pub contains_code: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn source_kind_follows_extension() {
        assert_eq!(
            SourceKind::from_path(Path::new("a/b.MD")),
            Some(SourceKind::Markdown)
        );
        assert_eq!(
            SourceKind::from_path(Path::new("index.html")),
            Some(SourceKind::Html)
        );
        assert_eq!(SourceKind::from_path(Path::new("notes.txt")), None);
    }

    #[test]
    fn context_keeps_typed_fields_over_extras() {
        let mut extra = BTreeMap::new();
        extra.insert("title".to_string(), json!("shadowed"));
        extra.insert("model".to_string(), json!("duck.glb"));
        let meta = PageMeta {
            title: "Real".into(),
            date: Some(datetime!(2016-05-03 0:00 UTC)),
            url: "/posts/2016/05/03/real.html".into(),
            layout: "post".into(),
            tags: vec!["rust".into()],
            summary: String::new(),
            extra,
        };

        let context = meta.to_context();
        assert_eq!(context["title"], json!("Real"));
        assert_eq!(context["model"], json!("duck.glb"));
        assert_eq!(context["date"], json!("2016-05-03T00:00:00Z"));
        assert_eq!(context["tags"], json!(["rust"]));
    }
}
