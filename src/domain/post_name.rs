//! Publish dates and URLs derived from `YYYY-MM-DD-name.ext` filenames.

use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use time::{Date, Month, OffsetDateTime};

use super::dates::{start_of_day, url_date_path};

/// Output directory, and URL prefix, of every dated document.
pub const POSTS_DIR: &str = "posts";

static POST_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})-(.*)$").expect("post name pattern is valid")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PostNameError {
    #[error("`{file}` carries an invalid date: {reason}")]
    InvalidDate { file: String, reason: String },
    #[error("`{file}` has a date prefix but no name")]
    EmptyName { file: String },
}

/// The pieces of a dated filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostName {
    pub date: Date,
    /// Everything after the date prefix, extension included.
    pub basename: String,
    /// `basename` without its extension.
    pub name: String,
}

/// Where a document lands in the output tree and how it is linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub url: String,
    /// Output path relative to the output root.
    pub output: PathBuf,
    /// Effective publish date: front matter first, then the filename.
    pub date: Option<OffsetDateTime>,
    /// Title derived from the filename, used when front matter has none.
    pub default_title: Option<String>,
}

/// Parse a file name. Names without a date prefix yield `Ok(None)`.
pub fn parse(file_name: &str) -> Result<Option<PostName>, PostNameError> {
    let Some(captures) = POST_NAME.captures(file_name) else {
        return Ok(None);
    };

    let invalid = |reason: String| PostNameError::InvalidDate {
        file: file_name.to_string(),
        reason,
    };

    let year: i32 = captures[1]
        .parse()
        .map_err(|err| invalid(format!("year: {err}")))?;
    let month: u8 = captures[2]
        .parse()
        .map_err(|err| invalid(format!("month: {err}")))?;
    let day: u8 = captures[3]
        .parse()
        .map_err(|err| invalid(format!("day: {err}")))?;

    let month = Month::try_from(month).map_err(|err| invalid(err.to_string()))?;
    let date = Date::from_calendar_date(year, month, day).map_err(|err| invalid(err.to_string()))?;

    let basename = captures[4].to_string();
    let name = Path::new(&basename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string();

    if name.is_empty() {
        return Err(PostNameError::EmptyName {
            file: file_name.to_string(),
        });
    }

    Ok(Some(PostName {
        date,
        basename,
        name,
    }))
}

/// Decide the output path and URL of a document.
///
/// `section` is the output directory the document belongs to (`posts` for
/// posts, empty for pages) and `relative` its path inside the matching
/// content directory. Dated file names always land under
/// `posts/YYYY/MM/DD/`, whatever their section.
pub fn place(
    section: &Path,
    relative: &Path,
    front_matter_date: Option<OffsetDateTime>,
) -> Result<Placement, PostNameError> {
    let file_name = relative
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    match parse(file_name)? {
        Some(post) => {
            let date = front_matter_date.unwrap_or_else(|| start_of_day(post.date));
            let output = Path::new(POSTS_DIR)
                .join(url_date_path(date.date()))
                .join(Path::new(&post.basename).with_extension("html"));

            Ok(Placement {
                url: url_from_relative(&output),
                output,
                date: Some(date),
                default_title: Some(capitalize(&post.name.replace('-', " "))),
            })
        }
        None => {
            let output = section.join(relative.with_extension("html"));
            Ok(Placement {
                url: url_from_relative(&output),
                output,
                date: front_matter_date,
                default_title: None,
            })
        }
    }
}

/// Site-absolute URL for an output-relative path.
pub fn url_from_relative(path: &Path) -> String {
    let segments: Vec<String> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    format!("/{}", segments.join("/"))
}

/// Upper-case the first character and lower-case the rest.
pub fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
