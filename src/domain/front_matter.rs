//! YAML front matter fenced by `---` lines at the top of a document.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;
use thiserror::Error;
use time::OffsetDateTime;

use super::dates::parse_front_matter_date;

const FENCE: &str = "---";

/// Typed view over a document's front matter. Keys without a dedicated field
/// are kept in `extra` so templates and placeholders can still reach them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<OffsetDateTime>,
    pub layout: Option<String>,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub extra: BTreeMap<String, JsonValue>,
}

#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("front matter opened with `---` but never closed")]
    Unterminated,
    #[error("front matter is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front matter must be a mapping")]
    NotAMapping,
    #[error("front matter field `{field}` is invalid: {reason}")]
    InvalidField { field: String, reason: String },
}

impl FrontMatterError {
    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Separate the front matter from the body. Documents without an opening
/// fence have empty front matter and keep their whole text as the body.
pub fn split(source: &str) -> Result<(FrontMatter, &str), FrontMatterError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let Some(rest) = strip_opening_fence(source) else {
        return Ok((FrontMatter::default(), source));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == FENCE {
            let matter = parse_yaml(&rest[..offset])?;
            return Ok((matter, &rest[offset + line.len()..]));
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unterminated)
}

fn strip_opening_fence(source: &str) -> Option<&str> {
    let rest = source.strip_prefix(FENCE)?;
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}

fn parse_yaml(yaml: &str) -> Result<FrontMatter, FrontMatterError> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::default());
    }

    let mapping = match serde_yaml::from_str::<YamlValue>(yaml)? {
        YamlValue::Mapping(mapping) => mapping,
        YamlValue::Null => return Ok(FrontMatter::default()),
        _ => return Err(FrontMatterError::NotAMapping),
    };

    let mut matter = FrontMatter::default();
    for (key, value) in mapping {
        let Some(key) = key.as_str().map(str::to_owned) else {
            continue;
        };

        match key.as_str() {
            "title" => matter.title = scalar_text(&value),
            "layout" => matter.layout = scalar_text(&value),
            "summary" => matter.summary = scalar_text(&value),
            "date" => {
                let raw = scalar_text(&value)
                    .ok_or_else(|| FrontMatterError::invalid("date", "expected a scalar"))?;
                let parsed = parse_front_matter_date(&raw)
                    .map_err(|reason| FrontMatterError::invalid("date", reason))?;
                matter.date = Some(parsed);
            }
            "tags" => matter.tags = parse_tags(&value)?,
            _ => {
                let json = serde_json::to_value(&value)
                    .map_err(|err| FrontMatterError::invalid(key.as_str(), err.to_string()))?;
                matter.extra.insert(key, json);
            }
        }
    }

    Ok(matter)
}

fn parse_tags(value: &YamlValue) -> Result<Vec<String>, FrontMatterError> {
    let raw: Vec<String> = match value {
        YamlValue::Null => Vec::new(),
        YamlValue::Sequence(items) => items
            .iter()
            .map(|item| {
                scalar_text(item)
                    .ok_or_else(|| FrontMatterError::invalid("tags", "tags must be scalars"))
            })
            .collect::<Result<_, _>>()?,
        other => match scalar_text(other) {
            Some(text) => text.split(',').map(str::to_owned).collect(),
            None => return Err(FrontMatterError::invalid("tags", "expected a list or a string")),
        },
    };

    Ok(raw
        .into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect())
}

fn scalar_text(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(text) => Some(text.clone()),
        YamlValue::Number(number) => Some(number.to_string()),
        YamlValue::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
