//! `{{ site.title }}` style placeholders resolved before rendering.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_\-]*(?:\.[A-Za-z0-9_\-]+)*)\s*\}\}")
        .expect("placeholder pattern is valid")
});

/// Result of interpolating a document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpolated {
    pub text: String,
    /// Placeholder paths that did not resolve and were left untouched.
    pub unresolved: Vec<String>,
}

/// Replace every placeholder outside fenced code with its value from `context`.
pub fn interpolate(body: &str, context: &Value) -> Interpolated {
    let mut text = String::with_capacity(body.len());
    let mut unresolved = Vec::new();
    let mut fence: Option<&str> = None;

    for line in body.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let marker = ["```", "~~~"]
            .into_iter()
            .find(|marker| trimmed.starts_with(marker));

        match (fence, marker) {
            (None, Some(open)) => {
                fence = Some(open);
                text.push_str(line);
                continue;
            }
            (Some(open), Some(close)) if open == close => {
                fence = None;
                text.push_str(line);
                continue;
            }
            (Some(_), _) => {
                text.push_str(line);
                continue;
            }
            (None, None) => {}
        }

        let replaced = PLACEHOLDER.replace_all(line, |captures: &Captures<'_>| {
            let path = &captures[1];
            match lookup(context, path).and_then(render_value) {
                Some(value) => value,
                None => {
                    unresolved.push(path.to_string());
                    captures[0].to_string()
                }
            }
        });
        text.push_str(&replaced);
    }

    Interpolated { text, unresolved }
}

fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(context, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index)),
        _ => None,
    })
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| scalar(item).map(Cow::into_owned))
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.join(", ")),
        other => scalar(other).map(Cow::into_owned),
    }
}

fn scalar(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => Some(Cow::Borrowed("")),
        Value::String(text) => Some(Cow::Borrowed(text.as_str())),
        Value::Bool(flag) => Some(Cow::Owned(flag.to_string())),
        Value::Number(number) => Some(Cow::Owned(number.to_string())),
        Value::Array(_) | Value::Object(_) => None,
    }
}
