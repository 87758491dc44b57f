use syntect::{
    html::{ClassStyle, ClassedHTMLGenerator},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};

use crate::application::render::types::RenderError;

/// Highlight a fenced block into `<pre><code>` with prefixed classes. Without a
/// language the syntax is guessed from the first line, then plain text.
pub(crate) fn highlight_code(
    language: Option<&str>,
    meta: Option<&str>,
    code: &str,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<String, RenderError> {
    let detected = match language {
        Some(token) => find_syntax(syntax_set, token),
        None => syntax_set.find_syntax_by_first_line(code),
    };
    let syntax = detected.unwrap_or_else(|| syntax_set.find_syntax_plain_text());

    let lang_token = match (language, detected) {
        (Some(token), _) => token.to_ascii_lowercase(),
        (None, Some(found)) => syntax_token(found),
        (None, None) => "text".to_string(),
    };

    let mut code_with_newline = code.to_string();
    if !code_with_newline.ends_with('\n') {
        code_with_newline.push('\n');
    }

    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set, *class_style);

    for line in LinesWithEndings::from(code_with_newline.as_str()) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .map_err(|err| RenderError::Highlighting {
                language: lang_token.clone(),
                message: err.to_string(),
            })?;
    }

    let highlighted = generator.finalize();
    let lang_attr = escape_attribute(&lang_token);
    let meta_attr = meta
        .filter(|m| !m.is_empty())
        .map(|m| format!(" data-meta=\"{}\"", escape_attribute(m)))
        .unwrap_or_default();

    Ok(format!(
        "<pre class=\"syntax-highlight syntax-lang-{lang_attr}\" data-language=\"{lang_attr}\"><code class=\"language-{lang_attr} syntax-code\"{meta_attr}>{highlighted}</code></pre>"
    ))
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, token: &str) -> Option<&'a SyntaxReference> {
    let lowercase = token.to_ascii_lowercase();
    syntax_set
        .find_syntax_by_token(&lowercase)
        .or_else(|| syntax_set.find_syntax_by_name(token))
        .or_else(|| syntax_set.find_syntax_by_extension(&lowercase))
}

fn syntax_token(syntax: &SyntaxReference) -> String {
    syntax
        .file_extensions
        .first()
        .cloned()
        .unwrap_or_else(|| "text".to_string())
        .to_ascii_lowercase()
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlight(language: Option<&str>, code: &str) -> String {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let class_style = ClassStyle::SpacedPrefixed { prefix: "syntax-" };
        highlight_code(language, None, code, &syntax_set, &class_style).expect("highlight")
    }

    #[test]
    fn named_languages_are_highlighted() {
        let html = highlight(Some("rust"), "fn main() {}");
        assert!(html.contains("syntax-lang-rust"));
        assert!(html.contains("class=\"syntax-"));
    }

    #[test]
    fn first_line_detection_is_used_without_a_language() {
        let html = highlight(None, "#!/bin/bash\necho hi");
        assert!(html.contains("syntax-lang-"));
        assert!(!html.contains("syntax-lang-text"));
    }

    #[test]
    fn unknown_content_falls_back_to_plain_text() {
        let html = highlight(None, "just words <here>");
        assert!(html.contains("syntax-lang-text"));
        assert!(html.contains("&lt;here&gt;"));
    }

    #[test]
    fn meta_is_escaped() {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let class_style = ClassStyle::SpacedPrefixed { prefix: "syntax-" };
        let html = highlight_code(
            Some("text"),
            Some("title=\"a<b\""),
            "x",
            &syntax_set,
            &class_style,
        )
        .expect("highlight");
        assert!(html.contains("data-meta=\"title=&quot;a&lt;b&quot;\""));
    }
}
