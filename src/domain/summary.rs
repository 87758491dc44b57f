//! Excerpts shown on index pages and in feeds.

/// Marker that ends the summary of an HTML document.
pub const MORE_MARKER: &str = "<!--more-->";

const MAX_SUMMARY_LINES: usize = 11;
const CODE_FENCE: &str = "```";
const ELLIPSIS: char = '…';

/// Everything before the first `<!--more-->`, or the whole body.
pub fn html_summary(body: &str) -> &str {
    match body.find(MORE_MARKER) {
        Some(index) => &body[..index],
        None => body,
    }
}

/// Markdown source for the excerpt of a Markdown document: the leading lines
/// up to the first code fence, suffixed with an ellipsis.
pub fn markdown_summary_source(body: &str) -> String {
    let mut summary = body
        .lines()
        .take_while(|line| !line.contains(CODE_FENCE))
        .take(MAX_SUMMARY_LINES)
        .collect::<Vec<_>>()
        .join("\n");
    summary.push(ELLIPSIS);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_summary_stops_at_marker() {
        assert_eq!(html_summary("<p>a</p><!--more--><p>b</p>"), "<p>a</p>");
        assert_eq!(html_summary("<p>a</p>"), "<p>a</p>");
    }

    #[test]
    fn markdown_summary_is_capped_at_eleven_lines() {
        let body = (1..=20).map(|n| n.to_string()).collect::<Vec<_>>().join("\n");
        let summary = markdown_summary_source(&body);
        assert_eq!(summary, "1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n11…");
    }

    #[test]
    fn markdown_summary_stops_before_code() {
        let summary = markdown_summary_source("intro\nmore\n```rust\nfn main() {}\n```\n");
        assert_eq!(summary, "intro\nmore…");
    }
}
