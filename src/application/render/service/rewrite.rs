use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use syntect::html::ClassStyle;
use syntect::parsing::SyntaxSet;

use crate::{
    application::render::types::{RenderError, RenderedHeading},
    domain::slug::Slugger,
};

use super::highlight;

const FALLBACK_ANCHOR: &str = "section";

#[derive(Debug, Default)]
pub(crate) struct RewriteOutcome {
    pub(crate) contains_code: bool,
    pub(crate) headings: Vec<RenderedHeading>,
}

/// Replace fenced code with highlighted HTML and assign heading anchors.
pub(crate) fn rewrite_ast<'a>(
    root: &'a AstNode<'a>,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<RewriteOutcome, RenderError> {
    let mut walker = RewriteWalker {
        syntax_set,
        class_style,
        outcome: RewriteOutcome::default(),
        slugger: Slugger::new(),
    };
    walker.visit_nodes(root)?;
    Ok(walker.outcome)
}

struct RewriteWalker<'a> {
    syntax_set: &'a SyntaxSet,
    class_style: &'a ClassStyle,
    outcome: RewriteOutcome,
    slugger: Slugger,
}

impl RewriteWalker<'_> {
    fn visit_nodes(&mut self, node: &AstNode<'_>) -> Result<(), RenderError> {
        if let Some(level) = heading_level(node) {
            let text = collect_inline_text(node);
            let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
            // Headings without sluggable text still need an id.
            let anchor = self
                .slugger
                .claim(&normalized)
                .unwrap_or_else(|_| self.slugger.claim_slug(FALLBACK_ANCHOR.to_string()));
            self.outcome.headings.push(RenderedHeading {
                level,
                anchor,
                text: normalized,
            });
        }

        if let Some((info, literal)) = extract_code_block(node) {
            let mut segments = info.split_whitespace();
            let language = segments.next().map(str::to_string);
            let meta = segments.collect::<Vec<_>>().join(" ");

            let html = highlight::highlight_code(
                language.as_deref(),
                (!meta.is_empty()).then_some(meta.as_str()),
                &literal,
                self.syntax_set,
                self.class_style,
            )?;
            self.outcome.contains_code = true;

            let mut data = node.data.borrow_mut();
            data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
                block_type: 0,
                literal: html,
            });
        }

        let mut child = node.first_child();
        while let Some(next) = child {
            self.visit_nodes(next)?;
            child = next.next_sibling();
        }

        Ok(())
    }
}

fn extract_code_block(node: &AstNode<'_>) -> Option<(String, String)> {
    let data = node.data.borrow();
    if let NodeValue::CodeBlock(block) = &data.value {
        Some((block.info.trim().to_string(), block.literal.clone()))
    } else {
        None
    }
}

fn heading_level(node: &AstNode<'_>) -> Option<u8> {
    let data = node.data.borrow();
    if let NodeValue::Heading(heading) = &data.value {
        Some(heading.level)
    } else {
        None
    }
}

fn collect_inline_text(node: &AstNode<'_>) -> String {
    fn walk(node: &AstNode<'_>, buffer: &mut String) {
        {
            let data = node.data.borrow();
            match &data.value {
                NodeValue::Text(text) => buffer.push_str(text),
                NodeValue::Code(code) => buffer.push_str(&code.literal),
                NodeValue::LineBreak | NodeValue::SoftBreak => buffer.push(' '),
                _ => {}
            }
        }
        let mut child = node.first_child();
        while let Some(next) = child {
            walk(next, buffer);
            child = next.next_sibling();
        }
    }

    let mut text = String::new();
    let mut child = node.first_child();
    while let Some(next) = child {
        walk(next, &mut text);
        child = next.next_sibling();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use comrak::{Arena, format_html, parse_document};

    fn rewrite(markdown: &str) -> (RewriteOutcome, String) {
        let options = super::super::config::default_options();
        let arena = Arena::new();
        let root = parse_document(&arena, markdown, &options);
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let class_style = ClassStyle::SpacedPrefixed { prefix: "syntax-" };

        let outcome = rewrite_ast(root, &syntax_set, &class_style).expect("rewrite");
        let mut html = String::new();
        format_html(root, &options, &mut html).expect("html");
        (outcome, html)
    }

    #[test]
    fn code_blocks_become_highlighted_html() {
        let (outcome, html) = rewrite("```rust\nlet x = 1;\n```\n");
        assert!(outcome.contains_code);
        assert!(html.contains("syntax-highlight"));
        assert!(!html.contains("<pre lang="));
    }

    #[test]
    fn headings_get_unique_anchors() {
        let (outcome, _) = rewrite("# Intro\n\n## Intro\n\n### `code` *here*\n");
        let anchors: Vec<_> = outcome
            .headings
            .iter()
            .map(|heading| heading.anchor.as_str())
            .collect();
        assert_eq!(anchors, vec!["intro", "intro-2", "code-here"]);
        assert_eq!(outcome.headings[2].text, "code here");
        assert!(!outcome.contains_code);
    }

    #[test]
    fn symbol_only_headings_fall_back() {
        let (outcome, _) = rewrite("## !!!\n\n## ???\n");
        let anchors: Vec<_> = outcome
            .headings
            .iter()
            .map(|heading| heading.anchor.as_str())
            .collect();
        assert_eq!(anchors, vec!["section", "section-2"]);
    }
}
