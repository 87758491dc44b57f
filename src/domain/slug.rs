//! URL-safe identifiers for tag pages and heading anchors.

use std::collections::HashSet;

use slug::slugify;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("`{input}` has no characters usable in a slug")]
    Unrepresentable { input: String },
}

/// Lower-case, hyphenated form of `input`.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    match slugify(input) {
        candidate if candidate.is_empty() => Err(SlugError::Unrepresentable {
            input: input.to_string(),
        }),
        candidate => Ok(candidate),
    }
}

/// Hands out slugs that are unique within one namespace: the tags of a site
/// or the headings of a document. Repeats get `-2`, `-3` and so on, skipping
/// any suffix an earlier slug already took.
#[derive(Debug, Default)]
pub struct Slugger {
    taken: HashSet<String>,
}

impl Slugger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, text: &str) -> Result<String, SlugError> {
        let base = derive_slug(text)?;
        Ok(self.claim_slug(base))
    }

    /// Claim an already-derived slug, suffixing it on collision.
    pub fn claim_slug(&mut self, base: String) -> String {
        let mut candidate = base.clone();
        let mut suffix = 1;
        while self.taken.contains(&candidate) {
            suffix += 1;
            candidate = format!("{base}-{suffix}");
        }
        self.taken.insert(candidate.clone());
        candidate
    }

    pub fn is_taken(&self, slug: &str) -> bool {
        self.taken.contains(slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_slug_lowercases_and_hyphenates() {
        assert_eq!(
            derive_slug("Hello, Dithered World").expect("slug"),
            "hello-dithered-world"
        );
    }

    #[test]
    fn blank_and_symbol_only_text_is_rejected() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
        assert!(matches!(
            derive_slug("!!!"),
            Err(SlugError::Unrepresentable { .. })
        ));
    }

    #[test]
    fn repeats_are_suffixed_in_order() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.claim("Overview").expect("slug"), "overview");
        assert_eq!(slugger.claim("overview").expect("slug"), "overview-2");
        assert_eq!(slugger.claim("Shader setup").expect("slug"), "shader-setup");
        assert_eq!(slugger.claim("OVERVIEW").expect("slug"), "overview-3");
    }

    #[test]
    fn suffixes_skip_slugs_taken_verbatim() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.claim("Step 2").expect("slug"), "step-2");
        assert_eq!(slugger.claim("Step").expect("slug"), "step");
        assert_eq!(slugger.claim("Step").expect("slug"), "step-3");
        assert!(slugger.is_taken("step-2"));
    }
}
