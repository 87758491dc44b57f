use std::{cell::RefCell, rc::Rc};

use lol_html::{RewriteStrSettings, element, rewrite_str};

use crate::application::render::types::{RenderError, RenderedHeading};

/// Set `id` on rendered headings in document order. Headings that already
/// carry an id (raw HTML in the source) keep it and do not consume an anchor.
pub(crate) fn apply_heading_ids(
    html: &str,
    headings: &[RenderedHeading],
) -> Result<String, RenderError> {
    if headings.is_empty() {
        return Ok(html.to_string());
    }

    let shared = Rc::new(headings.to_vec());
    let index = Rc::new(RefCell::new(0usize));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("h1, h2, h3, h4, h5, h6", {
                let shared = Rc::clone(&shared);
                let index = Rc::clone(&index);
                move |el| {
                    if el.has_attribute("id") {
                        return Ok(());
                    }

                    let mut idx = index.borrow_mut();
                    let Some(info) = shared.get(*idx) else {
                        return Ok(());
                    };

                    let level = el
                        .tag_name()
                        .strip_prefix('h')
                        .and_then(|value| value.parse::<u8>().ok())
                        .unwrap_or(0);
                    if level != info.level {
                        return Ok(());
                    }

                    *idx += 1;
                    el.set_attribute("id", &info.anchor)?;
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Document {
        message: err.to_string(),
    })
}
