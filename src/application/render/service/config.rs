use comrak::options::{ListStyleType, Options};

pub(crate) fn default_options() -> Options<'static> {
    let mut options = Options::default();
    configure_extensions(&mut options);
    options
}

fn configure_extensions(options: &mut Options<'static>) {
    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.tagfilter = false;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;
    ext.superscript = false;

    let render = &mut options.render;
    render.github_pre_lang = true;
    render.full_info_string = true;
    render.tasklist_classes = true;
    render.list_style = ListStyleType::Dash;
    // Content is trusted: raw HTML in posts passes through untouched.
    render.r#unsafe = true;
    render.sourcepos = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gfm_extensions_are_enabled() {
        let options = default_options();
        assert!(options.extension.table);
        assert!(options.extension.strikethrough);
        assert!(options.extension.autolink);
        assert!(options.extension.tasklist);
        assert!(options.extension.footnotes);
        assert!(options.render.r#unsafe);
    }
}
