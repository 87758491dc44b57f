//! Stylesheets, scripts, fonts and miscellaneous files copied into the output.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::{
    application::render::{RenderError, syntax_css},
    config::{PathSettings, SiteSettings},
    infra::output::{OutputDir, OutputError},
};

pub const STYLES_DIR: &str = "styles";
pub const SCRIPTS_DIR: &str = "scripts";
pub const FONTS_DIR: &str = "fonts";
pub const MISC_DIR: &str = "misc";
pub const SYNTAX_STYLESHEET: &str = "syntax.css";
pub const CNAME_FILE: &str = "CNAME";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to walk `{path}`: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error("failed to generate the syntax stylesheet: {0}")]
    Theme(#[from] RenderError),
}

/// Copy `.css` files and generate the highlighting stylesheet.
pub fn build_styles(
    paths: &PathSettings,
    syntax_theme: &str,
    output: &OutputDir,
) -> Result<usize, AssetError> {
    let copied = copy_tree(
        &paths.assets.join(STYLES_DIR),
        Path::new(STYLES_DIR),
        output,
        |path| has_extension(path, &["css"]),
    )?;

    let css = syntax_css(syntax_theme)?;
    output.write(&Path::new(STYLES_DIR).join(SYNTAX_STYLESHEET), css)?;
    Ok(copied + 1)
}

/// Copy client scripts together with the shader sources they load.
pub fn build_scripts(paths: &PathSettings, output: &OutputDir) -> Result<usize, AssetError> {
    copy_tree(
        &paths.assets.join(SCRIPTS_DIR),
        Path::new(SCRIPTS_DIR),
        output,
        |_| true,
    )
}

/// Copy bundled fonts and the optional extra font directory.
pub fn build_fonts(paths: &PathSettings, output: &OutputDir) -> Result<usize, AssetError> {
    let mut copied = copy_tree(
        &paths.assets.join(FONTS_DIR),
        Path::new(FONTS_DIR),
        output,
        |_| true,
    )?;
    if let Some(extra) = paths.extra_fonts.as_ref() {
        copied += copy_tree(extra, Path::new(FONTS_DIR), output, |_| true)?;
    }
    Ok(copied)
}

/// Copy `assets/misc/**` to the output root and write `CNAME` when configured.
pub fn build_misc(
    paths: &PathSettings,
    site: &SiteSettings,
    output: &OutputDir,
) -> Result<usize, AssetError> {
    let mut copied = copy_tree(&paths.assets.join(MISC_DIR), Path::new(""), output, |_| true)?;
    if let Some(cname) = site.cname.as_deref() {
        output.write(Path::new(CNAME_FILE), format!("{cname}\n"))?;
        copied += 1;
    }
    Ok(copied)
}

/// Mirror the files under `source` that pass `filter` into `prefix`. A
/// missing source directory copies nothing.
fn copy_tree<F>(
    source: &Path,
    prefix: &Path,
    output: &OutputDir,
    filter: F,
) -> Result<usize, AssetError>
where
    F: Fn(&Path) -> bool,
{
    if !source.is_dir() {
        debug!(
            target = "stipple::application::assets",
            path = %source.display(),
            "Asset directory missing; nothing to copy"
        );
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(source).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|err| AssetError::Walk {
            path: source.to_path_buf(),
            source: err,
        })?;
        if !entry.file_type().is_file() || !filter(entry.path()) {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        output.copy_from(entry.path(), &prefix.join(relative))?;
        copied += 1;
    }

    Ok(copied)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| {
            extensions
                .iter()
                .any(|candidate| extension.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_SYNTAX_THEME, Settings};
    use std::fs;

    fn fixture() -> (tempfile::TempDir, PathSettings, OutputDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = PathSettings {
            content: dir.path().join("content"),
            assets: dir.path().join("assets"),
            output: dir.path().join("dist"),
            extra_fonts: None,
        };
        let output = OutputDir::new(&paths.output);
        (dir, paths, output)
    }

    fn touch(path: PathBuf) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, "x").expect("write");
    }

    #[test]
    fn styles_copy_css_and_generate_syntax_sheet() {
        let (_dir, paths, output) = fixture();
        touch(paths.assets.join("styles/main.css"));
        touch(paths.assets.join("styles/partials/_vars.scss"));

        let copied = build_styles(&paths, DEFAULT_SYNTAX_THEME, &output).expect("styles");

        assert_eq!(copied, 2);
        assert!(output.exists(Path::new("styles/main.css")));
        assert!(output.exists(Path::new("styles/syntax.css")));
        assert!(!output.exists(Path::new("styles/partials/_vars.scss")));
    }

    #[test]
    fn scripts_include_shaders() {
        let (_dir, paths, output) = fixture();
        touch(paths.assets.join("scripts/client.js"));
        touch(paths.assets.join("scripts/shaders/dither.frag"));
        touch(paths.assets.join("scripts/shaders/scene.glsl"));

        assert_eq!(build_scripts(&paths, &output).expect("scripts"), 3);
        assert!(output.exists(Path::new("scripts/shaders/dither.frag")));
    }

    #[test]
    fn fonts_merge_extra_directory() {
        let (dir, mut paths, output) = fixture();
        touch(paths.assets.join("fonts/body.woff2"));
        touch(dir.path().join("vendor-fonts/icons.woff"));
        paths.extra_fonts = Some(dir.path().join("vendor-fonts"));

        assert_eq!(build_fonts(&paths, &output).expect("fonts"), 2);
        assert!(output.exists(Path::new("fonts/icons.woff")));
    }

    #[test]
    fn misc_lands_at_root_with_cname() {
        let (_dir, paths, output) = fixture();
        touch(paths.assets.join("misc/favicon.ico"));
        let site = SiteSettings {
            cname: Some("blog.example.com".to_string()),
            ..Settings::default().site
        };

        assert_eq!(build_misc(&paths, &site, &output).expect("misc"), 2);
        assert!(output.exists(Path::new("favicon.ico")));
        let cname = fs::read_to_string(output.root().join("CNAME")).expect("cname");
        assert_eq!(cname, "blog.example.com\n");
    }

    #[test]
    fn missing_asset_directories_copy_nothing() {
        let (_dir, paths, output) = fixture();
        assert_eq!(build_scripts(&paths, &output).expect("scripts"), 0);
        assert_eq!(build_fonts(&paths, &output).expect("fonts"), 0);
    }
}
