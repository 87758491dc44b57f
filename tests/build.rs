use std::{fs, path::Path, sync::Arc};

use stipple::{
    application::build::{SiteBuilder, Task, plan},
    config::{PathSettings, Settings, SiteSettings},
};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    fs::write(path, contents).expect("write fixture");
}

fn fixture_site() -> (TempDir, Arc<Settings>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();

    write(
        root,
        "content/posts/2016-05-03-dithered-webgl.md",
        "---\ntags: [webgl, dithering]\n---\n\
         Rendering a scene in {{ site.title }}.\n\n\
         ## Setup\n\n\
         ```js\nconst gl = canvas.getContext('webgl');\n```\n",
    );
    write(
        root,
        "content/posts/2015-12-01-hello.html",
        "---\ntitle: Hello there\ntags: [webgl]\n---\n<p>First post.</p>\n",
    );
    write(root, "content/posts/_draft.md", "Not ready yet.\n");
    write(
        root,
        "content/about.md",
        "---\ntitle: About\n---\nWelcome to {{ site.title }}.\n",
    );
    write(
        root,
        "content/archive.md",
        "---\nlayout: layouts/archive.html\ntitle: Archive\n---\nEverything so far.\n",
    );
    write(root, "content/broken.md", "---\ntitle: [unclosed\n---\nbody\n");
    write(root, "assets/styles/main.css", "body { margin: 0; }\n");
    write(root, "assets/scripts/client.js", "console.log('hi');\n");
    write(root, "assets/scripts/shaders/dither.frag", "void main() {}\n");
    write(root, "assets/fonts/body.woff2", "font");
    write(root, "assets/misc/favicon.ico", "icon");

    let defaults = Settings::default();
    let settings = Settings {
        site: SiteSettings {
            title: "Stipple Notes".to_string(),
            url: "https://blog.example.com".to_string(),
            cname: Some("blog.example.com".to_string()),
            ..defaults.site.clone()
        },
        paths: PathSettings {
            content: root.join("content"),
            assets: root.join("assets"),
            output: root.join("dist"),
            extra_fonts: None,
        },
        ..defaults
    };

    (dir, Arc::new(settings))
}

fn read(settings: &Settings, relative: &str) -> String {
    fs::read_to_string(settings.paths.output.join(relative))
        .unwrap_or_else(|err| panic!("missing output `{relative}`: {err}"))
}

#[test]
fn full_build_writes_site_feeds_and_assets() {
    let (_dir, settings) = fixture_site();
    let report = SiteBuilder::new(Arc::clone(&settings))
        .run(&plan(&[]))
        .expect("build succeeds");

    assert_eq!(report.documents_of("post"), 2);
    // about, archive and the generated index
    assert_eq!(report.documents_of("page"), 3);
    assert_eq!(report.documents_of("tag"), 2);
    assert_eq!(report.failures, 1, "broken front matter is skipped");

    let post = read(&settings, "posts/2016/05/03/dithered-webgl.html");
    assert!(post.contains("Rendering a scene in Stipple Notes."));
    assert!(post.contains("id=\"setup\""));
    assert!(post.contains("syntax-highlight"));
    assert!(post.contains("/styles/syntax.css"));
    assert!(post.contains("href=\"/tags/webgl.html\""));

    let hello = read(&settings, "posts/2015/12/01/hello.html");
    assert!(hello.contains("<p>First post.</p>"));
    assert!(!hello.contains("/styles/syntax.css"));

    let about = read(&settings, "about.html");
    assert!(about.contains("Welcome to Stipple Notes."));

    let index = read(&settings, "index.html");
    let newer = index.find("Dithered webgl").expect("newest post listed");
    let older = index.find("Hello there").expect("older post listed");
    assert!(newer < older);

    let archive = read(&settings, "archive.html");
    assert!(archive.contains("archive-year"));
    assert!(archive.contains("Everything so far."));

    let tag = read(&settings, "tags/webgl.html");
    assert!(tag.contains("Dithered webgl"));
    assert!(tag.contains("Hello there"));

    let rss = read(&settings, "posts.xml");
    assert!(rss.contains(
        "<link>https://blog.example.com/posts/2016/05/03/dithered-webgl.html</link>"
    ));
    assert!(read(&settings, "atom.xml").contains("<feed"));
    assert!(read(&settings, "sitemap.xml").contains("https://blog.example.com/about.html"));
    assert!(
        read(&settings, "robots.txt").contains("Sitemap: https://blog.example.com/sitemap.xml")
    );

    assert!(read(&settings, "styles/syntax.css").contains("syntax-"));
    assert_eq!(read(&settings, "styles/main.css"), "body { margin: 0; }\n");
    assert!(
        settings
            .paths
            .output
            .join("scripts/shaders/dither.frag")
            .is_file()
    );
    assert!(settings.paths.output.join("fonts/body.woff2").is_file());
    assert_eq!(read(&settings, "favicon.ico"), "icon");
    assert_eq!(read(&settings, "CNAME"), "blog.example.com\n");

    assert!(!settings.paths.output.join("posts/_draft.html").exists());
}

#[test]
fn selecting_feeds_builds_posts_first() {
    let (_dir, settings) = fixture_site();
    let tasks = plan(&[Task::Feeds]);
    let report = SiteBuilder::new(Arc::clone(&settings))
        .run(&tasks)
        .expect("build succeeds");

    assert_eq!(report.tasks, vec![Task::Posts, Task::Feeds]);
    assert!(read(&settings, "posts.xml").contains("Hello there"));
    assert!(!settings.paths.output.join("about.html").exists());
    assert!(!settings.paths.output.join("styles").exists());
}

#[test]
fn clean_removes_output_and_tolerates_missing_directory() {
    let (_dir, settings) = fixture_site();
    let builder = SiteBuilder::new(Arc::clone(&settings));
    builder.run(&plan(&[Task::Misc])).expect("build succeeds");
    assert!(settings.paths.output.exists());

    assert!(builder.clean().expect("clean"));
    assert!(!settings.paths.output.exists());
    assert!(!builder.clean().expect("second clean"));
}
