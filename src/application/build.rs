//! The build task graph: content, feeds and assets written into the output
//! directory.

use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    application::{
        assets::{self, AssetError},
        documents::{DocumentError, load_document},
        layout::{self, LayoutError},
        render::{RenderService, render_service},
        site::{Site, SourceFile, discover, site_context},
        sitemap::{ROBOTS_FILE, SITEMAP_FILE, SitemapEntry, robots_txt, sitemap_xml},
        syndication::{ATOM_FILE, RSS_FILE, SyndicationError, atom_feed, rss_feed},
    },
    config::{Settings, TaskSelector},
    domain::document::{Document, DocumentKind, PageMeta, SourceKind},
    infra::output::{OutputDir, OutputError},
};

const METRIC_DOCUMENTS: &str = "stipple_build_documents_total";
const METRIC_FAILURES: &str = "stipple_build_failures_total";
const METRIC_BUILD_MS: &str = "stipple_build_ms";
const INDEX_FILE: &str = "index.html";

/// One node of the build graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Task {
    Posts,
    Pages,
    Feeds,
    Styles,
    Scripts,
    Fonts,
    Misc,
}

impl Task {
    pub const ALL: [Task; 7] = [
        Task::Posts,
        Task::Pages,
        Task::Feeds,
        Task::Styles,
        Task::Scripts,
        Task::Fonts,
        Task::Misc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Pages => "pages",
            Self::Feeds => "feeds",
            Self::Styles => "styles",
            Self::Scripts => "scripts",
            Self::Fonts => "fonts",
            Self::Misc => "misc",
        }
    }

    pub fn prerequisites(self) -> &'static [Task] {
        match self {
            Self::Pages | Self::Feeds => &[Task::Posts],
            _ => &[],
        }
    }

    /// Tasks a CLI selector stands for.
    pub fn from_selector(selector: TaskSelector) -> &'static [Task] {
        match selector {
            TaskSelector::Content => &[Task::Posts, Task::Pages, Task::Feeds],
            TaskSelector::Posts => &[Task::Posts],
            TaskSelector::Pages => &[Task::Pages],
            TaskSelector::Feeds => &[Task::Feeds],
            TaskSelector::Styles => &[Task::Styles],
            TaskSelector::Scripts => &[Task::Scripts],
            TaskSelector::Fonts => &[Task::Fonts],
            TaskSelector::Misc => &[Task::Misc],
        }
    }
}

/// Close `selection` over prerequisites and return it in execution order.
/// An empty selection means every task.
pub fn plan(selection: &[Task]) -> Vec<Task> {
    if selection.is_empty() {
        return Task::ALL.to_vec();
    }

    let mut selected: Vec<Task> = Vec::new();
    let mut pending: Vec<Task> = selection.to_vec();
    while let Some(task) = pending.pop() {
        if selected.contains(&task) {
            continue;
        }
        selected.push(task);
        pending.extend_from_slice(task.prerequisites());
    }

    Task::ALL
        .into_iter()
        .filter(|task| selected.contains(task))
        .collect()
}

/// Expand CLI selectors into a build plan.
pub fn plan_selectors(selectors: &[TaskSelector]) -> Vec<Task> {
    let tasks: Vec<Task> = selectors
        .iter()
        .flat_map(|selector| Task::from_selector(*selector).iter().copied())
        .collect();
    plan(&tasks)
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to discover sources under `{path}`: {source}")]
    Discover {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error(transparent)]
    Syndication(#[from] SyndicationError),
}

/// Counts gathered over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub tasks: Vec<Task>,
    /// Files written per document kind (`post`, `page`, `tag`, `feed`, `meta`).
    pub documents: BTreeMap<&'static str, usize>,
    pub assets: usize,
    pub failures: usize,
}

impl BuildReport {
    pub fn documents_of(&self, kind: &str) -> usize {
        self.documents.get(kind).copied().unwrap_or(0)
    }

    fn wrote(&mut self, kind: &'static str) {
        *self.documents.entry(kind).or_insert(0) += 1;
        counter!(METRIC_DOCUMENTS, "kind" => kind).increment(1);
    }

    fn failed(&mut self, stage: &'static str) {
        self.failures += 1;
        counter!(METRIC_FAILURES, "stage" => stage).increment(1);
    }
}

/// Runs build plans against one configuration.
#[derive(Clone)]
pub struct SiteBuilder {
    settings: Arc<Settings>,
    renderer: Arc<dyn RenderService>,
    output: OutputDir,
}

impl SiteBuilder {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self::with_renderer(settings, render_service())
    }

    pub fn with_renderer(settings: Arc<Settings>, renderer: Arc<dyn RenderService>) -> Self {
        let output = OutputDir::new(&settings.paths.output);
        Self {
            settings,
            renderer,
            output,
        }
    }

    pub fn output(&self) -> &OutputDir {
        &self.output
    }

    /// Run `tasks` (already planned) in order. Per-document and per-asset
    /// failures are logged and counted without stopping the run.
    #[instrument(skip(self), fields(output = %self.output.root().display()))]
    pub fn run(&self, tasks: &[Task]) -> Result<BuildReport, BuildError> {
        let started_at = Instant::now();
        let mut report = BuildReport {
            tasks: tasks.to_vec(),
            ..BuildReport::default()
        };
        let mut site: Option<Site> = None;

        for task in tasks {
            debug!(
                target = "stipple::application::build",
                task = task.as_str(),
                "Running build task"
            );
            match task {
                Task::Posts => site = Some(self.build_posts(&mut report)?),
                Task::Pages => {
                    let site = site.get_or_insert_with(Site::default);
                    self.build_pages(site, &mut report)?;
                }
                Task::Feeds => {
                    let site = site.get_or_insert_with(Site::default);
                    self.build_feeds(site, &mut report)?;
                }
                Task::Styles | Task::Scripts | Task::Fonts | Task::Misc => {
                    self.build_assets(*task, &mut report);
                }
            }
        }

        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_BUILD_MS).record(elapsed_ms);
        info!(
            target = "stipple::application::build",
            tasks = ?report.tasks,
            documents = ?report.documents,
            assets = report.assets,
            failures = report.failures,
            elapsed_ms,
            "Build finished"
        );

        Ok(report)
    }

    /// Remove the output directory. Returns whether anything was removed.
    pub fn clean(&self) -> Result<bool, BuildError> {
        let removed = self.output.clean()?;
        info!(
            target = "stipple::application::build",
            output = %self.output.root().display(),
            removed,
            "Output directory cleaned"
        );
        Ok(removed)
    }

    fn build_posts(&self, report: &mut BuildReport) -> Result<Site, BuildError> {
        let sources = self.discover(DocumentKind::Post)?;
        let context = site_context(&self.settings.site, None);
        let posts = self.load_all(&sources, &context, report);
        let site = Site::collate(posts);

        for post in &site.posts {
            self.write_document(&site, post, report)?;
        }

        for tag in &site.tags {
            match layout::render_tag_page(&self.settings.site, &site, tag) {
                Ok((path, html)) => {
                    self.output.write(&path, html)?;
                    report.wrote("tag");
                }
                Err(err) => self.layout_failed(Path::new(&tag.slug), &err, report),
            }
        }

        Ok(site)
    }

    fn build_pages(&self, site: &Site, report: &mut BuildReport) -> Result<(), BuildError> {
        let sources = self.discover(DocumentKind::Page)?;
        let context = site_context(&self.settings.site, Some(site));
        let mut pages = self.load_all(&sources, &context, report);

        let has_index = pages
            .iter()
            .any(|page| page.output_path == Path::new(INDEX_FILE));
        if !has_index {
            pages.push(generated_index(&self.settings.site.title));
        }

        for page in &pages {
            self.write_document(site, page, report)?;
        }

        let entries: Vec<SitemapEntry> = site
            .posts
            .iter()
            .chain(pages.iter())
            .map(SitemapEntry::from)
            .collect();
        self.output.write(
            Path::new(SITEMAP_FILE),
            sitemap_xml(&self.settings.site, &entries)?,
        )?;
        self.output
            .write(Path::new(ROBOTS_FILE), robots_txt(&self.settings.site)?)?;
        report.wrote("meta");
        report.wrote("meta");

        Ok(())
    }

    fn build_feeds(&self, site: &Site, report: &mut BuildReport) -> Result<(), BuildError> {
        self.output
            .write(Path::new(RSS_FILE), rss_feed(&self.settings.site, site)?)?;
        report.wrote("feed");
        self.output
            .write(Path::new(ATOM_FILE), atom_feed(&self.settings.site, site)?)?;
        report.wrote("feed");
        Ok(())
    }

    fn build_assets(&self, task: Task, report: &mut BuildReport) {
        let paths = &self.settings.paths;
        let result = match task {
            Task::Styles => {
                assets::build_styles(paths, &self.settings.render.syntax_theme, &self.output)
            }
            Task::Scripts => assets::build_scripts(paths, &self.output),
            Task::Fonts => assets::build_fonts(paths, &self.output),
            Task::Misc => assets::build_misc(paths, &self.settings.site, &self.output),
            Task::Posts | Task::Pages | Task::Feeds => Ok(0),
        };

        match result {
            Ok(copied) => report.assets += copied,
            Err(err) => self.asset_failed(task, &err, report),
        }
    }

    fn discover(&self, kind: DocumentKind) -> Result<Vec<SourceFile>, BuildError> {
        let content = &self.settings.paths.content;
        discover(content, kind).map_err(|err| BuildError::Discover {
            path: content.clone(),
            source: err,
        })
    }

    fn load_all(
        &self,
        sources: &[SourceFile],
        context: &serde_json::Value,
        report: &mut BuildReport,
    ) -> Vec<Document> {
        sources
            .iter()
            .filter_map(
                |source| match load_document(source, context, self.renderer.as_ref()) {
                    Ok(document) => Some(document),
                    Err(err) => {
                        self.document_failed(&source.path, &err, report);
                        None
                    }
                },
            )
            .collect()
    }

    fn write_document(
        &self,
        site: &Site,
        document: &Document,
        report: &mut BuildReport,
    ) -> Result<(), BuildError> {
        match layout::apply(&self.settings.site, site, document) {
            Ok(applied) => {
                if applied.layout.is_none() {
                    report.failed("layout");
                }
                self.output.write(&document.output_path, applied.html)?;
                report.wrote(document.kind.as_str());
            }
            Err(err) => self.layout_failed(&document.source_path, &err, report),
        }
        Ok(())
    }

    fn document_failed(&self, path: &Path, err: &DocumentError, report: &mut BuildReport) {
        error!(
            target = "stipple::application::build",
            path = %path.display(),
            stage = err.stage(),
            error = %err,
            "Skipping document"
        );
        report.failed(err.stage());
    }

    fn layout_failed(&self, path: &Path, err: &LayoutError, report: &mut BuildReport) {
        error!(
            target = "stipple::application::build",
            path = %path.display(),
            error = %err,
            "Templating error"
        );
        report.failed("template");
    }

    fn asset_failed(&self, task: Task, err: &AssetError, report: &mut BuildReport) {
        warn!(
            target = "stipple::application::build",
            task = task.as_str(),
            error = %err,
            "Asset task failed"
        );
        report.failed(task.as_str());
    }
}

/// Home page used when the content directory has no `index` page.
fn generated_index(title: &str) -> Document {
    Document {
        kind: DocumentKind::Page,
        source_kind: SourceKind::Html,
        source_path: PathBuf::from(INDEX_FILE),
        output_path: PathBuf::from(INDEX_FILE),
        meta: PageMeta {
            title: title.to_string(),
            date: None,
            url: "/".to_string(),
            layout: "index".to_string(),
            tags: Vec::new(),
            summary: String::new(),
            extra: BTreeMap::new(),
        },
        content_html: String::new(),
        contains_code: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_runs_everything() {
        assert_eq!(plan(&[]), Task::ALL.to_vec());
    }

    #[test]
    fn pages_and_feeds_pull_in_posts() {
        assert_eq!(plan(&[Task::Feeds]), vec![Task::Posts, Task::Feeds]);
        assert_eq!(
            plan(&[Task::Styles, Task::Pages]),
            vec![Task::Posts, Task::Pages, Task::Styles]
        );
    }

    #[test]
    fn content_selector_expands_to_three_tasks() {
        assert_eq!(
            plan_selectors(&[TaskSelector::Content]),
            vec![Task::Posts, Task::Pages, Task::Feeds]
        );
        assert_eq!(
            plan_selectors(&[TaskSelector::Misc, TaskSelector::Misc]),
            vec![Task::Misc]
        );
    }

    #[test]
    fn generated_index_uses_index_layout() {
        let index = generated_index("Blog");
        assert_eq!(index.meta.layout, "index");
        assert_eq!(index.output_path, PathBuf::from("index.html"));
    }
}
