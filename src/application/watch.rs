//! Poll the content and asset trees and rebuild when they change.

use std::{
    io,
    path::{Path, PathBuf},
    time::{Duration, UNIX_EPOCH},
};

use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::application::build::{SiteBuilder, Task};

/// Digest over every file's path, size and modification time below `roots`.
/// Missing roots contribute nothing.
pub fn fingerprint(roots: &[PathBuf]) -> io::Result<String> {
    let mut hasher = Sha256::new();

    for root in roots {
        hasher.update(root.to_string_lossy().as_bytes());
        if !root.exists() {
            continue;
        }

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let metadata = entry.metadata().map_err(io::Error::other)?;
            let modified = metadata
                .modified()
                .ok()
                .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
                .map(|elapsed| elapsed.as_nanos())
                .unwrap_or(0);

            hasher.update(entry.path().to_string_lossy().as_bytes());
            hasher.update(metadata.len().to_le_bytes());
            hasher.update(modified.to_le_bytes());
        }
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Rebuilds the whole site whenever the watched fingerprint moves.
pub struct Watcher {
    builder: SiteBuilder,
    roots: Vec<PathBuf>,
    interval: Duration,
    last: Option<String>,
}

impl Watcher {
    pub fn new(builder: SiteBuilder, roots: Vec<PathBuf>, interval: Duration) -> Self {
        Self {
            builder,
            roots,
            interval,
            last: None,
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Take a new fingerprint and report whether it differs from the previous
    /// one. The first call only records the baseline.
    pub fn changed(&mut self) -> io::Result<bool> {
        let current = fingerprint(&self.roots)?;
        let changed = self
            .last
            .as_ref()
            .is_some_and(|previous| previous != &current);
        self.last = Some(current);
        Ok(changed)
    }

    /// Poll forever. Builds run on the blocking pool so the server keeps
    /// answering while the site is regenerated.
    pub async fn run(mut self) {
        if let Err(err) = self.changed() {
            warn!(
                target = "stipple::application::watch",
                error = %err,
                "Initial fingerprint failed"
            );
        }
        info!(
            target = "stipple::application::watch",
            roots = ?self.roots,
            interval_ms = self.interval.as_millis() as u64,
            "Watching for changes"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.tick().await;
        loop {
            interval.tick().await;
            match self.changed() {
                Ok(false) => continue,
                Ok(true) => self.rebuild().await,
                Err(err) => {
                    debug!(
                        target = "stipple::application::watch",
                        error = %err,
                        "Fingerprint failed; retrying next tick"
                    );
                }
            }
        }
    }

    async fn rebuild(&self) {
        info!(target = "stipple::application::watch", "Change detected, rebuilding");
        let builder = self.builder.clone();
        let outcome = tokio::task::spawn_blocking(move || builder.run(&Task::ALL)).await;
        match outcome {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => error!(
                target = "stipple::application::watch",
                error = %err,
                "Rebuild failed"
            ),
            Err(err) => error!(
                target = "stipple::application::watch",
                error = %err,
                "Rebuild task panicked"
            ),
        }
    }
}

/// Roots watched for a given content and assets directory.
pub fn watch_roots(content: &Path, assets: &Path) -> Vec<PathBuf> {
    vec![content.to_path_buf(), assets.to_path_buf()]
}
