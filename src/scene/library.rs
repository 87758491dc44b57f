use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use tracing::info;

use super::{
    container,
    error::SceneError,
    graph::{Scene, SceneSummary},
};

/// Scenes loaded from disk, keyed by path. Selecting a model twice reuses
/// the first parse.
#[derive(Debug, Default)]
pub struct SceneLibrary {
    scenes: DashMap<PathBuf, Arc<Scene>>,
}

impl SceneLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path` unless the same file was loaded before. Paths are compared
    /// after canonicalisation, so `./a.glb` and `a.glb` share one entry.
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<Scene>, SceneError> {
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if let Some(scene) = self.scenes.get(&key) {
            return Ok(Arc::clone(scene.value()));
        }

        let container = container::load(path)?;
        let scene = Arc::new(Scene::process(&container)?);
        info!(
            target = "stipple::scene::library",
            path = %path.display(),
            version = scene.version,
            nodes = scene.nodes.len(),
            meshes = scene.meshes.len(),
            "Loaded scene"
        );

        Ok(Arc::clone(
            self.scenes
                .entry(key)
                .or_insert(scene)
                .value(),
        ))
    }

    /// Summaries in the order given, one entry per requested path.
    pub fn summaries(&self, paths: &[PathBuf]) -> Result<Vec<(PathBuf, SceneSummary)>, SceneError> {
        paths
            .iter()
            .map(|path| Ok((path.clone(), self.get_or_load(path)?.summary())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_loads_share_the_scene() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.gltf");
        std::fs::write(&path, r#"{"nodes": [{"name": "only"}]}"#).expect("write");

        let library = SceneLibrary::new();
        let first = library.get_or_load(&path).expect("first");
        let second = library.get_or_load(&path).expect("second");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn summaries_reuse_scenes_named_twice() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pair.gltf");
        std::fs::write(&path, r#"{"nodes": [{"name": "a"}, {"name": "b"}]}"#).expect("write");
        let dotted = dir.path().join(".").join("pair.gltf");

        let library = SceneLibrary::new();
        let summaries = library
            .summaries(&[path.clone(), dotted.clone()])
            .expect("summaries");

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].0, path);
        assert_eq!(summaries[1].0, dotted);
        assert_eq!(summaries[1].1.nodes, 2);
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn missing_files_are_io_errors() {
        let library = SceneLibrary::new();
        let err = library
            .get_or_load(Path::new("/definitely/not/here.glb"))
            .expect_err("missing");
        assert!(matches!(err, SceneError::Io(_)));
        assert!(library.is_empty());
    }
}
