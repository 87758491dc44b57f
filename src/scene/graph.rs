use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    sync::Arc,
};

use glam::{Mat4, Vec3};
use serde::Serialize;

use super::{
    accessor::Accessor,
    buffer_view::BufferView,
    container::{BINARY_BODY_IDS, Container},
    error::SceneError,
    mesh::Mesh,
    node::Node,
    program::{Program, Shader, Technique},
};

/// A fully linked scene graph.
#[derive(Debug, Clone)]
pub struct Scene {
    pub version: u32,
    pub buffer_views: BTreeMap<String, Arc<BufferView>>,
    pub accessors: BTreeMap<String, Arc<Accessor>>,
    pub shaders: BTreeMap<String, Shader>,
    pub programs: BTreeMap<String, Program>,
    pub techniques: BTreeMap<String, Technique>,
    pub meshes: BTreeMap<String, Arc<Mesh>>,
    pub nodes: BTreeMap<String, Node>,
    roots: Vec<String>,
}

/// One mesh to draw with the world transform of the node that holds it.
#[derive(Debug, Clone)]
pub struct DrawCall {
    pub node: String,
    pub world: Mat4,
    pub mesh: Arc<Mesh>,
}

impl Scene {
    /// Build every entity in dependency order and link node children.
    pub fn process(container: &Container) -> Result<Self, SceneError> {
        let document = &container.document;

        let mut buffer_views = BTreeMap::new();
        for (id, raw) in document.buffer_views.entries() {
            let buffer_id = raw.buffer.id();
            let buffer = container.buffer(&buffer_id).ok_or_else(|| {
                let declared = document.buffers.get(&buffer_id).is_some()
                    || BINARY_BODY_IDS.contains(&buffer_id.as_str());
                if declared {
                    SceneError::UnresolvedBuffer(buffer_id.clone())
                } else {
                    SceneError::missing("bufferView", &id, "buffer", &buffer_id)
                }
            })?;
            let view = BufferView::new(&id, raw, buffer)?;
            buffer_views.insert(id, Arc::new(view));
        }

        let mut accessors = BTreeMap::new();
        for (id, raw) in document.accessors.entries() {
            let accessor = Accessor::new(&id, raw, &buffer_views)?;
            accessors.insert(id, Arc::new(accessor));
        }

        let mut shaders = BTreeMap::new();
        for (id, raw) in document.shaders.entries() {
            let shader = Shader::new(&id, raw, &buffer_views)?;
            shaders.insert(id, shader);
        }

        let mut programs = BTreeMap::new();
        for (id, raw) in document.programs.entries() {
            let program = Program::new(&id, raw, &shaders)?;
            programs.insert(id, program);
        }

        let mut techniques = BTreeMap::new();
        for (id, raw) in document.techniques.entries() {
            let technique = Technique::new(&id, raw, &programs)?;
            techniques.insert(id, technique);
        }

        let mut meshes = BTreeMap::new();
        for (id, raw) in document.meshes.entries() {
            let mesh = Mesh::new(&id, raw, &accessors)?;
            meshes.insert(id, Arc::new(mesh));
        }

        let mut nodes = BTreeMap::new();
        for (id, raw) in document.nodes.entries() {
            let node = Node::new(&id, raw, &meshes)?;
            nodes.insert(id, node);
        }

        for (id, raw) in document.nodes.entries() {
            let children = raw
                .children
                .iter()
                .map(|child| {
                    let child_id = child.id();
                    if nodes.contains_key(&child_id) {
                        Ok(child_id)
                    } else {
                        Err(SceneError::missing("node", &id, "node", &child_id))
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            if let Some(node) = nodes.get_mut(&id) {
                node.children = children;
            }
        }

        let roots = match document.scene.as_ref() {
            Some(reference) => {
                let scene_id = reference.id();
                let scene = document
                    .scenes
                    .get(&scene_id)
                    .ok_or_else(|| SceneError::missing("document", "scene", "scene", &scene_id))?;
                scene
                    .nodes
                    .iter()
                    .map(|node| {
                        let node_id = node.id();
                        if nodes.contains_key(&node_id) {
                            Ok(node_id)
                        } else {
                            Err(SceneError::missing("scene", &scene_id, "node", &node_id))
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
            None => orphan_nodes(&nodes),
        };

        Ok(Self {
            version: container.version,
            buffer_views,
            accessors,
            shaders,
            programs,
            techniques,
            meshes,
            nodes,
            roots,
        })
    }

    /// Nodes drawn first: the default scene's, or every node nobody parents.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Visit `from` and then its descendants depth-first, passing each node's
    /// world matrix. A node reachable through several parents is visited once.
    pub fn traverse<F>(&self, from: &str, mut visit: F)
    where
        F: FnMut(&Node, Mat4),
    {
        let mut visited = HashSet::new();
        self.walk(from, &mut visited, &mut visit);
    }

    /// Traverse every root, sharing the visited set across roots.
    pub fn traverse_roots<F>(&self, mut visit: F)
    where
        F: FnMut(&Node, Mat4),
    {
        let mut visited = HashSet::new();
        for root in &self.roots {
            self.walk(root, &mut visited, &mut visit);
        }
    }

    fn walk<'s, F>(&'s self, from: &str, visited: &mut HashSet<&'s str>, visit: &mut F)
    where
        F: FnMut(&Node, Mat4),
    {
        let mut stack: Vec<(&str, Mat4)> = vec![(from, Mat4::IDENTITY)];

        while let Some((id, parent)) = stack.pop() {
            let Some((key, node)) = self.nodes.get_key_value(id) else {
                continue;
            };
            if !visited.insert(key.as_str()) {
                continue;
            }

            let world = parent * node.matrix;
            visit(node, world);

            for child in node.children.iter().rev() {
                stack.push((child.as_str(), world));
            }
        }
    }

    /// Every mesh reachable from the roots, in traversal order.
    pub fn draw_calls(&self) -> Vec<DrawCall> {
        let mut calls = Vec::new();
        self.traverse_roots(|node, world| {
            for mesh in &node.meshes {
                calls.push(DrawCall {
                    node: node.id.clone(),
                    world,
                    mesh: Arc::clone(mesh),
                });
            }
        });
        calls
    }

    pub fn summary(&self) -> SceneSummary {
        let meshes = self
            .meshes
            .values()
            .map(|mesh| MeshSummary {
                id: mesh.id.clone(),
                name: mesh.name.clone(),
                primitives: mesh
                    .primitives
                    .iter()
                    .map(|primitive| PrimitiveSummary {
                        mode: format!("{:?}", primitive.mode),
                        vertices: primitive
                            .attribute("POSITION")
                            .map(|accessor| accessor.count)
                            .unwrap_or(0),
                        indices: primitive.indices.as_ref().map(|accessor| accessor.count),
                        attributes: primitive.attributes.keys().cloned().collect(),
                    })
                    .collect(),
            })
            .collect();

        SceneSummary {
            version: self.version,
            buffer_views: self.buffer_views.len(),
            accessors: self.accessors.len(),
            shaders: self.shaders.len(),
            programs: self.programs.len(),
            techniques: self.techniques.len(),
            nodes: self.nodes.len(),
            roots: self.roots.clone(),
            meshes,
            bounds: self.bounds(),
        }
    }

    /// World-space bounds of every drawn position.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut bounds: Option<Bounds> = None;
        for call in self.draw_calls() {
            for primitive in &call.mesh.primitives {
                let Some(positions) = primitive
                    .attribute("POSITION")
                    .and_then(|accessor| accessor.read_vec3().ok())
                else {
                    continue;
                };
                for position in positions {
                    let point = call.world.transform_point3(position);
                    bounds = Some(match bounds {
                        Some(existing) => existing.include(point),
                        None => Bounds::at(point),
                    });
                }
            }
        }
        bounds
    }
}

fn orphan_nodes(nodes: &BTreeMap<String, Node>) -> Vec<String> {
    let children: BTreeSet<&str> = nodes
        .values()
        .flat_map(|node| node.children.iter().map(String::as_str))
        .collect();

    nodes
        .keys()
        .filter(|id| !children.contains(id.as_str()))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneSummary {
    pub version: u32,
    pub buffer_views: usize,
    pub accessors: usize,
    pub shaders: usize,
    pub programs: usize,
    pub techniques: usize,
    pub nodes: usize,
    pub roots: Vec<String>,
    pub meshes: Vec<MeshSummary>,
    pub bounds: Option<Bounds>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeshSummary {
    pub id: String,
    pub name: Option<String>,
    pub primitives: Vec<PrimitiveSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrimitiveSummary {
    pub mode: String,
    pub vertices: usize,
    pub indices: Option<usize>,
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    fn at(point: Vec3) -> Self {
        Self {
            min: point.to_array(),
            max: point.to_array(),
        }
    }

    fn include(self, point: Vec3) -> Self {
        Self {
            min: Vec3::from_array(self.min).min(point).to_array(),
            max: Vec3::from_array(self.max).max(point).to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::container::parse_json;

    fn scene(json: &str) -> Result<Scene, SceneError> {
        let container = parse_json(json.as_bytes(), None)?;
        Scene::process(&container)
    }

    #[test]
    fn traversal_is_preorder_and_accumulates_transforms() {
        let scene = scene(
            r#"{
                "nodes": {
                    "root": {"children": ["left", "right"], "translation": [1, 0, 0]},
                    "left": {"children": ["leaf"], "translation": [0, 1, 0]},
                    "right": {},
                    "leaf": {"scale": [2, 2, 2]}
                }
            }"#,
        )
        .expect("scene");

        let mut order = Vec::new();
        let mut leaf_world = Mat4::IDENTITY;
        scene.traverse("root", |node, world| {
            order.push(node.id.clone());
            if node.id == "leaf" {
                leaf_world = world;
            }
        });

        assert_eq!(order, vec!["root", "left", "leaf", "right"]);
        assert_eq!(scene.roots(), ["root".to_string()]);
        let origin = leaf_world.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn cycles_are_visited_once() {
        let scene = scene(r#"{"nodes": [{"children": [1]}, {"children": [0]}]}"#).expect("scene");

        let mut visits = 0;
        scene.traverse("0", |_, _| visits += 1);
        assert_eq!(visits, 2);
    }

    #[test]
    fn default_scene_selects_roots() {
        let scene = scene(
            r#"{"scene": 0, "scenes": [{"nodes": [1]}], "nodes": [{}, {}]}"#,
        )
        .expect("scene");
        assert_eq!(scene.roots(), ["1".to_string()]);
    }

    #[test]
    fn missing_child_is_an_error() {
        let err = scene(r#"{"nodes": {"a": {"children": ["ghost"]}}}"#).expect_err("missing");
        match err {
            SceneError::MissingReference {
                kind, reference, ..
            } => {
                assert_eq!(kind, "node");
                assert_eq!(reference, "ghost");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unresolved_buffer_is_reported() {
        let err = scene(
            r#"{"buffers": [{"uri": "far/away.bin", "byteLength": 4}],
                "bufferViews": [{"buffer": 0, "byteLength": 4}]}"#,
        )
        .expect_err("unresolved");
        assert!(matches!(err, SceneError::UnresolvedBuffer(_)));
    }
}
