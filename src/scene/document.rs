//! Serde model of the glTF scene description.
//!
//! glTF 1.0 keys every collection by name while glTF 2.0 uses arrays and
//! numeric references. Both shapes deserialize into the same types: keyed
//! collections become `(id, value)` pairs and references become string ids.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// A collection that is either a JSON object (glTF 1) or an array (glTF 2).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Keyed<T> {
    Map(BTreeMap<String, T>),
    List(Vec<T>),
}

impl<T> Default for Keyed<T> {
    fn default() -> Self {
        Keyed::List(Vec::new())
    }
}

impl<T> Keyed<T> {
    /// Entries with their ids; list entries are keyed by index.
    pub fn entries(&self) -> Vec<(String, &T)> {
        match self {
            Keyed::Map(map) => map.iter().map(|(id, value)| (id.clone(), value)).collect(),
            Keyed::List(items) => items
                .iter()
                .enumerate()
                .map(|(index, value)| (index.to_string(), value))
                .collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        match self {
            Keyed::Map(map) => map.get(id),
            Keyed::List(items) => id.parse::<usize>().ok().and_then(|index| items.get(index)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Keyed::Map(map) => map.len(),
            Keyed::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A reference to another entity, by name (glTF 1) or index (glTF 2).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Index(usize),
    Name(String),
}

impl Reference {
    pub fn id(&self) -> String {
        match self {
            Reference::Index(index) => index.to_string(),
            Reference::Name(name) => name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDocument {
    pub asset: Option<RawAsset>,
    pub scene: Option<Reference>,
    pub scenes: Keyed<RawScene>,
    pub buffers: Keyed<RawBuffer>,
    pub buffer_views: Keyed<RawBufferView>,
    pub accessors: Keyed<RawAccessor>,
    pub meshes: Keyed<RawMesh>,
    pub nodes: Keyed<RawNode>,
    pub shaders: Keyed<RawShader>,
    pub programs: Keyed<RawProgram>,
    pub techniques: Keyed<RawTechnique>,
}

impl RawDocument {
    /// Major version declared by `asset.version`, defaulting to 1.
    pub fn major_version(&self) -> u32 {
        self.asset
            .as_ref()
            .and_then(|asset| asset.version.as_ref())
            .map(|version| match version {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .and_then(|version| version.split('.').next().and_then(|major| major.parse().ok()))
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAsset {
    /// A string in glTF 2 (`"2.0"`), sometimes a number in glTF 1 files.
    pub version: Option<Value>,
    pub generator: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawScene {
    #[serde(default)]
    pub nodes: Vec<Reference>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBuffer {
    pub uri: Option<String>,
    pub byte_length: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBufferView {
    pub buffer: Reference,
    #[serde(default)]
    pub byte_offset: usize,
    pub byte_length: usize,
    pub byte_stride: Option<usize>,
    pub target: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccessor {
    pub buffer_view: Option<Reference>,
    #[serde(default)]
    pub byte_offset: usize,
    /// glTF 1 keeps the stride on the accessor; glTF 2 moved it to the view.
    pub byte_stride: Option<usize>,
    pub component_type: u32,
    pub count: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub min: Option<Vec<f64>>,
    pub max: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMesh {
    pub name: Option<String>,
    #[serde(default)]
    pub primitives: Vec<RawPrimitive>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPrimitive {
    #[serde(default)]
    pub attributes: BTreeMap<String, Reference>,
    pub indices: Option<Reference>,
    pub mode: Option<u32>,
    pub material: Option<Reference>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNode {
    pub name: Option<String>,
    #[serde(default)]
    pub children: Vec<Reference>,
    /// glTF 1 lists several meshes per node.
    #[serde(default)]
    pub meshes: Vec<Reference>,
    /// glTF 2 has at most one mesh per node.
    pub mesh: Option<Reference>,
    pub matrix: Option<[f32; 16]>,
    pub rotation: Option<[f32; 4]>,
    pub scale: Option<[f32; 3]>,
    pub translation: Option<[f32; 3]>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawShader {
    #[serde(rename = "type")]
    pub stage: u32,
    pub uri: Option<String>,
    pub extensions: Option<RawShaderExtensions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawShaderExtensions {
    #[serde(rename = "KHR_binary_glTF")]
    pub binary: Option<RawBinaryReference>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBinaryReference {
    pub buffer_view: Reference,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProgram {
    pub vertex_shader: Reference,
    pub fragment_shader: Reference,
    #[serde(default)]
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTechnique {
    pub program: Reference,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_collections_accept_both_shapes() {
        let v1: Keyed<RawScene> =
            serde_json::from_str(r#"{"defaultScene": {"nodes": ["root"]}}"#).expect("map");
        let v2: Keyed<RawScene> = serde_json::from_str(r#"[{"nodes": [0]}]"#).expect("list");

        assert_eq!(v1.entries()[0].0, "defaultScene");
        assert_eq!(v1.entries()[0].1.nodes, vec![Reference::Name("root".into())]);
        assert_eq!(v2.entries()[0].0, "0");
        assert_eq!(v2.get("0").expect("scene").nodes[0].id(), "0");
    }

    #[test]
    fn version_comes_from_asset() {
        let v2: RawDocument = serde_json::from_str(r#"{"asset": {"version": "2.0"}}"#).expect("doc");
        let v1: RawDocument = serde_json::from_str(r#"{"asset": {"version": 1.0}}"#).expect("doc");
        let bare: RawDocument = serde_json::from_str("{}").expect("doc");

        assert_eq!(v2.major_version(), 2);
        assert_eq!(v1.major_version(), 1);
        assert_eq!(bare.major_version(), 1);
    }
}
