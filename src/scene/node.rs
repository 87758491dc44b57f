use std::{collections::BTreeMap, sync::Arc};

use glam::{Mat4, Quat, Vec3, Vec4};

use super::{document::RawNode, error::SceneError, mesh::Mesh};

const KIND: &str = "node";

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub name: Option<String>,
    /// Local transform relative to the parent.
    pub matrix: Mat4,
    /// Child ids, linked after every node exists.
    pub children: Vec<String>,
    pub meshes: Vec<Arc<Mesh>>,
}

impl Node {
    /// Build a node without its child links.
    pub fn new(
        id: &str,
        raw: &RawNode,
        meshes: &BTreeMap<String, Arc<Mesh>>,
    ) -> Result<Self, SceneError> {
        let node_meshes = raw
            .meshes
            .iter()
            .chain(raw.mesh.as_ref())
            .map(|reference| {
                let mesh_id = reference.id();
                meshes
                    .get(&mesh_id)
                    .cloned()
                    .ok_or_else(|| SceneError::missing(KIND, id, "mesh", &mesh_id))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: id.to_string(),
            name: raw.name.clone(),
            matrix: local_matrix(raw),
            children: Vec::new(),
            meshes: node_meshes,
        })
    }
}

/// The node's `matrix` when present, else `T·R·S` from whichever parts exist.
pub fn local_matrix(raw: &RawNode) -> Mat4 {
    if let Some(matrix) = raw.matrix.as_ref() {
        return Mat4::from_cols_array(matrix);
    }

    if raw.translation.is_none() && raw.rotation.is_none() && raw.scale.is_none() {
        return Mat4::IDENTITY;
    }

    let translation = raw.translation.map(Vec3::from_array).unwrap_or(Vec3::ZERO);
    let rotation = raw.rotation.map(unit_rotation).unwrap_or(Quat::IDENTITY);
    let scale = raw.scale.map(Vec3::from_array).unwrap_or(Vec3::ONE);

    Mat4::from_scale_rotation_translation(scale, rotation, translation)
}

/// Normalise a stored quaternion. Degenerate ones (all zero, NaN) fall back
/// to the identity so they cannot poison the subtree below.
fn unit_rotation(rotation: [f32; 4]) -> Quat {
    let unit = Vec4::from_array(rotation).normalize_or_zero();
    if unit == Vec4::ZERO {
        Quat::IDENTITY
    } else {
        Quat::from_vec4(unit)
    }
}
