use std::{collections::BTreeMap, sync::Arc};

use super::{accessor::Accessor, document::RawMesh, error::SceneError};

const KIND: &str = "mesh";
const DEFAULT_MODE: u32 = 4;

/// GL primitive topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl PrimitiveMode {
    pub fn from_gl(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Points),
            1 => Some(Self::Lines),
            2 => Some(Self::LineLoop),
            3 => Some(Self::LineStrip),
            4 => Some(Self::Triangles),
            5 => Some(Self::TriangleStrip),
            6 => Some(Self::TriangleFan),
            _ => None,
        }
    }

    /// Assemble triangles from a vertex sequence. Point and line modes yield none.
    pub fn triangles(self, indices: &[u32]) -> Vec<[u32; 3]> {
        match self {
            Self::Triangles => indices
                .chunks_exact(3)
                .map(|tri| [tri[0], tri[1], tri[2]])
                .collect(),
            Self::TriangleStrip => indices
                .windows(3)
                .enumerate()
                .map(|(n, tri)| {
                    if n % 2 == 0 {
                        [tri[0], tri[1], tri[2]]
                    } else {
                        [tri[1], tri[0], tri[2]]
                    }
                })
                .collect(),
            Self::TriangleFan => match indices.split_first() {
                Some((&hub, rest)) => rest
                    .windows(2)
                    .map(|pair| [hub, pair[0], pair[1]])
                    .collect(),
                None => Vec::new(),
            },
            Self::Points | Self::Lines | Self::LineLoop | Self::LineStrip => Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Primitive {
    pub attributes: BTreeMap<String, Arc<Accessor>>,
    pub indices: Option<Arc<Accessor>>,
    pub mode: PrimitiveMode,
    pub material: Option<String>,
}

impl Primitive {
    pub fn attribute(&self, name: &str) -> Option<&Arc<Accessor>> {
        self.attributes.get(name)
    }
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub id: String,
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

impl Mesh {
    pub fn new(
        id: &str,
        raw: &RawMesh,
        accessors: &BTreeMap<String, Arc<Accessor>>,
    ) -> Result<Self, SceneError> {
        let lookup = |reference: String| {
            accessors
                .get(&reference)
                .cloned()
                .ok_or_else(|| SceneError::missing(KIND, id, "accessor", &reference))
        };

        let mut mesh = Self {
            id: id.to_string(),
            name: raw.name.clone(),
            primitives: Vec::with_capacity(raw.primitives.len()),
        };

        for primitive in &raw.primitives {
            let attributes = primitive
                .attributes
                .iter()
                .map(|(name, reference)| {
                    lookup(reference.id()).map(|accessor| (name.clone(), accessor))
                })
                .collect::<Result<BTreeMap<_, _>, SceneError>>()?;
            let indices = primitive
                .indices
                .as_ref()
                .map(|reference| lookup(reference.id()))
                .transpose()?;
            let code = primitive.mode.unwrap_or(DEFAULT_MODE);
            let mode = PrimitiveMode::from_gl(code)
                .ok_or_else(|| SceneError::unsupported(KIND, id, "primitive mode", code))?;

            mesh.add_primitive(Primitive {
                attributes,
                indices,
                mode,
                material: primitive.material.as_ref().map(|material| material.id()),
            });
        }

        Ok(mesh)
    }

    pub fn add_primitive(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_list_groups_by_three() {
        assert_eq!(
            PrimitiveMode::Triangles.triangles(&[0, 1, 2, 3, 4, 5, 6]),
            vec![[0, 1, 2], [3, 4, 5]]
        );
    }

    #[test]
    fn strips_alternate_winding() {
        assert_eq!(
            PrimitiveMode::TriangleStrip.triangles(&[0, 1, 2, 3]),
            vec![[0, 1, 2], [2, 1, 3]]
        );
    }

    #[test]
    fn fans_share_the_first_vertex() {
        assert_eq!(
            PrimitiveMode::TriangleFan.triangles(&[0, 1, 2, 3]),
            vec![[0, 1, 2], [0, 2, 3]]
        );
    }

    #[test]
    fn lines_produce_no_triangles() {
        assert!(PrimitiveMode::Lines.triangles(&[0, 1, 2, 3]).is_empty());
    }

    #[test]
    fn mesh_with_missing_accessor_is_rejected() {
        let raw: RawMesh = serde_json::from_str(
            r#"{"primitives": [{"attributes": {"POSITION": "positions"}}]}"#,
        )
        .expect("mesh");
        let err = Mesh::new("m", &raw, &BTreeMap::new()).expect_err("missing accessor");
        assert!(matches!(err, SceneError::MissingReference { .. }));
    }
}
