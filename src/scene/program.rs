//! glTF 1 material plumbing: shaders, programs and techniques.

use std::{collections::BTreeMap, sync::Arc};

use tracing::debug;

use super::{
    buffer_view::BufferView,
    container::decode_data_uri,
    document::{RawProgram, RawShader, RawTechnique},
    error::SceneError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Other(u32),
}

impl From<u32> for ShaderStage {
    fn from(code: u32) -> Self {
        match code {
            35633 => Self::Vertex,
            35632 => Self::Fragment,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Shader {
    pub id: String,
    pub stage: ShaderStage,
    /// GLSL source; `None` when it lives in an external file.
    pub source: Option<String>,
}

impl Shader {
    pub fn new(
        id: &str,
        raw: &RawShader,
        views: &BTreeMap<String, Arc<BufferView>>,
    ) -> Result<Self, SceneError> {
        let embedded = raw
            .extensions
            .as_ref()
            .and_then(|extensions| extensions.binary.as_ref());

        let source = if let Some(binary) = embedded {
            let view_id = binary.buffer_view.id();
            let view = views
                .get(&view_id)
                .ok_or_else(|| SceneError::missing("shader", id, "bufferView", &view_id))?;
            Some(std::str::from_utf8(view.bytes())?.to_string())
        } else {
            match raw.uri.as_deref().and_then(decode_data_uri) {
                Some(Ok(bytes)) => Some(std::str::from_utf8(&bytes)?.to_string()),
                Some(Err(reason)) => {
                    return Err(SceneError::DataUri {
                        id: id.to_string(),
                        reason,
                    });
                }
                None => {
                    debug!(
                        target = "stipple::scene::program",
                        shader = id,
                        "Shader source is external; keeping it unresolved"
                    );
                    None
                }
            }
        };

        Ok(Self {
            id: id.to_string(),
            stage: ShaderStage::from(raw.stage),
            source,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Program {
    pub id: String,
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub attributes: Vec<String>,
}

impl Program {
    pub fn new(
        id: &str,
        raw: &RawProgram,
        shaders: &BTreeMap<String, Shader>,
    ) -> Result<Self, SceneError> {
        let resolve = |reference: String| {
            if shaders.contains_key(&reference) {
                Ok(reference)
            } else {
                Err(SceneError::missing("program", id, "shader", &reference))
            }
        };

        Ok(Self {
            id: id.to_string(),
            vertex_shader: resolve(raw.vertex_shader.id())?,
            fragment_shader: resolve(raw.fragment_shader.id())?,
            attributes: raw.attributes.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Technique {
    pub id: String,
    pub program: String,
    /// Shader attribute name → technique parameter name.
    pub attributes: BTreeMap<String, String>,
    pub parameters: BTreeMap<String, serde_json::Value>,
}

impl Technique {
    pub fn new(
        id: &str,
        raw: &RawTechnique,
        programs: &BTreeMap<String, Program>,
    ) -> Result<Self, SceneError> {
        let program = raw.program.id();
        if !programs.contains_key(&program) {
            return Err(SceneError::missing("technique", id, "program", &program));
        }

        Ok(Self {
            id: id.to_string(),
            program,
            attributes: raw.attributes.clone(),
            parameters: raw.parameters.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_shaders_are_decoded() {
        let raw: RawShader = serde_json::from_str(
            r#"{"type": 35632, "uri": "data:text/plain;base64,dm9pZCBtYWluKCkge30="}"#,
        )
        .expect("shader");
        let shader = Shader::new("fs", &raw, &BTreeMap::new()).expect("shader");

        assert_eq!(shader.stage, ShaderStage::Fragment);
        assert_eq!(shader.source.as_deref(), Some("void main() {}"));
    }

    #[test]
    fn external_shaders_stay_unresolved() {
        let raw: RawShader =
            serde_json::from_str(r#"{"type": 35633, "uri": "duck.vert"}"#).expect("shader");
        let shader = Shader::new("vs", &raw, &BTreeMap::new()).expect("shader");
        assert_eq!(shader.stage, ShaderStage::Vertex);
        assert!(shader.source.is_none());
    }

    #[test]
    fn program_requires_its_shaders() {
        let raw: RawProgram = serde_json::from_str(
            r#"{"vertexShader": "vs", "fragmentShader": "fs"}"#,
        )
        .expect("program");
        let err = Program::new("p", &raw, &BTreeMap::new()).expect_err("missing shader");
        assert!(matches!(err, SceneError::MissingReference { .. }));
    }
}
