//! Binary (`.glb`) and JSON (`.gltf`) scene containers.

use std::{collections::HashMap, path::Path};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use tracing::debug;

use super::{document::RawDocument, error::SceneError};

pub const MAGIC: &[u8; 4] = b"glTF";
/// Buffer ids under which the glTF 1 binary body is registered.
pub const BINARY_BODY_IDS: [&str; 2] = ["KHR_binary_glTF", "binary_glTF"];

const V1_HEADER_LEN: usize = 20;
const V2_HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;
const SCENE_FORMAT_JSON: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneFormat {
    Binary,
    Json,
}

/// Decide how to parse a payload from its declared content type, falling
/// back to sniffing the magic number.
pub fn detect_format(bytes: &[u8], content_type: Option<&str>) -> SceneFormat {
    let declared = content_type.map(|value| {
        value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    });

    match declared.as_deref() {
        Some("application/octet-stream") | Some("model/gltf-binary") => SceneFormat::Binary,
        _ if bytes.starts_with(MAGIC) => SceneFormat::Binary,
        _ => SceneFormat::Json,
    }
}

/// A parsed scene description plus every buffer that could be resolved.
#[derive(Debug, Clone)]
pub struct Container {
    pub version: u32,
    pub document: RawDocument,
    pub buffers: HashMap<String, Bytes>,
}

impl Container {
    pub fn buffer(&self, id: &str) -> Option<&Bytes> {
        self.buffers.get(id)
    }
}

/// Read a scene from disk. Relative buffer URIs resolve next to the file.
pub fn load(path: &Path) -> Result<Container, SceneError> {
    let bytes = Bytes::from(std::fs::read(path)?);
    let content_type = mime_guess::from_path(path).first_raw();
    parse(bytes, content_type, path.parent())
}

pub fn parse(
    bytes: Bytes,
    content_type: Option<&str>,
    base_dir: Option<&Path>,
) -> Result<Container, SceneError> {
    match detect_format(&bytes, content_type) {
        SceneFormat::Binary => parse_binary_in(bytes, base_dir),
        SceneFormat::Json => parse_json(&bytes, base_dir),
    }
}

/// Parse a binary container (version 1 or 2).
pub fn parse_binary(bytes: impl Into<Bytes>) -> Result<Container, SceneError> {
    parse_binary_in(bytes.into(), None)
}

fn parse_binary_in(bytes: Bytes, base_dir: Option<&Path>) -> Result<Container, SceneError> {
    let magic = bytes
        .get(0..MAGIC.len())
        .ok_or(SceneError::Truncated { context: "magic" })?;
    if magic != MAGIC {
        return Err(SceneError::BadMagic);
    }

    let version = read_u32(&bytes, 4, "header")?;
    let (document, mut buffers) = match version {
        1 => parse_v1(&bytes)?,
        2 => parse_v2(&bytes)?,
        other => return Err(SceneError::UnsupportedVersion(other)),
    };

    resolve_uri_buffers(&document, &mut buffers, base_dir)?;

    Ok(Container {
        version,
        document,
        buffers,
    })
}

fn parse_v1(bytes: &Bytes) -> Result<(RawDocument, HashMap<String, Bytes>), SceneError> {
    let length = read_u32(bytes, 8, "header")? as usize;
    let scene_length = read_u32(bytes, 12, "header")? as usize;
    let scene_format = read_u32(bytes, 16, "header")?;

    if scene_format != SCENE_FORMAT_JSON {
        return Err(SceneError::UnsupportedSceneFormat(scene_format));
    }
    if length > bytes.len() {
        return Err(SceneError::Truncated {
            context: "declared length",
        });
    }

    let scene_end = V1_HEADER_LEN
        .checked_add(scene_length)
        .filter(|end| *end <= length)
        .ok_or(SceneError::Truncated { context: "scene" })?;

    let document: RawDocument = serde_json::from_slice(&bytes[V1_HEADER_LEN..scene_end])?;
    let body = bytes.slice(scene_end..length);

    let buffers = BINARY_BODY_IDS
        .iter()
        .map(|id| (id.to_string(), body.clone()))
        .collect();

    Ok((document, buffers))
}

fn parse_v2(bytes: &Bytes) -> Result<(RawDocument, HashMap<String, Bytes>), SceneError> {
    let length = read_u32(bytes, 8, "header")? as usize;
    if length > bytes.len() {
        return Err(SceneError::Truncated {
            context: "declared length",
        });
    }
    let data = bytes.slice(..length);

    let mut offset = V2_HEADER_LEN;
    let (chunk_type, json) = read_chunk(&data, &mut offset)?.ok_or(SceneError::Truncated {
        context: "JSON chunk",
    })?;
    if chunk_type != CHUNK_JSON {
        return Err(SceneError::UnexpectedChunk {
            expected: "JSON",
            found: chunk_type,
        });
    }
    let document: RawDocument = serde_json::from_slice(&json)?;

    let mut buffers = HashMap::new();
    while let Some((chunk_type, chunk)) = read_chunk(&data, &mut offset)? {
        if chunk_type == CHUNK_BIN && !buffers.contains_key("0") {
            buffers.insert("0".to_string(), chunk);
        } else {
            debug!(
                target = "stipple::scene::container",
                chunk_type = format_args!("{chunk_type:#010x}"),
                "Skipping chunk"
            );
        }
    }

    Ok((document, buffers))
}

/// Parse a plain JSON scene. `data:` buffers are decoded; relative URIs are
/// read from `base_dir` when one is given.
pub fn parse_json(bytes: &[u8], base_dir: Option<&Path>) -> Result<Container, SceneError> {
    let document: RawDocument = serde_json::from_slice(bytes)?;
    let version = document.major_version();
    let mut buffers = HashMap::new();
    resolve_uri_buffers(&document, &mut buffers, base_dir)?;

    Ok(Container {
        version,
        document,
        buffers,
    })
}

fn resolve_uri_buffers(
    document: &RawDocument,
    buffers: &mut HashMap<String, Bytes>,
    base_dir: Option<&Path>,
) -> Result<(), SceneError> {
    for (id, buffer) in document.buffers.entries() {
        let Some(uri) = buffer.uri.as_deref() else {
            continue;
        };

        match decode_data_uri(uri) {
            Some(Ok(data)) => {
                buffers.insert(id, Bytes::from(data));
            }
            Some(Err(reason)) => return Err(SceneError::DataUri { id, reason }),
            None => {
                let Some(base) = base_dir.filter(|_| !uri.contains("://")) else {
                    debug!(
                        target = "stipple::scene::container",
                        buffer = %id,
                        uri,
                        "Leaving external buffer unresolved"
                    );
                    continue;
                };
                let data = std::fs::read(base.join(uri))?;
                buffers.insert(id, Bytes::from(data));
            }
        }
    }

    Ok(())
}

/// Decode a `data:` URI. Returns `None` for any other URI. Payloads without
/// `;base64` are percent-decoded.
pub(crate) fn decode_data_uri(uri: &str) -> Option<Result<Vec<u8>, String>> {
    let rest = uri.strip_prefix("data:")?;
    let Some((meta, payload)) = rest.split_once(',') else {
        return Some(Err("missing `,` separator".to_string()));
    };

    if meta.ends_with(";base64") {
        Some(
            STANDARD
                .decode(payload)
                .map_err(|err| format!("invalid base64: {err}")),
        )
    } else {
        Some(Ok(percent_decode_str(payload).collect()))
    }
}

fn read_u32(bytes: &[u8], offset: usize, context: &'static str) -> Result<u32, SceneError> {
    bytes
        .get(offset..offset + 4)
        .and_then(|slice| <[u8; 4]>::try_from(slice).ok())
        .map(u32::from_le_bytes)
        .ok_or(SceneError::Truncated { context })
}

fn read_chunk(data: &Bytes, offset: &mut usize) -> Result<Option<(u32, Bytes)>, SceneError> {
    if *offset >= data.len() {
        return Ok(None);
    }

    let chunk_length = read_u32(data, *offset, "chunk header")? as usize;
    let chunk_type = read_u32(data, *offset + 4, "chunk header")?;
    let start = *offset + CHUNK_HEADER_LEN;
    let end = start
        .checked_add(chunk_length)
        .filter(|end| *end <= data.len())
        .ok_or(SceneError::Truncated { context: "chunk" })?;

    *offset = end;
    Ok(Some((chunk_type, data.slice(start..end))))
}
