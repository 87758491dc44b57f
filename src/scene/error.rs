use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to read scene: {0}")]
    Io(#[from] std::io::Error),
    #[error("magic number is not \"glTF\"")]
    BadMagic,
    #[error("unsupported binary container version {0}")]
    UnsupportedVersion(u32),
    #[error("unsupported scene format {0} in binary container")]
    UnsupportedSceneFormat(u32),
    #[error("container truncated while reading {context}")]
    Truncated { context: &'static str },
    #[error("unexpected chunk type {found:#010x}, expected {expected}")]
    UnexpectedChunk { expected: &'static str, found: u32 },
    #[error("scene JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("scene text is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("buffer `{id}` has an unusable data URI: {reason}")]
    DataUri { id: String, reason: String },
    #[error("buffer `{0}` is not loaded")]
    UnresolvedBuffer(String),
    #[error("{kind} `{id}` references missing {target} `{reference}`")]
    MissingReference {
        kind: &'static str,
        id: String,
        target: &'static str,
        reference: String,
    },
    #[error("{kind} `{id}` is out of bounds: {reason}")]
    OutOfBounds {
        kind: &'static str,
        id: String,
        reason: String,
    },
    #[error("{kind} `{id}` has unsupported {what} `{value}`")]
    Unsupported {
        kind: &'static str,
        id: String,
        what: &'static str,
        value: String,
    },
    #[error("failed to encode frame: {0}")]
    Image(#[from] image::ImageError),
}

impl SceneError {
    pub(crate) fn missing(
        kind: &'static str,
        id: &str,
        target: &'static str,
        reference: &str,
    ) -> Self {
        Self::MissingReference {
            kind,
            id: id.to_string(),
            target,
            reference: reference.to_string(),
        }
    }

    pub(crate) fn out_of_bounds(kind: &'static str, id: &str, reason: impl Into<String>) -> Self {
        Self::OutOfBounds {
            kind,
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(
        kind: &'static str,
        id: &str,
        what: &'static str,
        value: impl ToString,
    ) -> Self {
        Self::Unsupported {
            kind,
            id: id.to_string(),
            what,
            value: value.to_string(),
        }
    }
}
