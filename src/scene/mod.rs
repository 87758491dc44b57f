//! glTF scene loading and the dithered background renderer.

pub mod accessor;
pub mod buffer_view;
pub mod container;
pub mod document;
pub mod error;
pub mod graph;
pub mod library;
pub mod mesh;
pub mod node;
pub mod program;
pub mod render;

pub use container::{Container, SceneFormat, detect_format, parse_binary, parse_json};
pub use error::SceneError;
pub use graph::{Bounds, DrawCall, Scene, SceneSummary};
pub use library::SceneLibrary;
pub use render::{RenderOptions, Renderer, render_frames};
