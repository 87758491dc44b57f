//! Side effects: telemetry, the output directory and the dev server.

pub mod assets;
pub mod error;
pub mod http;
pub mod output;
pub mod telemetry;
