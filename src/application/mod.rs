//! Orchestration: rendering, collation, layouts, feeds, assets and the build graph.

pub mod assets;
pub mod build;
pub mod documents;
pub mod error;
pub mod layout;
pub mod render;
pub mod site;
pub mod sitemap;
pub mod syndication;
pub mod watch;
