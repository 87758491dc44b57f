//! Pure content rules: no filesystem, no rendering.

pub mod dates;
pub mod document;
pub mod front_matter;
pub mod interpolate;
pub mod post_name;
pub mod slug;
pub mod summary;
