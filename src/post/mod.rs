//! Post pages: resolving a slug to a post and enumerating slugs to pre-render

mod paths;
mod resolver;

pub use paths::{list_known_slugs, StaticPaths};
pub use resolver::{resolve, PostState};
