//! Helper functions shared by the generator, server and templates

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
