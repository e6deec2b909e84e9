//! Configuration module

mod site;

pub use site::CmsConfig;
pub use site::ListingConfig;
pub use site::SiteConfig;
pub use site::StaticPathsConfig;
pub use site::{ENV_CMS_ENDPOINT, ENV_CMS_TOKEN};
