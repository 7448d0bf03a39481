//! nginx front for the Sub-Store container
//!
//! Renders the HTTP-only and HTTPS virtual hosts and installs them into
//! nginx's sites-available/sites-enabled tree, validating with `nginx -t`
//! before every reload.

pub mod error;
pub mod site;
pub mod template;

pub use error::ProxyError;
pub use site::NginxSiteManager;
pub use template::SiteTemplate;
