//! Host-independent request snapshots for a SAML2 Web SSO engine.
//!
//! A [`RequestSnapshot`] is the protocol engine's only view of an inbound
//! HTTP request. Hosting adapters build one per request; the [`http`]
//! module provides such an adapter for axum.
//!
//! ```
//! use sso_request::snapshot::RequestSnapshot;
//! use url::Url;
//!
//! let snapshot = RequestSnapshot::builder("POST", Url::parse("https://idp.example.com/Saml2/Acs").unwrap())
//!     .form_data(vec![("SAMLResponse".into(), vec!["base64string".into()])])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(snapshot.form().get("SAMLResponse"), Some("base64string"));
//! assert_eq!(snapshot.application_root_url().as_str(), "https://idp.example.com/");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod snapshot;

pub use config::AppConfig;
pub use error::{SnapshotError, SnapshotResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use snapshot::{FormFields, IdentityClaim, QueryParameters, RequestSnapshot};
