//! Host-independent request snapshots.
//!
//! # Data Flow
//! ```text
//! hosting adapter (axum, tests, CLI)
//!     → form.rs (raw multi-valued form → single-valued fields)
//!     → query.rs (query string → multi-valued parameters)
//!     → claim.rs (identity resolved by the host)
//!     → request.rs (RequestSnapshot, immutable)
//!     → SAML protocol engine
//! ```
//!
//! # Design Decisions
//! - Nothing in this module depends on a web framework
//! - A snapshot is built atomically: either every field normalizes or construction fails
//! - Absent form data and query parameters become empty collections, never `None`

pub mod claim;
pub mod form;
pub mod query;
pub mod request;

pub use claim::IdentityClaim;
pub use form::{group_pairs, parse_urlencoded, FormFields, RawFormData};
pub use query::QueryParameters;
pub use request::{RequestSnapshot, SnapshotBuilder};
