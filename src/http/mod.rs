//! HTTP hosting subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → extract.rs (axum request → RequestSnapshot, or 4xx rejection)
//!     → handler (JSON echo of the snapshot)
//! ```

pub mod extract;
pub mod request;
pub mod server;

pub use extract::{Snapshot, SnapshotRejection, SnapshotSettings};
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
