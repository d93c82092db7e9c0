//! Axum hosting adapter.
//!
//! # Responsibilities
//! - Rebuild the absolute request url (scheme, authority, path, query)
//! - Decode url-encoded form bodies within a size limit
//! - Pick up the identity claim an upstream auth layer stored in the extensions
//! - Turn construction failures into 4xx responses
//!
//! # Design Decisions
//! - Forwarded headers are only honoured when the config says a trusted proxy sits in front
//! - Host values must be a bare authority (host and optional port), so they can never move
//!   the path into the query or fragment
//! - Non-form bodies are left unread; the snapshot then has no form fields
//! - Settings are loaded once per request, so a reload never changes a request mid-flight

use std::str::FromStr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    extract::{FromRef, FromRequest, Request},
    http::{header, request::Parts, uri::Authority, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use thiserror::Error;
use url::Url;

use crate::config::SnapshotConfig;
use crate::error::SnapshotError;
use crate::observability::metrics;
use crate::snapshot::{parse_urlencoded, IdentityClaim, QueryParameters, RequestSnapshot};

const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Snapshot settings shared with the adapter, swappable at runtime.
#[derive(Debug, Clone)]
pub struct SnapshotSettings(Arc<ArcSwap<SnapshotConfig>>);

impl SnapshotSettings {
    pub fn new(config: SnapshotConfig) -> Self {
        Self(Arc::new(ArcSwap::from_pointee(config)))
    }

    /// Current settings.
    pub fn load(&self) -> Arc<SnapshotConfig> {
        self.0.load_full()
    }

    /// Replace the settings for requests that start after this call.
    pub fn store(&self, config: SnapshotConfig) {
        self.0.store(Arc::new(config));
    }
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self::new(SnapshotConfig::default())
    }
}

/// Reasons the adapter could not produce a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotRejection {
    #[error("Request has no host to build an absolute url from")]
    MissingHost,

    #[error("Host '{0}' is not a valid authority")]
    InvalidHost(String),

    #[error("Scheme '{0}' is not http or https")]
    UnsupportedScheme(String),

    #[error("Request url '{url}' is not a valid absolute url: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Form body exceeds the limit of {limit} bytes")]
    FormTooLarge { limit: usize },

    #[error("Failed to read request body: {0}")]
    UnreadableBody(String),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl SnapshotRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            SnapshotRejection::FormTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SnapshotRejection::MissingHost => "missing_host",
            SnapshotRejection::InvalidHost(_) => "invalid_host",
            SnapshotRejection::UnsupportedScheme(_) => "unsupported_scheme",
            SnapshotRejection::InvalidUrl { .. } => "invalid_url",
            SnapshotRejection::FormTooLarge { .. } => "form_too_large",
            SnapshotRejection::UnreadableBody(_) => "unreadable_body",
            SnapshotRejection::Snapshot(e) if e.is_malformed_form_data() => "malformed_form",
            SnapshotRejection::Snapshot(_) => "invalid_application_path",
        }
    }
}

impl IntoResponse for SnapshotRejection {
    fn into_response(self) -> Response {
        tracing::warn!(kind = self.kind(), error = %self, "Rejected request");
        metrics::record_rejection(self.kind());
        (self.status(), self.to_string()).into_response()
    }
}

/// Extractor yielding the [`RequestSnapshot`] of the current request.
///
/// The router state must provide [`SnapshotSettings`] through `FromRef`.
#[derive(Debug, Clone)]
pub struct Snapshot(pub RequestSnapshot);

impl<S> FromRequest<S> for Snapshot
where
    S: Send + Sync,
    SnapshotSettings: FromRef<S>,
{
    type Rejection = SnapshotRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let settings = SnapshotSettings::from_ref(state).load();
        let (parts, body) = req.into_parts();

        let url = absolute_url(&parts, &settings)?;
        let query = QueryParameters::from_url(&url);
        let claim = parts.extensions.get::<IdentityClaim>().cloned();

        let form_data = if is_form_urlencoded(&parts.headers) {
            if let Some(length) = content_length(&parts.headers) {
                if length > settings.max_form_bytes {
                    return Err(SnapshotRejection::FormTooLarge {
                        limit: settings.max_form_bytes,
                    });
                }
            }
            let bytes = axum::body::to_bytes(body, settings.max_form_bytes)
                .await
                .map_err(|e| body_error(e, settings.max_form_bytes))?;
            Some(parse_urlencoded(&bytes))
        } else {
            None
        };

        let snapshot = RequestSnapshot::new(
            parts.method.as_str(),
            url,
            &settings.application_path,
            form_data,
            Some(query),
            claim,
        )?;

        tracing::debug!(
            method = %snapshot.method(),
            url = %snapshot.url(),
            form_fields = snapshot.form().len(),
            authenticated = snapshot.identity_claim().is_some(),
            "Request snapshot built"
        );
        metrics::record_snapshot(snapshot.form().len());

        Ok(Snapshot(snapshot))
    }
}

/// Reconstruct the absolute url the client requested.
pub fn absolute_url(parts: &Parts, settings: &SnapshotConfig) -> Result<Url, SnapshotRejection> {
    let forwarded = |name: &HeaderName| {
        settings
            .trust_forwarded_headers
            .then(|| first_header_value(&parts.headers, name))
            .flatten()
    };

    let scheme = forwarded(&X_FORWARDED_PROTO)
        .or_else(|| parts.uri.scheme_str().map(str::to_string))
        .unwrap_or_else(|| settings.default_scheme.clone())
        .to_ascii_lowercase();
    if !matches!(scheme.as_str(), "http" | "https") {
        return Err(SnapshotRejection::UnsupportedScheme(scheme));
    }

    let authority = forwarded(&X_FORWARDED_HOST)
        .or_else(|| parts.uri.authority().map(|a| a.as_str().to_string()))
        .or_else(|| first_header_value(&parts.headers, &header::HOST))
        .ok_or(SnapshotRejection::MissingHost)?;
    let authority = checked_authority(authority)?;

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let raw = format!("{}://{}{}", scheme, authority, path_and_query);
    Url::parse(&raw).map_err(|source| SnapshotRejection::InvalidUrl { url: raw, source })
}

/// Accept only `host[:port]`; userinfo, paths, queries and fragments are rejected.
fn checked_authority(raw: String) -> Result<String, SnapshotRejection> {
    match Authority::from_str(&raw) {
        Ok(authority) if !authority.as_str().contains('@') => Ok(raw),
        _ => Err(SnapshotRejection::InvalidHost(raw)),
    }
}

/// Map a body buffering failure, recognising the length limit wherever it
/// sits in the error chain.
fn body_error(err: axum::Error, limit: usize) -> SnapshotRejection {
    let inner = err.into_inner();
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&*inner);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return SnapshotRejection::FormTooLarge { limit };
        }
        source = e.source();
    }
    SnapshotRejection::UnreadableBody(inner.to_string())
}

/// First comma-separated entry of a header, trimmed. Proxies append, so the
/// first entry is the one closest to the client.
fn first_header_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn is_form_urlencoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case(FORM_URLENCODED))
        .unwrap_or(false)
}

fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}
