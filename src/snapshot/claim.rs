//! The already-resolved identity of the signed-in principal.

use serde::{Deserialize, Serialize};

/// Claim type carrying the name identifier of a principal.
pub const NAME_IDENTIFIER: &str =
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";

/// Issuer reported for claims that were not issued by an external party.
pub const LOCAL_AUTHORITY: &str = "LOCAL AUTHORITY";

/// A single type/value claim about the current principal.
///
/// Hosts resolve this before building a snapshot, typically from their own
/// session, and hand it over as-is. An authentication layer in front of the
/// axum adapter can insert it into the request extensions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityClaim {
    pub claim_type: String,
    pub value: String,
    pub issuer: String,
}

impl IdentityClaim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
            issuer: LOCAL_AUTHORITY.to_string(),
        }
    }

    /// Name identifier claim for the given value.
    pub fn name_identifier(value: impl Into<String>) -> Self {
        Self::new(NAME_IDENTIFIER, value)
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn is_name_identifier(&self) -> bool {
        self.claim_type == NAME_IDENTIFIER
    }
}
