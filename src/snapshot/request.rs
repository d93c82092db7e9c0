//! The request snapshot itself.

use serde::Serialize;
use url::Url;

use crate::error::{SnapshotError, SnapshotResult};
use crate::snapshot::claim::IdentityClaim;
use crate::snapshot::form::{FormFields, RawFormData};
use crate::snapshot::query::QueryParameters;

/// Read-only view of one inbound HTTP request.
///
/// Built once per request by a hosting adapter and handed to the protocol
/// engine. Every field is fixed at construction; there are no setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestSnapshot {
    method: String,
    url: Url,
    application_root_url: Url,
    form: FormFields,
    query_parameters: QueryParameters,
    identity_claim: Option<IdentityClaim>,
}

impl RequestSnapshot {
    /// Build a snapshot from every input at once.
    ///
    /// `application_path` is resolved against `url` as a relative reference.
    /// Each form field must carry exactly one value.
    pub fn new(
        method: impl Into<String>,
        url: Url,
        application_path: &str,
        form_data: Option<RawFormData>,
        query_parameters: Option<QueryParameters>,
        identity_claim: Option<IdentityClaim>,
    ) -> SnapshotResult<Self> {
        let application_root_url =
            url.join(application_path)
                .map_err(|source| SnapshotError::InvalidApplicationPath {
                    path: application_path.to_string(),
                    source,
                })?;

        let form = match form_data {
            Some(raw) => FormFields::from_raw(raw)?,
            None => FormFields::new(),
        };

        Ok(Self {
            method: method.into(),
            url,
            application_root_url,
            form,
            query_parameters: query_parameters.unwrap_or_default(),
            identity_claim,
        })
    }

    /// Start building a snapshot for the given method and url.
    pub fn builder(method: impl Into<String>, url: Url) -> SnapshotBuilder {
        SnapshotBuilder::new(method, url)
    }

    /// Snapshot of a bare request mounted at the root, with no form, query or claim.
    pub fn from_method_and_url(method: impl Into<String>, url: Url) -> SnapshotResult<Self> {
        Self::new(method, url, "/", None, None, None)
    }

    /// The http method, exactly as the host reported it.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// True when the method is `POST`, ignoring case.
    pub fn is_post(&self) -> bool {
        self.method.eq_ignore_ascii_case("POST")
    }

    /// The complete requested url.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Root url of the application, including the directory it is mounted
    /// under, e.g. `https://hosting.example.com/myapp/`.
    pub fn application_root_url(&self) -> &Url {
        &self.application_root_url
    }

    /// Posted form fields; empty when the request carried none.
    pub fn form(&self) -> &FormFields {
        &self.form
    }

    /// Query string parameters; empty when none were supplied.
    pub fn query_parameters(&self) -> &QueryParameters {
        &self.query_parameters
    }

    /// Claim naming the currently signed-in principal, if any.
    pub fn identity_claim(&self) -> Option<&IdentityClaim> {
        self.identity_claim.as_ref()
    }
}

/// Step-by-step construction of a [`RequestSnapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    method: String,
    url: Url,
    application_path: String,
    form_data: Option<RawFormData>,
    query_parameters: Option<QueryParameters>,
    identity_claim: Option<IdentityClaim>,
}

impl SnapshotBuilder {
    fn new(method: impl Into<String>, url: Url) -> Self {
        Self {
            method: method.into(),
            url,
            application_path: "/".to_string(),
            form_data: None,
            query_parameters: None,
            identity_claim: None,
        }
    }

    /// Path the application is mounted under. Defaults to `/`.
    pub fn application_path(mut self, path: impl Into<String>) -> Self {
        self.application_path = path.into();
        self
    }

    /// Raw form data; each name must carry exactly one value.
    pub fn form_data(mut self, raw: RawFormData) -> Self {
        self.form_data = Some(raw);
        self
    }

    /// Query parameters, stored as given.
    pub fn query_parameters(mut self, query: QueryParameters) -> Self {
        self.query_parameters = Some(query);
        self
    }

    /// Claim naming the signed-in principal.
    pub fn identity_claim(mut self, claim: IdentityClaim) -> Self {
        self.identity_claim = Some(claim);
        self
    }

    /// Normalize the inputs into a snapshot.
    pub fn build(self) -> SnapshotResult<RequestSnapshot> {
        RequestSnapshot::new(
            self.method,
            self.url,
            &self.application_path,
            self.form_data,
            self.query_parameters,
            self.identity_claim,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn raw(pairs: &[(&str, &[&str])]) -> RawFormData {
        pairs
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_acs_post() {
        let snapshot = RequestSnapshot::builder("POST", url("https://idp.example.com/Saml2/Acs"))
            .form_data(raw(&[("SAMLResponse", &["base64string"])]))
            .build()
            .unwrap();

        assert_eq!(snapshot.method(), "POST");
        assert!(snapshot.is_post());
        assert_eq!(snapshot.form().get("SAMLResponse"), Some("base64string"));
        assert_eq!(snapshot.form().len(), 1);
        assert_eq!(snapshot.application_root_url().as_str(), "https://idp.example.com/");
    }

    #[test]
    fn test_application_root_resolution() {
        let snapshot = RequestSnapshot::new(
            "GET",
            url("https://example.com/app/login?x=1"),
            "/app/",
            None,
            None,
            None,
        )
        .unwrap();

        assert_eq!(snapshot.application_root_url().as_str(), "https://example.com/app/");
        assert_eq!(snapshot.url().as_str(), "https://example.com/app/login?x=1");
    }

    #[test]
    fn test_application_path_without_trailing_slash() {
        let snapshot = RequestSnapshot::builder("GET", url("http://hosting.example.com/myapp/Saml2"))
            .application_path("/myapp")
            .build()
            .unwrap();

        assert_eq!(snapshot.application_root_url().as_str(), "http://hosting.example.com/myapp");
    }

    #[test]
    fn test_relative_application_path() {
        let snapshot = RequestSnapshot::builder("GET", url("https://example.com/a/b/c"))
            .application_path("../")
            .build()
            .unwrap();

        assert_eq!(snapshot.application_root_url().as_str(), "https://example.com/a/");
    }

    #[test]
    fn test_absolute_application_path_replaces_url() {
        let snapshot = RequestSnapshot::builder("GET", url("http://internal:8080/app/x"))
            .application_path("https://public.example.com/app/")
            .build()
            .unwrap();

        assert_eq!(snapshot.application_root_url().as_str(), "https://public.example.com/app/");
    }

    #[test]
    fn test_invalid_application_path() {
        let err = RequestSnapshot::builder("GET", url("https://example.com/"))
            .application_path("http://[::1")
            .build()
            .unwrap_err();

        assert!(matches!(err, SnapshotError::InvalidApplicationPath { .. }));
    }

    #[test]
    fn test_defaults_are_empty() {
        let snapshot =
            RequestSnapshot::from_method_and_url("GET", url("https://sp.example.com/Saml2/SignIn")).unwrap();

        assert!(snapshot.form().is_empty());
        assert!(snapshot.query_parameters().is_empty());
        assert!(snapshot.identity_claim().is_none());
        assert!(!snapshot.is_post());
        assert_eq!(snapshot.application_root_url().as_str(), "https://sp.example.com/");
    }

    #[test]
    fn test_query_parameters_stored_as_given() {
        let query = QueryParameters::from_query("SAMLRequest=abc&RelayState=xyz");
        let snapshot = RequestSnapshot::builder("GET", url("https://sp.example.com/Saml2/Acs?ignored=1"))
            .query_parameters(query.clone())
            .build()
            .unwrap();

        assert_eq!(snapshot.query_parameters(), &query);
        assert!(!snapshot.query_parameters().contains("ignored"));
    }

    #[test]
    fn test_identity_claim_stored_verbatim() {
        let claim = IdentityClaim::name_identifier("alice").with_issuer("https://idp.example.com");
        let snapshot = RequestSnapshot::builder("GET", url("https://sp.example.com/Saml2/Logout"))
            .identity_claim(claim.clone())
            .build()
            .unwrap();

        assert_eq!(snapshot.identity_claim(), Some(&claim));
    }

    #[test]
    fn test_malformed_form_fails_whole_construction() {
        for values in [&[][..], &["a", "b"][..]] {
            let result = RequestSnapshot::builder("POST", url("https://sp.example.com/Saml2/Acs"))
                .form_data(raw(&[("RelayState", &["ok"]), ("SAMLResponse", values)]))
                .build();

            let err = result.unwrap_err();
            assert!(err.is_malformed_form_data());
            assert_eq!(err.field(), Some("SAMLResponse"));
        }
    }

    #[test]
    fn test_method_not_validated() {
        let snapshot = RequestSnapshot::from_method_and_url("post", url("https://sp.example.com/")).unwrap();
        assert_eq!(snapshot.method(), "post");
        assert!(snapshot.is_post());

        let snapshot = RequestSnapshot::from_method_and_url("BREW", url("https://sp.example.com/")).unwrap();
        assert_eq!(snapshot.method(), "BREW");
    }

    #[test]
    fn test_repeated_reads_are_stable() {
        let snapshot = RequestSnapshot::builder("POST", url("https://sp.example.com/app/Saml2/Acs?a=1"))
            .application_path("/app/")
            .form_data(raw(&[("SAMLResponse", &["x"]), ("RelayState", &["y"])]))
            .query_parameters(QueryParameters::from_query("a=1&a=2"))
            .identity_claim(IdentityClaim::name_identifier("bob"))
            .build()
            .unwrap();

        let first = snapshot.clone();
        for _ in 0..3 {
            assert_eq!(snapshot.method(), first.method());
            assert_eq!(snapshot.url(), first.url());
            assert_eq!(snapshot.application_root_url(), first.application_root_url());
            assert_eq!(snapshot.form(), first.form());
            assert_eq!(snapshot.query_parameters().get_all("a"), first.query_parameters().get_all("a"));
            assert_eq!(snapshot.identity_claim(), first.identity_claim());
        }
        assert_eq!(snapshot, first);
    }

    #[test]
    fn test_snapshot_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RequestSnapshot>();
    }

    #[test]
    fn test_serializes_to_json() {
        let snapshot = RequestSnapshot::builder("POST", url("https://idp.example.com/Saml2/Acs"))
            .form_data(raw(&[("SAMLResponse", &["base64string"])]))
            .build()
            .unwrap();

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["method"], "POST");
        assert_eq!(json["application_root_url"], "https://idp.example.com/");
        assert_eq!(json["form"]["SAMLResponse"], "base64string");
        assert!(json["identity_claim"].is_null());
    }
}
