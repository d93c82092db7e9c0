//! Single-valued form fields.
//!
//! # Responsibilities
//! - Accept the raw, multi-valued form data a host decoded from the body
//! - Enforce exactly one value per field name
//! - Keep field order and spelling exactly as submitted
//!
//! # Design Decisions
//! - Cardinality is checked up front; nothing silently picks first or last
//! - Lookups are case-sensitive, as form field names are
//! - Names are indexed by hash, so a body with many fields stays linear to parse

use std::collections::HashMap;

use serde::ser::{Serialize, Serializer};
use url::form_urlencoded;

use crate::error::{SnapshotError, SnapshotResult};

/// Raw form data as decoded by a host: each name with every submitted value.
pub type RawFormData = Vec<(String, Vec<String>)>;

/// Ordered, read-only mapping from form field name to its single value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl FormFields {
    /// Create an empty set of form fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize raw form data, requiring exactly one value per name.
    pub fn from_raw<I, K, V>(raw: I) -> SnapshotResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        let mut fields = Self::new();

        for (name, values) in raw {
            let name = name.into();
            if fields.index.contains_key(&name) {
                return Err(SnapshotError::DuplicateFormField { field: name });
            }

            let mut values = values.into_iter().map(Into::<String>::into);
            let value = match (values.next(), values.count()) {
                (Some(value), 0) => value,
                (None, _) => return Err(SnapshotError::MissingFormValue { field: name }),
                (Some(_), rest) => {
                    return Err(SnapshotError::RepeatedFormValue {
                        field: name,
                        count: rest + 1,
                    })
                }
            };

            fields.index.insert(name.clone(), fields.entries.len());
            fields.entries.push((name, value));
        }

        Ok(fields)
    }

    /// Value of the named field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.index
            .get(name)
            .map(|&idx| self.entries[idx].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs in submission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for FormFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Decode an `application/x-www-form-urlencoded` body into raw form data.
///
/// Repeated names are grouped under their first occurrence, so the result
/// is ready for [`FormFields::from_raw`].
pub fn parse_urlencoded(body: &[u8]) -> RawFormData {
    group_pairs(form_urlencoded::parse(body))
}

/// Group `(name, value)` pairs into raw form data, one entry per distinct
/// name in first-appearance order.
pub fn group_pairs<I, K, V>(pairs: I) -> RawFormData
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut raw: RawFormData = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (name, value) in pairs {
        let name = name.into();
        match index.get(&name) {
            Some(&idx) => raw[idx].1.push(value.into()),
            None => {
                index.insert(name.clone(), raw.len());
                raw.push((name, vec![value.into()]));
            }
        }
    }

    raw
}
