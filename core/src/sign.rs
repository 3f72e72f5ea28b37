//! Request parameters and the `api_sig` signature.
//!
//! # Design
//! `Params` keeps its entries in a `BTreeMap<String, _>`, whose ordering is
//! byte-wise on the UTF-8 key. That is the order the service expects when it
//! recomputes the signature, so signing never has to sort. Values are
//! `Option<String>`: an explicitly absent parameter stays in the map but is
//! neither signed nor sent.

use std::collections::BTreeMap;

/// Name of the signature parameter appended to every request.
pub const API_SIG: &str = "api_sig";

/// A set of request parameters, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: BTreeMap<String, Option<String>>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `insert`.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Set `key` to `value`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.entries.insert(key.into(), Some(value.to_string()));
    }

    /// Record `key` as explicitly absent. Absent keys are skipped when
    /// signing and when encoding the query string.
    pub fn insert_absent(&mut self, key: impl Into<String>) {
        self.entries.insert(key.into(), None);
    }

    /// Set `key` to `value` only if `key` is not present yet.
    pub fn insert_default(&mut self, key: impl Into<String>, value: impl ToString) {
        self.entries
            .entry(key.into())
            .or_insert_with(|| Some(value.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|v| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries with a value, in signing order.
    pub fn present(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        params.extend(iter);
        params
    }
}

impl<K: Into<String>, V: ToString> Extend<(K, V)> for Params {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Compute the request signature: lowercase hex MD5 of the secret followed
/// by every present `key` + `value` in key order, with no separators.
pub fn sign(secret: &str, params: &Params) -> String {
    let mut payload = String::from(secret);
    for (key, value) in params.present() {
        payload.push_str(key);
        payload.push_str(value);
    }
    format!("{:x}", md5::compute(payload.as_bytes()))
}
