//! Canonical parameter encoding shared by redirect signing and callback verification.
//!
//! Keys and values are percent-encoded first (space becomes `+`), the pairs are
//! then sorted by the *encoded* key, and joined as `key=value` with `&`. Both
//! directions must go through [`ParamSet::canonical_string`]; any other ordering
//! produces digests that never match even with the right secret.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::{AppError, Result};

/// Percent-encode one key or value the way the gateway does.
///
/// Follows PHP `urlencode`, which VNPay's reference integration signs with:
/// only ASCII letters, digits and `-_.` pass through, space becomes `+`, and
/// everything else (`~!'()*` included) is `%XX` over UTF-8 bytes.
pub fn encode_component(raw: &str) -> String {
    urlencoding::encode(raw)
        .replace("%20", "+")
        .replace('~', "%7E")
}

/// Flat, string-valued gateway parameter set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSet {
    params: BTreeMap<String, String>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.params.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy of the set without `keys`; used to drop signature fields before verifying
    pub fn without(&self, keys: &[&str]) -> Self {
        Self {
            params: self
                .params
                .iter()
                .filter(|(k, _)| !keys.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Build a set from a JSON object of strings and numbers.
    ///
    /// Nested objects, arrays, booleans and nulls are rejected instead of being
    /// stringified, since the gateway would never sign them the same way.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| AppError::validation("Gateway parameters must be a flat object"))?;

        let mut set = Self::new();
        for (key, value) in object {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Object(_) | Value::Array(_) => {
                    return Err(AppError::validation(format!(
                        "Gateway parameter '{}' must be a string or number, nested values are not supported",
                        key
                    )))
                }
                Value::Bool(_) | Value::Null => {
                    return Err(AppError::validation(format!(
                        "Gateway parameter '{}' must be a string or number",
                        key
                    )))
                }
            };
            set.insert(key.clone(), rendered);
        }

        Ok(set)
    }

    /// Deterministic encoding that gets signed
    pub fn canonical_string(&self) -> String {
        let mut encoded: Vec<(String, String)> = self
            .params
            .iter()
            .map(|(k, v)| (encode_component(k), encode_component(v)))
            .collect();

        // Order by the encoded key; raw-key order can differ once escapes appear
        encoded.sort_by(|a, b| a.0.cmp(&b.0));

        encoded
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
