//! Untyped token tree and deep merge
//!
//! Configuration documents (the embedded defaults and the user's override
//! file) are first read into a [`TokenTree`], merged, and only then mapped
//! onto the typed [`TokenConfig`](crate::schema::TokenConfig). Keeping the
//! merge on a closed set of variants means every case is an explicit match
//! arm rather than a runtime shape check.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A leaf value in a token document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Numeric value, parsing strings like `"1.5"`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Str(s) => s.trim().parse().ok(),
            Scalar::Bool(_) => None,
        }
    }

    /// The string value, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    /// `true` for the empty string
    pub fn is_empty(&self) -> bool {
        matches!(self, Scalar::Str(s) if s.is_empty())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl PartialEq<str> for Scalar {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Scalar {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

/// A node in a token document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenTree {
    /// Explicit `null` (JSON/YAML). Ignored by [`deep_merge`].
    Null,
    Value(Scalar),
    List(Vec<TokenTree>),
    Map(IndexMap<String, TokenTree>),
}

impl Default for TokenTree {
    fn default() -> Self {
        TokenTree::Map(IndexMap::new())
    }
}

impl TokenTree {
    /// An empty mapping
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TokenTree::Null)
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, TokenTree>> {
        match self {
            TokenTree::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a dotted path (`"primitives.colors.blue.500"`)
    pub fn get_path(&self, path: &str) -> Option<&TokenTree> {
        path.split('.')
            .try_fold(self, |node, segment| node.as_map()?.get(segment))
    }

    /// Copy of this tree with every `null` removed, at any depth
    pub fn without_nulls(&self) -> TokenTree {
        match self {
            TokenTree::Map(map) => TokenTree::Map(
                map.iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k.clone(), v.without_nulls()))
                    .collect(),
            ),
            TokenTree::List(items) => TokenTree::List(
                items
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(TokenTree::without_nulls)
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Strip an export wrapper around the actual document
    ///
    /// Accepts `{ default = {...} }` and `{ module = { exports = {...} } }`
    /// in addition to a bare document.
    pub fn unwrap_export(self) -> TokenTree {
        let TokenTree::Map(mut map) = self else {
            return self;
        };
        if let Some(inner @ TokenTree::Map(_)) = map.get("default") {
            return inner.clone();
        }
        if let Some(TokenTree::Map(module)) = map.get("module") {
            if let Some(inner @ TokenTree::Map(_)) = module.get("exports") {
                return inner.clone();
            }
        }
        // A lone non-mapping `default` is returned as-is so validation rejects it.
        if map.len() == 1 {
            if let Some(inner) = map.shift_remove("default") {
                return inner;
            }
        }
        TokenTree::Map(map)
    }
}

impl From<Scalar> for TokenTree {
    fn from(value: Scalar) -> Self {
        TokenTree::Value(value)
    }
}

/// Recursively merge `overrides` onto `base`
///
/// For each key in `overrides`:
/// - `null` is skipped and never erases a base value
/// - if both sides are mappings, they are merged recursively
/// - otherwise the override replaces the base value (lists are replaced
///   wholesale, never concatenated)
///
/// `base` is left untouched; the result is a new tree. Merging with an empty
/// mapping returns a tree equal to `base`.
pub fn deep_merge(base: &TokenTree, overrides: &TokenTree) -> TokenTree {
    match (base, overrides) {
        (_, TokenTree::Null) => base.clone(),
        (TokenTree::Map(base_map), TokenTree::Map(override_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in override_map {
                if value.is_null() {
                    continue;
                }
                let next = match (merged.get(key), value) {
                    (Some(existing @ TokenTree::Map(_)), TokenTree::Map(_)) => {
                        deep_merge(existing, value)
                    }
                    _ => value.without_nulls(),
                };
                merged.insert(key.clone(), next);
            }
            TokenTree::Map(merged)
        }
        (_, other) => other.without_nulls(),
    }
}
