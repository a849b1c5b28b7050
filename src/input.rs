//! Input normalization
//!
//! Callers hand over a single string, an ordered list, or a keyed mapping,
//! each element optionally carrying per-item option overrides. This module
//! flattens any of those into an ordered list of [`Job`]s and remembers the
//! original shape as a tagged [`InputShape`] so results can be reassembled
//! into exactly the shape the caller provided.

use crate::error::{Error, Result};
use crate::transport::RequestOptions;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Call-level options, inherited by every item unless overridden.
#[derive(Debug, Clone)]
pub struct TranslateOptions {
    /// Source language code or name; `"auto"` requests detection.
    pub from: String,
    /// Target language code or name.
    pub to: String,
    /// Regional top-level domain of the endpoint (`"com"`, `"hk"`, ...).
    pub tld: String,
    /// Pass an unresolvable `from` through to the endpoint instead of
    /// failing locally.
    pub force_from: bool,
    /// Same for `to`.
    pub force_to: bool,
    /// Partial-failure policy: `true` rejects the whole call when any item
    /// fails, `false` returns `None` at the failed positions.
    pub reject_on_partial_fail: bool,
    /// Pass-through transport configuration (timeout, proxy, headers,
    /// cancellation).
    pub request: RequestOptions,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            from: "auto".to_string(),
            to: "en".to_string(),
            tld: "com".to_string(),
            force_from: false,
            force_to: false,
            reject_on_partial_fail: true,
            request: RequestOptions::default(),
        }
    }
}

/// One input element: a text plus optional per-item option overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Item {
    pub text: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub tld: Option<String>,
    pub force_from: Option<bool>,
    pub force_to: Option<bool>,
}

impl Item {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Override the target language for this item only.
    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    /// Override the source language for this item only.
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }
}

impl From<&str> for Item {
    fn from(text: &str) -> Self {
        Item::new(text)
    }
}

impl From<String> for Item {
    fn from(text: String) -> Self {
        Item::new(text)
    }
}

/// The caller's input, one of the three supported shapes.
#[derive(Debug, Clone)]
pub enum TranslateInput {
    Single(String),
    List(Vec<Item>),
    /// Keyed mapping; pairs keep the caller's key order.
    Mapping(Vec<(String, Item)>),
}

impl From<&str> for TranslateInput {
    fn from(text: &str) -> Self {
        TranslateInput::Single(text.to_string())
    }
}

impl From<String> for TranslateInput {
    fn from(text: String) -> Self {
        TranslateInput::Single(text)
    }
}

impl From<Vec<&str>> for TranslateInput {
    fn from(texts: Vec<&str>) -> Self {
        TranslateInput::List(texts.into_iter().map(<Item as From<&str>>::from).collect())
    }
}

impl From<Vec<String>> for TranslateInput {
    fn from(texts: Vec<String>) -> Self {
        TranslateInput::List(
            texts
                .into_iter()
                .map(<Item as From<String>>::from)
                .collect(),
        )
    }
}

impl From<Vec<Item>> for TranslateInput {
    fn from(items: Vec<Item>) -> Self {
        TranslateInput::List(items)
    }
}

impl From<Vec<(&str, &str)>> for TranslateInput {
    fn from(pairs: Vec<(&str, &str)>) -> Self {
        TranslateInput::Mapping(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), <Item as From<&str>>::from(v)))
                .collect(),
        )
    }
}

impl From<Vec<(String, Item)>> for TranslateInput {
    fn from(pairs: Vec<(String, Item)>) -> Self {
        TranslateInput::Mapping(pairs)
    }
}

/// The unit of translation: one text with its fully inherited options.
/// Immutable once created; shared read-only between batches and the
/// assembler via `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Position in the flattened input.
    pub index: usize,
    pub text: String,
    pub from: String,
    pub to: String,
    pub tld: String,
    pub force_from: bool,
    pub force_to: bool,
}

/// Tag recording the caller's original input shape, captured at
/// normalization time and matched on during reassembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputShape {
    Scalar,
    List,
    /// Original keys in original order.
    Mapping(Vec<String>),
}

/// Flatten the caller's input into an ordered job list plus the shape tag
/// needed to reassemble results.
///
/// Every element becomes exactly one job, inheriting the call options
/// unless overridden per-item. Empty-string items still become jobs; the
/// batch encoder later keeps them off the wire.
pub(crate) fn normalize(
    input: &TranslateInput,
    opts: &TranslateOptions,
) -> Result<(Vec<Arc<Job>>, InputShape)> {
    let make_job = |index: usize, item: &Item| -> Arc<Job> {
        Arc::new(Job {
            index,
            text: item.text.clone(),
            from: item.from.clone().unwrap_or_else(|| opts.from.clone()),
            to: item.to.clone().unwrap_or_else(|| opts.to.clone()),
            tld: item.tld.clone().unwrap_or_else(|| opts.tld.clone()),
            force_from: item.force_from.unwrap_or(opts.force_from),
            force_to: item.force_to.unwrap_or(opts.force_to),
        })
    };

    match input {
        TranslateInput::Single(text) => {
            let item = Item::new(text.clone());
            Ok((vec![make_job(0, &item)], InputShape::Scalar))
        }
        TranslateInput::List(items) => {
            let jobs = items
                .iter()
                .enumerate()
                .map(|(i, item)| make_job(i, item))
                .collect();
            Ok((jobs, InputShape::List))
        }
        TranslateInput::Mapping(pairs) => {
            let mut seen = HashSet::new();
            for (key, _) in pairs {
                if !seen.insert(key.as_str()) {
                    return Err(Error::InvalidInput(format!(
                        "duplicate key in mapping input: {key:?}"
                    )));
                }
            }
            let jobs = pairs
                .iter()
                .enumerate()
                .map(|(i, (_, item))| make_job(i, item))
                .collect();
            let keys = pairs.iter().map(|(k, _)| k.clone()).collect();
            Ok((jobs, InputShape::Mapping(keys)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> TranslateOptions {
        TranslateOptions {
            from: "en".to_string(),
            to: "es".to_string(),
            ..TranslateOptions::default()
        }
    }

    #[test]
    fn test_normalize_scalar() {
        let (jobs, shape) = normalize(&TranslateInput::from("dog"), &opts()).unwrap();
        assert_eq!(shape, InputShape::Scalar);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].index, 0);
        assert_eq!(jobs[0].text, "dog");
        assert_eq!(jobs[0].from, "en");
        assert_eq!(jobs[0].to, "es");
        assert_eq!(jobs[0].tld, "com");
    }

    #[test]
    fn test_normalize_list_preserves_order() {
        let (jobs, shape) = normalize(&TranslateInput::from(vec!["dog", "cat"]), &opts()).unwrap();
        assert_eq!(shape, InputShape::List);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].text, "dog");
        assert_eq!(jobs[1].text, "cat");
        assert_eq!(jobs[1].index, 1);
    }

    #[test]
    fn test_normalize_mapping_keeps_key_order() {
        let input = TranslateInput::from(vec![("dog", "dog"), ("cat", "cat")]);
        let (jobs, shape) = normalize(&input, &opts()).unwrap();
        assert_eq!(
            shape,
            InputShape::Mapping(vec!["dog".to_string(), "cat".to_string()])
        );
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].text, "dog");
    }

    #[test]
    fn test_normalize_rejects_duplicate_keys() {
        let input = TranslateInput::from(vec![("a", "dog"), ("a", "cat")]);
        match normalize(&input, &opts()) {
            Err(Error::InvalidInput(msg)) => assert!(msg.contains("duplicate")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_per_item_overrides_inherit_rest() {
        let input = TranslateInput::List(vec![Item::new("dog").to("ar"), Item::new("cat")]);
        let (jobs, _) = normalize(&input, &opts()).unwrap();
        assert_eq!(jobs[0].to, "ar");
        assert_eq!(jobs[0].from, "en");
        assert_eq!(jobs[1].to, "es");
    }

    #[test]
    fn test_empty_items_become_jobs() {
        let (jobs, _) = normalize(&TranslateInput::from(vec!["dog", ""]), &opts()).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].text, "");
    }

    #[test]
    fn test_default_options() {
        let o = TranslateOptions::default();
        assert_eq!(o.from, "auto");
        assert_eq!(o.to, "en");
        assert_eq!(o.tld, "com");
        assert!(o.reject_on_partial_fail);
        assert!(!o.force_from);
        assert!(!o.force_to);
    }
}
