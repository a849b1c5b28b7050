//! Result assembly
//!
//! Maps decoded records back onto jobs by position, derives the public
//! per-job result (didYouMean / autocorrection signals included), applies
//! the partial-failure policy across the whole original input, and
//! reshapes the flat result list into the caller's original input shape.

use crate::error::{Error, Result};
use crate::input::{InputShape, Job};
use crate::languages;
use crate::parser::ParsedJob;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, OnceLock};

/// Detected/requested source language signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageInfo {
    pub iso: String,
    /// True when the requested source differs from what the endpoint
    /// detected and the caller did not force the request value.
    pub did_you_mean: bool,
}

/// Source-text correction signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceTextInfo {
    /// The endpoint's suggested source text with its emphasis markup
    /// rewritten to brackets, or empty when there was no suggestion.
    pub value: String,
    /// The endpoint silently translated the corrected text.
    pub auto_corrected: bool,
    /// The correction was only suggested, not applied.
    pub did_you_mean: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub language: LanguageInfo,
    pub text: SourceTextInfo,
}

/// Public output for one translated item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationResult {
    pub text: String,
    pub pronunciation: Option<String>,
    pub from: SourceInfo,
    /// The decoded wire record, for callers that need fields this crate
    /// does not surface.
    pub raw: Value,
}

/// Results reshaped to the caller's original input shape. `None` slots
/// appear only under the lenient partial-failure policy.
#[derive(Debug, Clone, PartialEq)]
pub enum Translated {
    Single(Option<TranslationResult>),
    List(Vec<Option<TranslationResult>>),
    Mapping(Vec<(String, Option<TranslationResult>)>),
}

impl Translated {
    /// Unwrap a scalar-shaped result.
    pub fn into_single(self) -> Option<TranslationResult> {
        match self {
            Translated::Single(result) => result,
            _ => None,
        }
    }

    /// Unwrap a list-shaped result.
    pub fn into_list(self) -> Option<Vec<Option<TranslationResult>>> {
        match self {
            Translated::List(results) => Some(results),
            _ => None,
        }
    }

    /// Unwrap a mapping-shaped result, keys in original order.
    pub fn into_mapping(self) -> Option<Vec<(String, Option<TranslationResult>)>> {
        match self {
            Translated::Mapping(pairs) => Some(pairs),
            _ => None,
        }
    }
}

/// Rewrite the endpoint's `<b><i>…</i></b>` correction emphasis to the
/// bracket form surfaced to callers.
fn rewrite_markup(markup: &str) -> String {
    static OPEN: OnceLock<Regex> = OnceLock::new();
    static CLOSE: OnceLock<Regex> = OnceLock::new();
    let open = OPEN.get_or_init(|| Regex::new(r"<b>(<i>)?").expect("static regex"));
    let close = CLOSE.get_or_init(|| Regex::new(r"(</i>)?</b>").expect("static regex"));
    close.replace_all(&open.replace_all(markup, "["), "]").into_owned()
}

/// Build the public result for one job from its decoded record.
fn build_result(job: &Job, record: &crate::parser::RawRecord) -> TranslationResult {
    let detected = record.detected_source_language.as_str();
    let language = if job.from == languages::AUTO {
        LanguageInfo {
            iso: detected.to_string(),
            did_you_mean: false,
        }
    } else {
        let requested = languages::get_code(&job.from).unwrap_or(job.from.as_str());
        let did_you_mean = !job.force_from && requested != detected;
        LanguageInfo {
            iso: if did_you_mean { detected } else { requested }.to_string(),
            did_you_mean,
        }
    };

    let text = match &record.source_text_corrected {
        Some(markup) => SourceTextInfo {
            value: rewrite_markup(markup),
            auto_corrected: record.source_text_had_correction,
            did_you_mean: !record.source_text_had_correction,
        },
        None => SourceTextInfo {
            value: String::new(),
            auto_corrected: false,
            did_you_mean: false,
        },
    };

    TranslationResult {
        text: record.translated_text.clone(),
        pronunciation: record.pronunciation.clone(),
        from: SourceInfo { language, text },
        raw: record.payload.clone(),
    }
}

/// Trivial result for an empty-text job that never hit the wire.
fn empty_result(job: &Job) -> TranslationResult {
    let iso = languages::resolve_from(&job.from)
        .unwrap_or(job.from.as_str())
        .to_string();
    TranslationResult {
        text: String::new(),
        pronunciation: None,
        from: SourceInfo {
            language: LanguageInfo {
                iso,
                did_you_mean: false,
            },
            text: SourceTextInfo {
                value: String::new(),
                auto_corrected: false,
                did_you_mean: false,
            },
        },
        raw: Value::Null,
    }
}

/// Map per-index records onto jobs and apply the partial-failure policy.
///
/// `records[i]` belongs to `jobs[i]`; `None` means the job's batch failed
/// as a whole. Under the strict policy any failed index rejects the entire
/// call — after all batches have been accounted for, so diagnostics list
/// every failed index, not just the first.
pub(crate) fn assemble(
    jobs: &[Arc<Job>],
    records: Vec<Option<ParsedJob>>,
    reject_on_partial_fail: bool,
) -> Result<Vec<Option<TranslationResult>>> {
    debug_assert_eq!(jobs.len(), records.len());

    let mut results = Vec::with_capacity(jobs.len());
    let mut failed = Vec::new();
    for (job, record) in jobs.iter().zip(records) {
        if job.text.is_empty() {
            results.push(Some(empty_result(job)));
            continue;
        }
        match record {
            Some(Ok(record)) => results.push(Some(build_result(job, &record))),
            Some(Err(_)) | None => {
                failed.push(job.index);
                results.push(None);
            }
        }
    }

    if reject_on_partial_fail && !failed.is_empty() {
        return Err(Error::PartialFailure { failed });
    }
    Ok(results)
}

/// Reshape the flat result list into the caller's original input shape.
pub(crate) fn reshape(shape: InputShape, mut results: Vec<Option<TranslationResult>>) -> Translated {
    match shape {
        InputShape::Scalar => Translated::Single(results.pop().flatten()),
        InputShape::List => Translated::List(results),
        InputShape::Mapping(keys) => {
            Translated::Mapping(keys.into_iter().zip(results).collect())
        }
    }
}
