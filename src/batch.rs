//! Batch partitioning and request encoding
//!
//! Jobs are grouped by their `(from, to, tld)` triple — the endpoint is
//! keyed per language pair and regional domain — then each group is split
//! into batches of at most `max_batch_size` jobs, preserving the original
//! relative order throughout. Each batch is serialized into the RPC
//! envelope the endpoint expects: a list of `[text, from, to, "auto"]`
//! tuples, double-encoded as a JSON string inside the enclosing envelope
//! together with the fixed RPC method id.
//!
//! Language validation happens here, before any request is built, so
//! invalid jobs never consume network quota.

use crate::error::{Error, Result};
use crate::input::Job;
use crate::languages;
use serde_json::{Value, json};
use std::sync::Arc;

/// RPC method identifier of the translation call on the batch endpoint.
pub(crate) const RPC_ID: &str = "MkEWBc";

/// Default upper bound on jobs per request.
pub(crate) const DEFAULT_BATCH_SIZE: usize = 128;

/// Distinct `(from, to, tld)` combination a batch is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub from: String,
    pub to: String,
    pub tld: String,
}

/// A group of jobs sent in one network round trip.
#[derive(Debug, Clone)]
pub struct Batch {
    pub key: GroupKey,
    /// Constituent jobs, shared read-only with the caller's flat list.
    pub jobs: Vec<Arc<Job>>,
    /// Serialized RPC envelope, ready to be form-encoded as `f.req`.
    pub payload: String,
}

/// Resolve a job's wire-level `from`/`to`, applying the force policy.
///
/// An unresolvable value passes through verbatim when forced (the endpoint
/// itself falls back or rejects); otherwise the call fails fast with
/// `InvalidLanguage` before anything is sent.
fn wire_languages(job: &Job) -> Result<(String, String)> {
    let from = match languages::resolve_from(&job.from) {
        Some(code) => code.to_string(),
        None if job.force_from => job.from.clone(),
        None => return Err(Error::InvalidLanguage(job.from.clone())),
    };
    let to = match languages::get_code(&job.to) {
        Some(code) => code.to_string(),
        None if job.force_to => job.to.clone(),
        None => return Err(Error::InvalidLanguage(job.to.clone())),
    };
    Ok((from, to))
}

/// Serialize one batch's jobs into the RPC envelope.
///
/// The inner tuple list is JSON-encoded to a string first and embedded as
/// a string value in the outer envelope; the endpoint rejects anything
/// that is not this exact double-encoded nesting.
fn encode_payload(jobs: &[Arc<Job>], from: &str, to: &str) -> Result<String> {
    let tuples: Vec<Value> = jobs
        .iter()
        .map(|job| json!([job.text, from, to, "auto"]))
        .collect();
    let inner = serde_json::to_string(&Value::Array(tuples))
        .map_err(|e| Error::InvalidInput(format!("failed to encode request: {e}")))?;
    let envelope = json!([[[RPC_ID, inner, Value::Null, "generic"]]]);
    serde_json::to_string(&envelope)
        .map_err(|e| Error::InvalidInput(format!("failed to encode request: {e}")))
}

/// Partition jobs into size-bounded, group-keyed batches.
///
/// Empty-text jobs are excluded entirely — they translate trivially to the
/// empty string and never touch the network. Order within each group
/// mirrors the original flat order.
pub(crate) fn encode_batches(jobs: &[Arc<Job>], max_batch_size: usize) -> Result<Vec<Batch>> {
    assert!(max_batch_size > 0, "batch size must be positive");

    // Validate every job up front, including the empty ones: a bad code is
    // a caller error regardless of whether the job would hit the wire.
    let mut resolved = Vec::with_capacity(jobs.len());
    for job in jobs {
        resolved.push(wire_languages(job)?);
    }

    // Group by (from, to, tld), preserving first-appearance group order.
    let mut groups: Vec<(GroupKey, Vec<Arc<Job>>)> = Vec::new();
    for (job, (from, to)) in jobs.iter().zip(&resolved) {
        if job.text.is_empty() {
            continue;
        }
        let key = GroupKey {
            from: from.clone(),
            to: to.clone(),
            tld: job.tld.clone(),
        };
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(Arc::clone(job)),
            None => groups.push((key, vec![Arc::clone(job)])),
        }
    }

    let mut batches = Vec::new();
    for (key, members) in groups {
        for chunk in members.chunks(max_batch_size) {
            let payload = encode_payload(chunk, &key.from, &key.to)?;
            batches.push(Batch {
                key: key.clone(),
                jobs: chunk.to_vec(),
                payload,
            });
        }
    }
    Ok(batches)
}
