//! Mock transport for testing
//!
//! A deterministic, network-free [`Transport`] that answers with real wire
//! framing, so the whole pipeline — envelope encoding, response parsing,
//! assembly, partial-failure policy — is exercised end to end without an
//! API dependency. The [`wire`] helpers build response fixtures and are
//! public so downstream tests can fabricate endpoint responses too.

use crate::batch::Batch;
use crate::error::{Error, Result};
use crate::transport::{RequestOptions, Transport, with_cancel};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Response fixture builders mirroring the endpoint's framed format.
pub mod wire {
    use crate::batch::RPC_ID;
    use serde_json::{Value, json};

    /// Build a correction suggestion block.
    pub fn correction(markup: &str, autocorrected: bool) -> Value {
        json!([
            [[Value::Null, markup]],
            Value::Null,
            if autocorrected { 1 } else { 0 }
        ])
    }

    /// Build one job record: source section, translation section with
    /// per-sentence chunks and optional transliteration, detected language.
    pub fn record(
        source_text: &str,
        chunks: &[&str],
        detected: &str,
        pronunciation: Option<&str>,
        correction: Option<Value>,
    ) -> Value {
        let chunk_values: Vec<Value> = chunks.iter().map(|c| json!([c, Value::Null])).collect();
        json!([
            [Value::Null, correction.unwrap_or(Value::Null)],
            [
                [[
                    Value::Null,
                    pronunciation,
                    Value::Null,
                    Value::Null,
                    Value::Null,
                    chunk_values
                ]],
                [source_text, Value::Null]
            ],
            detected
        ])
    }

    /// Wrap job records in the full framed response: anti-hijacking
    /// header, length-prefix lines, RPC envelope, bookkeeping frames.
    pub fn response_text(records: &Value) -> String {
        let inner = serde_json::to_string(records).expect("serializable fixture");
        let envelope = serde_json::to_string(&json!([[
            "wrb.fr",
            RPC_ID,
            inner,
            Value::Null,
            Value::Null,
            Value::Null,
            "generic"
        ]]))
        .expect("serializable fixture");
        format!(
            ")]}}'\n\n{}\n{}\n56\n[[\"di\",59],[\"af.httprm\",59,\"8911\",7]]\n",
            envelope.len(),
            envelope
        )
    }
}

/// What the mock endpoint should do with a batch.
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Echo with a target suffix: `"dog"` → `"dog:es"`.
    Suffix,
    /// Fixed text → translation table, falling back to the suffix form.
    Mappings(HashMap<String, String>),
    /// Emit a malformed record at these within-batch positions.
    FailAt(HashSet<usize>),
    /// Fail every exchange with the given HTTP status.
    TransportError(u16),
    /// Fail every exchange with HTTP 429.
    RateLimited,
    /// Answer with something that is not the expected framing at all.
    Garbage,
    /// Never answer; only useful together with a cancellation token.
    Hang,
}

/// Canned-wire transport; see [`MockMode`] for behaviors.
#[derive(Debug, Clone)]
pub struct MockTransport {
    mode: MockMode,
    detect_as: Option<String>,
    corrections: HashMap<String, (String, bool)>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockTransport {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            detect_as: None,
            corrections: HashMap::new(),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Report this language as the detected source for every job.
    pub fn with_detect_as(mut self, iso: impl Into<String>) -> Self {
        self.detect_as = Some(iso.into());
        self
    }

    /// Attach a correction suggestion to a specific source text.
    pub fn with_correction(
        mut self,
        source_text: impl Into<String>,
        markup: impl Into<String>,
        autocorrected: bool,
    ) -> Self {
        self.corrections
            .insert(source_text.into(), (markup.into(), autocorrected));
        self
    }

    /// Simulate network latency per exchange.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared exchange counter, for asserting how many requests were made
    /// (including that none were).
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Recover the `(text, from, to)` tuples from a batch's envelope, the
    /// same way the endpoint would.
    fn decode_payload(payload: &str) -> Result<Vec<(String, String, String)>> {
        let envelope: Value = serde_json::from_str(payload)
            .map_err(|e| Error::Decode(format!("mock received bad envelope: {e}")))?;
        let inner = envelope
            .get(0)
            .and_then(|v| v.get(0))
            .and_then(|rpc| rpc.get(1))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Decode("mock received bad envelope".to_string()))?;
        let tuples: Value = serde_json::from_str(inner)
            .map_err(|e| Error::Decode(format!("mock received bad tuple list: {e}")))?;
        tuples
            .as_array()
            .map(|list| {
                list.iter()
                    .map(|t| {
                        (
                            t.get(0).and_then(Value::as_str).unwrap_or_default().to_string(),
                            t.get(1).and_then(Value::as_str).unwrap_or_default().to_string(),
                            t.get(2).and_then(Value::as_str).unwrap_or_default().to_string(),
                        )
                    })
                    .collect()
            })
            .ok_or_else(|| Error::Decode("mock received bad tuple list".to_string()))
    }

    fn translate(&self, text: &str, to: &str) -> String {
        match &self.mode {
            MockMode::Mappings(map) => map
                .get(text)
                .cloned()
                .unwrap_or_else(|| format!("{text}:{to}")),
            _ => format!("{text}:{to}"),
        }
    }

    fn detected_for(&self, from: &str) -> String {
        match &self.detect_as {
            Some(iso) => iso.clone(),
            None if from == "auto" => "en".to_string(),
            None => from.to_string(),
        }
    }

    async fn respond(&self, batch: &Batch) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.mode {
            MockMode::TransportError(status) => Err(Error::Transport {
                status: Some(*status),
                message: "mock transport failure".to_string(),
            }),
            MockMode::RateLimited => Err(Error::RateLimit),
            MockMode::Garbage => Ok("<html>not the translator</html>".to_string()),
            MockMode::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            MockMode::Suffix | MockMode::Mappings(_) | MockMode::FailAt(_) => {
                let tuples = Self::decode_payload(&batch.payload)?;
                let records: Vec<Value> = tuples
                    .iter()
                    .enumerate()
                    .map(|(i, (text, from, to))| {
                        if matches!(&self.mode, MockMode::FailAt(positions) if positions.contains(&i)) {
                            return Value::Array(Vec::new());
                        }
                        let translated = self.translate(text, to);
                        let correction = self
                            .corrections
                            .get(text)
                            .map(|(markup, auto)| wire::correction(markup, *auto));
                        wire::record(
                            text,
                            &[translated.as_str()],
                            &self.detected_for(from),
                            None,
                            correction,
                        )
                    })
                    .collect();
                Ok(wire::response_text(&Value::Array(records)))
            }
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, batch: &Batch, opts: &RequestOptions) -> Result<String> {
        with_cancel(opts.cancel.as_ref(), self.respond(batch)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{DEFAULT_BATCH_SIZE, encode_batches};
    use crate::input::{TranslateInput, TranslateOptions, normalize};
    use crate::parser::parse;

    async fn round_trip(mock: &MockTransport, texts: Vec<&str>) -> Vec<Option<String>> {
        let opts = TranslateOptions {
            from: "es".to_string(),
            to: "en".to_string(),
            ..TranslateOptions::default()
        };
        let jobs = normalize(&TranslateInput::from(texts), &opts).unwrap().0;
        let batches = encode_batches(&jobs, DEFAULT_BATCH_SIZE).unwrap();
        let raw = mock
            .send(&batches[0], &RequestOptions::default())
            .await
            .unwrap();
        let texts: Vec<&str> = batches[0].jobs.iter().map(|j| j.text.as_str()).collect();
        parse(&raw, &texts)
            .unwrap()
            .into_iter()
            .map(|p| p.ok().map(|r| r.translated_text))
            .collect()
    }

    #[tokio::test]
    async fn test_suffix_round_trip() {
        let mock = MockTransport::new(MockMode::Suffix);
        let texts = round_trip(&mock, vec!["uno", "dos"]).await;
        assert_eq!(texts[0].as_deref(), Some("uno:en"));
        assert_eq!(texts[1].as_deref(), Some("dos:en"));
        assert_eq!(mock.call_counter().load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mappings_round_trip() {
        let mut map = HashMap::new();
        map.insert("uno".to_string(), "one".to_string());
        let mock = MockTransport::new(MockMode::Mappings(map));
        let texts = round_trip(&mock, vec!["uno", "tres"]).await;
        assert_eq!(texts[0].as_deref(), Some("one"));
        assert_eq!(texts[1].as_deref(), Some("tres:en"));
    }

    #[tokio::test]
    async fn test_fail_at_marks_positions() {
        let mock = MockTransport::new(MockMode::FailAt(HashSet::from([1])));
        let texts = round_trip(&mock, vec!["uno", "dos", "tres"]).await;
        assert!(texts[0].is_some());
        assert!(texts[1].is_none());
        assert!(texts[2].is_some());
    }
}
