//! Response parsing
//!
//! The endpoint answers with a format meant for its own web client, not
//! for strict JSON consumers: line-oriented length-prefix framing around
//! an array literal whose translation payload is itself a JSON-encoded
//! string, with occasional single-quoted strings and trailing garbage.
//!
//! Parsing is deliberately tolerant in the small and strict in the large:
//! fragments are located by structural shape rather than fixed offsets
//! (the endpoint's internal nesting shifts release to release), a
//! malformed per-job chunk degrades to a [`ParseFailure`] for that index
//! only, and a [`Decode`](crate::Error::Decode) error is raised solely
//! when the outer framing cannot be located at all.
//!
//! A decoded job record has, somewhere inside it:
//! - a list of per-sentence translation chunks, recognizable as the first
//!   non-empty array whose every element is an array headed by a string;
//! - the detected source language, the last top-level string of the record;
//! - optionally a correction block under the record's source section,
//!   carrying the suggestion markup and an autocorrection flag.
//!
//! Multi-sentence translations are re-stitched with the whitespace
//! captured from the *input* text before dispatch, because the endpoint
//! splits on sentence boundaries and does not preserve the spacing
//! between them.

use crate::batch::RPC_ID;
use crate::error::{Error, Result};
use serde_json::Value;

/// Decoded endpoint output for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub translated_text: String,
    pub detected_source_language: String,
    /// Correction suggestion as sent by the endpoint (HTML markup intact).
    pub source_text_corrected: Option<String>,
    /// True when the endpoint silently translated the corrected text
    /// rather than merely suggesting it.
    pub source_text_had_correction: bool,
    pub pronunciation: Option<String>,
    /// The decoded record as-is, surfaced to callers as `raw`.
    pub payload: Value,
}

/// Per-job decode failure inside an otherwise usable batch response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub reason: String,
}

impl ParseFailure {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason)
    }
}

pub(crate) type ParsedJob = std::result::Result<RawRecord, ParseFailure>;

/// Decode a raw batch response into per-job records, one per job text.
///
/// `job_texts` carries the original input strings of the batch, in batch
/// order; they determine the expected record count and supply the
/// inter-sentence delimiters for re-stitching.
pub(crate) fn parse(raw: &str, job_texts: &[&str]) -> Result<Vec<ParsedJob>> {
    let records = extract_records(raw)?;
    let parsed = job_texts
        .iter()
        .enumerate()
        .map(|(i, text)| match records.get(i) {
            Some(value) => extract_record(value, text),
            None => Err(ParseFailure::new("no record for job in batch response")),
        })
        .collect::<Vec<_>>();

    let failed = parsed.iter().filter(|p| p.is_err()).count();
    if failed > 0 {
        tracing::warn!(
            failed,
            total = job_texts.len(),
            "recovered partial batch response"
        );
    }
    Ok(parsed)
}

/// Strip the framing and collect the per-job record values, in order.
fn extract_records(raw: &str) -> Result<Vec<Value>> {
    let mut inners = Vec::new();
    for frame in extract_frames(raw) {
        let Some(entries) = frame.as_array() else {
            continue;
        };
        for entry in entries {
            let is_rpc_result = entry.get(0).and_then(Value::as_str) == Some("wrb.fr")
                && entry.get(1).and_then(Value::as_str) == Some(RPC_ID);
            if !is_rpc_result {
                continue;
            }
            if let Some(inner) = entry.get(2).and_then(Value::as_str) {
                inners.push(inner.to_string());
            }
        }
    }
    if inners.is_empty() {
        return Err(Error::Decode(
            "no translation payload found in response framing".to_string(),
        ));
    }

    let mut records = Vec::new();
    for inner in inners {
        match parse_lenient(&inner) {
            Some(Value::Array(items)) => records.extend(items),
            Some(other) => records.push(other),
            // The envelope was located but its payload is unreadable;
            // the affected jobs surface as per-index failures.
            None => tracing::warn!("unparseable payload inside response envelope"),
        }
    }
    Ok(records)
}

/// Pull every JSON value out of the framed response text.
///
/// Length-prefix lines and the anti-hijacking header carry no `[`, so
/// anchoring at `[` and letting the deserializer stop at the end of each
/// value skips the framing and tolerates trailing garbage.
fn extract_frames(raw: &str) -> Vec<Value> {
    let mut frames = Vec::new();
    let mut rest = raw.trim_start();
    if let Some(stripped) = rest.strip_prefix(")]}'") {
        rest = stripped;
    }
    while let Some(pos) = rest.find('[') {
        let mut stream = serde_json::Deserializer::from_str(&rest[pos..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => {
                let consumed = stream.byte_offset();
                frames.push(value);
                rest = &rest[pos + consumed..];
            }
            _ => rest = &rest[pos + 1..],
        }
    }
    frames
}

/// Parse a payload fragment, normalizing quoting when strict JSON fails.
fn parse_lenient(fragment: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(fragment) {
        return Some(value);
    }
    let requoted = normalize_quotes(fragment);
    match serde_json::from_str(&requoted) {
        Ok(value) => {
            tracing::debug!("payload required quote normalization");
            Some(value)
        }
        Err(_) => None,
    }
}

/// Rewrite single-quoted string literals into strict-JSON double quoting.
fn normalize_quotes(fragment: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Outside,
        Double,
        Single,
    }

    let mut out = String::with_capacity(fragment.len());
    let mut state = State::Outside;
    let mut chars = fragment.chars();
    while let Some(c) = chars.next() {
        match state {
            State::Outside => match c {
                '"' => {
                    state = State::Double;
                    out.push('"');
                }
                '\'' => {
                    state = State::Single;
                    out.push('"');
                }
                _ => out.push(c),
            },
            State::Double => match c {
                '\\' => {
                    out.push('\\');
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                }
                '"' => {
                    state = State::Outside;
                    out.push('"');
                }
                _ => out.push(c),
            },
            State::Single => match c {
                '\\' => match chars.next() {
                    // \' has no meaning in JSON; emit the bare quote
                    Some('\'') => out.push('\''),
                    Some(next) => {
                        out.push('\\');
                        out.push(next);
                    }
                    None => {}
                },
                '\'' => {
                    state = State::Outside;
                    out.push('"');
                }
                '"' => out.push_str("\\\""),
                _ => out.push(c),
            },
        }
    }
    out
}

/// Decode one job's record by structural markers.
fn extract_record(value: &Value, source_text: &str) -> ParsedJob {
    let elements = value
        .as_array()
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ParseFailure::new("job record is not an array"))?;

    let detected = elements
        .iter()
        .rev()
        .find_map(Value::as_str)
        .ok_or_else(|| ParseFailure::new("detected source language missing"))?;

    let (chunks, parent) = find_chunk_list(value)
        .ok_or_else(|| ParseFailure::new("translation chunks not found"))?;
    let pieces: Vec<&str> = chunks
        .iter()
        .filter_map(|c| c.get(0).and_then(Value::as_str))
        .collect();
    if pieces.is_empty() {
        return Err(ParseFailure::new("translation chunks empty"));
    }
    let translated_text = join_chunks(&pieces, &capture_delimiters(source_text));

    let pronunciation = parent
        .and_then(|p| p.iter().find_map(Value::as_str))
        .map(str::to_string);

    let (source_text_corrected, source_text_had_correction) = extract_correction(value);

    Ok(RawRecord {
        translated_text,
        detected_source_language: detected.to_string(),
        source_text_corrected,
        source_text_had_correction,
        pronunciation,
        payload: value.clone(),
    })
}

/// Find the per-sentence chunk list: the first non-empty array (in
/// depth-first order) whose every element is an array headed by a string.
/// Also returns its enclosing array, which carries the transliteration.
fn find_chunk_list(value: &Value) -> Option<(&Vec<Value>, Option<&Vec<Value>>)> {
    fn chunk_shaped(arr: &[Value]) -> bool {
        !arr.is_empty()
            && arr.iter().all(|e| {
                e.as_array()
                    .and_then(|a| a.first())
                    .is_some_and(Value::is_string)
            })
    }

    fn walk<'a>(
        value: &'a Value,
        parent: Option<&'a Vec<Value>>,
    ) -> Option<(&'a Vec<Value>, Option<&'a Vec<Value>>)> {
        let arr = value.as_array()?;
        if chunk_shaped(arr) {
            return Some((arr, parent));
        }
        arr.iter().find_map(|child| walk(child, Some(arr)))
    }

    walk(value, None)
}

/// Extract the correction suggestion block, anchored under the record's
/// source section: `(suggestion_markup, autocorrected)`.
fn extract_correction(value: &Value) -> (Option<String>, bool) {
    let Some(container) = value
        .get(0)
        .and_then(|src| src.get(1))
        .filter(|c| c.is_array())
    else {
        return (None, false);
    };
    let markup = container
        .get(0)
        .and_then(|c| c.get(0))
        .and_then(|c| c.get(1))
        .and_then(Value::as_str)
        .map(str::to_string);
    if markup.is_none() {
        return (None, false);
    }
    let autocorrected = container.get(2).and_then(Value::as_i64) == Some(1);
    (markup, autocorrected)
}

/// Capture the whitespace run following each sentence terminator that has
/// more text after it, in order.
pub(crate) fn capture_delimiters(text: &str) -> Vec<String> {
    fn is_terminator(c: char) -> bool {
        matches!(c, '.' | '!' | '?' | '。' | '！' | '？')
    }

    let chars: Vec<char> = text.chars().collect();
    let mut delims = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if !is_terminator(chars[i]) {
            i += 1;
            continue;
        }
        while i < chars.len() && is_terminator(chars[i]) {
            i += 1;
        }
        let start = i;
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i < chars.len() {
            delims.push(chars[start..i].iter().collect());
        }
    }
    delims
}

/// Join sentence chunks using the delimiters captured from the input.
/// Falls back to a single-space join when the endpoint's chunking does
/// not line up with the captured delimiters.
pub(crate) fn join_chunks(chunks: &[&str], delims: &[String]) -> String {
    let mut out = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        let piece = if i + 1 < chunks.len() {
            chunk.trim_end()
        } else {
            chunk
        };
        if i == 0 {
            out.push_str(piece);
            continue;
        }
        match delims.get(i - 1) {
            Some(delim) => {
                out.push_str(delim);
                out.push_str(piece.trim_start());
            }
            None => {
                out.push(' ');
                out.push_str(piece.trim_start());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::wire;
    use serde_json::json;

    #[test]
    fn test_parse_single_record() {
        let record = wire::record("vertaler", &["translator"], "nl", None, None);
        let raw = wire::response_text(&json!([record]));

        let parsed = parse(&raw, &["vertaler"]).unwrap();
        assert_eq!(parsed.len(), 1);
        let rec = parsed[0].as_ref().unwrap();
        assert_eq!(rec.translated_text, "translator");
        assert_eq!(rec.detected_source_language, "nl");
        assert_eq!(rec.source_text_corrected, None);
        assert!(!rec.source_text_had_correction);
        assert_eq!(rec.pronunciation, None);
        assert!(rec.payload.is_array());
    }

    #[test]
    fn test_parse_skips_framing_and_garbage() {
        let record = wire::record("dog", &["perro"], "en", None, None);
        let inner = serde_json::to_string(&json!([record])).unwrap();
        let envelope = serde_json::to_string(&json!([[
            "wrb.fr",
            RPC_ID,
            inner,
            Value::Null,
            Value::Null,
            Value::Null,
            "generic"
        ]]))
        .unwrap();
        let raw = format!(
            ")]}}'\n\n1234\n{envelope}\n56\n[[\"di\",59],[\"af.httprm\",59,\"8911\",7]]\n25\ntrailing garbage"
        );

        let parsed = parse(&raw, &["dog"]).unwrap();
        assert_eq!(parsed[0].as_ref().unwrap().translated_text, "perro");
    }

    #[test]
    fn test_unrecognizable_framing_is_decode_error() {
        assert!(matches!(
            parse("<html>moved</html>", &["dog"]),
            Err(Error::Decode(_))
        ));
        assert!(matches!(parse("", &["dog"]), Err(Error::Decode(_))));
        // Valid frames, but none carrying our RPC result
        assert!(matches!(
            parse("[[\"di\",59]]", &["dog"]),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_malformed_record_is_per_job_failure() {
        let good = wire::record("dos", &["two"], "es", None, None);
        let raw = wire::response_text(&json!([good.clone(), [], good]));

        let parsed = parse(&raw, &["dos", "uno", "dos"]).unwrap();
        assert!(parsed[0].is_ok());
        assert!(parsed[1].is_err());
        assert!(parsed[2].is_ok());
    }

    #[test]
    fn test_missing_records_fail_their_indices_only() {
        let record = wire::record("uno", &["one"], "es", None, None);
        let raw = wire::response_text(&json!([record]));

        let parsed = parse(&raw, &["uno", "dos"]).unwrap();
        assert!(parsed[0].is_ok());
        match &parsed[1] {
            Err(failure) => assert!(failure.reason.contains("no record")),
            Ok(_) => panic!("expected failure for missing record"),
        }
    }

    #[test]
    fn test_single_quoted_payload_is_normalized() {
        // Hand-built envelope whose inner payload uses single quotes
        let inner = r#"[[[null,null],[[[null,null,null,null,null,[['translator',null]]]],'en'],'nl']]"#;
        let envelope =
            serde_json::to_string(&json!([["wrb.fr", RPC_ID, inner, Value::Null, "generic"]]))
                .unwrap();
        let raw = format!(")]}}'\n\n{envelope}\n");

        let parsed = parse(&raw, &["vertaler"]).unwrap();
        let rec = parsed[0].as_ref().unwrap();
        assert_eq!(rec.translated_text, "translator");
        assert_eq!(rec.detected_source_language, "nl");
    }

    #[test]
    fn test_normalize_quotes() {
        assert_eq!(normalize_quotes(r#"['a','b']"#), r#"["a","b"]"#);
        assert_eq!(normalize_quotes(r#"['it\'s']"#), r#"["it's"]"#);
        assert_eq!(normalize_quotes(r#"['say "hi"']"#), r#"["say \"hi\""]"#);
        // Double-quoted strings pass through untouched, apostrophes included
        assert_eq!(normalize_quotes(r#"["don't"]"#), r#"["don't"]"#);
        assert_eq!(normalize_quotes(r#"["a\"b"]"#), r#"["a\"b"]"#);
    }

    #[test]
    fn test_pronunciation_extracted_from_chunk_parent() {
        let record = wire::record("translator", &["译者"], "en", Some("Yì zhě"), None);
        let raw = wire::response_text(&json!([record]));

        let parsed = parse(&raw, &["translator"]).unwrap();
        let rec = parsed[0].as_ref().unwrap();
        assert_eq!(rec.pronunciation.as_deref(), Some("Yì zhě"));
    }

    #[test]
    fn test_correction_block() {
        let correction = wire::correction("I <b><i>speak</i></b> Dutch!", false);
        let record = wire::record(
            "I spea Dutch!",
            &["Ik spreek Nederlands!"],
            "en",
            None,
            Some(correction),
        );
        let raw = wire::response_text(&json!([record]));

        let parsed = parse(&raw, &["I spea Dutch!"]).unwrap();
        let rec = parsed[0].as_ref().unwrap();
        assert_eq!(
            rec.source_text_corrected.as_deref(),
            Some("I <b><i>speak</i></b> Dutch!")
        );
        assert!(!rec.source_text_had_correction);

        let correction = wire::correction("I <b><i>speak</i></b> Dutch!", true);
        let record = wire::record(
            "I spea Dutch!",
            &["Ik spreek Nederlands!"],
            "en",
            None,
            Some(correction),
        );
        let raw = wire::response_text(&json!([record]));
        let parsed = parse(&raw, &["I spea Dutch!"]).unwrap();
        assert!(parsed[0].as_ref().unwrap().source_text_had_correction);
    }

    #[test]
    fn test_capture_delimiters() {
        assert_eq!(capture_delimiters("one two"), Vec::<String>::new());
        assert_eq!(capture_delimiters("One. Two."), vec![" "]);
        assert_eq!(capture_delimiters("One.  Two!   Three?"), vec!["  ", "   "]);
        assert_eq!(capture_delimiters("a.b!c"), vec!["", ""]);
        // A terminator run counts once
        assert_eq!(capture_delimiters("What?! Yes."), vec![" "]);
    }

    #[test]
    fn test_join_chunks_reuses_input_spacing() {
        let delims = capture_delimiters("One.  Two!Three? Four.");
        let joined = join_chunks(&["Uno. ", "¡Dos!", "¿Tres?", "Cuatro."], &delims);
        assert_eq!(joined, "Uno.  ¡Dos!¿Tres? Cuatro.");
    }

    #[test]
    fn test_join_chunks_falls_back_to_space() {
        let joined = join_chunks(&["One.", "Two."], &[]);
        assert_eq!(joined, "One. Two.");
    }

    #[test]
    fn test_multi_sentence_round_trip_spacing() {
        let source =
            "translator, translator. translator! translator? translator,translator.translator!translator?";
        let chunks = [
            "vertaler, vertaler. ",
            "vertaler! ",
            "vertaler? ",
            "vertaler,vertaler.",
            "vertaler!",
            "vertaler?",
        ];
        let joined = join_chunks(&chunks, &capture_delimiters(source));
        assert_eq!(
            joined,
            "vertaler, vertaler. vertaler! vertaler? vertaler,vertaler.vertaler!vertaler?"
        );
    }
}
