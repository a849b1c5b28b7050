//! Orchestration of the full translation pipeline
//!
//! [`Translator`] composes the pipeline stages: normalize the caller's
//! input into jobs, partition and encode batches, dispatch every batch
//! concurrently, parse each response, then assemble and reshape results.
//! Batches are fully independent requests; results are keyed by original
//! job index, so completion order never matters.

use crate::assemble::{TranslationResult, Translated, assemble, reshape};
use crate::batch::{DEFAULT_BATCH_SIZE, encode_batches};
use crate::error::{Error, Result};
use crate::input::{TranslateInput, TranslateOptions, normalize};
use crate::parser::{self, ParsedJob};
use crate::transport::{HttpTransport, Transport};
use futures::future::join_all;

/// Client for the batch translation endpoint.
///
/// Stateless per call; holds only the transport and the batch size bound.
/// Generic over [`Transport`] so tests drive the identical pipeline
/// through a mock.
///
/// # Example
///
/// ```no_run
/// use gtx_batch::{TranslateOptions, Translator};
///
/// # async fn run() -> gtx_batch::Result<()> {
/// let translator = Translator::new();
/// let result = translator.translate("vertaler", &TranslateOptions::default()).await?;
/// println!("{} (from {})", result.text, result.from.language.iso);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Translator<T: Transport = HttpTransport> {
    transport: T,
    batch_size: usize,
}

impl Translator<HttpTransport> {
    pub fn new() -> Self {
        Self::with_transport(HttpTransport::new())
    }
}

impl Default for Translator<HttpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Translator<T> {
    /// Build a translator over a custom transport.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Tune the upper bound on jobs per request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch size must be positive");
        self.batch_size = batch_size;
        self
    }

    /// Translate one or many items, returning results in the caller's
    /// input shape.
    ///
    /// Local validation (input shape, language codes) happens before any
    /// request is sent. Batches are dispatched concurrently; one batch's
    /// failure does not block the others, but it counts toward the
    /// partial-failure policy. Cancellation is all-or-nothing: a cancelled
    /// batch fails the whole call with [`Error::Cancelled`].
    pub async fn translate_many(
        &self,
        input: impl Into<TranslateInput>,
        options: &TranslateOptions,
    ) -> Result<Translated> {
        let input = input.into();
        let (jobs, shape) = normalize(&input, options)?;
        let batches = encode_batches(&jobs, self.batch_size)?;
        tracing::debug!(
            jobs = jobs.len(),
            batches = batches.len(),
            "dispatching translation request"
        );

        let outcomes = join_all(batches.iter().map(|batch| async move {
            let raw = self.transport.send(batch, &options.request).await?;
            let texts: Vec<&str> = batch.jobs.iter().map(|j| j.text.as_str()).collect();
            parser::parse(&raw, &texts)
        }))
        .await;

        // Results are slotted by original job index, not arrival order.
        let mut slots: Vec<Option<ParsedJob>> = vec![None; jobs.len()];
        let mut batch_error: Option<Error> = None;
        for (batch, outcome) in batches.iter().zip(outcomes) {
            match outcome {
                Ok(parsed) => {
                    for (job, record) in batch.jobs.iter().zip(parsed) {
                        slots[job.index] = Some(record);
                    }
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                // Unrecognizable wire format means structural drift; fail
                // closed rather than report per-job nulls.
                Err(err @ Error::Decode(_)) => return Err(err),
                Err(err) => {
                    tracing::warn!(error = %err, "batch dispatch failed");
                    if batch_error.is_none() {
                        batch_error = Some(err);
                    }
                }
            }
        }
        if options.reject_on_partial_fail {
            if let Some(err) = batch_error {
                return Err(err);
            }
        }

        let results = assemble(&jobs, slots, options.reject_on_partial_fail)?;
        Ok(reshape(shape, results))
    }

    /// Translate exactly one text; never returns a `None` placeholder.
    pub async fn translate(
        &self,
        text: impl Into<String>,
        options: &TranslateOptions,
    ) -> Result<TranslationResult> {
        let mut options = options.clone();
        options.reject_on_partial_fail = true;
        let translated = self
            .translate_many(TranslateInput::Single(text.into()), &options)
            .await?;
        translated.into_single().ok_or_else(|| {
            Error::Decode("no result for single translation".to_string())
        })
    }
}
