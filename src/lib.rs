//! Batch client for the Google Translate web endpoint.
//!
//! Translates a single text, an ordered list, or a keyed mapping in one
//! call. Items are grouped by `(from, to, tld)`, encoded into the
//! endpoint's double-encoded RPC envelope, dispatched concurrently in
//! size-bounded batches, and the framed quasi-JSON responses are parsed
//! back into results in the caller's original input shape.
//!
//! # Example
//!
//! ```no_run
//! use gtx_batch::{TranslateOptions, Translator};
//!
//! # async fn run() -> gtx_batch::Result<()> {
//! let translator = Translator::new();
//!
//! let single = translator.translate("vertaler", &TranslateOptions::default()).await?;
//! assert_eq!(single.from.language.iso, "nl");
//!
//! let options = TranslateOptions {
//!     from: "en".to_string(),
//!     to: "es".to_string(),
//!     ..TranslateOptions::default()
//! };
//! let many = translator.translate_many(vec!["dog", "cat"], &options).await?;
//! for result in many.into_list().unwrap() {
//!     println!("{}", result.unwrap().text);
//! }
//! # Ok(())
//! # }
//! ```

mod assemble;
mod batch;
pub mod error;
mod input;
pub mod languages;
pub mod mock;
mod parser;
pub mod transport;
mod translator;

pub use assemble::{
    LanguageInfo, SourceInfo, SourceTextInfo, Translated, TranslationResult,
};
pub use batch::{Batch, GroupKey};
pub use error::{Error, Result};
pub use input::{InputShape, Item, TranslateInput, TranslateOptions};
pub use languages::{get_code, is_supported};
pub use mock::{MockMode, MockTransport};
pub use transport::{
    CancelHandle, CancelToken, HttpTransport, RequestOptions, Transport, cancel_pair,
};
pub use translator::Translator;
