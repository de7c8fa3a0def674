//! Oracle module: the external judgment collaborator.
//!
//! All taxonomy matching judgment is delegated to a Gemini-style
//! generative API. The local side owns the contexts and prompts, uploads
//! the material once, asks one constrained JSON question per dimension,
//! and validates every answer string against the taxonomy afterwards.
//!
//! [`ClassificationOracle`] is the seam: the production implementation is
//! [`GeminiOracle`], tests substitute a scripted mock.

mod gemini;
pub mod prompts;

pub use gemini::GeminiOracle;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Handle to a file the oracle host has accepted, referenced by later
/// matching calls. Valid only for the oracle that produced it.
#[derive(Debug, Clone)]
pub struct OracleFile {
    /// Host-assigned URI of the uploaded content.
    pub uri: String,
    /// MIME type the content was uploaded under.
    pub mime_type: String,
}

/// External collaborator answering taxonomy-matching questions about an
/// uploaded file.
///
/// Answers are natural names taken from the supplied taxonomy text; the
/// caller validates them. Calls are bounded by the implementation's
/// request timeout and are never retried automatically.
#[async_trait]
pub trait ClassificationOracle: Send + Sync {
    /// Upload file content, returning the handle later calls reference.
    async fn upload(&self, display_name: &str, mime_type: &str, content: Bytes) -> Result<OracleFile>;

    /// Ask for the single best-matching term. The answer is one natural
    /// name from the taxonomy outline.
    async fn best_match(
        &self,
        file: &OracleFile,
        taxonomy: &str,
        priming_instruction: &str,
        matching_instruction: &str,
    ) -> Result<String>;

    /// Ask for all matching terms, zero or more natural names.
    async fn all_matches(
        &self,
        file: &OracleFile,
        taxonomy: &str,
        priming_instruction: &str,
        matching_instruction: &str,
    ) -> Result<Vec<String>>;
}
