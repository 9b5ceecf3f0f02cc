//! Turn an uploaded PDF or pasted text into essay text.

use std::fmt;
use std::panic;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::error::ExtractionError;

/// Magic prefix of every PDF file.
const PDF_MAGIC: &[u8] = b"%PDF-";

/// The normalized full text of one essay.
///
/// Cheap to clone; the text itself is never mutated after creation.
#[derive(Clone, PartialEq, Eq)]
pub struct EssayText(Arc<str>);

impl EssayText
{
    pub fn new(text: impl Into<Arc<str>>) -> Self
    {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str
    {
        &self.0
    }

    /// True when the text has no non-whitespace content.
    pub fn is_blank(&self) -> bool
    {
        self.0
            .trim()
            .is_empty()
    }

    /// First `max_chars` characters, with `...` appended when cut.
    pub fn preview(
        &self,
        max_chars: usize,
    ) -> String
    {
        match self
            .0
            .char_indices()
            .nth(max_chars)
        {
            Some((cut, _)) => format!("{}...", &self.0[..cut]),
            None => self
                .0
                .to_string(),
        }
    }
}

impl fmt::Debug for EssayText
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        f.debug_struct("EssayText")
            .field("chars", &self.0.chars().count())
            .finish()
    }
}

impl AsRef<str> for EssayText
{
    fn as_ref(&self) -> &str
    {
        self.as_str()
    }
}

/// Where the essay comes from.
#[derive(Debug)]
pub enum EssaySource<'a>
{
    /// Raw bytes of a PDF document
    Pdf(&'a [u8]),
    /// Text the user pasted or typed
    Text(&'a str),
}

impl<'a> EssaySource<'a>
{
    /// Classify raw bytes: PDF when flagged by the caller or by the magic
    /// header, UTF-8 text otherwise.
    pub fn sniff(
        bytes: &'a [u8],
        looks_like_pdf: bool,
    ) -> Result<Self, ExtractionError>
    {
        if looks_like_pdf || bytes.starts_with(PDF_MAGIC)
        {
            return Ok(Self::Pdf(bytes));
        }

        std::str::from_utf8(bytes)
            .map(Self::Text)
            .map_err(|_| ExtractionError::InvalidUtf8)
    }
}

/// Produce essay text from a source.
///
/// PDF pages are read in order and joined by newlines; pages without a text
/// layer contribute an empty segment. Plain text passes through as given.
#[instrument(level = "debug", skip(source))]
pub fn extract(source: EssaySource<'_>) -> Result<EssayText, ExtractionError>
{
    match source
    {
        EssaySource::Text(text) => Ok(EssayText::new(text)),
        EssaySource::Pdf(bytes) =>
        {
            let pages = read_pdf_pages(bytes)?;

            debug!(pages = pages.len(), bytes = bytes.len(), "extracted pdf pages");

            if pages.is_empty()
            {
                return Err(ExtractionError::MalformedPdf { reason: "document has no pages".to_string() });
            }

            let text = join_pages(&pages);
            if text.is_empty()
            {
                warn!("pdf has no extractable text layer");
            }

            Ok(EssayText::new(text))
        }
    }
}

/// Per-page text of a PDF.
///
/// pdf-extract panics on some documents that parse but reference missing
/// resources (e.g. an undefined font); such panics become `MalformedPdf`.
fn read_pdf_pages(bytes: &[u8]) -> Result<Vec<String>, ExtractionError>
{
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
    {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(ExtractionError::MalformedPdf { reason: e.to_string() }),
        Err(payload) =>
        {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| {
                    payload
                        .downcast_ref::<String>()
                        .cloned()
                })
                .unwrap_or_else(|| "text extraction aborted".to_string());

            warn!(%reason, "pdf text extraction panicked");
            Err(ExtractionError::MalformedPdf { reason })
        }
    }
}

/// Join page texts with a single newline and trim the result.
fn join_pages<S: AsRef<str>>(pages: &[S]) -> String
{
    pages
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
