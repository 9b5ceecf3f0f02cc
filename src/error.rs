//! Error taxonomy surfaced to the user.
//!
//! Every failure belongs to one of four kinds. None of them is fatal to a
//! session: the caller prints the diagnostic and lets the user retry.

use miette::Diagnostic;

/// Top-level error returned by the review pipeline.
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum ReviewError
{
    #[error(transparent)]
    #[diagnostic(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),
}

/// The input document could not be turned into essay text.
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum ExtractionError
{
    #[error("not a readable PDF document: {reason}")]
    #[diagnostic(
        code(essaylens::extract::pdf),
        help("re-export the file as PDF or paste the essay text instead")
    )]
    MalformedPdf
    {
        reason: String
    },

    #[error("input is not valid UTF-8 text")]
    #[diagnostic(
        code(essaylens::extract::utf8),
        help("save the essay as UTF-8 or upload it as a PDF")
    )]
    InvalidUtf8,

    #[error("failed to read {origin}")]
    #[diagnostic(code(essaylens::extract::io))]
    Io
    {
        origin: String,
        #[source]
        source: std::io::Error,
    },
}

/// The service credential or configuration is missing or unusable.
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum ConfigurationError
{
    #[error("no API key configured for the generation service")]
    #[diagnostic(
        code(essaylens::config::missing_key),
        help("set GEMINI_API_KEY, ESSAYLENS_API_KEY, api_key in essaylens.toml, or pass --api-key")
    )]
    MissingCredential,

    #[error("invalid configuration: {0}")]
    #[diagnostic(code(essaylens::config::invalid))]
    Invalid(String),
}

/// The generation service call failed or returned nothing usable.
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum GenerationError
{
    #[error("generation service rejected the credential (HTTP {status})")]
    #[diagnostic(code(essaylens::generate::unauthorized), help("check that the API key is valid"))]
    Unauthorized
    {
        status: u16
    },

    #[error("generation service quota exhausted")]
    #[diagnostic(code(essaylens::generate::quota), help("wait a moment and try again"))]
    QuotaExhausted,

    #[error("generation service returned HTTP {status}")]
    #[diagnostic(code(essaylens::generate::status))]
    Status
    {
        status: u16
    },

    #[error("could not reach the generation service: {0}")]
    #[diagnostic(code(essaylens::generate::transport))]
    Transport(String),

    #[error("malformed response from the generation service: {0}")]
    #[diagnostic(code(essaylens::generate::malformed))]
    Malformed(String),

    #[error("generation service blocked the request: {reason}")]
    #[diagnostic(code(essaylens::generate::blocked))]
    Blocked
    {
        reason: String
    },
}

/// The user submitted something the pipeline refuses to process.
#[derive(Debug, Diagnostic, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError
{
    #[error("essay text is empty")]
    #[diagnostic(code(essaylens::validate::empty_essay), help("upload a PDF with a text layer or paste the essay"))]
    EmptyEssay,

    #[error("question is empty")]
    #[diagnostic(code(essaylens::validate::empty_question))]
    EmptyQuestion,

    #[error("no essay has been analyzed in this session yet")]
    #[diagnostic(code(essaylens::validate::no_essay), help("run an analysis before asking questions"))]
    NoEssay,

    #[error("the session has ended")]
    #[diagnostic(code(essaylens::validate::ended))]
    SessionEnded,
}

pub type Result<T, E = ReviewError> = std::result::Result<T, E>;
