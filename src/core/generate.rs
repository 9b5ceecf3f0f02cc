//! Adapter for the external text-generation service.
//!
//! One blocking request per prompt, no retry. The reply text is returned
//! verbatim; an empty reply is a success, every failure is a
//! [`GenerationError`].

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::GenerationError;

/// Service access key. Never printed, logged, or embedded in prompts.
#[derive(Clone)]
pub struct Credential(String);

impl Credential
{
    /// Wrap a key; blank input yields `None`.
    pub fn new(key: impl Into<String>) -> Option<Self>
    {
        let key = key
            .into()
            .trim()
            .to_string();

        (!key.is_empty()).then_some(Self(key))
    }

    fn expose(&self) -> &str
    {
        &self.0
    }
}

impl fmt::Debug for Credential
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        f.write_str("Credential(<redacted>)")
    }
}

/// A text-generation backend.
///
/// The trait is object-safe and synchronous; implementations that need to
/// record state use interior mutability.
pub trait Generator
{
    /// Send `prompt` and return the reply text unmodified.
    fn generate(
        &self,
        prompt: &str,
    ) -> Result<String, GenerationError>;

    /// Human-readable backend name (for logging).
    fn name(&self) -> &str;
}

impl<G: Generator + ?Sized> Generator for &G
{
    fn generate(
        &self,
        prompt: &str,
    ) -> Result<String, GenerationError>
    {
        (**self).generate(prompt)
    }

    fn name(&self) -> &str
    {
        (**self).name()
    }
}

// ─── Wire types ───────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a>
{
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a>
{
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a>
{
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse
{
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate
{
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent
{
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart
{
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback
{
    block_reason: Option<String>,
}

fn request_body(prompt: &str) -> GenerateRequest<'_>
{
    GenerateRequest {
        contents: [RequestContent { role: "user", parts: [RequestPart { text: prompt }] }],
    }
}

/// Extract the reply text from a `generateContent` response body.
fn parse_reply(body: &str) -> Result<String, GenerationError>
{
    let resp: GenerateResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Malformed(e.to_string()))?;

    let Some(first) = resp
        .candidates
        .into_iter()
        .next()
    else
    {
        if let Some(reason) = resp
            .prompt_feedback
            .and_then(|f| f.block_reason)
        {
            return Err(GenerationError::Blocked { reason });
        }

        return Err(GenerationError::Malformed("response has no candidates".to_string()));
    };

    // A candidate without content (e.g. stopped for safety) is an empty reply
    let text = first
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    Ok(text)
}

fn map_transport(err: ureq::Error) -> GenerationError
{
    match err
    {
        ureq::Error::StatusCode(status @ (401 | 403)) => GenerationError::Unauthorized { status },
        ureq::Error::StatusCode(429) => GenerationError::QuotaExhausted,
        ureq::Error::StatusCode(status) => GenerationError::Status { status },
        other => GenerationError::Transport(other.to_string()),
    }
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient
{
    agent: ureq::Agent,
    /// API base URL (e.g. "https://generativelanguage.googleapis.com/v1beta").
    endpoint: String,
    /// Model identifier (e.g. "gemini-2.5-pro").
    model: String,
    credential: Credential,
}

impl GeminiClient
{
    pub fn new(
        endpoint: &str,
        model: &str,
        credential: Credential,
    ) -> Self
    {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            endpoint: endpoint
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            credential,
        }
    }

    fn url(&self) -> String
    {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl fmt::Debug for GeminiClient
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("credential", &self.credential)
            .finish()
    }
}

impl Generator for GeminiClient
{
    #[instrument(skip_all, fields(model = %self.model, prompt_chars = prompt.len()))]
    fn generate(
        &self,
        prompt: &str,
    ) -> Result<String, GenerationError>
    {
        info!("calling generation service");

        let mut resp = self
            .agent
            .post(self.url())
            .header("x-goog-api-key", self.credential.expose())
            .send_json(request_body(prompt))
            .map_err(map_transport)?;

        let body = resp
            .body_mut()
            .read_to_string()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let text = parse_reply(&body)?;
        debug!(reply_chars = text.len(), "generation reply received");

        Ok(text)
    }

    fn name(&self) -> &str
    {
        "gemini"
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn credential_rejects_blank_and_redacts()
    {
        assert!(Credential::new("   ").is_none());

        let cred = Credential::new(" sk-secret ").unwrap();
        assert_eq!(cred.expose(), "sk-secret");
        assert!(!format!("{cred:?}").contains("sk-secret"));

        let client = GeminiClient::new("http://localhost/", "m", cred);
        assert!(!format!("{client:?}").contains("sk-secret"));
    }

    #[test]
    fn url_joins_endpoint_and_model()
    {
        let client = GeminiClient::new(
            "https://example.test/v1beta/",
            "gemini-2.5-pro",
            Credential::new("k").unwrap(),
        );
        assert_eq!(client.url(), "https://example.test/v1beta/models/gemini-2.5-pro:generateContent");
    }

    #[test]
    fn request_body_shape()
    {
        let v = serde_json::to_value(request_body("hello")).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"contents": [{"role": "user", "parts": [{"text": "hello"}]}]})
        );
    }

    #[test]
    fn reply_concatenates_parts_verbatim()
    {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Score: "},{"text":"87/100\n"}]}}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "Score: 87/100\n");
    }

    #[test]
    fn empty_candidate_is_empty_success()
    {
        assert_eq!(parse_reply(r#"{"candidates":[{"content":{"parts":[]}}]}"#).unwrap(), "");
        assert_eq!(parse_reply(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap(), "");
    }

    #[test]
    fn missing_candidates_is_malformed_or_blocked()
    {
        assert!(matches!(parse_reply("{}"), Err(GenerationError::Malformed(_))));
        assert!(matches!(parse_reply("not json"), Err(GenerationError::Malformed(_))));

        let blocked = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        match parse_reply(blocked)
        {
            Err(GenerationError::Blocked { reason }) => assert_eq!(reason, "SAFETY"),
            other => panic!("expected Blocked, got {other:?}"),
        }
    }

    #[test]
    fn status_codes_map_to_kinds()
    {
        assert!(matches!(
            map_transport(ureq::Error::StatusCode(401)),
            GenerationError::Unauthorized { status: 401 }
        ));
        assert!(matches!(map_transport(ureq::Error::StatusCode(429)), GenerationError::QuotaExhausted));
        assert!(matches!(
            map_transport(ureq::Error::StatusCode(500)),
            GenerationError::Status { status: 500 }
        ));
    }

    #[test]
    fn unreachable_service_is_transport_error()
    {
        // Port 9 (discard) on localhost is closed in test environments
        let client = GeminiClient::new("http://127.0.0.1:9", "m", Credential::new("k").unwrap());
        assert!(matches!(client.generate("hi"), Err(GenerationError::Transport(_))));
    }
}
