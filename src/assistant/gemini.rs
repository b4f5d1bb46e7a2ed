//! Gemini API client for the coach assistant

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::{Role, Turn};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
/// Upper bound on one model call; a hung call fails the whole turn
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum CoachError {
    #[error("model request failed")]
    Http(#[from] reqwest::Error),
    #[error("model returned no text")]
    EmptyReply,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<TurnContent<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct TurnContent<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

/// Gemini chat client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Result<Self, CoachError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// One chat completion over the running transcript.
    pub async fn generate(&self, system: &str, turns: &[Turn]) -> Result<String, CoachError> {
        let contents = turns
            .iter()
            .map(|turn| TurnContent {
                role: match turn.role {
                    Role::User => "user",
                    Role::Model => "model",
                },
                parts: vec![Part { text: &turn.text }],
            })
            .collect();
        let request = GenerateRequest {
            system_instruction: Content {
                parts: vec![Part { text: system }],
            },
            contents,
        };

        let url = format!("{BASE_URL}/{}:generateContent", self.model);
        debug!(model = %self.model, turns = turns.len(), "calling assistant model");

        let response: GenerateResponse = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text: String = response
            .candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(CoachError::EmptyReply);
        }
        Ok(text)
    }
}
