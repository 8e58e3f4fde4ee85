//! Minimal OpenAI-compatible chat client and the conversational question generator built on it.
//!
//! We only call chat.completions and request plain text. Calls are instrumented and log model
//! name, latency, token usage and response size. Reply contents are only logged truncated at debug.
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::collaborator::{CollaboratorError, QuizCollaborator};
use crate::config::Prompts;
use crate::domain::KnowledgeLevel;
use crate::util::{fill_template, trunc_for_log};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    if api_key.trim().is_empty() {
      return None;
    }
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let timeout_secs = std::env::var("OPENAI_TIMEOUT_SECS")
      .ok()
      .and_then(|s| s.parse::<u64>().ok())
      .unwrap_or(DEFAULT_TIMEOUT_SECS);

    let client = match build_client(timeout_secs) {
      Ok(c) => c,
      Err(e) => {
        error!(error = %e, "Could not build the HTTP client for OpenAI");
        return None;
      }
    };

    Some(Self { client, api_key, base_url, model })
  }

  /// Plain-text chat completion over a full message history.
  #[instrument(level = "info", skip(self, messages), fields(model = %self.model, turns = messages.len()))]
  async fn chat(&self, messages: &[ChatMessageReq], temperature: f32) -> Result<String, CollaboratorError> {
    let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: messages.to_vec(),
      temperature,
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "quiz-tutor-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or(body);
      error!(elapsed = ?start.elapsed(), %status, "Model call failed");
      return Err(CollaboratorError::HttpStatus { status: status.as_u16(), message });
    }

    let body: ChatCompletionResponse = res.json().await?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.into_iter().next()
      .and_then(|c| c.message.content)
      .map(|t| t.trim().to_string())
      .unwrap_or_default();

    if text.is_empty() {
      return Err(CollaboratorError::EmptyResponse);
    }
    info!(elapsed = ?start.elapsed(), reply_bytes = text.len(), "Model response received");
    debug!(reply = %trunc_for_log(&text, 200), "Model reply preview");
    Ok(text)
  }
}

/// One quiz conversation with the model.
///
/// The history is only extended after a successful call, so a failed `start`/`next`
/// can be retried as if it never happened.
pub struct ChatSession {
  openai: Option<OpenAI>,
  prompts: Prompts,
  temperature: f32,
  history: Option<Vec<ChatMessageReq>>,
}

impl ChatSession {
  pub fn new(openai: Option<OpenAI>, prompts: Prompts, temperature: f32) -> Self {
    Self { openai, prompts, temperature, history: None }
  }

  pub fn is_started(&self) -> bool {
    self.history.is_some()
  }

  fn start_message(&self, topic: &str, level: KnowledgeLevel, difficulty: u8) -> String {
    let difficulty = difficulty.to_string();
    fill_template(
      &self.prompts.start_user_template,
      &[("topic", topic), ("level", level.as_str()), ("difficulty", &difficulty)],
    )
  }

  fn next_message(&self, difficulty: u8) -> String {
    let guidance = self.prompts.guidance_for(difficulty);
    let difficulty = difficulty.to_string();
    fill_template(
      &self.prompts.next_user_template,
      &[("difficulty", &difficulty), ("guidance", guidance)],
    )
  }
}

#[async_trait]
impl QuizCollaborator for ChatSession {
  #[instrument(level = "info", skip(self, topic), fields(topic_len = topic.len()))]
  async fn start(
    &mut self,
    topic: &str,
    level: KnowledgeLevel,
    initial_difficulty: u8,
  ) -> Result<String, CollaboratorError> {
    let oa = self.openai.as_ref().ok_or(CollaboratorError::Disabled)?;
    let mut history = vec![
      ChatMessageReq::new("system", self.prompts.system.clone()),
      ChatMessageReq::new("user", self.start_message(topic, level, initial_difficulty)),
    ];
    let reply = oa.chat(&history, self.temperature).await?;
    history.push(ChatMessageReq::new("assistant", reply.clone()));
    self.history = Some(history);
    Ok(reply)
  }

  #[instrument(level = "info", skip(self))]
  async fn next(&mut self, difficulty: u8) -> Result<String, CollaboratorError> {
    let Some(history) = self.history.as_ref() else {
      return Err(CollaboratorError::NotStarted);
    };
    let oa = self.openai.as_ref().ok_or(CollaboratorError::Disabled)?;

    let mut messages = history.clone();
    messages.push(ChatMessageReq::new("user", self.next_message(difficulty)));
    let reply = oa.chat(&messages, self.temperature).await?;
    messages.push(ChatMessageReq::new("assistant", reply.clone()));
    self.history = Some(messages);
    Ok(reply)
  }
}

fn build_client(timeout_secs: u64) -> Result<reqwest::Client, reqwest::Error> {
  reqwest::Client::builder()
    .timeout(Duration::from_secs(timeout_secs))
    .build()
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
}
#[derive(Clone, Debug, Serialize)]
struct ChatMessageReq { role: String, content: String }

impl ChatMessageReq {
  fn new(role: &str, content: String) -> Self {
    Self { role: role.into(), content }
  }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn offline() -> ChatSession {
    ChatSession::new(None, Prompts::default(), 0.8)
  }

  #[tokio::test]
  async fn next_before_start_is_not_started() {
    let mut s = offline();
    let err = s.next(4).await.unwrap_err();
    assert!(matches!(err, CollaboratorError::NotStarted));
  }

  #[tokio::test]
  async fn start_without_api_key_is_disabled_and_stays_unstarted() {
    let mut s = offline();
    let err = s.start("Physics", KnowledgeLevel::Beginner, 2).await.unwrap_err();
    assert!(matches!(err, CollaboratorError::Disabled));
    assert!(!s.is_started());
  }

  #[test]
  fn start_message_carries_topic_level_and_difficulty() {
    let msg = offline().start_message("Italian Cuisine", KnowledgeLevel::Advanced, 8);
    assert!(msg.contains("Topic: Italian Cuisine"));
    assert!(msg.contains("Knowledge level: Advanced"));
    assert!(msg.contains("Difficulty: 8/10"));
  }

  #[test]
  fn next_message_picks_guidance_by_band() {
    let s = offline();
    let high = s.next_message(9);
    assert!(high.contains("9/10"));
    assert!(high.contains(&s.prompts.guidance_advanced));
    assert!(s.next_message(5).contains(&s.prompts.guidance_intermediate));
    assert!(s.next_message(2).contains(&s.prompts.guidance_fundamental));
  }

  #[test]
  fn client_builds_with_configured_timeout() {
    assert!(build_client(DEFAULT_TIMEOUT_SECS).is_ok());
    assert!(build_client(1).is_ok());
  }

  #[test]
  fn provider_error_message_is_extracted() {
    let body = r#"{"error":{"message":"Invalid API key","type":"auth"}}"#;
    assert_eq!(extract_openai_error(body).as_deref(), Some("Invalid API key"));
    assert_eq!(extract_openai_error("<html>bad gateway</html>"), None);
  }

  #[test]
  fn request_serializes_chat_history() {
    let req = ChatCompletionRequest {
      model: "m".into(),
      messages: vec![ChatMessageReq::new("system", "sys".into()), ChatMessageReq::new("user", "hi".into())],
      temperature: 0.5,
    };
    let v = serde_json::to_value(&req).unwrap();
    assert_eq!(v["messages"][0]["role"], "system");
    assert_eq!(v["messages"][1]["content"], "hi");
    assert_eq!(v["temperature"], 0.5);
  }
}
