//! Application state shared by all connections: quiz configuration and the optional OpenAI client.
//!
//! Everything here is read-only after startup. Mutable quiz state lives in one
//! `QuizSession` per connection, built by `new_session`.

use tracing::{info, instrument, warn};

use crate::config::{load_quiz_config_from_env, QuizConfig};
use crate::openai::{ChatSession, OpenAI};
use crate::session::QuizSession;

#[derive(Clone)]
pub struct AppState {
    pub openai: Option<OpenAI>,
    pub config: QuizConfig,
}

impl AppState {
    /// Build state from env: load config, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let config = load_quiz_config_from_env().unwrap_or_default();

        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "quiz_tutor", base_url = %oa.base_url, model = %oa.model, "OpenAI enabled.");
        } else {
            warn!(target: "quiz_tutor", "OpenAI disabled (no OPENAI_API_KEY or client setup failed). Quizzes cannot start.");
        }

        Self::from_parts(config, openai)
    }

    pub fn from_parts(config: QuizConfig, openai: Option<OpenAI>) -> Self {
        Self { openai, config }
    }

    /// Fresh, unstarted session with its own conversation.
    pub fn new_session(&self) -> QuizSession<ChatSession> {
        QuizSession::new(ChatSession::new(
            self.openai.clone(),
            self.config.prompts.clone(),
            self.config.temperature,
        ))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
