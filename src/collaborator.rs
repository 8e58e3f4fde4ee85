//! Contract with the external chat model that writes the questions.
//!
//! A collaborator is conversational: `start` opens a quiz conversation for a topic and
//! `next` continues it, so the model can avoid repeating itself. Both return the raw reply
//! text; turning that into a `Question` is the parser's job.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::KnowledgeLevel;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CollaboratorError {
  #[error("quiz not started")]
  NotStarted,
  #[error("question generator is not configured")]
  Disabled,
  #[error("question generator returned an empty response")]
  EmptyResponse,
  #[error("question generator HTTP {status}: {message}")]
  HttpStatus { status: u16, message: String },
  #[error(transparent)]
  Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait QuizCollaborator: Send {
  /// Open a new conversation, discarding any previous one, and return the first reply.
  async fn start(
    &mut self,
    topic: &str,
    level: KnowledgeLevel,
    initial_difficulty: u8,
  ) -> Result<String, CollaboratorError>;

  /// Ask for the next question at `difficulty`.
  /// Fails with `CollaboratorError::NotStarted` before a successful `start`.
  async fn next(&mut self, difficulty: u8) -> Result<String, CollaboratorError>;
}
