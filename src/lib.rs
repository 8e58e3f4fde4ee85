//! Adaptive multiple-choice quiz tutor.
//!
//! - `difficulty`: progress + adaptive difficulty transitions
//! - `parser`: tagged model reply → `Question`
//! - `session`: one quiz, driving a `QuizCollaborator` (the chat model)
//! - `openai`: OpenAI-compatible collaborator keeping the quiz conversation
//! - `routes` / `protocol` / `state`: the HTTP + WebSocket shell used by the server binary

pub mod collaborator;
pub mod config;
pub mod difficulty;
pub mod domain;
pub mod openai;
pub mod parser;
pub mod protocol;
pub mod routes;
pub mod session;
pub mod state;
pub mod summary;
pub mod telemetry;
pub mod util;

pub use collaborator::{CollaboratorError, QuizCollaborator};
pub use difficulty::{QuizProgress, MAX_DIFFICULTY, MIN_DIFFICULTY, SESSION_LENGTH};
pub use domain::{AnswerOption, KnowledgeLevel, OptionId, Question, QuizPhase};
pub use parser::parse;
pub use session::{Advance, AnswerFeedback, QuizSession, SessionError};
pub use summary::QuizSummary;
