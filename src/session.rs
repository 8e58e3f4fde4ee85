//! One quiz session: sequencing collaborator calls, parsing replies and feeding answers
//! into the difficulty controller.
//!
//! The session is owned by whoever drives it (one per WebSocket connection in the server).
//! Every suspending operation takes `&mut self`, so at most one collaborator request is in
//! flight per session. A failed request leaves progress and the current round untouched;
//! the caller can simply repeat the same call.

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::collaborator::{CollaboratorError, QuizCollaborator};
use crate::difficulty::QuizProgress;
use crate::domain::{KnowledgeLevel, OptionId, Question, QuizPhase};
use crate::parser;
use crate::summary::QuizSummary;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
  #[error("topic must not be empty")]
  EmptyTopic,
  #[error("a quiz is already in progress")]
  InProgress,
  #[error("model reply did not contain a usable question")]
  IncompleteQuestion,
  #[error(transparent)]
  Collaborator(#[from] CollaboratorError),
}

impl SessionError {
  /// Whether repeating the same call can succeed.
  pub fn is_retryable(&self) -> bool {
    match self {
      SessionError::IncompleteQuestion => true,
      SessionError::Collaborator(e) => !matches!(e, CollaboratorError::Disabled),
      SessionError::EmptyTopic | SessionError::InProgress => false,
    }
  }
}

/// Outcome of one accepted answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerFeedback {
  pub selected: OptionId,
  pub correct: bool,
  pub correct_id: Option<OptionId>,
  pub explanation: Option<String>,
  pub progress: QuizProgress,
}

/// Result of asking for the next question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advance {
  /// A new question is ready (see `QuizSession::current_question`).
  Question,
  /// The session reached its length; the summary is final.
  Finished(QuizSummary),
  /// Not applicable right now (no answer given yet, or not playing).
  Ignored,
}

pub struct QuizSession<C> {
  collaborator: C,
  phase: QuizPhase,
  progress: QuizProgress,
  topic: String,
  current: Option<Question>,
  selected: Option<OptionId>,
  round: u32,
}

impl<C: QuizCollaborator> QuizSession<C> {
  pub fn new(collaborator: C) -> Self {
    Self {
      collaborator,
      phase: QuizPhase::Setup,
      progress: QuizProgress::initialize(KnowledgeLevel::default()),
      topic: String::new(),
      current: None,
      selected: None,
      round: 0,
    }
  }

  pub fn phase(&self) -> QuizPhase { self.phase }
  pub fn progress(&self) -> &QuizProgress { &self.progress }
  pub fn topic(&self) -> &str { &self.topic }
  pub fn current_question(&self) -> Option<&Question> { self.current.as_ref() }
  pub fn feedback_shown(&self) -> bool { self.selected.is_some() }

  /// Bumped every time a new question is shown. Never reset, so a token from an earlier
  /// question (or an earlier quiz) never matches again.
  pub fn round(&self) -> u32 { self.round }

  pub fn summary(&self) -> Option<QuizSummary> {
    (self.phase == QuizPhase::Finished).then(|| QuizSummary::from_progress(&self.progress))
  }

  /// Begin a quiz on `topic` at `level`. On failure the session is back in the phase it
  /// had before (Setup or Finished) with its previous progress.
  #[instrument(level = "info", skip(self, topic))]
  pub async fn start(&mut self, topic: &str, level: KnowledgeLevel) -> Result<&Question, SessionError> {
    let topic = topic.trim();
    if topic.is_empty() {
      return Err(SessionError::EmptyTopic);
    }
    if self.phase == QuizPhase::Playing {
      return Err(SessionError::InProgress);
    }

    let fresh = QuizProgress::initialize(level);
    let prior = self.phase;
    self.phase = QuizPhase::Loading;
    let question = match self.fetch_start(topic, level, fresh.difficulty).await {
      Ok(q) => q,
      Err(e) => {
        self.phase = prior;
        warn!(target: "quiz", error = %e, "Quiz start failed");
        return Err(e);
      }
    };

    info!(target: "quiz", %topic, difficulty = fresh.difficulty, "Quiz started");
    self.topic = topic.to_string();
    self.progress = fresh;
    self.selected = None;
    self.round = self.round.wrapping_add(1);
    self.phase = QuizPhase::Playing;
    Ok(&*self.current.insert(question))
  }

  /// Answer the current question. Returns None when the selection does not apply:
  /// not playing, feedback already shown, or no such option.
  pub fn select(&mut self, option: OptionId) -> Option<AnswerFeedback> {
    if self.phase != QuizPhase::Playing || self.selected.is_some() {
      return None;
    }
    let question = self.current.as_ref()?;
    question.option(option)?;

    let correct = question.correct_id == Some(option);
    self.progress = self.progress.record_answer(correct);
    self.selected = Some(option);

    info!(
      target: "quiz",
      selected = %option,
      %correct,
      difficulty = self.progress.difficulty,
      streak = self.progress.current_streak,
      answered = self.progress.total_questions,
      "Answer recorded"
    );

    Some(AnswerFeedback {
      selected: option,
      correct,
      correct_id: question.correct_id,
      explanation: question.explanation.clone(),
      progress: self.progress,
    })
  }

  /// Move past an answered question: either fetch the next one at the current difficulty
  /// or finish the session.
  #[instrument(level = "info", skip(self), fields(answered = self.progress.total_questions))]
  pub async fn next_question(&mut self) -> Result<Advance, SessionError> {
    if self.phase != QuizPhase::Playing || self.selected.is_none() {
      return Ok(Advance::Ignored);
    }
    if self.progress.is_session_complete() {
      self.phase = QuizPhase::Finished;
      let summary = QuizSummary::from_progress(&self.progress);
      info!(target: "quiz", score = summary.score, score_percent = summary.score_percent, "Quiz finished");
      return Ok(Advance::Finished(summary));
    }

    let raw = self.collaborator.next(self.progress.difficulty).await?;
    let question = playable(&raw)?;
    self.current = Some(question);
    self.selected = None;
    self.round = self.round.wrapping_add(1);
    Ok(Advance::Question)
  }

  /// Leave the current quiz and return to setup.
  pub fn restart(&mut self) {
    self.phase = QuizPhase::Setup;
    self.current = None;
    self.selected = None;
  }

  async fn fetch_start(&mut self, topic: &str, level: KnowledgeLevel, difficulty: u8) -> Result<Question, SessionError> {
    let raw = self.collaborator.start(topic, level, difficulty).await?;
    playable(&raw)
  }
}

fn playable(raw: &str) -> Result<Question, SessionError> {
  let question = parser::parse(raw);
  if question.is_playable() {
    Ok(question)
  } else {
    warn!(
      target: "quiz",
      has_question = question.question.is_some(),
      options = question.options.len(),
      has_correct = question.correct_id.is_some(),
      "Model reply is not a usable question"
    );
    Err(SessionError::IncompleteQuestion)
  }
}

#[cfg(test)]
mod tests {
  use std::collections::VecDeque;

  use async_trait::async_trait;

  use super::*;

  /// Replays canned replies; `Err` entries simulate an outage.
  #[derive(Default)]
  struct Scripted {
    replies: VecDeque<Result<String, CollaboratorError>>,
    started: bool,
    difficulties: Vec<u8>,
  }

  impl Scripted {
    fn with(replies: Vec<Result<String, CollaboratorError>>) -> Self {
      Self { replies: replies.into(), ..Self::default() }
    }

    fn pop(&mut self) -> Result<String, CollaboratorError> {
      self.replies.pop_front().unwrap_or(Err(CollaboratorError::EmptyResponse))
    }
  }

  #[async_trait]
  impl QuizCollaborator for Scripted {
    async fn start(&mut self, _topic: &str, _level: KnowledgeLevel, difficulty: u8) -> Result<String, CollaboratorError> {
      self.difficulties.push(difficulty);
      let reply = self.pop();
      self.started |= reply.is_ok();
      reply
    }

    async fn next(&mut self, difficulty: u8) -> Result<String, CollaboratorError> {
      if !self.started {
        return Err(CollaboratorError::NotStarted);
      }
      self.difficulties.push(difficulty);
      self.pop()
    }
  }

  fn question(n: u32, correct: &str) -> Result<String, CollaboratorError> {
    Ok(format!(
      "<q>Question {n}</q><a>one</a><b>two</b><c>three</c><d>four</d><correct>{correct}</correct><explanation>Because {n}.</explanation>"
    ))
  }

  fn outage() -> Result<String, CollaboratorError> {
    Err(CollaboratorError::HttpStatus { status: 503, message: "overloaded".into() })
  }

  #[tokio::test]
  async fn start_sets_playing_with_level_difficulty() {
    let mut s = QuizSession::new(Scripted::with(vec![question(1, "A")]));
    let q = s.start("  Physics ", KnowledgeLevel::Advanced).await.unwrap();
    assert_eq!(q.question.as_deref(), Some("Question 1"));
    assert_eq!(s.phase(), QuizPhase::Playing);
    assert_eq!(s.topic(), "Physics");
    assert_eq!(s.progress().difficulty, 8);
    assert_eq!(s.collaborator.difficulties, vec![8]);
  }

  #[tokio::test]
  async fn empty_topic_is_rejected_without_calling_the_model() {
    let mut s = QuizSession::new(Scripted::with(vec![question(1, "A")]));
    let err = s.start("   ", KnowledgeLevel::Beginner).await.unwrap_err();
    assert!(matches!(err, SessionError::EmptyTopic));
    assert!(s.collaborator.difficulties.is_empty());
  }

  #[tokio::test]
  async fn failed_start_returns_to_setup_and_can_be_retried() {
    let mut s = QuizSession::new(Scripted::with(vec![outage(), Ok("no tags here".into()), question(1, "C")]));

    let err = s.start("History", KnowledgeLevel::Intermediate).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(s.phase(), QuizPhase::Setup);
    assert!(s.current_question().is_none());

    let err = s.start("History", KnowledgeLevel::Intermediate).await.unwrap_err();
    assert!(matches!(err, SessionError::IncompleteQuestion));
    assert_eq!(s.phase(), QuizPhase::Setup);
    assert_eq!(s.round(), 0);

    s.start("History", KnowledgeLevel::Intermediate).await.unwrap();
    assert_eq!(s.round(), 1);
    assert_eq!(s.phase(), QuizPhase::Playing);
    assert_eq!(s.progress().difficulty, 5);
  }

  #[tokio::test]
  async fn start_while_playing_is_refused() {
    let mut s = QuizSession::new(Scripted::with(vec![question(1, "A"), question(2, "A")]));
    s.start("Chess", KnowledgeLevel::Beginner).await.unwrap();
    let err = s.start("Go", KnowledgeLevel::Beginner).await.unwrap_err();
    assert!(matches!(err, SessionError::InProgress));
    assert!(!err.is_retryable());
    assert_eq!(s.topic(), "Chess");
  }

  #[tokio::test]
  async fn selection_is_accepted_once_per_round() {
    let mut s = QuizSession::new(Scripted::with(vec![question(1, "B")]));
    s.start("Math", KnowledgeLevel::Beginner).await.unwrap();

    let fb = s.select(OptionId::B).unwrap();
    assert!(fb.correct);
    assert_eq!(fb.correct_id, Some(OptionId::B));
    assert_eq!(fb.explanation.as_deref(), Some("Because 1."));
    assert_eq!(fb.progress.score, 1);
    assert!(s.feedback_shown());

    assert_eq!(s.select(OptionId::A), None);
    assert_eq!(s.progress().total_questions, 1);
  }

  #[tokio::test]
  async fn selection_outside_playing_or_of_missing_option_is_ignored() {
    let mut s = QuizSession::new(Scripted::with(vec![Ok(
      "<q>Short list</q><a>x</a><b>y</b><correct>A</correct>".into(),
    )]));
    assert_eq!(s.select(OptionId::A), None);

    s.start("Math", KnowledgeLevel::Beginner).await.unwrap();
    assert_eq!(s.select(OptionId::D), None);
    assert!(!s.feedback_shown());
    assert!(s.select(OptionId::A).is_some());
  }

  #[tokio::test]
  async fn next_before_answering_is_ignored() {
    let mut s = QuizSession::new(Scripted::with(vec![question(1, "A"), question(2, "A")]));
    assert_eq!(s.next_question().await.unwrap(), Advance::Ignored);
    s.start("Math", KnowledgeLevel::Beginner).await.unwrap();
    assert_eq!(s.next_question().await.unwrap(), Advance::Ignored);
    assert_eq!(s.collaborator.difficulties.len(), 1);
  }

  #[tokio::test]
  async fn failed_next_keeps_the_round_for_retry() {
    let mut s = QuizSession::new(Scripted::with(vec![
      question(1, "A"),
      outage(),
      Ok("<q>No options</q>".into()),
      question(2, "D"),
    ]));
    s.start("Math", KnowledgeLevel::Beginner).await.unwrap();
    s.select(OptionId::C).unwrap();
    let before = *s.progress();

    assert!(s.next_question().await.unwrap_err().is_retryable());
    assert!(matches!(s.next_question().await.unwrap_err(), SessionError::IncompleteQuestion));
    assert_eq!(*s.progress(), before);
    assert!(s.feedback_shown());
    assert_eq!(s.current_question().and_then(|q| q.question.as_deref()), Some("Question 1"));

    assert_eq!(s.round(), 1);
    assert_eq!(s.next_question().await.unwrap(), Advance::Question);
    assert_eq!(s.current_question().and_then(|q| q.question.as_deref()), Some("Question 2"));
    assert!(!s.feedback_shown());
    assert_eq!(s.round(), 2);
  }

  #[tokio::test]
  async fn failed_start_after_finishing_keeps_the_results() {
    let mut replies: Vec<_> = (1..=10).map(|n| question(n, "A")).collect();
    replies.push(outage());
    let mut s = QuizSession::new(Scripted::with(replies));
    s.start("Geography", KnowledgeLevel::Beginner).await.unwrap();
    for _ in 0..10 {
      s.select(OptionId::A).unwrap();
      s.next_question().await.unwrap();
    }
    assert_eq!(s.phase(), QuizPhase::Finished);
    let finished = s.summary();

    let err = s.start("Botany", KnowledgeLevel::Advanced).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(s.phase(), QuizPhase::Finished);
    assert_eq!(s.summary(), finished);
    assert_eq!(s.topic(), "Geography");
  }

  #[tokio::test]
  async fn next_requests_use_updated_difficulty() {
    let mut s = QuizSession::new(Scripted::with(vec![
      question(1, "A"),
      question(2, "A"),
      question(3, "A"),
    ]));
    s.start("Math", KnowledgeLevel::Beginner).await.unwrap();
    s.select(OptionId::A).unwrap();
    s.next_question().await.unwrap();
    s.select(OptionId::A).unwrap();
    s.next_question().await.unwrap();
    assert_eq!(s.collaborator.difficulties, vec![2, 2, 3]);
  }

  #[tokio::test]
  async fn ten_answers_finish_the_session() {
    let replies = (1..=10).map(|n| question(n, "A")).collect();
    let mut s = QuizSession::new(Scripted::with(replies));
    s.start("Geography", KnowledgeLevel::Intermediate).await.unwrap();

    for round in 1..=10u32 {
      let pick = if round % 3 == 0 { OptionId::B } else { OptionId::A };
      s.select(pick).unwrap();
      let advance = s.next_question().await.unwrap();
      if round < 10 {
        assert_eq!(advance, Advance::Question);
      } else {
        match advance {
          Advance::Finished(summary) => {
            assert_eq!(summary.score, 7);
            assert_eq!(summary.incorrect, 3);
            assert_eq!(summary.score_percent, 70);
          }
          other => panic!("expected finish, got {other:?}"),
        }
      }
    }
    assert_eq!(s.phase(), QuizPhase::Finished);
    assert!(s.summary().is_some());
    assert_eq!(s.select(OptionId::A), None);
  }

  #[tokio::test]
  async fn restart_returns_to_setup_and_allows_a_new_quiz() {
    let mut s = QuizSession::new(Scripted::with(vec![question(1, "A"), question(1, "B")]));
    s.start("Art", KnowledgeLevel::Beginner).await.unwrap();
    s.select(OptionId::B).unwrap();
    s.restart();
    assert_eq!(s.phase(), QuizPhase::Setup);
    assert!(s.current_question().is_none());
    assert!(s.summary().is_none());

    let before = s.round();
    s.start("Music", KnowledgeLevel::Advanced).await.unwrap();
    assert!(s.round() > before);
    assert_eq!(s.progress().total_questions, 0);
    assert_eq!(s.progress().difficulty, 8);
  }
}
