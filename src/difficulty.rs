//! Adaptive difficulty controller.
//!
//! Pure state transitions over `QuizProgress`:
//!   - every answer bumps the question counter,
//!   - a miss drops difficulty by one immediately and resets the streak,
//!   - a hit raises difficulty by one only when the streak becomes even.
//!
//! The asymmetry is the pacing policy: two hits in a row to climb, one miss to fall.

use serde::Serialize;

use crate::domain::KnowledgeLevel;

/// Questions per session.
pub const SESSION_LENGTH: u32 = 10;
pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizProgress {
  pub score: u32,
  pub incorrect: u32,
  pub total_questions: u32,
  pub difficulty: u8,
  pub current_streak: u32,
  pub knowledge_level: KnowledgeLevel,
}

/// Starting difficulty for a knowledge level.
pub fn initial_difficulty(level: KnowledgeLevel) -> u8 {
  match level {
    KnowledgeLevel::Beginner => 2,
    KnowledgeLevel::Intermediate => 5,
    KnowledgeLevel::Advanced => 8,
  }
}

impl QuizProgress {
  pub fn initialize(level: KnowledgeLevel) -> Self {
    Self {
      score: 0,
      incorrect: 0,
      total_questions: 0,
      difficulty: initial_difficulty(level),
      current_streak: 0,
      knowledge_level: level,
    }
  }

  #[must_use]
  pub fn record_answer(self, is_correct: bool) -> Self {
    let mut next = self;
    next.total_questions += 1;
    if is_correct {
      next.score += 1;
      next.current_streak += 1;
      // Even streak, not "streak >= 2": hits 2, 4, 6... each climb once.
      if next.current_streak % 2 == 0 {
        next.difficulty = next.difficulty.saturating_add(1).min(MAX_DIFFICULTY);
      }
    } else {
      next.incorrect += 1;
      next.current_streak = 0;
      next.difficulty = next.difficulty.saturating_sub(1).max(MIN_DIFFICULTY);
    }
    next
  }

  pub fn is_session_complete(&self) -> bool {
    self.total_questions >= SESSION_LENGTH
  }

  /// Share of answered questions that were correct; 100 before the first answer.
  pub fn accuracy_percent(&self) -> u32 {
    if self.total_questions == 0 {
      return 100;
    }
    rounded_percent(self.score, self.total_questions)
  }

  /// How far through the session we are, capped at 100.
  pub fn completion_percent(&self) -> u32 {
    rounded_percent(self.total_questions, SESSION_LENGTH).min(100)
  }
}

pub(crate) fn rounded_percent(part: u32, whole: u32) -> u32 {
  ((f64::from(part) / f64::from(whole)) * 100.0).round() as u32
}
