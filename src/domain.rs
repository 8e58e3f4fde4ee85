//! Domain models shared by the controller, the parser and the session:
//! knowledge levels, option ids, questions and the session phase.

use std::fmt;

use serde::{Deserialize, Serialize};

/// User-declared starting proficiency. Fixed for the whole session once chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnowledgeLevel {
  Beginner,
  Intermediate,
  Advanced,
}

impl KnowledgeLevel {
  pub const ALL: [KnowledgeLevel; 3] =
    [KnowledgeLevel::Beginner, KnowledgeLevel::Intermediate, KnowledgeLevel::Advanced];

  pub fn as_str(self) -> &'static str {
    match self {
      KnowledgeLevel::Beginner => "Beginner",
      KnowledgeLevel::Intermediate => "Intermediate",
      KnowledgeLevel::Advanced => "Advanced",
    }
  }
}

impl Default for KnowledgeLevel {
  fn default() -> Self { KnowledgeLevel::Beginner }
}

impl fmt::Display for KnowledgeLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Identifier of one of the four answer slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionId {
  A,
  B,
  C,
  D,
}

impl OptionId {
  pub const ALL: [OptionId; 4] = [OptionId::A, OptionId::B, OptionId::C, OptionId::D];

  /// Exact match against "A".."D". Callers normalize case first.
  pub fn from_letter(s: &str) -> Option<Self> {
    match s {
      "A" => Some(OptionId::A),
      "B" => Some(OptionId::B),
      "C" => Some(OptionId::C),
      "D" => Some(OptionId::D),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      OptionId::A => "A",
      OptionId::B => "B",
      OptionId::C => "C",
      OptionId::D => "D",
    }
  }

  /// Lowercase tag name carrying this option in model output (`<a>`, `<b>`, ...).
  pub fn tag(self) -> &'static str {
    match self {
      OptionId::A => "a",
      OptionId::B => "b",
      OptionId::C => "c",
      OptionId::D => "d",
    }
  }
}

impl fmt::Display for OptionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnswerOption {
  pub id: OptionId,
  pub text: String,
}

/// One round's question as extracted from model output.
/// Every field may be missing; `is_playable` tells whether it can be shown.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Question {
  pub question: Option<String>,
  pub options: Vec<AnswerOption>,
  pub correct_id: Option<OptionId>,
  pub explanation: Option<String>,
}

impl Question {
  pub fn option(&self, id: OptionId) -> Option<&AnswerOption> {
    self.options.iter().find(|o| o.id == id)
  }

  /// Question text present, at least one option, and a correct id that names a parsed option.
  pub fn is_playable(&self) -> bool {
    let has_text = self.question.as_deref().is_some_and(|q| !q.is_empty());
    let answerable = self.correct_id.is_some_and(|id| self.option(id).is_some());
    has_text && !self.options.is_empty() && answerable
  }
}

/// Which screen the session is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizPhase {
  Setup,
  Loading,
  Playing,
  Finished,
}
