//! End-of-quiz result summary.

use serde::Serialize;

use crate::difficulty::{rounded_percent, QuizProgress, SESSION_LENGTH};
use crate::domain::KnowledgeLevel;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
  pub score: u32,
  pub incorrect: u32,
  /// Score against the full session length, not against questions answered.
  pub score_percent: u32,
  pub final_difficulty: u8,
  pub knowledge_level: KnowledgeLevel,
  pub title: &'static str,
  pub message: &'static str,
}

impl QuizSummary {
  pub fn from_progress(p: &QuizProgress) -> Self {
    let score_percent = rounded_percent(p.score, SESSION_LENGTH);
    let (title, message) = verdict(score_percent);
    Self {
      score: p.score,
      incorrect: p.incorrect,
      score_percent,
      final_difficulty: p.difficulty,
      knowledge_level: p.knowledge_level,
      title,
      message,
    }
  }
}

fn verdict(score_percent: u32) -> (&'static str, &'static str) {
  match score_percent {
    90.. => ("Genius Status!", "You've mastered this topic at an elite level!"),
    70..=89 => ("Excellent Work!", "A very strong performance. You know your stuff!"),
    50..=69 => ("Solid Progress!", "You're getting there. A bit more practice and you'll be a pro."),
    _ => ("Keep Growing!", "Every mistake is a learning opportunity. Ready for another round?"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn finished_with(hits: u32) -> QuizProgress {
    (0..SESSION_LENGTH).fold(QuizProgress::initialize(KnowledgeLevel::Intermediate), |p, i| {
      p.record_answer(i < hits)
    })
  }

  #[test]
  fn tiers_follow_score_percent() {
    let cases = [
      (10, "Genius Status!"),
      (9, "Genius Status!"),
      (8, "Excellent Work!"),
      (7, "Excellent Work!"),
      (6, "Solid Progress!"),
      (5, "Solid Progress!"),
      (4, "Keep Growing!"),
      (0, "Keep Growing!"),
    ];
    for (hits, title) in cases {
      let s = QuizSummary::from_progress(&finished_with(hits));
      assert_eq!(s.score_percent, hits * 10);
      assert_eq!(s.title, title, "hits = {hits}");
    }
  }

  #[test]
  fn carries_final_state() {
    let p = finished_with(6);
    let s = QuizSummary::from_progress(&p);
    assert_eq!((s.score, s.incorrect), (6, 4));
    assert_eq!(s.final_difficulty, p.difficulty);
    assert_eq!(s.knowledge_level, KnowledgeLevel::Intermediate);
  }
}
