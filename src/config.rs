//! Loading quiz configuration (prompts, sampling temperature, setup suggestions) from TOML.
//!
//! See `QuizConfig` and `Prompts` for expected schema. Every key is optional.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize)]
pub struct QuizConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default = "default_temperature")]
  pub temperature: f32,
  /// Topics offered on the setup screen.
  #[serde(default = "default_suggestions")]
  pub suggestions: Vec<String>,
}

impl Default for QuizConfig {
  fn default() -> Self {
    Self {
      prompts: Prompts::default(),
      temperature: default_temperature(),
      suggestions: default_suggestions(),
    }
  }
}

fn default_temperature() -> f32 { 0.8 }

fn default_suggestions() -> Vec<String> {
  ["World History", "Physics", "React Development", "Psychology", "Italian Cuisine"]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Prompts sent to the chat model.
/// Templates use `{topic}`, `{level}`, `{difficulty}` and `{guidance}` placeholders.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub system: String,
  pub start_user_template: String,
  pub next_user_template: String,
  // Guidance appended to `next_user_template`, by difficulty band.
  pub guidance_advanced: String,
  pub guidance_intermediate: String,
  pub guidance_fundamental: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      system: DEFAULT_SYSTEM_PROMPT.trim().into(),
      start_user_template: "Topic: {topic}\nKnowledge level: {level}\nDifficulty: {difficulty}/10\n\nBegin the quiz with the first question at this difficulty.".into(),
      next_user_template: "Next question. Difficulty: {difficulty}/10. {guidance} Keep to the tag format.".into(),
      guidance_advanced: "The learner is doing well. Raise the complexity: use precise terminology and probe deep understanding.".into(),
      guidance_intermediate: "The learner is comfortable. Ask an application-style question that needs some reasoning.".into(),
      guidance_fundamental: "Stay on fundamental principles and clear, core concepts.".into(),
    }
  }
}

impl Prompts {
  /// Guidance sentence for a difficulty: 8+ advanced, 5+ intermediate, otherwise fundamentals.
  pub fn guidance_for(&self, difficulty: u8) -> &str {
    match difficulty {
      8.. => &self.guidance_advanced,
      5..=7 => &self.guidance_intermediate,
      _ => &self.guidance_fundamental,
    }
  }
}

const DEFAULT_SYSTEM_PROMPT: &str = r#"
You are a quiz tutor that writes multiple-choice questions.

Write each question for the user's topic, their declared knowledge level
(Beginner, Intermediate, Advanced) and the current difficulty score (1-10):
- 1-3: core concepts and definitions, plain explanations.
- 4-7: applied and connected concepts, specific details.
- 8-10: expert reasoning, edge cases and technical nuance.

Output format (STRICT), nothing outside the tags:
<q>question text</q>
<a>first option</a>
<b>second option</b>
<c>third option</c>
<d>fourth option</d>
<correct>letter of the correct option: A, B, C or D</correct>
<explanation>one or two sentences on why the answer is correct</explanation>

Never repeat a question from earlier in the conversation.
Keep an encouraging, professional tone.
"#;

/// Parse a TOML document into `QuizConfig`.
pub fn parse_quiz_config(s: &str) -> Result<QuizConfig, toml::de::Error> {
  toml::from_str::<QuizConfig>(s)
}

/// Attempt to load `QuizConfig` from QUIZ_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_quiz_config_from_env() -> Option<QuizConfig> {
  let path = std::env::var("QUIZ_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_quiz_config(&s) {
      Ok(cfg) => {
        info!(target: "quiz_tutor", %path, "Loaded quiz config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "quiz_tutor", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "quiz_tutor", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
