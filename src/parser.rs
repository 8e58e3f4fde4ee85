//! Lenient extraction of a `Question` from tagged model output.
//!
//! Expected shape (any order, extra prose allowed, tags case-insensitive):
//!
//! ```text
//! <q>What is 2+2?</q>
//! <a>3</a> <b>4</b> <c>5</c> <d>6</d>
//! <correct>B</correct>
//! <explanation>Basic arithmetic.</explanation>
//! ```
//!
//! Each field is looked up on its own: the first `<tag>` and the first `</tag>` after it.
//! A missing or broken field leaves only that field empty; parsing never fails.

use crate::domain::{AnswerOption, OptionId, Question};

const TAG_QUESTION: &str = "q";
const TAG_CORRECT: &str = "correct";
const TAG_EXPLANATION: &str = "explanation";

/// Parse one model reply. Pure: the same text always yields the same `Question`.
pub fn parse(text: &str) -> Question {
  let scanner = TagScanner::new(text);

  let options = OptionId::ALL
    .iter()
    .filter_map(|&id| {
      scanner.extract(id.tag()).map(|content| AnswerOption {
        id,
        text: strip_option_prefix(content).to_string(),
      })
    })
    .collect();

  let correct_id = scanner
    .extract(TAG_CORRECT)
    .and_then(|c| OptionId::from_letter(&c.to_ascii_uppercase()));

  Question {
    question: scanner.extract(TAG_QUESTION).map(str::to_string),
    options,
    correct_id,
    explanation: scanner.extract(TAG_EXPLANATION).map(str::to_string),
  }
}

/// Holds the reply next to an ASCII-lowercased copy used for matching.
/// Lowercasing ASCII keeps every byte offset, so spans found in `lower` slice `text` directly.
struct TagScanner<'a> {
  text: &'a str,
  lower: String,
}

impl<'a> TagScanner<'a> {
  fn new(text: &'a str) -> Self {
    Self { text, lower: text.to_ascii_lowercase() }
  }

  /// Trimmed content of the first `<tag>...</tag>` span, or None when absent or blank.
  fn extract(&self, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");

    let start = self.lower.find(&open)? + open.len();
    let end = start + self.lower[start..].find(&close)?;

    let content = self.text[start..end].trim();
    (!content.is_empty()).then_some(content)
  }
}

/// Drop an echoed slot label such as "A: " or "c) " in front of option text.
fn strip_option_prefix(text: &str) -> &str {
  let mut chars = text.chars();
  match (chars.next(), chars.next()) {
    (Some(letter), Some(':' | ')')) if matches!(letter.to_ascii_uppercase(), 'A'..='D') => {
      chars.as_str().trim_start()
    }
    _ => text,
  }
}
