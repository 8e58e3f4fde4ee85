//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::difficulty::{QuizProgress, SESSION_LENGTH};
use crate::domain::{AnswerOption, KnowledgeLevel, OptionId, Question, QuizPhase};
use crate::summary::QuizSummary;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartQuiz {
        topic: String,
        level: KnowledgeLevel,
    },
    /// `round` echoes the round of the question the user answered.
    SelectOption {
        #[serde(rename = "optionId")]
        option_id: OptionId,
        round: u32,
    },
    NextQuestion,
    Restart,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Question {
        question: QuestionOut,
        round: u32,
        progress: ProgressOut,
    },
    AnswerResult {
        #[serde(rename = "selectedId")]
        selected_id: OptionId,
        correct: bool,
        #[serde(rename = "correctId")]
        correct_id: Option<OptionId>,
        explanation: Option<String>,
        progress: ProgressOut,
    },
    Finished {
        summary: QuizSummary,
        progress: ProgressOut,
    },
    Phase {
        phase: QuizPhase,
    },
    Error {
        message: String,
        retryable: bool,
    },
}

/// Question as shown before answering. The correct id stays on the server.
#[derive(Debug, Serialize)]
pub struct QuestionOut {
    pub question: String,
    pub options: Vec<AnswerOption>,
}

pub fn to_question_out(q: &Question) -> QuestionOut {
    QuestionOut {
        question: q.question.clone().unwrap_or_default(),
        options: q.options.clone(),
    }
}

/// Progress plus the derived HUD values.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressOut {
    #[serde(flatten)]
    pub progress: QuizProgress,
    pub accuracy_percent: u32,
    pub completion_percent: u32,
    pub session_length: u32,
}

pub fn to_progress_out(p: &QuizProgress) -> ProgressOut {
    ProgressOut {
        progress: *p,
        accuracy_percent: p.accuracy_percent(),
        completion_percent: p.completion_percent(),
        session_length: SESSION_LENGTH,
    }
}

//
// HTTP request/response DTOs
//

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupOut {
    pub levels: Vec<KnowledgeLevel>,
    pub suggestions: Vec<String>,
    pub session_length: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_messages_parse_from_tagged_json() {
        let m: ClientWsMessage =
            serde_json::from_str(r#"{"type":"start_quiz","topic":"Physics","level":"Advanced"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::StartQuiz { ref topic, level: KnowledgeLevel::Advanced } if topic == "Physics"));

        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"select_option","optionId":"C","round":3}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::SelectOption { option_id: OptionId::C, round: 3 }));

        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"next_question"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::NextQuestion));
    }

    #[test]
    fn unknown_option_or_level_is_rejected() {
        assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"select_option","optionId":"E","round":1}"#).is_err());
        assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"select_option","optionId":"A"}"#).is_err());
        assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"start_quiz","topic":"x","level":"Expert"}"#).is_err());
    }

    #[test]
    fn question_message_hides_the_answer() {
        let q = crate::parser::parse("<q>2+2?</q><a>3</a><b>4</b><correct>B</correct><explanation>math</explanation>");
        let msg = ServerWsMessage::Question {
            question: to_question_out(&q),
            round: 1,
            progress: to_progress_out(&QuizProgress::initialize(KnowledgeLevel::Beginner)),
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "question");
        assert_eq!(v["round"], 1);
        assert_eq!(v["question"]["question"], "2+2?");
        assert_eq!(v["question"]["options"][1], json!({"id": "B", "text": "4"}));
        let text = v.to_string();
        assert!(!text.contains("correctId"));
        assert!(!text.contains("math"));
    }

    #[test]
    fn progress_is_flattened_with_hud_values() {
        let p = QuizProgress::initialize(KnowledgeLevel::Intermediate).record_answer(true);
        let v = serde_json::to_value(to_progress_out(&p)).unwrap();
        assert_eq!(v["score"], 1);
        assert_eq!(v["totalQuestions"], 1);
        assert_eq!(v["difficulty"], 5);
        assert_eq!(v["currentStreak"], 1);
        assert_eq!(v["knowledgeLevel"], "Intermediate");
        assert_eq!(v["accuracyPercent"], 100);
        assert_eq!(v["completionPercent"], 10);
        assert_eq!(v["sessionLength"], 10);
    }

    #[test]
    fn error_message_shape() {
        let v = serde_json::to_value(ServerWsMessage::Error { message: "oops".into(), retryable: true }).unwrap();
        assert_eq!(v, json!({"type": "error", "message": "oops", "retryable": true}));
    }
}
