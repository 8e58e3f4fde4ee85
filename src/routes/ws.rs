//! WebSocket upgrade + message loop. Each connection owns one `QuizSession`.
//! Messages are handled strictly in order, so a connection never has two model
//! requests in flight. A selection queued behind a request carries the round of the
//! question the user saw; once a newer question is shown it no longer matches and is dropped.
//! Ignored inputs get no reply.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, warn, instrument, debug};
use uuid::Uuid;

use crate::collaborator::QuizCollaborator;
use crate::protocol::{to_progress_out, to_question_out, ClientWsMessage, ServerWsMessage};
use crate::session::{Advance, QuizSession, SessionError};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "quiz_tutor", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state), fields(conn = %Uuid::new_v4()))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "quiz_tutor", "WebSocket connected");
  let mut session = state.new_session();

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "quiz_tutor", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &mut session).await
          }
          Err(e) => Some(ServerWsMessage::Error { message: format!("Invalid JSON: {}", e), retryable: false }),
        };
        let Some(reply_msg) = reply_msg else { continue };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e), "retryable": false }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "quiz_tutor", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "quiz_tutor", "WebSocket disconnected");
}

/// Apply one client message to the session. `None` means the input was ignored.
pub(crate) async fn handle_client_ws<C: QuizCollaborator>(
  msg: ClientWsMessage,
  session: &mut QuizSession<C>,
) -> Option<ServerWsMessage> {
  let reply = match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::StartQuiz { topic, level } => match session.start(&topic, level).await.map(to_question_out) {
      Ok(question) => ServerWsMessage::Question {
        question,
        round: session.round(),
        progress: to_progress_out(session.progress()),
      },
      Err(e) => error_reply(&e),
    },

    ClientWsMessage::SelectOption { option_id, round } => {
      if round != session.round() {
        debug!(target: "quiz_tutor", round, current = session.round(), "Stale selection dropped");
        return None;
      }
      let fb = session.select(option_id)?;
      ServerWsMessage::AnswerResult {
        selected_id: fb.selected,
        correct: fb.correct,
        correct_id: fb.correct_id,
        explanation: fb.explanation,
        progress: to_progress_out(&fb.progress),
      }
    }

    ClientWsMessage::NextQuestion => match session.next_question().await {
      Ok(Advance::Question) => {
        let question = to_question_out(session.current_question()?);
        ServerWsMessage::Question { question, round: session.round(), progress: to_progress_out(session.progress()) }
      }
      Ok(Advance::Finished(summary)) => {
        ServerWsMessage::Finished { summary, progress: to_progress_out(session.progress()) }
      }
      Ok(Advance::Ignored) => return None,
      Err(e) => error_reply(&e),
    },

    ClientWsMessage::Restart => {
      session.restart();
      ServerWsMessage::Phase { phase: session.phase() }
    }
  };
  Some(reply)
}

fn error_reply(e: &SessionError) -> ServerWsMessage {
  warn!(target: "quiz", error = %e, "Quiz step failed");
  let message = match e {
    SessionError::Collaborator(_) if e.is_retryable() => {
      "The tutor is having connectivity issues. Please try again.".to_string()
    }
    SessionError::IncompleteQuestion => "The tutor's reply was incomplete. Please try again.".to_string(),
    other => other.to_string(),
  };
  ServerWsMessage::Error { message, retryable: e.is_retryable() }
}
