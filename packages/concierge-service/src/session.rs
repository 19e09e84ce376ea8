use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use concierge_domain::{ConversationSession, Turn, bounded_history};

use crate::ConciergeService;

impl ConciergeService {
	/// Resolves the conversation session for a request. Unknown or absent
	/// ids mint a fresh session; store failures are non-fatal and leave the
	/// conversation running on an unsaved session.
	pub async fn resolve_session(&self, session_id: Option<Uuid>) -> ConversationSession {
		let now = OffsetDateTime::now_utc();

		if let Some(id) = session_id {
			match self.sessions.fetch(id).await {
				Ok(Some(session)) => return session,
				Ok(None) => {
					warn!(session_id = %id, "Unknown session id; minting a fresh session.");
				},
				Err(err) => {
					warn!(session_id = %id, error = %err, "Session fetch failed; minting a fresh session.");
				},
			}
		}

		let session = ConversationSession::new(Uuid::new_v4(), now);
		if let Err(err) = self.sessions.create(&session).await {
			warn!(
				session_id = %session.session_id,
				error = %err,
				"Session create failed; continuing with an unsaved session."
			);
		}

		session
	}

	/// Appends exactly one user/assistant pair after the transport layer
	/// has composed the final answer. Store failures are logged, never
	/// surfaced; a lost turn must not block the conversation.
	pub async fn record_exchange(&self, session_id: Uuid, user_text: &str, assistant_text: &str) {
		if let Err(err) = self
			.sessions
			.append_turn(session_id, user_text, assistant_text, self.cfg.session.max_stored_turns)
			.await
		{
			warn!(session_id = %session_id, error = %err, "Failed to record exchange.");
		}
	}

	/// The bounded suffix of a session's history to hand to the language
	/// model when composing the final response.
	pub fn history_window(&self, session: &ConversationSession) -> Vec<Turn> {
		bounded_history(session, self.cfg.session.context_window_turns)
	}
}
