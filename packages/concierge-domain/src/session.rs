use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// One multi-turn conversation thread. Created lazily on first contact;
/// mutated only by appending a user/assistant pair per exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
	pub session_id: Uuid,
	pub history: Vec<Turn>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub last_activity_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
	pub role: Role,
	pub content: String,
	#[serde(with = "time::serde::rfc3339")]
	pub at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	User,
	Assistant,
}

impl ConversationSession {
	pub fn new(session_id: Uuid, now: OffsetDateTime) -> Self {
		Self { session_id, history: Vec::new(), created_at: now, last_activity_at: now }
	}

	/// Appends exactly one exchange and trims the oldest turns past
	/// `max_stored_turns`. Partial appends are not supported.
	pub fn append_exchange(
		&mut self,
		user_text: &str,
		assistant_text: &str,
		max_stored_turns: u32,
		now: OffsetDateTime,
	) {
		self.history.push(Turn { role: Role::User, content: user_text.to_string(), at: now });
		self.history.push(Turn {
			role: Role::Assistant,
			content: assistant_text.to_string(),
			at: now,
		});

		let max = (max_stored_turns as usize).max(2);
		if self.history.len() > max {
			let drop = self.history.len() - max;
			self.history.drain(..drop);
		}
		self.last_activity_at = now;
	}
}

/// Most-recent-N window, oldest first within the window. This is what gets
/// handed to the language model, never the full history.
pub fn bounded_history(session: &ConversationSession, max_turns: u32) -> Vec<Turn> {
	let max = max_turns as usize;
	let start = session.history.len().saturating_sub(max);

	session.history[start..].to_vec()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn now() -> OffsetDateTime {
		OffsetDateTime::from_unix_timestamp(1_754_000_000).unwrap()
	}

	#[test]
	fn append_adds_exactly_one_pair() {
		let mut session = ConversationSession::new(Uuid::new_v4(), now());
		session.append_exchange("what's the wifi password", "It's on the router.", 20, now());

		assert_eq!(session.history.len(), 2);
		assert_eq!(session.history[0].role, Role::User);
		assert_eq!(session.history[1].role, Role::Assistant);
	}

	#[test]
	fn append_trims_oldest_turns() {
		let mut session = ConversationSession::new(Uuid::new_v4(), now());
		for i in 0..8 {
			session.append_exchange(&format!("q{i}"), &format!("a{i}"), 6, now());
		}

		assert_eq!(session.history.len(), 6);
		assert_eq!(session.history[0].content, "q5");
		assert_eq!(session.history[5].content, "a7");
	}

	#[test]
	fn bounded_history_keeps_order_within_window() {
		let mut session = ConversationSession::new(Uuid::new_v4(), now());
		for i in 0..5 {
			session.append_exchange(&format!("q{i}"), &format!("a{i}"), 20, now());
		}

		let window = bounded_history(&session, 4);

		assert_eq!(window.len(), 4);
		assert_eq!(window[0].content, "q3");
		assert_eq!(window[1].content, "a3");
		assert_eq!(window[2].content, "q4");
		assert_eq!(window[3].content, "a4");
	}

	#[test]
	fn bounded_history_handles_short_sessions() {
		let mut session = ConversationSession::new(Uuid::new_v4(), now());
		session.append_exchange("hi", "hello", 20, now());

		assert_eq!(bounded_history(&session, 10).len(), 2);
	}
}
