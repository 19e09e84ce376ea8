use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// One row returned by a domain's similarity-search procedure.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchRow {
	pub identity: String,
	pub content: String,
	pub metadata: Value,
	pub similarity: f32,
}

#[derive(Debug, sqlx::FromRow)]
pub struct SessionRow {
	pub session_id: Uuid,
	pub history: Value,
	pub created_at: OffsetDateTime,
	pub last_activity_at: OffsetDateTime,
}
