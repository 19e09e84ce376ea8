use serde_json::Value;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, models::SessionRow};

pub async fn fetch_session(pool: &PgPool, session_id: Uuid) -> Result<Option<SessionRow>> {
	let row: Option<SessionRow> = sqlx::query_as(
		"SELECT session_id, history, created_at, last_activity_at \
         FROM guest_sessions WHERE session_id = $1",
	)
	.bind(session_id)
	.fetch_optional(pool)
	.await?;

	Ok(row)
}

pub async fn insert_session(
	pool: &PgPool,
	session_id: Uuid,
	now: OffsetDateTime,
) -> Result<SessionRow> {
	sqlx::query(
		"INSERT INTO guest_sessions (session_id, history, created_at, last_activity_at) \
         VALUES ($1, '[]'::jsonb, $2, $2)",
	)
	.bind(session_id)
	.bind(now)
	.execute(pool)
	.await?;

	Ok(SessionRow {
		session_id,
		history: Value::Array(Vec::new()),
		created_at: now,
		last_activity_at: now,
	})
}

/// Replaces the whole history array. Concurrent writers to the same session
/// race as last-write-wins, which the session contract permits.
pub async fn update_history(
	pool: &PgPool,
	session_id: Uuid,
	history: &Value,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"UPDATE guest_sessions SET history = $2, last_activity_at = $3 WHERE session_id = $1",
	)
	.bind(session_id)
	.bind(history)
	.bind(now)
	.execute(pool)
	.await?;

	Ok(())
}
