/// Pipeline-owned tables only. The per-domain content tables and their
/// `match_*` search procedures belong to the datastore deployment, not to
/// this service.
pub fn render_schema() -> String {
	"\
CREATE TABLE IF NOT EXISTS guest_sessions (
	session_id uuid PRIMARY KEY,
	history jsonb NOT NULL DEFAULT '[]'::jsonb,
	created_at timestamptz NOT NULL,
	last_activity_at timestamptz NOT NULL
);
CREATE INDEX IF NOT EXISTS guest_sessions_last_activity_idx
	ON guest_sessions (last_activity_at)"
		.to_string()
}
