use sqlx::PgPool;

use crate::{Result, models::SearchRow, vector_to_pg};

/// Invokes one domain's similarity-search stored procedure. The procedure
/// name comes from validated config (plain identifier), so interpolating it
/// into the statement is safe; the vector, threshold, and count are bound.
pub async fn run_domain_search(
	pool: &PgPool,
	procedure: &str,
	embedding: &[f32],
	match_threshold: f32,
	match_count: u32,
) -> Result<Vec<SearchRow>> {
	let statement = format!(
		"SELECT identity, content, metadata, similarity \
         FROM {procedure}($1::text::vector, $2, $3)"
	);
	let rows: Vec<SearchRow> = sqlx::query_as(&statement)
		.bind(vector_to_pg(embedding))
		.bind(match_threshold)
		.bind(match_count as i32)
		.fetch_all(pool)
		.await?;

	Ok(rows)
}
