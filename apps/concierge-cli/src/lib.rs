use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use concierge_service::{AnswerRequest, ConciergeService};
use concierge_storage::db::Db;

/// Runs one answer round-trip against a configured deployment and prints
/// the pipeline's JSON output. Operational harness, not a transport layer.
#[derive(Debug, Parser)]
#[command(version, rename_all = "kebab")]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Guest question to answer.
	pub question: String,
	/// Existing conversation session to continue.
	#[arg(long)]
	pub session_id: Option<Uuid>,
	/// Context-chunk budget for retrieval and curation.
	#[arg(long, default_value_t = 4)]
	pub max_context_chunks: u32,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let cfg = concierge_config::load(&args.config)?;
	init_tracing(&cfg);

	let db = Arc::new(Db::connect(&cfg.storage.postgres).await?);
	db.ensure_schema().await?;
	tracing::info!("Storage ready.");

	let service = ConciergeService::new(cfg, db);
	let response = service
		.answer(AnswerRequest {
			question: args.question,
			session_id: args.session_id,
			max_context_chunks: args.max_context_chunks,
		})
		.await?;

	println!("{}", serde_json::to_string_pretty(&response)?);

	Ok(())
}

fn init_tracing(cfg: &concierge_config::Config) {
	let filter =
		EnvFilter::try_new(&cfg.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();
}
