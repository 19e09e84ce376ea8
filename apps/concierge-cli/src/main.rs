use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = concierge_cli::Args::parse();
	concierge_cli::run(args).await
}
