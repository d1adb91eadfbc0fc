//! `hh-limits` binary.

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	hh_limits::cli::run().await
}
