//! Command-line entry point shared by both variants.

// std
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
// crates.io
use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
// self
use crate::{
	_prelude::*,
	api::ApiClient,
	config::{Settings, WebSettings},
	console::{self, InteractivePrompt},
	http::ReqwestHttpClient,
	oauth::ReqwestOAuthClient,
	obs::logging,
	provider::HhEndpoints,
	web::{self, AppState},
};

/// Resume-view limits for hh.ru employer accounts.
#[derive(Debug, Parser)]
#[command(name = "hh-limits", version, about)]
pub struct Cli {
	/// Subcommand to run.
	#[command(subcommand)]
	pub command: Command,
	/// Mirror logs into this file (appended, no colors).
	#[arg(long, global = true, value_name = "PATH")]
	pub log_file: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
	/// Serve the web front end.
	Serve {
		/// Address to bind.
		#[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
		bind: IpAddr,
		/// Port to listen on; falls back to `PORT`, then 6859.
		#[arg(long)]
		port: Option<u16>,
	},
	/// Fetch limits for every manager and write a timestamped report.
	Fetch {
		/// Credential file holding the client registration and the tokens.
		#[arg(long, default_value = ".env", value_name = "PATH")]
		env_file: PathBuf,
		/// Directory the report is written to.
		#[arg(long, default_value = ".", value_name = "DIR")]
		output_dir: PathBuf,
	},
}

/// Parses the command line and runs the selected variant.
pub async fn run() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let cli = Cli::parse();

	match &cli.command {
		Command::Fetch { env_file, .. } => load_env_file(env_file)?,
		Command::Serve { .. } => load_env_file(Path::new(".env"))?,
	}

	logging::init(cli.log_file.as_deref())?;

	let settings = Settings::from_env().wrap_err("Invalid configuration.")?;
	let http = ReqwestHttpClient::build(&settings.user_agent)?;
	let endpoints = HhEndpoints::default();
	let oauth =
		ReqwestOAuthClient::new(settings.credentials.clone(), endpoints.clone(), http.clone())?;
	let api = ApiClient::new(http, endpoints);

	match cli.command {
		Command::Serve { bind, port } => {
			let web_settings = WebSettings::from_env().wrap_err("Invalid configuration.")?;
			let addr = SocketAddr::new(bind, port.unwrap_or(web_settings.port));
			let state = AppState::new(
				oauth,
				api,
				&web_settings.secret_key,
				&settings.credentials.redirect_uri,
			);

			web::serve(state, addr).await.wrap_err_with(|| format!("Failed to serve on {addr}."))?;
		},
		Command::Fetch { env_file, output_dir } => {
			let mut prompt = InteractivePrompt::default();

			console::run(&oauth, &api, &env_file, &output_dir, &mut prompt).await?;
		},
	}

	Ok(())
}

fn load_env_file(path: &Path) -> color_eyre::Result<()> {
	match dotenvy::from_path(path) {
		Ok(()) => Ok(()),
		Err(e) if e.not_found() => Ok(()),
		Err(e) => Err(e).wrap_err_with(|| format!("Failed to load {}.", path.display())),
	}
}
