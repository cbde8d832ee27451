use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use log::*;
use phonegen::Pipeline;

use crate::delivery::{CsvStore, Delivery, DeliveryMode, RemoteConfig, RemoteSink};
use crate::http_server::{AppState, HttpServer};

use super::*;

#[derive(Debug, Clone, Parser)]
#[clap(about = "Start the HTTP API server")]
pub struct ServeCommand {
	#[clap(long, default_value = "127.0.0.1", help = "Address to bind the HTTP server to")]
	pub host: String,
	#[clap(
		short,
		long,
		default_value = "8000",
		help = "Port to bind the HTTP server to"
	)]
	pub port: u16,
	#[clap(
		short,
		long,
		arg_enum,
		default_value_t = DeliveryMode::Csv,
		help = "What to do with generated numbers: return a CSV, forward them to a remote API, or store a CSV locally."
	)]
	pub delivery: DeliveryMode,
	#[clap(
		long,
		env = "PHONEGEN_STORAGE_DIR",
		default_value = "generated_files",
		help = "Directory that stored CSV files are written to and served from."
	)]
	pub storage_dir: PathBuf,
	#[clap(
		long,
		env = "PHONEGEN_REMOTE_URL",
		required_if_eq("delivery", "remote"),
		help = "Endpoint that result sets are POSTed to in remote delivery mode."
	)]
	pub remote_url: Option<String>,
	#[clap(
		long,
		env = "PHONEGEN_DOWNLOAD_BASE",
		required_if_eq("delivery", "remote"),
		help = "Base URL for the download links built from the remote API's file names."
	)]
	pub download_base: Option<String>,
	#[clap(
		long,
		default_value = "30",
		help = "Timeout in seconds for requests to the remote API."
	)]
	pub remote_timeout: u64,
	#[clap(long, help = "Don't verify the remote API's TLS certificate.")]
	pub insecure_remote: bool,
	#[clap(long, help = "Reject requests that ask for more than this many draw attempts.")]
	pub max_amount: Option<u64>,
}

impl ServeCommand {
	fn build_delivery(&self) -> anyhow::Result<Delivery> {
		Ok(match self.delivery {
			DeliveryMode::Csv => Delivery::Csv,
			DeliveryMode::Stored => Delivery::Stored,
			DeliveryMode::Remote => {
				let endpoint = self
					.remote_url
					.clone()
					.ok_or_else(|| anyhow!("--remote-url is required for remote delivery"))?;
				let download_base = self
					.download_base
					.clone()
					.ok_or_else(|| anyhow!("--download-base is required for remote delivery"))?;
				let sink = RemoteSink::new(RemoteConfig {
					endpoint,
					download_base,
					timeout: Duration::from_secs(self.remote_timeout),
					accept_invalid_certs: self.insecure_remote,
				})?;
				Delivery::Remote(Arc::new(sink))
			}
		})
	}
}

impl PipelineCommand for ServeCommand {
	fn execute(&self, pipeline: Pipeline) -> anyhow::Result<()> {
		let addr: SocketAddr = format!("{}:{}", self.host, self.port).parse()?;
		// the remote sink's blocking client has to be built outside of the async runtime
		let delivery = self.build_delivery()?;
		let server = HttpServer::new(AppState {
			pipeline,
			delivery,
			store: CsvStore::new(self.storage_dir.clone()),
			max_amount: self.max_amount,
		});

		info!("Starting HTTP API server on {}", addr);

		let rt = tokio::runtime::Runtime::new()?;
		match rt.block_on(server.start(addr)) {
			Ok(_) => Ok(()),
			Err(e) => Err(anyhow!("Server error: {}", e)),
		}
	}
}
