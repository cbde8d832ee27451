use clap::Parser;
use log::*;
use phonegen::{CarrierTable, MetadataPlan, Pipeline};

#[macro_use]
extern crate anyhow;

mod commands;
mod delivery;
mod errors;
mod http_server;

use commands::{Args, CommandType, GlobalArgs};

fn main() {
	std::process::exit(match run() {
		Ok(_) => 0,
		Err(e) => {
			error!("{:?}", e);
			1
		}
	});
}

fn run() -> anyhow::Result<()> {
	let args = Args::parse();

	stderrlog::new()
		.verbosity(args.global.verbosity as usize)
		.module(module_path!())
		.init()?;
	info!("phonegen v{}", env!("CARGO_PKG_VERSION"));

	debug!("{:?}", args);

	let cmd: CommandType = args.sub.into();
	match cmd {
		CommandType::Const(cmd) => cmd.execute(),
		CommandType::Pipeline(cmd) => {
			let pipeline = build_pipeline(&args.global)?;
			cmd.execute(pipeline)
		}
	}
}

fn build_pipeline(global: &GlobalArgs) -> anyhow::Result<Pipeline> {
	let carriers = match &global.carrier_table {
		Some(path) => CarrierTable::load(path)?,
		None => {
			debug!("using built-in carrier table");
			CarrierTable::builtin()
		}
	};
	debug!(
		"pipeline mode: {}, {} carrier prefixes",
		global.mode,
		carriers.len()
	);
	Ok(Pipeline::new(global.mode, MetadataPlan, carriers))
}
