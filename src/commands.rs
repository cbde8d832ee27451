use std::path::PathBuf;

use clap::{ArgEnum, Parser};
use clap_complete::Shell;
use phonegen::{Pipeline, ValidationMode};
use std::str::FromStr;

pub mod check;
pub mod completions;
pub mod generate;
pub mod serve;

pub use check::CheckCommand;
pub use completions::CompletionsCommand;
pub use generate::GenerateCommand;
pub use serve::ServeCommand;

/// A command that does not need a pipeline.
pub(crate) trait ConstCommand {
	fn execute(&self) -> anyhow::Result<()>;
}

/// A command that runs candidates through the configured pipeline.
pub(crate) trait PipelineCommand {
	fn execute(&self, pipeline: Pipeline) -> anyhow::Result<()>;
}

pub(crate) enum CommandType {
	Const(Box<dyn ConstCommand>),
	Pipeline(Box<dyn PipelineCommand>),
}

#[derive(Debug, Clone, Parser)]
#[clap(name="phonegen", bin_name="phonegen", author, version, about = "Generate candidate phone numbers and check them against real numbering plans.", long_about = None)]
pub(crate) struct Args {
	#[clap(flatten)]
	pub global: GlobalArgs,

	#[clap(subcommand)]
	pub sub: Subcommands,
}

#[derive(Debug, Clone, Parser)]
pub(crate) struct GlobalArgs {
	#[clap(
		long,
		global = true,
		default_value_t = ValidationMode::Permissive,
		help = "How strictly candidates are checked: permissive, format-check, format+carrier, format+carrier+linetype.",
		long_help = "How strictly candidates are checked.\n\npermissive: keep every candidate.\nformat-check: keep numbers that are valid in their numbering plan.\nformat+carrier: also attach the carrier name, \"Unknown\" if there isn't one.\nformat+carrier+linetype: drop numbers with no known carrier, and classify the line type."
	)]
	pub mode: ValidationMode,
	#[clap(
		long,
		global = true,
		env = "PHONEGEN_CARRIER_TABLE",
		help = "Path to a JSON file mapping E.164 digit prefixes to carrier names. Defaults to the built-in table."
	)]
	pub carrier_table: Option<PathBuf>,
	#[clap(short, long, global = true, arg_enum, default_value_t=Verbosity::Info, help = "Set the log level. Trace logs every discarded candidate.")]
	pub verbosity: Verbosity,
}

#[derive(Debug, Clone, Parser)]
pub(crate) enum Subcommands {
	Serve(ServeCommand),
	Generate(GenerateCommand),
	Check(CheckCommand),
	Completion(CompletionsCommand),
}

impl From<Subcommands> for CommandType {
	fn from(sub: Subcommands) -> Self {
		match sub {
			Subcommands::Serve(args) => CommandType::Pipeline(Box::new(args)),
			Subcommands::Generate(args) => CommandType::Pipeline(Box::new(args)),
			Subcommands::Check(args) => CommandType::Pipeline(Box::new(args)),
			Subcommands::Completion(args) => CommandType::Const(Box::new(args)),
		}
	}
}

#[derive(Debug, Clone, Copy, ArgEnum)]
pub(crate) enum Verbosity {
	Error = 0,
	Warn = 1,
	Info = 2,
	Debug = 3,
	Trace = 4,
}

impl std::fmt::Display for Verbosity {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_fmt(format_args!(
			"{}",
			match self {
				Verbosity::Error => "error",
				Verbosity::Warn => "warn",
				Verbosity::Info => "info",
				Verbosity::Debug => "debug",
				Verbosity::Trace => "trace",
			}
		))
	}
}

impl FromStr for Verbosity {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"error" => Ok(Verbosity::Error),
			"warn" => Ok(Verbosity::Warn),
			"info" => Ok(Verbosity::Info),
			"debug" => Ok(Verbosity::Debug),
			"trace" => Ok(Verbosity::Trace),
			_ => Err(anyhow!("Invalid verbosity level: {}", s)),
		}
	}
}
