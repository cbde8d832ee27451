use log::*;
use phonegen::Pipeline;

use super::*;

#[derive(Debug, Clone, Parser)]
#[clap(about = "Check a single number the same way generated candidates are checked")]
pub struct CheckCommand {
	#[clap(help = "The number to check, in international format, eg. +447400123456")]
	pub number: String,
}

impl PipelineCommand for CheckCommand {
	fn execute(&self, pipeline: Pipeline) -> anyhow::Result<()> {
		debug!("checking {} with mode {}", self.number, pipeline.mode());
		match pipeline.assess(&self.number) {
			Some(record) => {
				println!("{}", serde_json::to_string_pretty(&record)?);
				Ok(())
			}
			None => bail!(
				"{} was rejected in {} mode",
				self.number,
				pipeline.mode()
			),
		}
	}
}
