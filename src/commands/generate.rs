use std::{fs, io::Write, path::PathBuf};

use log::*;
use phonegen::{GenerationRequest, Pipeline, ValidatedNumber};
use rand::{rngs::StdRng, SeedableRng};

use crate::delivery::render_csv;

use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ArgEnum)]
pub enum OutputFormat {
	Csv,
	Json,
}

impl std::fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			OutputFormat::Csv => "csv",
			OutputFormat::Json => "json",
		})
	}
}

#[derive(Debug, Clone, Parser)]
#[clap(about = "Generate phone numbers locally, without starting the server")]
pub struct GenerateCommand {
	#[clap(short, long, help = "Country code, including the leading '+', eg. +44")]
	pub country_code: String,
	#[clap(short, long, help = "Digits placed between the country code and the random suffix. At least 3.")]
	pub prefix: String,
	#[clap(
		short = 'n',
		long,
		allow_hyphen_values = true,
		help = "Number of draw attempts. Invalid candidates are discarded, not redrawn."
	)]
	pub amount: i64,
	#[clap(long, help = "Seed the random generator for a reproducible run.")]
	pub seed: Option<u64>,
	#[clap(short, long, help = "Write the result to this file instead of stdout.")]
	pub output: Option<PathBuf>,
	#[clap(short, long, arg_enum, default_value_t = OutputFormat::Csv, help = "Output format.")]
	pub format: OutputFormat,
}

impl GenerateCommand {
	fn run(&self, pipeline: &Pipeline) -> anyhow::Result<Vec<ValidatedNumber>> {
		let request =
			GenerationRequest::new(self.country_code.clone(), self.prefix.clone(), self.amount)
				.validate(None)?;

		let mut rng = match self.seed {
			Some(seed) => {
				debug!("using seed {}", seed);
				StdRng::seed_from_u64(seed)
			}
			None => StdRng::from_entropy(),
		};
		let numbers = pipeline.synthesize(&request, &mut rng);
		info!(
			"{} of {} candidates passed ({})",
			numbers.len(),
			request.amount(),
			pipeline.mode()
		);
		Ok(numbers)
	}

	fn render(&self, numbers: &[ValidatedNumber]) -> anyhow::Result<String> {
		Ok(match self.format {
			OutputFormat::Csv => render_csv(numbers),
			OutputFormat::Json => {
				let mut json = serde_json::to_string_pretty(numbers)?;
				json.push('\n');
				json
			}
		})
	}
}

impl PipelineCommand for GenerateCommand {
	fn execute(&self, pipeline: Pipeline) -> anyhow::Result<()> {
		let numbers = self.run(&pipeline)?;
		if numbers.is_empty() {
			bail!("No valid phone numbers were generated");
		}

		let rendered = self.render(&numbers)?;
		match &self.output {
			Some(path) => {
				fs::write(path, rendered)?;
				info!("Wrote {} numbers to {}", numbers.len(), path.display());
			}
			None => {
				let stdout = std::io::stdout();
				let mut handle = stdout.lock();
				handle.write_all(rendered.as_bytes())?;
				handle.flush()?;
			}
		}
		Ok(())
	}
}
