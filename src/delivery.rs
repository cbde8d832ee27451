use std::sync::Arc;

use clap::ArgEnum;
use phonegen::ValidatedNumber;
use thiserror::Error;

pub mod remote;
pub mod store;

pub use remote::{RemoteConfig, RemoteSink};
pub use store::CsvStore;

/// Header row of every generated CSV file.
pub const CSV_HEADER: &str = "Phone Number";

/// What the server does with a generated result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ArgEnum)]
pub enum DeliveryMode {
	/// Send the CSV back in the response body.
	Csv,
	/// Forward the numbers to a remote API and relay the download link it gives back.
	Remote,
	/// Write the CSV to the local storage directory and return a link to `/download`.
	Stored,
}

impl std::fmt::Display for DeliveryMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			DeliveryMode::Csv => "csv",
			DeliveryMode::Remote => "remote",
			DeliveryMode::Stored => "stored",
		})
	}
}

/// A configured delivery mode, along with anything it needs to do its job.
pub enum Delivery {
	Csv,
	Remote(Arc<RemoteSink>),
	Stored,
}

impl Delivery {
	pub fn mode(&self) -> DeliveryMode {
		match self {
			Delivery::Csv => DeliveryMode::Csv,
			Delivery::Remote(_) => DeliveryMode::Remote,
			Delivery::Stored => DeliveryMode::Stored,
		}
	}
}

/// Render a result set as a single column CSV document.
pub fn render_csv(numbers: &[ValidatedNumber]) -> String {
	let mut csv = String::with_capacity((numbers.len() + 1) * 16);
	csv.push_str(CSV_HEADER);
	csv.push('\n');
	for number in numbers {
		push_field(&mut csv, &number.phone_number);
		csv.push('\n');
	}
	csv
}

/// Append a field, quoted RFC 4180 style when it contains a delimiter, a quote or a line break.
fn push_field(csv: &mut String, field: &str) {
	if !field.contains(|c: char| matches!(c, ',' | '"' | '\r' | '\n')) {
		csv.push_str(field);
		return;
	}
	csv.push('"');
	csv.push_str(&field.replace('"', "\"\""));
	csv.push('"');
}

#[derive(Debug, Error)]
pub enum DeliveryError {
	#[error("Failed to connect to remote API: {0}")]
	Unreachable(#[from] reqwest::Error),
	#[error("Remote API error ({status}): {body}")]
	RemoteStatus { status: u16, body: String },
	#[error("Remote API returned malformed JSON: {0}")]
	MalformedResponse(#[source] serde_json::Error),
	#[error("Failed to get file name from remote API")]
	MissingFileName,
	#[error("Invalid file name: {0:?}")]
	InvalidFileName(String),
	#[error("File not found")]
	NotFound,
	#[error("Storage error: {0}")]
	Io(#[from] std::io::Error),
}
