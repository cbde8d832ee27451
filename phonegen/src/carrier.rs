use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use log::*;
use phonenumber::{Mode, PhoneNumber};
use thiserror::Error;

/// Sample prefix table compiled into the binary. Operators are expected to supply their own.
const BUILTIN_TABLE: &str = include_str!("carriers.json");

/// Resolves the operator a number range is allocated to.
pub trait CarrierLookup {
	/// Returns `None` when no carrier is known for the number.
	fn carrier_for(&self, number: &PhoneNumber) -> Option<String>;
}

/// Maps E.164 digit prefixes (without the leading `+`) to carrier names.
///
/// Lookups use the longest matching prefix, so `"447400"` wins over `"4474"`.
#[derive(Debug, Clone, Default)]
pub struct CarrierTable {
	prefixes: HashMap<String, String>,
	longest: usize,
}

impl CarrierTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// The table shipped with the crate.
	pub fn builtin() -> Self {
		Self::from_json(BUILTIN_TABLE).expect("built-in carrier table is valid")
	}

	/// Parse a table from a JSON object of `"prefix": "carrier name"` pairs.
	pub fn from_json(json: &str) -> Result<Self, CarrierTableError> {
		let entries: HashMap<String, String> = serde_json::from_str(json)?;
		Self::from_entries(entries)
	}

	pub fn load(path: &Path) -> Result<Self, CarrierTableError> {
		debug!("loading carrier table from {}", path.display());
		let file = File::open(path)?;
		let reader = BufReader::new(file);
		let entries: HashMap<String, String> = serde_json::from_reader(reader)?;
		let table = Self::from_entries(entries)?;
		info!(
			"Loaded {} carrier prefixes from {}",
			table.len(),
			path.display()
		);
		Ok(table)
	}

	pub fn from_entries<I>(entries: I) -> Result<Self, CarrierTableError>
	where
		I: IntoIterator<Item = (String, String)>,
	{
		let mut table = Self::new();
		for (prefix, carrier) in entries {
			table.insert(prefix, carrier)?;
		}
		Ok(table)
	}

	pub fn insert(
		&mut self,
		prefix: impl Into<String>,
		carrier: impl Into<String>,
	) -> Result<(), CarrierTableError> {
		let prefix = prefix.into();
		if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
			return Err(CarrierTableError::InvalidPrefix(prefix));
		}
		self.longest = self.longest.max(prefix.len());
		self.prefixes.insert(prefix, carrier.into());
		Ok(())
	}

	pub fn len(&self) -> usize {
		self.prefixes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.prefixes.is_empty()
	}

	/// Look up the carrier for a string of E.164 digits, eg. `"2348031234567"`.
	pub fn lookup_digits(&self, digits: &str) -> Option<&str> {
		let max = self.longest.min(digits.len());
		(1..=max)
			.rev()
			.filter_map(|len| digits.get(..len))
			.find_map(|prefix| self.prefixes.get(prefix))
			.map(String::as_str)
			.filter(|name| !name.trim().is_empty())
	}
}

impl CarrierLookup for CarrierTable {
	fn carrier_for(&self, number: &PhoneNumber) -> Option<String> {
		let e164 = number.format().mode(Mode::E164).to_string();
		let digits = e164.trim_start_matches('+');
		self.lookup_digits(digits).map(str::to_owned)
	}
}

#[derive(Debug, Error)]
pub enum CarrierTableError {
	#[error("Failed to read carrier table: {0}")]
	Io(#[from] std::io::Error),
	#[error("Carrier table is not valid JSON: {0}")]
	Json(#[from] serde_json::Error),
	#[error("Carrier table prefix must be digits only, got {0:?}")]
	InvalidPrefix(String),
}
