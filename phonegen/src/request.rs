use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

lazy_static! {
	static ref PREFIX_PATTERN: Regex = Regex::new("^[0-9]{3,}$").unwrap();
}

/// A request to generate phone numbers, as it arrives from a client.
///
/// `amount` is signed so that negative values make it to [`GenerationRequest::validate`]
/// and get a proper rejection instead of a decoding failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
	pub country_code: String,
	pub prefix: String,
	pub amount: i64,
}

impl GenerationRequest {
	pub fn new(country_code: impl Into<String>, prefix: impl Into<String>, amount: i64) -> Self {
		Self {
			country_code: country_code.into(),
			prefix: prefix.into(),
			amount,
		}
	}

	/// Check the request before any numbers are drawn.
	///
	/// `max_amount` is an optional operator-imposed ceiling on the number of draw attempts.
	pub fn validate(self, max_amount: Option<u64>) -> Result<CheckedRequest, RequestError> {
		if !self.country_code.starts_with('+') {
			return Err(RequestError::CountryCode);
		}
		if !PREFIX_PATTERN.is_match(&self.prefix) {
			return Err(RequestError::Prefix);
		}
		if self.amount <= 0 {
			return Err(RequestError::Amount);
		}
		let amount = self.amount as u64;
		if let Some(max) = max_amount {
			if amount > max {
				return Err(RequestError::AmountTooLarge(max));
			}
		}

		Ok(CheckedRequest {
			country_code: self.country_code,
			prefix: self.prefix,
			amount,
		})
	}
}

/// A [`GenerationRequest`] that passed validation. This is the only thing the pipeline accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedRequest {
	country_code: String,
	prefix: String,
	amount: u64,
}

impl CheckedRequest {
	pub fn country_code(&self) -> &str {
		&self.country_code
	}

	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	/// Number of draw attempts. Not a guarantee on the number of results.
	pub fn amount(&self) -> u64 {
		self.amount
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
	#[error("Country code must start with '+'")]
	CountryCode,
	#[error("Prefix must be a number with at least 3 digits")]
	Prefix,
	#[error("Amount must be greater than 0")]
	Amount,
	#[error("Amount must not exceed {0}")]
	AmountTooLarge(u64),
}
