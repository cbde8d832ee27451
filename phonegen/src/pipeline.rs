use std::{fmt, str::FromStr};

use log::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
	carrier::{CarrierLookup, CarrierTable},
	numbering::{MetadataPlan, NumberingPlan},
	request::CheckedRequest,
};

/// Smallest random subscriber suffix. Suffixes are always 7 digits.
pub const SUFFIX_MIN: u32 = 1_000_000;
/// Largest random subscriber suffix.
pub const SUFFIX_MAX: u32 = 9_999_999;

/// Carrier name used when a lookup did not produce anything.
pub const UNKNOWN_CARRIER: &str = "Unknown";

/// How much checking and enrichment the pipeline does for each candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationMode {
	/// Every candidate is accepted as is.
	#[serde(rename = "permissive")]
	Permissive,
	/// Candidates must be valid numbers in their numbering plan.
	#[serde(rename = "format-check")]
	FormatCheck,
	/// Like `FormatCheck`, and attach the carrier name when one is known.
	#[serde(rename = "format+carrier")]
	FormatCarrier,
	/// Like `FormatCheck`, but drop numbers with no known carrier, and classify the line type.
	#[serde(rename = "format+carrier+linetype")]
	FormatCarrierLineType,
}

impl ValidationMode {
	pub const ALL: [ValidationMode; 4] = [
		ValidationMode::Permissive,
		ValidationMode::FormatCheck,
		ValidationMode::FormatCarrier,
		ValidationMode::FormatCarrierLineType,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			ValidationMode::Permissive => "permissive",
			ValidationMode::FormatCheck => "format-check",
			ValidationMode::FormatCarrier => "format+carrier",
			ValidationMode::FormatCarrierLineType => "format+carrier+linetype",
		}
	}

	fn checks_numbering_plan(&self) -> bool {
		!matches!(self, ValidationMode::Permissive)
	}

	fn resolves_carrier(&self) -> bool {
		matches!(
			self,
			ValidationMode::FormatCarrier | ValidationMode::FormatCarrierLineType
		)
	}

	fn requires_carrier(&self) -> bool {
		matches!(self, ValidationMode::FormatCarrierLineType)
	}

	fn classifies_line_type(&self) -> bool {
		matches!(self, ValidationMode::FormatCarrierLineType)
	}
}

impl Default for ValidationMode {
	fn default() -> Self {
		ValidationMode::Permissive
	}
}

impl fmt::Display for ValidationMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ValidationMode {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		ValidationMode::ALL
			.iter()
			.copied()
			.find(|mode| mode.as_str() == s)
			.ok_or_else(|| {
				anyhow::anyhow!(
					"Invalid validation mode: {}. Expected one of: {}",
					s,
					ValidationMode::ALL
						.iter()
						.map(ValidationMode::as_str)
						.collect::<Vec<_>>()
						.join(", ")
				)
			})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
	Mobile,
	Landline,
	Unknown,
}

impl Default for LineType {
	fn default() -> Self {
		LineType::Unknown
	}
}

impl fmt::Display for LineType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			LineType::Mobile => "mobile",
			LineType::Landline => "landline",
			LineType::Unknown => "unknown",
		})
	}
}

/// A candidate that made it through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedNumber {
	/// Exactly the drawn candidate, without any reformatting.
	pub phone_number: String,
	pub valid: bool,
	pub carrier: String,
	pub line_type: LineType,
}

impl ValidatedNumber {
	fn unenriched(phone_number: String) -> Self {
		Self {
			phone_number,
			valid: true,
			carrier: UNKNOWN_CARRIER.into(),
			line_type: LineType::Unknown,
		}
	}
}

/// Form a candidate number: country code, prefix and a random 7 digit suffix, with no separators.
pub fn draw_candidate<R: Rng + ?Sized>(rng: &mut R, country_code: &str, prefix: &str) -> String {
	let suffix: u32 = rng.gen_range(SUFFIX_MIN..=SUFFIX_MAX);
	format!("{}{}{}", country_code, prefix, suffix)
}

/// Draws, validates and enriches candidate numbers.
///
/// The pipeline holds no state between calls; the randomness source is passed in to
/// [`Pipeline::synthesize`] so runs can be reproduced with a seeded generator.
#[derive(Debug, Clone)]
pub struct Pipeline<P = MetadataPlan, C = CarrierTable> {
	mode: ValidationMode,
	plan: P,
	carriers: C,
}

impl Pipeline {
	/// A pipeline using the bundled numbering plan metadata and the built-in carrier table.
	pub fn with_defaults(mode: ValidationMode) -> Self {
		Self::new(mode, MetadataPlan, CarrierTable::builtin())
	}
}

impl<P, C> Pipeline<P, C>
where
	P: NumberingPlan,
	C: CarrierLookup,
{
	pub fn new(mode: ValidationMode, plan: P, carriers: C) -> Self {
		Self {
			mode,
			plan,
			carriers,
		}
	}

	pub fn mode(&self) -> ValidationMode {
		self.mode
	}

	/// Make exactly `request.amount()` draw attempts and return the candidates that survive.
	///
	/// Rejected candidates are not redrawn, so the result can be shorter than the amount, or empty.
	pub fn synthesize<R: Rng + ?Sized>(
		&self,
		request: &CheckedRequest,
		rng: &mut R,
	) -> Vec<ValidatedNumber> {
		let mut results = Vec::new();
		for _ in 0..request.amount() {
			let candidate = draw_candidate(rng, request.country_code(), request.prefix());
			match self.assess(&candidate) {
				Some(record) => results.push(record),
				None => trace!("discarding candidate {}", candidate),
			}
		}

		debug!(
			"synthesized {} of {} attempts for {}{} (mode: {})",
			results.len(),
			request.amount(),
			request.country_code(),
			request.prefix(),
			self.mode
		);
		results
	}

	/// Validate and enrich a single candidate according to the pipeline's mode.
	///
	/// Returns `None` if the candidate should be discarded.
	pub fn assess(&self, candidate: &str) -> Option<ValidatedNumber> {
		if !self.mode.checks_numbering_plan() {
			return Some(ValidatedNumber::unenriched(candidate.to_owned()));
		}

		let number = self.plan.parse_valid(candidate)?;
		let mut record = ValidatedNumber::unenriched(candidate.to_owned());

		if self.mode.resolves_carrier() {
			match self.carriers.carrier_for(&number) {
				Some(carrier) => record.carrier = carrier,
				None if self.mode.requires_carrier() => {
					trace!("{}: no carrier found", candidate);
					return None;
				}
				None => {}
			}
		}

		if self.mode.classifies_line_type() {
			record.line_type = self.plan.line_type(&number);
		}

		Some(record)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::request::GenerationRequest;
	use proptest::prelude::*;
	use rand::{rngs::StdRng, SeedableRng};

	fn checked(country_code: &str, prefix: &str, amount: i64) -> CheckedRequest {
		GenerationRequest::new(country_code, prefix, amount)
			.validate(None)
			.unwrap()
	}

	fn uk_table() -> CarrierTable {
		let mut table = CarrierTable::new();
		table.insert("4474", "Example Mobile").unwrap();
		table
	}

	fn has_shape(number: &str, country_code: &str, prefix: &str) -> bool {
		match number.strip_prefix(&format!("{}{}", country_code, prefix)) {
			Some(suffix) => {
				suffix.len() == 7 && suffix.bytes().all(|b| b.is_ascii_digit()) && !suffix.starts_with('0')
			}
			None => false,
		}
	}

	#[test]
	fn test_mode_names_round_trip() {
		for mode in ValidationMode::ALL {
			assert_eq!(mode.to_string().parse::<ValidationMode>().unwrap(), mode);
			let json = serde_json::to_string(&mode).unwrap();
			assert_eq!(json, format!("\"{}\"", mode));
		}
		assert!("strict".parse::<ValidationMode>().is_err());
	}

	#[test]
	fn test_draw_candidate_shape() {
		let mut rng = StdRng::seed_from_u64(7);
		for _ in 0..1000 {
			let candidate = draw_candidate(&mut rng, "+44", "7700");
			assert!(has_shape(&candidate, "+44", "7700"), "{}", candidate);
		}
	}

	#[test]
	fn test_permissive_uk_example() {
		let pipeline = Pipeline::with_defaults(ValidationMode::Permissive);
		let mut rng = StdRng::seed_from_u64(1);
		let results = pipeline.synthesize(&checked("+44", "7700", 5), &mut rng);
		assert_eq!(results.len(), 5);
		for record in &results {
			assert!(has_shape(&record.phone_number, "+44", "7700"));
			assert_eq!(record.phone_number.len(), "+447700".len() + 7);
			assert!(record.valid);
			assert_eq!(record.carrier, UNKNOWN_CARRIER);
			assert_eq!(record.line_type, LineType::Unknown);
		}
	}

	#[test]
	fn test_same_seed_same_results() {
		let pipeline = Pipeline::with_defaults(ValidationMode::Permissive);
		let request = checked("+1", "201", 50);
		let a = pipeline.synthesize(&request, &mut StdRng::seed_from_u64(99));
		let b = pipeline.synthesize(&request, &mut StdRng::seed_from_u64(99));
		assert_eq!(a, b);
	}

	#[test]
	fn test_no_redraw_for_impossible_range() {
		// +44 7700 followed by 7 digits is 11 national digits, which never exists in the UK plan
		let request = checked("+44", "7700", 1000);
		for mode in [
			ValidationMode::FormatCheck,
			ValidationMode::FormatCarrier,
			ValidationMode::FormatCarrierLineType,
		] {
			let pipeline = Pipeline::new(mode, MetadataPlan, uk_table());
			let results = pipeline.synthesize(&request, &mut StdRng::seed_from_u64(3));
			assert!(results.is_empty(), "mode {} produced {:?}", mode, results);
		}
	}

	#[test]
	fn test_rejected_draws_are_not_replaced() {
		// suffixes starting with 1 give an exchange code NANP never assigns, so only part of the draws survive
		let pipeline = Pipeline::with_defaults(ValidationMode::FormatCheck);
		let results = pipeline.synthesize(&checked("+1", "201", 1000), &mut StdRng::seed_from_u64(11));
		assert!(!results.is_empty());
		assert!(results.len() < 1000, "all {} draws passed", results.len());
		for record in &results {
			assert!(MetadataPlan.parse_valid(&record.phone_number).is_some());
		}
	}

	#[test]
	fn test_format_check_admits_only_valid_numbers() {
		let pipeline = Pipeline::new(ValidationMode::FormatCheck, MetadataPlan, uk_table());
		let results = pipeline.synthesize(&checked("+44", "740", 200), &mut StdRng::seed_from_u64(5));
		assert!(!results.is_empty());
		for record in &results {
			assert!(MetadataPlan.parse_valid(&record.phone_number).is_some());
			assert_eq!(record.carrier, UNKNOWN_CARRIER);
			assert_eq!(record.line_type, LineType::Unknown);
		}
	}

	#[test]
	fn test_format_carrier_keeps_unknown_carriers() {
		let pipeline = Pipeline::new(ValidationMode::FormatCarrier, MetadataPlan, CarrierTable::new());
		let results = pipeline.synthesize(&checked("+44", "740", 200), &mut StdRng::seed_from_u64(5));
		assert!(!results.is_empty());
		assert!(results.iter().all(|r| r.carrier == UNKNOWN_CARRIER));

		let pipeline = Pipeline::new(ValidationMode::FormatCarrier, MetadataPlan, uk_table());
		let results = pipeline.synthesize(&checked("+44", "740", 200), &mut StdRng::seed_from_u64(5));
		assert!(!results.is_empty());
		assert!(results.iter().all(|r| r.carrier == "Example Mobile"));
		assert!(results.iter().all(|r| r.line_type == LineType::Unknown));
	}

	#[test]
	fn test_strict_mode_drops_unknown_carriers() {
		let request = checked("+44", "740", 200);
		let pipeline = Pipeline::new(
			ValidationMode::FormatCarrierLineType,
			MetadataPlan,
			CarrierTable::new(),
		);
		assert!(pipeline
			.synthesize(&request, &mut StdRng::seed_from_u64(5))
			.is_empty());

		let pipeline = Pipeline::new(ValidationMode::FormatCarrierLineType, MetadataPlan, uk_table());
		let results = pipeline.synthesize(&request, &mut StdRng::seed_from_u64(5));
		assert!(!results.is_empty());
		for record in &results {
			assert_ne!(record.carrier, UNKNOWN_CARRIER);
			assert_eq!(record.line_type, LineType::Mobile);
		}
	}

	#[test]
	fn test_assess_single_numbers() {
		let pipeline = Pipeline::new(ValidationMode::FormatCarrierLineType, MetadataPlan, uk_table());
		let record = pipeline.assess("+447400123456").unwrap();
		assert_eq!(record.phone_number, "+447400123456");
		assert_eq!(record.carrier, "Example Mobile");
		assert_eq!(record.line_type, LineType::Mobile);
		// valid, but no carrier in the table
		assert!(pipeline.assess("+441212345678").is_none());

		let pipeline = Pipeline::new(ValidationMode::FormatCarrier, MetadataPlan, uk_table());
		let record = pipeline.assess("+441212345678").unwrap();
		assert_eq!(record.carrier, UNKNOWN_CARRIER);
	}

	#[test]
	fn test_builtin_table_enriches_nigerian_numbers() {
		let pipeline = Pipeline::with_defaults(ValidationMode::FormatCarrierLineType);
		let results = pipeline.synthesize(&checked("+234", "803", 50), &mut StdRng::seed_from_u64(11));
		assert!(!results.is_empty());
		assert!(results.iter().all(|r| r.carrier == "MTN"));
	}

	proptest! {
		#[test]
		fn permissive_keeps_every_draw(seed in any::<u64>(), amount in 1i64..300, prefix in "[0-9]{3,6}") {
			let pipeline = Pipeline::with_defaults(ValidationMode::Permissive);
			let request = checked("+44", &prefix, amount);
			let results = pipeline.synthesize(&request, &mut StdRng::seed_from_u64(seed));
			prop_assert_eq!(results.len() as i64, amount);
			for record in &results {
				prop_assert!(has_shape(&record.phone_number, "+44", &prefix));
			}
		}

		#[test]
		fn strict_modes_never_exceed_amount(seed in any::<u64>(), amount in 1i64..100, mode_idx in 0usize..4) {
			let mode = ValidationMode::ALL[mode_idx];
			let pipeline = Pipeline::new(mode, MetadataPlan, uk_table());
			let request = checked("+44", "740", amount);
			let results = pipeline.synthesize(&request, &mut StdRng::seed_from_u64(seed));
			prop_assert!(results.len() as i64 <= amount);
			for record in &results {
				prop_assert!(has_shape(&record.phone_number, "+44", "740"));
				if mode != ValidationMode::Permissive {
					prop_assert!(MetadataPlan.parse_valid(&record.phone_number).is_some());
				}
				if mode == ValidationMode::FormatCarrierLineType {
					prop_assert_ne!(record.carrier.as_str(), UNKNOWN_CARRIER);
				}
			}
		}

		#[test]
		fn assessment_is_idempotent(seed in any::<u64>(), mode_idx in 0usize..4) {
			let pipeline = Pipeline::new(ValidationMode::ALL[mode_idx], MetadataPlan, uk_table());
			let mut rng = StdRng::seed_from_u64(seed);
			let candidate = draw_candidate(&mut rng, "+44", "740");
			let first = pipeline.assess(&candidate);
			prop_assert_eq!(pipeline.assess(&candidate), first.clone());
			if let Some(record) = first {
				prop_assert_eq!(pipeline.assess(&record.phone_number), Some(record.clone()));
			}
		}
	}
}
