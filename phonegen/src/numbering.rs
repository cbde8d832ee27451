use log::*;
use phonenumber::{metadata::DATABASE, PhoneNumber, Type};

use crate::pipeline::LineType;

/// Knows which numbers are actually allocated in a country's numbering plan.
pub trait NumberingPlan {
	/// Parse `candidate` and return it only if it is a valid number for its region.
	///
	/// `candidate` is expected in international form, ie. starting with `+` and the country code.
	fn parse_valid(&self, candidate: &str) -> Option<PhoneNumber>;

	fn line_type(&self, number: &PhoneNumber) -> LineType;
}

/// Numbering plan backed by the libphonenumber metadata bundled with the `phonenumber` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataPlan;

impl NumberingPlan for MetadataPlan {
	fn parse_valid(&self, candidate: &str) -> Option<PhoneNumber> {
		let number = match phonenumber::parse(None, candidate) {
			Ok(number) => number,
			Err(err) => {
				trace!("{}: failed to parse: {}", candidate, err);
				return None;
			}
		};

		if !number.is_valid() {
			trace!("{}: not a valid number for its region", candidate);
			return None;
		}

		Some(number)
	}

	fn line_type(&self, number: &PhoneNumber) -> LineType {
		match number.number_type(&DATABASE) {
			Type::Mobile => LineType::Mobile,
			Type::FixedLine => LineType::Landline,
			_ => LineType::Unknown,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_accepts_example_numbers() {
		let plan = MetadataPlan;
		// libphonenumber's own example numbers for GB
		assert!(plan.parse_valid("+447400123456").is_some());
		assert!(plan.parse_valid("+441212345678").is_some());
	}

	#[test]
	fn test_rejects_impossible_numbers() {
		let plan = MetadataPlan;
		// UK national numbers are never 11 digits long
		assert!(plan.parse_valid("+4477001234567").is_none());
		assert!(plan.parse_valid("+44").is_none());
		assert!(plan.parse_valid("not a number").is_none());
		assert!(plan.parse_valid("").is_none());
	}

	#[test]
	fn test_line_types() {
		let plan = MetadataPlan;
		let mobile = plan.parse_valid("+447400123456").unwrap();
		assert_eq!(plan.line_type(&mobile), LineType::Mobile);
		let landline = plan.parse_valid("+441212345678").unwrap();
		assert_eq!(plan.line_type(&landline), LineType::Landline);
	}

	#[test]
	fn test_validation_is_deterministic() {
		let plan = MetadataPlan;
		for candidate in ["+447400123456", "+4477001234567", "+12015550123", "+999123"] {
			let first = plan.parse_valid(candidate).is_some();
			for _ in 0..3 {
				assert_eq!(plan.parse_valid(candidate).is_some(), first, "{}", candidate);
			}
		}
	}
}
