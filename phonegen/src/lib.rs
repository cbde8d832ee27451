//! Candidate phone number synthesis.
//!
//! A [`Pipeline`] draws random subscriber suffixes for a country code and
//! prefix, checks each candidate against the numbering plan, and optionally
//! attaches carrier and line type information. How strict it is depends on the
//! configured [`ValidationMode`].

#[macro_use]
extern crate lazy_static;

pub mod carrier;
pub mod numbering;
pub mod pipeline;
pub mod request;

pub use carrier::{CarrierLookup, CarrierTable, CarrierTableError};
pub use numbering::{MetadataPlan, NumberingPlan};
pub use phonenumber::PhoneNumber;
pub use pipeline::{
	draw_candidate, LineType, Pipeline, ValidatedNumber, ValidationMode, SUFFIX_MAX, SUFFIX_MIN,
	UNKNOWN_CARRIER,
};
pub use request::{CheckedRequest, GenerationRequest, RequestError};
