use std::time::Duration;

use log::*;
use phonegen::ValidatedNumber;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use super::DeliveryError;

#[derive(Debug, Clone)]
pub struct RemoteConfig {
	/// Where result sets are POSTed.
	pub endpoint: String,
	/// Base URL the remote API serves its saved files from. The returned `file_name` is appended to it.
	pub download_base: String,
	pub timeout: Duration,
	/// Skip TLS certificate verification for the remote API.
	pub accept_invalid_certs: bool,
}

#[derive(Debug, Serialize)]
struct ForwardPayload<'a> {
	numbers: Vec<ForwardedNumber<'a>>,
}

#[derive(Debug, Serialize)]
struct ForwardedNumber<'a> {
	phone_number: &'a str,
	carrier: &'a str,
}

#[derive(Debug, Deserialize)]
struct RemoteResponse {
	file_name: Option<String>,
}

/// Hands result sets off to an external API that persists them.
///
/// Uses a blocking client, so calls must not happen directly on an async executor thread.
#[derive(Debug)]
pub struct RemoteSink {
	client: reqwest::blocking::Client,
	endpoint: Url,
	download_base: String,
}

impl RemoteSink {
	pub fn new(config: RemoteConfig) -> anyhow::Result<Self> {
		let endpoint: Url = config.endpoint.parse()?;
		if config.accept_invalid_certs {
			warn!("TLS certificate verification is disabled for {}", endpoint);
		}
		let client = reqwest::blocking::Client::builder()
			.timeout(config.timeout)
			.danger_accept_invalid_certs(config.accept_invalid_certs)
			.build()?;
		Ok(Self {
			client,
			endpoint,
			download_base: config.download_base,
		})
	}

	/// Send `numbers` to the remote API and return the download link for the file it saved.
	pub fn forward(&self, numbers: &[ValidatedNumber]) -> Result<String, DeliveryError> {
		let payload = ForwardPayload {
			numbers: numbers
				.iter()
				.map(|n| ForwardedNumber {
					phone_number: &n.phone_number,
					carrier: &n.carrier,
				})
				.collect(),
		};

		debug!("HTTP Request: POST {} ({} numbers)", self.endpoint, numbers.len());
		let resp = self
			.client
			.post(self.endpoint.clone())
			.json(&payload)
			.send()?;
		let status = resp.status();
		debug!("Response HTTP status: {}", status);
		let body = resp.text()?;
		trace!("Response body: {}", body);

		interpret_response(status, &body, &self.download_base)
	}
}

fn interpret_response(
	status: StatusCode,
	body: &str,
	download_base: &str,
) -> Result<String, DeliveryError> {
	if status != StatusCode::OK {
		return Err(DeliveryError::RemoteStatus {
			status: status.as_u16(),
			body: body.to_owned(),
		});
	}

	let resp: RemoteResponse =
		serde_json::from_str(body).map_err(DeliveryError::MalformedResponse)?;
	match resp.file_name {
		Some(file_name) if !file_name.is_empty() => Ok(format!(
			"{}/{}",
			download_base.trim_end_matches('/'),
			file_name
		)),
		_ => Err(DeliveryError::MissingFileName),
	}
}
