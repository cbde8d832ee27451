use log::*;
use phonegen::RequestError;
use serde::Serialize;
use thiserror::Error;
use warp::http::StatusCode;
use warp::Reply;

use crate::delivery::DeliveryError;

/// JSON envelope for everything the server says that isn't a file.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
	pub success: bool,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<serde_json::Value>,
}

impl ApiResponse {
	pub fn ok(message: impl Into<String>) -> Self {
		Self {
			success: true,
			message: message.into(),
			data: None,
		}
	}

	pub fn failure(message: impl Into<String>) -> Self {
		Self {
			success: false,
			message: message.into(),
			data: None,
		}
	}
}

#[derive(Debug, Error)]
pub enum AppError {
	#[error("{0}")]
	InvalidRequest(#[from] RequestError),
	#[error("No valid phone numbers were generated")]
	EmptyResult,
	#[error(transparent)]
	Delivery(#[from] DeliveryError),
	#[error("Background task failed: {0}")]
	Task(#[from] tokio::task::JoinError),
}

impl AppError {
	pub fn status(&self) -> StatusCode {
		match self {
			AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
			AppError::EmptyResult => StatusCode::UNPROCESSABLE_ENTITY,
			AppError::Delivery(DeliveryError::InvalidFileName(_)) => StatusCode::BAD_REQUEST,
			AppError::Delivery(DeliveryError::NotFound) => StatusCode::NOT_FOUND,
			AppError::Delivery(_) | AppError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	pub fn into_response(self) -> warp::reply::Response {
		let status = self.status();
		if status.is_server_error() {
			error!("{}", self);
		} else {
			debug!("rejecting request: {}", self);
		}
		warp::reply::with_status(
			warp::reply::json(&ApiResponse::failure(self.to_string())),
			status,
		)
		.into_response()
	}
}
