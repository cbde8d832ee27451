use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use log::*;
use phonegen::{GenerationRequest, Pipeline};
use serde::{Deserialize, Serialize};
use warp::{
	http::{
		header::{CONTENT_DISPOSITION, CONTENT_TYPE},
		StatusCode,
	},
	reply::Response,
	Filter, Rejection, Reply,
};

use crate::delivery::{render_csv, CsvStore, Delivery};
use crate::errors::{ApiResponse, AppError};

/// File name offered to clients when a CSV is returned inline.
const CSV_FILE_NAME: &str = "phone_numbers.csv";

/// Largest request body accepted by `/generate`.
const MAX_BODY_BYTES: u64 = 16 * 1024;

/// Everything a request handler needs. Built once at startup and shared.
pub struct AppState {
	pub pipeline: Pipeline,
	pub delivery: Delivery,
	pub store: CsvStore,
	pub max_amount: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
	pub file_name: String,
}

#[derive(Debug, Serialize)]
pub struct SavedResponse {
	pub message: String,
	pub download_link: String,
}

pub struct HttpServer {
	state: Arc<AppState>,
}

impl HttpServer {
	pub fn new(state: AppState) -> Self {
		Self {
			state: Arc::new(state),
		}
	}

	pub fn routes(
		&self,
	) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone + Send + Sync + 'static {
		let state = self.state.clone();
		let with_state = warp::any().map(move || state.clone());

		// CORS headers for browser frontends
		let cors = warp::cors()
			.allow_any_origin()
			.allow_headers(vec!["content-type"])
			.allow_methods(vec!["GET", "POST", "OPTIONS"]);

		let health = warp::path("health")
			.and(warp::path::end())
			.and(warp::get())
			.map(|| warp::reply::json(&ApiResponse::ok("Server is running")));

		let generate = warp::path("generate")
			.and(warp::path::end())
			.and(warp::post())
			.and(warp::body::content_length_limit(MAX_BODY_BYTES))
			.and(warp::body::json())
			.and(with_state.clone())
			.and_then(handle_generate);

		let download = warp::path("download")
			.and(warp::path::end())
			.and(warp::get())
			.and(warp::query::<DownloadQuery>())
			.and(with_state)
			.and_then(handle_download);

		health
			.or(generate)
			.or(download)
			.recover(handle_rejection)
			.with(cors)
	}

	pub async fn start(&self, addr: SocketAddr) -> anyhow::Result<()> {
		info!(
			"HTTP server starting on {} (mode: {}, delivery: {})",
			addr,
			self.state.pipeline.mode(),
			self.state.delivery.mode()
		);
		info!("Available endpoints:");
		info!("  GET  http://{}/health", addr);
		info!("  POST http://{}/generate", addr);
		info!("  GET  http://{}/download?file_name=...", addr);

		let (addr, server) = warp::serve(self.routes()).try_bind_ephemeral(addr)?;
		debug!("listening on {}", addr);
		server.await;
		Ok(())
	}
}

async fn handle_generate(
	request: GenerationRequest,
	state: Arc<AppState>,
) -> Result<Response, Rejection> {
	match generate(request, state).await {
		Ok(resp) => Ok(resp),
		Err(err) => Ok(err.into_response()),
	}
}

async fn generate(request: GenerationRequest, state: Arc<AppState>) -> Result<Response, AppError> {
	let checked = request.validate(state.max_amount)?;
	debug!(
		"generating {} candidates for {}{}",
		checked.amount(),
		checked.country_code(),
		checked.prefix()
	);

	// synthesis is CPU bound, keep it off the executor threads
	let pipeline_state = state.clone();
	let numbers = tokio::task::spawn_blocking(move || {
		pipeline_state
			.pipeline
			.synthesize(&checked, &mut rand::thread_rng())
	})
	.await?;

	if numbers.is_empty() {
		return Err(AppError::EmptyResult);
	}
	info!("Generated {} valid numbers", numbers.len());

	match &state.delivery {
		Delivery::Csv => Ok(csv_attachment(CSV_FILE_NAME, render_csv(&numbers).into_bytes())),
		Delivery::Remote(sink) => {
			let sink = sink.clone();
			let download_link = tokio::task::spawn_blocking(move || sink.forward(&numbers)).await??;
			Ok(saved(download_link))
		}
		Delivery::Stored => {
			let store = state.store.clone();
			let file_name = tokio::task::spawn_blocking(move || store.save(&numbers)).await??;
			Ok(saved(format!("/download?file_name={}", file_name)))
		}
	}
}

fn saved(download_link: String) -> Response {
	warp::reply::json(&SavedResponse {
		message: "File saved successfully".into(),
		download_link,
	})
	.into_response()
}

async fn handle_download(query: DownloadQuery, state: Arc<AppState>) -> Result<Response, Rejection> {
	let file_name = query.file_name;
	let store = state.store.clone();
	let result = {
		let file_name = file_name.clone();
		tokio::task::spawn_blocking(move || store.open(&file_name)).await
	};
	let resp = match result {
		Ok(Ok(bytes)) => csv_attachment(&file_name, bytes),
		Ok(Err(err)) => AppError::from(err).into_response(),
		Err(err) => AppError::from(err).into_response(),
	};
	Ok(resp)
}

fn csv_attachment(file_name: &str, body: Vec<u8>) -> Response {
	let reply = warp::reply::with_header(body, CONTENT_TYPE, "text/csv");
	warp::reply::with_header(
		reply,
		CONTENT_DISPOSITION,
		format!("attachment; filename=\"{}\"", file_name),
	)
	.into_response()
}

async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
	let (status, message) = if err.is_not_found() {
		(StatusCode::NOT_FOUND, "Not found".to_string())
	} else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
		(StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e))
	} else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
		(StatusCode::BAD_REQUEST, format!("Invalid query: {}", e))
	} else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
		(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large".to_string())
	} else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
		(
			StatusCode::UNSUPPORTED_MEDIA_TYPE,
			"Request body must be JSON".to_string(),
		)
	} else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
		(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
	} else {
		error!("Unhandled rejection: {:?}", err);
		(
			StatusCode::INTERNAL_SERVER_ERROR,
			"Internal server error".to_string(),
		)
	};

	Ok(warp::reply::with_status(warp::reply::json(&ApiResponse::failure(message)), status)
		.into_response())
}
