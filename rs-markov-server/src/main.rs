use std::sync::RwLock;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, put, web};

use rs_markov_core::io::list_files;
use rs_markov_core::model::generator::CORPUS_EXTENSION;
use rs_markov_core::{Generator, MarkovConfig, MarkovError};
use serde::Deserialize;

/// Default listening address, overridden by `MARKOV_BIND`.
const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Query parameters of the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	corpus: Option<String>, // random loaded corpus if missing
	min_length: Option<usize>,
}

#[derive(Deserialize)]
struct CorpusQuery {
	names: Option<String>,
}

struct SharedData {
	generator: Generator,
}

/// Maps library errors to HTTP statuses.
fn error_response(e: MarkovError) -> HttpResponse {
	match e {
		MarkovError::UnknownCorpus(_) => HttpResponse::NotFound().body(e.to_string()),
		MarkovError::UnreachableMinLength { .. } => HttpResponse::UnprocessableEntity().body(e.to_string()),
		MarkovError::EmptyCorpus | MarkovError::InvalidConfig(_) => HttpResponse::BadRequest().body(e.to_string()),
		_ => HttpResponse::InternalServerError().body(e.to_string()),
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates a sentence from the requested corpus (or a random loaded one).
/// Synthesis runs on the blocking pool under the read lock only: the
/// indexes are never mutated.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<RwLock<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let corpus = query.corpus.as_deref().map(str::trim).filter(|name| !name.is_empty()).map(str::to_owned);
	let min_length = query.min_length;
	let data = data.clone();

	let result = web::block(move || -> Result<rs_markov_core::Result<String>, &'static str> {
		let shared_data = data.read().map_err(|_| "Generator lock failed")?;
		let generator = &shared_data.generator;
		let min_length = min_length.unwrap_or(generator.config().min_sentence_length);
		Ok(match corpus {
			Some(name) => generator.generate_sentence(&name, min_length),
			None => generator.generate_random(min_length).map(|(_, sentence)| sentence),
		})
	})
	.await;

	match result {
		Ok(Ok(Ok(sentence))) => HttpResponse::Ok().body(sentence),
		Ok(Ok(Err(e))) => {
			log::debug!("Generation failed: {e}");
			error_response(e)
		}
		Ok(Err(message)) => HttpResponse::InternalServerError().body(message),
		Err(_) => HttpResponse::InternalServerError().body("Generation task failed"),
	}
}

#[get("/v1/corpora")]
async fn get_corpora(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	let data_dir = match data.read() {
		Ok(d) => d.generator.config().data_dir.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	};
	let suffix = format!(".{CORPUS_EXTENSION}");
	match list_files(&data_dir, CORPUS_EXTENSION) {
		Ok(files) => HttpResponse::Ok().body(
			files.iter().map(|f| f.trim_end_matches(&suffix)).collect::<Vec<_>>().join("\n"),
		),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list corpora"),
	}
}

#[get("/v1/loaded_corpora")]
async fn get_loaded_corpora(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	let shared_data = match data.read() {
		Ok(d) => d,
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	};
	HttpResponse::Ok().body(shared_data.generator.corpus_names().join("\n"))
}

/// HTTP PUT endpoint `/v1/load_corpora?names=a,b`
///
/// Replaces the loaded set with the named corpora. Indexes are built on
/// the blocking pool without holding the lock, then swapped in at once;
/// if any name fails the loaded set is left as it was.
#[put("/v1/load_corpora")]
async fn put_corpora(data: web::Data<RwLock<SharedData>>, query: web::Query<CorpusQuery>) -> impl Responder {
	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};

	let names: Vec<String> = query_names
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.map(str::to_owned)
		.collect();

	let config = match data.read() {
		Ok(d) => d.generator.config().clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	};

	let corpora = match web::block(move || Generator::build_corpora(&config, &names)).await {
		Ok(Ok(corpora)) => corpora,
		Ok(Err(e)) => {
			log::warn!("Failed to load corpora '{query_names}': {e}");
			return error_response(e);
		}
		Err(_) => return HttpResponse::InternalServerError().body("Loading task failed"),
	};

	match data.write() {
		Ok(mut d) => d.generator.replace_corpora(corpora),
		Err(_) => return HttpResponse::InternalServerError().body("Generator lock failed"),
	}

	HttpResponse::Ok().body("Corpora loaded successfully")
}

/// Main entry point for the server.
///
/// Reads `markov.toml` if present, loads every corpus of the data folder,
/// and serves the REST API on `MARKOV_BIND` (default 127.0.0.1:5000).
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();

	let config = MarkovConfig::load_or_default("markov.toml").map_err(std::io::Error::other)?;
	let generator = match Generator::new(config.clone()) {
		Ok(generator) => generator,
		Err(e) => {
			log::warn!("Starting with no corpus loaded: {e}");
			Generator::empty(config).map_err(std::io::Error::other)?
		}
	};
	let shared_data = web::Data::new(RwLock::new(SharedData { generator }));

	let bind = std::env::var("MARKOV_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_owned());
	log::info!("Listening on {bind}");

	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.service(get_generated)
			.service(get_corpora)
			.service(get_loaded_corpora)
			.service(put_corpora)
	})
		.bind(bind)?
		.run()
		.await
}
