//! HTTP surface: the two relay routes plus the static/index fallback.

use std::path::PathBuf;

use actix_web::{
    App, HttpResponse, HttpServer,
    http::{StatusCode, header},
    middleware::{DefaultHeaders, Logger},
    web,
};
use anyhow::Context;
use serde_json::json;
use tracing::info;
use weather_core::{Config, ErrorEnvelope, RelayResponse, RelayStatus, Relays};

use crate::assets;

/// Immutable per-process state shared by all workers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub relays: Relays,
    pub static_dir: Option<PathBuf>,
}

/// Raw query pairs, kept in order so repeated keys resolve to their first value.
type QueryPairs = web::Query<Vec<(String, String)>>;

/// Validate configuration, then run the server until it is stopped.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let settings = config.relay_settings()?;
    let relays = Relays::from_settings(&settings)?;
    if let Some(root) = &config.server.static_dir {
        assets::check_root(root)?;
    }

    let host = config.server.host.clone();
    let port = config.server.port;
    info!(
        %host,
        port,
        static_dir = ?config.server.static_dir,
        upstream_timeout = ?settings.upstream_timeout,
        "starting weather relay"
    );

    let state = web::Data::new(AppState {
        relays,
        static_dir: config.server.static_dir.clone(),
    });
    HttpServer::new(move || {
        App::new()
            .wrap(cors_headers())
            .wrap(Logger::default())
            .configure(routes(state.clone()))
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("Failed to bind {host}:{port}"))?
    .run()
    .await
    .context("HTTP server stopped with an error")
}

/// The original deployment allowed any origin; the relay routes are read-only.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new().add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
}

/// Register routes. The static bundle or catch-all must stay last.
pub fn routes(state: web::Data<AppState>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let static_dir = state.static_dir.clone();
        cfg.app_data(state)
            .route("/forecast", web::get().to(forecast))
            .route("/weather", web::get().to(weather));

        match static_dir {
            Some(root) => {
                cfg.service(assets::spa_files(&root));
            }
            None => {
                cfg.route("/", web::get().to(status))
                    .route("/{tail:.*}", web::route().to(not_found));
            }
        }
    }
}

async fn forecast(state: web::Data<AppState>, params: QueryPairs) -> HttpResponse {
    let response = state
        .relays
        .get_forecast(first_param(&params, "city"), first_param(&params, "days"))
        .await;
    relay_response(response)
}

async fn weather(state: web::Data<AppState>, params: QueryPairs) -> HttpResponse {
    let response = state.relays.get_weather(first_param(&params, "city")).await;
    relay_response(response)
}

async fn status() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "API is operational" }))
}

async fn not_found() -> HttpResponse {
    envelope(StatusCode::NOT_FOUND, "Not found")
}

fn first_param<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn relay_response(response: RelayResponse) -> HttpResponse {
    HttpResponse::build(status_code(response.status)).json(response.body)
}

fn status_code(status: RelayStatus) -> StatusCode {
    match status {
        RelayStatus::Ok => StatusCode::OK,
        RelayStatus::BadRequest => StatusCode::BAD_REQUEST,
        RelayStatus::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn envelope(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(ErrorEnvelope::new(message))
}
