use crate::{
    app::{App, AppError},
    embed::{iframe_html, parse_episode, parse_tmdb_id},
    scrape::types::ResolutionTier,
    target::{ContentId, MediaTarget},
};
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse},
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::signal;

#[derive(Clone)]
struct SharedState {
    app: Arc<App>,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn router(app: Arc<App>) -> Router {
    let shared_state = Arc::new(SharedState { app });

    Router::new()
        .route("/scrape/video/:id", get(video))
        .route("/scrape/video/:id/jsoup", get(video_direct))
        .route("/scrape/tv/:id/:season/:episode", get(episode_video))
        .route("/scrape/embed/:id", get(scrape_embed))
        .route("/scrape/health", get(health))
        .route("/scrape/cache", delete(cache_clear_all))
        .route("/scrape/cache/stats", get(cache_stats))
        .route("/scrape/cache/:id", delete(cache_clear))
        .route("/embed/movie/:id", get(movie_embed))
        .route("/embed/tv/:id", get(series_embed))
        .route("/embed/tv/:id/:season/:episode", get(episode_embed))
        .route("/embed/tv/:id/:season/:episode/info", get(episode_info))
        .route("/embed/check/movie/:id", get(check_movie))
        .route("/embed/check/tv/:id", get(check_series))
        .route("/embed/check/tv/:id/:season/:episode", get(check_episode))
        .route("/embed/iframe/movie/:id", get(movie_iframe))
        .route("/embed/iframe/tv/:id", get(series_iframe))
        .route("/embed/iframe/tv/:id/:season/:episode", get(episode_iframe))
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                log::error!("failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::warn!("shutting down");
}

pub async fn serve(app: Arc<App>, listen_addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    log::info!("listening on {listen_addr}");

    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Debug)]
struct HttpError(AppError);

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.0 {
            AppError::InvalidIdentifier | AppError::InvalidParameters(_) => {
                axum::http::StatusCode::BAD_REQUEST
            }
            AppError::NotFoundInCatalog(_) => axum::http::StatusCode::NOT_FOUND,
            AppError::IO(_) | AppError::Other(_) => {
                log::error!("{self:?}");
                axum::http::StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(error_body(&self.0.to_string()))).into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

fn error_body(error: &str) -> Value {
    json!({
        "success": false,
        "error": error,
        "timestamp": now_millis(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub success: bool,
    pub movie_id: String,
    pub video_url: String,
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: i64,
}

async fn resolve_target(
    state: &SharedState,
    target: MediaTarget,
) -> Json<VideoResponse> {
    let resolution = state.app.resolver.resolve(&target).await;

    let message = (resolution.tier == ResolutionTier::Embed)
        .then(|| "Direct video URL not found, using embed URL".to_string());

    Json(VideoResponse {
        success: true,
        movie_id: target.id().to_string(),
        video_url: resolution.reference,
        method: resolution.tier.as_str(),
        message,
        timestamp: now_millis(),
    })
}

async fn video(
    State(state): State<Arc<SharedState>>,
    Path(id): Path<String>,
) -> Result<Json<VideoResponse>, HttpError> {
    log::info!("received request to extract video url for {id:?}");
    let id = ContentId::parse(&id)?;

    Ok(resolve_target(&state, MediaTarget::Movie(id)).await)
}

async fn episode_video(
    State(state): State<Arc<SharedState>>,
    Path((id, season, episode)): Path<(String, String, String)>,
) -> Result<Json<VideoResponse>, HttpError> {
    let series = ContentId::parse(&id)?;
    let (season, episode) = parse_episode(&season, &episode)?;

    Ok(resolve_target(
        &state,
        MediaTarget::Episode {
            series,
            season,
            episode,
        },
    )
    .await)
}

async fn video_direct(
    State(state): State<Arc<SharedState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HttpError> {
    let id = ContentId::parse(&id)?;
    let target = MediaTarget::Movie(id.clone());

    match state.app.resolver.resolve_direct(&target).await {
        Some(found) => Ok(Json(json!({
            "success": true,
            "movieId": id.as_str(),
            "videoUrl": found.reference(),
            "method": "jsoup",
        }))),
        None => Ok(Json(error_body("No video URL found"))),
    }
}

async fn scrape_embed(
    State(state): State<Arc<SharedState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HttpError> {
    let id = ContentId::parse(&id)?;
    let embed_url = state.app.resolver.embed_url(&MediaTarget::Movie(id.clone()));
    log::info!("generated embed url for {id}: {embed_url}");

    Ok(Json(json!({
        "success": true,
        "movieId": id.as_str(),
        "embedUrl": embed_url,
    })))
}

async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "service": "Video Scraper Service",
        "status": "running",
        "timestamp": now_millis(),
    }))
}

async fn cache_stats(State(state): State<Arc<SharedState>>) -> Json<Value> {
    let stats = state.app.resolver.cache().stats();
    Json(json!({
        "success": true,
        "cacheSize": stats.cache_size,
        "cachedMovies": stats.cached_movies,
    }))
}

async fn cache_clear(
    State(state): State<Arc<SharedState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HttpError> {
    let id = ContentId::parse(&id)?;
    let removed = state.app.resolver.cache().clear(&id);

    Ok(Json(json!({
        "success": true,
        "movieId": id.as_str(),
        "removed": removed,
    })))
}

async fn cache_clear_all(State(state): State<Arc<SharedState>>) -> Json<Value> {
    state.app.resolver.cache().clear_all();
    Json(json!({ "success": true }))
}

fn embed_body(id: u64, kind: &str, embed_url: String) -> Json<Value> {
    Json(json!({
        "success": true,
        "tmdbId": id,
        "type": kind,
        "embedUrl": embed_url,
        "iframeUrl": embed_url,
    }))
}

async fn movie_embed(
    State(state): State<Arc<SharedState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HttpError> {
    let id = parse_tmdb_id(&id)?;
    let url = state.app.embeds.movie_embed_url(id)?;
    Ok(embed_body(id, "movie", url))
}

async fn series_embed(
    State(state): State<Arc<SharedState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HttpError> {
    let id = parse_tmdb_id(&id)?;
    let url = state.app.embeds.series_embed_url(id)?;
    Ok(embed_body(id, "series", url))
}

async fn episode_embed(
    State(state): State<Arc<SharedState>>,
    Path((id, season, episode)): Path<(String, String, String)>,
) -> Result<Json<Value>, HttpError> {
    let id = parse_tmdb_id(&id)?;
    let (season, episode) = parse_episode(&season, &episode)?;
    let url = state.app.embeds.episode_embed_url(id, season, episode)?;

    let Json(mut body) = embed_body(id, "episode", url);
    body["season"] = json!(season);
    body["episode"] = json!(episode);
    Ok(Json(body))
}

async fn episode_info(
    State(state): State<Arc<SharedState>>,
    Path((id, season, episode)): Path<(String, String, String)>,
) -> Result<Json<Value>, HttpError> {
    let id = parse_tmdb_id(&id)?;
    let (season, episode) = parse_episode(&season, &episode)?;
    let info = state.app.embeds.episode_info(id, season, episode)?;

    Ok(Json(json!({
        "success": true,
        "tmdbId": info.series_id,
        "seriesName": info.series_name,
        "season": info.season_number,
        "episode": info.episode_number,
        "episodeTitle": info.episode_title,
        "episodeOverview": info.episode_overview,
        "embedUrl": info.embed_url,
        "iframeUrl": info.embed_url,
    })))
}

fn exists_body(id: u64, kind: &str, exists: bool) -> Json<Value> {
    Json(json!({
        "success": true,
        "tmdbId": id,
        "type": kind,
        "exists": exists,
    }))
}

async fn check_movie(
    State(state): State<Arc<SharedState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HttpError> {
    let id = parse_tmdb_id(&id)?;
    Ok(exists_body(id, "movie", state.app.embeds.movie_exists(id)))
}

async fn check_series(
    State(state): State<Arc<SharedState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HttpError> {
    let id = parse_tmdb_id(&id)?;
    Ok(exists_body(id, "series", state.app.embeds.series_exists(id)))
}

async fn check_episode(
    State(state): State<Arc<SharedState>>,
    Path((id, season, episode)): Path<(String, String, String)>,
) -> Result<Json<Value>, HttpError> {
    let id = parse_tmdb_id(&id)?;
    let (season, episode) = parse_episode(&season, &episode)?;
    let exists = state.app.embeds.episode_exists(id, season, episode);

    let Json(mut body) = exists_body(id, "episode", exists);
    body["season"] = json!(season);
    body["episode"] = json!(episode);
    Ok(Json(body))
}

async fn movie_iframe(
    State(state): State<Arc<SharedState>>,
    Path(id): Path<String>,
) -> Result<Html<String>, HttpError> {
    let id = parse_tmdb_id(&id)?;
    let url = state.app.embeds.movie_embed_url(id)?;
    Ok(Html(iframe_html(&url)))
}

async fn series_iframe(
    State(state): State<Arc<SharedState>>,
    Path(id): Path<String>,
) -> Result<Html<String>, HttpError> {
    let id = parse_tmdb_id(&id)?;
    let url = state.app.embeds.series_embed_url(id)?;
    Ok(Html(iframe_html(&url)))
}

async fn episode_iframe(
    State(state): State<Arc<SharedState>>,
    Path((id, season, episode)): Path<(String, String, String)>,
) -> Result<Html<String>, HttpError> {
    let id = parse_tmdb_id(&id)?;
    let (season, episode) = parse_episode(&season, &episode)?;
    let url = state.app.embeds.episode_embed_url(id, season, episode)?;
    Ok(Html(iframe_html(&url)))
}
