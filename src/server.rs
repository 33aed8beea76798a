//! HTTP control plane: axum router and request handlers.
//!
//! The rotation loop and the handlers share three things: the global
//! [`ScrollSpeed`] handle, the display status and the matrix itself. A speed
//! change reaches the canvas playing right now through the speed's watch
//! channel; direction changes apply from the next pass.
//!
//! ## Rust concepts
//! - axum extractors: `State`, `Json`
//! - `Arc` for sharing state across async tasks
//! - Serde `Deserialize` for parsing JSON request bodies
//! - `tower-http` middleware for CORS and request tracing

use crate::canvas::{ScrollDirection, ScrollSpeed};
use crate::matrix::SharedMatrix;
use crate::media::{self, MediaEntry};
use crate::render::{DisplayState, DisplayStatus, SharedStatus, lock_status};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// How much `faster` and `slower` change the scroll interval.
pub const SPEED_STEP: Duration = Duration::from_millis(5);

type ApiResult<T> = Result<T, (StatusCode, String)>;

// ── App State ────────────────────────────────────────────────────────

/// Shared application state, cloned into every handler by axum.
#[derive(Clone)]
pub struct AppState {
    /// Speed every canvas of the rotation loop plays at
    pub speed: ScrollSpeed,
    /// Shared display status (rotation loop writes, handlers read)
    pub status: SharedStatus,
    /// The panel, for brightness changes
    pub matrix: SharedMatrix,
    /// Root directory for media files (images/)
    pub media_dir: PathBuf,
}

// ── OpenAPI Documentation ────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    paths(
        get_status,
        get_images,
        post_scroll_speed,
        post_scroll_faster,
        post_scroll_slower,
        post_scroll_direction,
        post_brightness,
    ),
    components(schemas(
        DisplayStatus,
        DisplayState,
        ScrollDirection,
        MediaEntry,
        SpeedRequest,
        SpeedResponse,
        DirectionRequest,
        BrightnessRequest,
    )),
    tags(
        (name = "scroll", description = "Scroll speed and direction"),
        (name = "display", description = "Display control endpoints"),
        (name = "media", description = "Media discovery endpoints"),
        (name = "system", description = "System status endpoints"),
    ),
    info(
        title = "Scroll Matrix API",
        version = env!("CARGO_PKG_VERSION"),
        description = "HTTP API for steering the scroll canvas on an RGB LED matrix"
    )
)]
pub struct ApiDoc;

// ── Request/Response types ───────────────────────────────────────────

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SpeedRequest {
    /// Delay between two scroll steps in milliseconds. Lower is faster.
    #[schema(example = 30, minimum = 1)]
    ms: u64,
}

#[derive(Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct SpeedResponse {
    /// Delay between two scroll steps in milliseconds
    scroll_ms: u64,
}

impl SpeedResponse {
    fn from_speed(speed: &ScrollSpeed) -> Self {
        Self {
            scroll_ms: speed.get().as_millis() as u64,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct DirectionRequest {
    /// `right_to_left` or `bottom_to_top`
    direction: ScrollDirection,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct BrightnessRequest {
    /// Brightness level (0-100)
    #[schema(example = 75, minimum = 0, maximum = 100)]
    value: u8,
}

// ── Router ───────────────────────────────────────────────────────────

/// Build the axum router with all API endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(
            SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", ApiDoc::openapi())
                .config(utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"]).validator_url("none")),
        )
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/images", get(get_images))
        .route("/api/v1/scroll/speed", post(post_scroll_speed))
        .route("/api/v1/scroll/faster", post(post_scroll_faster))
        .route("/api/v1/scroll/slower", post(post_scroll_slower))
        .route("/api/v1/scroll/direction", post(post_scroll_direction))
        .route("/api/v1/brightness", post(post_brightness))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Handlers ─────────────────────────────────────────────────────────

/// GET /api/v1/status: return current display state
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "system",
    responses(
        (status = 200, description = "Current display status", body = DisplayStatus)
    )
)]
async fn get_status(State(state): State<AppState>) -> Json<DisplayStatus> {
    let mut status = lock_status(&state.status).clone();
    status.scroll_ms = state.speed.get().as_millis() as u64;
    Json(status)
}

/// GET /api/v1/images: list the images in the rotation
#[utoipa::path(
    get,
    path = "/api/v1/images",
    tag = "media",
    responses(
        (status = 200, description = "List of available images", body = Vec<MediaEntry>)
    )
)]
async fn get_images(State(state): State<AppState>) -> Json<Vec<MediaEntry>> {
    Json(media::list_images(&state.media_dir))
}

/// POST /api/v1/scroll/speed: set the scroll interval
#[utoipa::path(
    post,
    path = "/api/v1/scroll/speed",
    tag = "scroll",
    request_body = SpeedRequest,
    responses(
        (status = 200, description = "Scroll speed updated", body = SpeedResponse),
        (status = 400, description = "Interval of zero")
    )
)]
async fn post_scroll_speed(
    State(state): State<AppState>,
    Json(req): Json<SpeedRequest>,
) -> ApiResult<Json<SpeedResponse>> {
    if req.ms == 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Scroll interval must be at least 1ms".to_string(),
        ));
    }
    state.speed.set(Duration::from_millis(req.ms));
    Ok(Json(SpeedResponse::from_speed(&state.speed)))
}

/// POST /api/v1/scroll/faster: shorten the scroll interval by one step
///
/// The interval never drops to zero; at the floor this is a no-op.
#[utoipa::path(
    post,
    path = "/api/v1/scroll/faster",
    tag = "scroll",
    responses(
        (status = 200, description = "Current scroll speed", body = SpeedResponse)
    )
)]
async fn post_scroll_faster(State(state): State<AppState>) -> Json<SpeedResponse> {
    let current = state.speed.get();
    match current.checked_sub(SPEED_STEP) {
        Some(faster) if !faster.is_zero() => {
            tracing::info!("Speeding up scroll canvas to {:?}", faster);
            state.speed.set(faster);
        }
        _ => tracing::info!("Scroll speed already at its fastest ({:?})", current),
    }
    Json(SpeedResponse::from_speed(&state.speed))
}

/// POST /api/v1/scroll/slower: lengthen the scroll interval by one step
#[utoipa::path(
    post,
    path = "/api/v1/scroll/slower",
    tag = "scroll",
    responses(
        (status = 200, description = "Current scroll speed", body = SpeedResponse)
    )
)]
async fn post_scroll_slower(State(state): State<AppState>) -> Json<SpeedResponse> {
    let slower = state.speed.get() + SPEED_STEP;
    tracing::info!("Slowing down scroll canvas to {:?}", slower);
    state.speed.set(slower);
    Json(SpeedResponse::from_speed(&state.speed))
}

/// POST /api/v1/scroll/direction: change direction from the next pass on
#[utoipa::path(
    post,
    path = "/api/v1/scroll/direction",
    tag = "scroll",
    request_body = DirectionRequest,
    responses(
        (status = 200, description = "Direction updated"),
        (status = 400, description = "Direction not supported by the scroll canvas")
    )
)]
async fn post_scroll_direction(
    State(state): State<AppState>,
    Json(req): Json<DirectionRequest>,
) -> ApiResult<StatusCode> {
    match req.direction {
        ScrollDirection::RightToLeft | ScrollDirection::BottomToTop => {}
        other => {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("Cannot scroll {other}"),
            ));
        }
    }

    lock_status(&state.status).direction = req.direction;
    tracing::info!("Scroll direction set to {}", req.direction);
    Ok(StatusCode::OK)
}

/// POST /api/v1/brightness: set display brightness (0-100)
#[utoipa::path(
    post,
    path = "/api/v1/brightness",
    tag = "display",
    request_body = BrightnessRequest,
    responses(
        (status = 200, description = "Brightness updated"),
        (status = 400, description = "Value above 100")
    )
)]
async fn post_brightness(
    State(state): State<AppState>,
    Json(req): Json<BrightnessRequest>,
) -> ApiResult<StatusCode> {
    if req.value > 100 {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Brightness {} is above 100", req.value),
        ));
    }

    state.matrix.set_brightness(req.value);
    lock_status(&state.status).brightness = req.value;
    Ok(StatusCode::OK)
}
