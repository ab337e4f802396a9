use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use platform_api::{ApiError, ApiResult, require};
use platform_authz::{Engine, ResourceRecord, ResourceView};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use uuid::Uuid;

use crate::{auth, config::AppConfig, directory::Directory};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub directory: Arc<Directory>,
    pub config: Arc<AppConfig>,
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "sitedesk server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/{kind}", get(list_handler).post(create_handler))
        .route(
            "/v1/{kind}/{id}",
            get(view_handler).put(update_handler).delete(delete_handler),
        )
        .route("/v1/{kind}/{id}/{action}", post(action_handler))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        rules: state.engine.table().len(),
        resources: state.directory.len(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    rules: usize,
    resources: usize,
    version: &'static str,
}

#[derive(Serialize)]
struct ResourceSummary {
    kind: String,
    id: Uuid,
    tenant: Option<String>,
    state: Option<String>,
}

impl From<&ResourceRecord> for ResourceSummary {
    fn from(record: &ResourceRecord) -> Self {
        ResourceSummary {
            kind: record.kind.clone(),
            id: record.id,
            tenant: record.tenant.as_ref().map(|t| t.as_str().to_string()),
            state: record.state.clone(),
        }
    }
}

#[derive(Serialize)]
struct ActionOutcome {
    ok: bool,
    action: String,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,
}

#[derive(Deserialize)]
struct CreateBody {
    #[serde(default)]
    parent: Option<ParentRef>,
}

#[derive(Deserialize)]
struct ParentRef {
    kind: String,
    id: Uuid,
}

/// Existence hiding applies to reads only; mutations answer 403 outright.
fn hide_existence(state: &AppState, action: &str) -> bool {
    state.config.hide_forbidden && action == "view"
}

/// Shared path for every route that targets a loaded record.
fn check_on_record(
    state: &AppState,
    headers: &HeaderMap,
    action: &str,
    kind: &str,
    id: Uuid,
) -> ApiResult<ResourceRecord> {
    let principal = auth::bearer_principal(headers, &state.config)?;
    let record = state.directory.get(kind, id).ok_or(ApiError::NotFound)?;
    let parent = state.directory.parent_of(record);
    let decision = state.engine.authorize(
        &principal,
        action,
        kind,
        Some(record as &dyn ResourceView),
        parent.map(|p| p as &dyn ResourceView),
    )?;
    require(decision, hide_existence(state, action))?;
    Ok(record.clone())
}

async fn list_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<ResourceSummary>>> {
    let principal = auth::bearer_principal(&headers, &state.config)?;
    let decision = state
        .engine
        .authorize(&principal, "view_any", &kind, None, None)?;
    require(decision, false)?;

    let mut visible = Vec::new();
    for record in state.directory.list(&kind) {
        let parent = state.directory.parent_of(record);
        let decision = state.engine.authorize(
            &principal,
            "view",
            &kind,
            Some(record as &dyn ResourceView),
            parent.map(|p| p as &dyn ResourceView),
        )?;
        if decision.is_allow() {
            visible.push(ResourceSummary::from(record));
        }
    }
    Ok(Json(visible))
}

async fn view_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    headers: HeaderMap,
) -> ApiResult<Json<ResourceRecord>> {
    let record = check_on_record(&state, &headers, "view", &kind, id)?;
    Ok(Json(record))
}

async fn create_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    body: Option<Json<CreateBody>>,
) -> ApiResult<(StatusCode, Json<ActionOutcome>)> {
    let principal = auth::bearer_principal(&headers, &state.config)?;
    let parent = body
        .as_ref()
        .and_then(|b| b.parent.as_ref())
        .map(|p| state.directory.get(&p.kind, p.id).ok_or(ApiError::NotFound))
        .transpose()?;
    let decision = state.engine.authorize(
        &principal,
        "create",
        &kind,
        None,
        parent.map(|p| p as &dyn ResourceView),
    )?;
    require(decision, false)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ActionOutcome {
            ok: true,
            action: "create".to_string(),
            kind,
            id: None,
        }),
    ))
}

async fn update_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    headers: HeaderMap,
) -> ApiResult<(StatusCode, Json<ActionOutcome>)> {
    check_on_record(&state, &headers, "update", &kind, id)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ActionOutcome {
            ok: true,
            action: "update".to_string(),
            kind,
            id: Some(id),
        }),
    ))
}

async fn delete_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    headers: HeaderMap,
) -> ApiResult<(StatusCode, Json<ActionOutcome>)> {
    check_on_record(&state, &headers, "delete", &kind, id)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ActionOutcome {
            ok: true,
            action: "delete".to_string(),
            kind,
            id: Some(id),
        }),
    ))
}

async fn action_handler(
    State(state): State<AppState>,
    Path((kind, id, action)): Path<(String, Uuid, String)>,
    headers: HeaderMap,
) -> ApiResult<(StatusCode, Json<ActionOutcome>)> {
    check_on_record(&state, &headers, &action, &kind, id)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ActionOutcome {
            ok: true,
            action,
            kind,
            id: Some(id),
        }),
    ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}
