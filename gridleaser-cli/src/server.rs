use std::sync::Arc;
use tokio::sync::Mutex;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{Html, Response},
    routing::{get, post},
    Json, Router,
};
use nanoid::nanoid;
use tower_http::cors::CorsLayer;

use gridleaser_client::now_ms;
use gridleaser_core::infrastructure::{StoreError, TaskStore};
use gridleaser_core::infrastructure_in_memory::InMemoryTaskStore;
use gridleaser_core::scheduler::TaskScheduler;
use gridleaser_core::types::TaskResult;

use crate::handlers::*;
use crate::job::RangeSearchJob;

pub type AppState = Arc<Mutex<TaskScheduler>>;

pub async fn run(host: &str, port: u16, storage: &str, job: RangeSearchJob) {
    let store = create_store(storage);
    let scheduler = TaskScheduler::new(store, Box::new(job));
    let state: AppState = Arc::new(Mutex::new(scheduler));

    let app = Router::new()
        .route("/login/", get(login))
        .route("/task/", get(get_task))
        .route("/task/", post(post_task))
        .route("/stat.json", get(stat_json))
        .route("/stat.html", get(stat_html))
        .layer(middleware::from_fn(auth_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    tracing::info!("gridleaser server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}

// ─── Auth Middleware ────────────────────────────────────────────────────────

/// Task traffic must look like the logged-in worker: the XHR marker header
/// plus the uid cookie handed out by /login/. Stats need the cookie only;
/// /login/ is always open.
async fn auth_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let path = request.uri().path();
    let authorized = if path.starts_with("/task/") {
        is_xhr(&headers) && uid_cookie(&headers).is_some()
    } else if path.starts_with("/stat") {
        uid_cookie(&headers).is_some()
    } else {
        true
    };

    if authorized {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("unauthorized request to {}", path);
        Err(StatusCode::FORBIDDEN)
    }
}

// ─── Handlers ───────────────────────────────────────────────────────────────

async fn login() -> ([(header::HeaderName, String); 1], Json<ApiResponse<LoginResponse>>) {
    let uid = nanoid!();
    tracing::info!(uid = %uid, "client logged in");
    (
        [(
            header::SET_COOKIE,
            format!("uid={uid}; Path=/; HttpOnly"),
        )],
        Json(ApiResponse::ok(LoginResponse { uid })),
    )
}

async fn get_task(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<serde_json::Value>) {
    let uid = uid_cookie(&headers);
    let mut scheduler = state.lock().await;
    match scheduler.lease(uid.as_deref(), now_ms()) {
        Ok(reply) => (StatusCode::OK, Json(serde_json::json!(reply))),
        Err(err) => store_failure(err),
    }
}

async fn post_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(results): Json<Vec<TaskResult>>,
) -> (StatusCode, Json<serde_json::Value>) {
    let uid = uid_cookie(&headers);
    let mut scheduler = state.lock().await;
    match scheduler.report(uid.as_deref(), &results, now_ms()) {
        Ok(reply) => {
            if scheduler.is_complete() {
                tracing::info!("job complete");
            }
            (StatusCode::OK, Json(serde_json::json!(reply)))
        }
        Err(err) => store_failure(err),
    }
}

async fn stat_json(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let scheduler = state.lock().await;
    match scheduler.stats(now_ms()) {
        Ok(stats) => (StatusCode::OK, Json(serde_json::json!(stats))),
        Err(err) => store_failure(err),
    }
}

async fn stat_html(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let scheduler = state.lock().await;
    let stats = scheduler.stats(now_ms()).map_err(|err| {
        tracing::error!(error = %err, "store failure");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    // Owner tokens and winner payloads come straight from clients; escape
    // everything interpolated into the page
    let mut owners = String::new();
    for (owner, count) in &stats.owners {
        owners.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape_html(owner),
            count
        ));
    }
    let winner = stats
        .winner
        .as_ref()
        .map(|w| escape_html(&format!("unit {}: {}", w.id, w.data)))
        .unwrap_or_else(|| "—".to_string());

    Ok(Html(format!(
        "<!DOCTYPE html>\n<html><head><title>gridleaser</title></head><body>\n\
         <h1>gridleaser</h1>\n\
         <p>{done} / {total} units done ({percent:.1}%)</p>\n\
         <p>issued: {issued}, received: {received}, in flight: {in_flight}</p>\n\
         <p>complete: {complete}, winner: {winner}</p>\n\
         <table><tr><th>client</th><th>done</th></tr>\n{owners}</table>\n\
         </body></html>\n",
        done = stats.done,
        total = stats.total,
        percent = stats.percent_done,
        issued = stats.issued,
        received = stats.received,
        in_flight = stats.in_flight,
        complete = stats.complete,
    )))
}

fn store_failure(err: StoreError) -> (StatusCode, Json<serde_json::Value>) {
    tracing::error!(error = %err, "store failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!(ApiResponse::<()>::err(err.to_string()))),
    )
}

// ─── Storage Backend Selection ──────────────────────────────────────────────

fn create_store(storage: &str) -> Box<dyn TaskStore + Send> {
    if storage == "memory" {
        tracing::info!("storage backend: in-memory (leases will not persist)");
        Box::new(InMemoryTaskStore::new())
    } else if let Some(path) = storage.strip_prefix("sqlite:") {
        #[cfg(feature = "sqlite")]
        {
            use gridleaser_core::infrastructure_sqlite::SqliteTaskStore;
            tracing::info!("storage backend: SQLite ({})", path);
            match SqliteTaskStore::open(path) {
                Ok(store) => Box::new(store),
                Err(e) => {
                    tracing::error!("Failed to open SQLite: {}. Falling back to in-memory.", e);
                    Box::new(InMemoryTaskStore::new())
                }
            }
        }
        #[cfg(not(feature = "sqlite"))]
        {
            tracing::error!(
                "SQLite storage requested but `sqlite` feature is not enabled. \
                 Rebuild with: cargo build --features sqlite"
            );
            tracing::warn!("Falling back to in-memory storage.");
            let _ = path;
            Box::new(InMemoryTaskStore::new())
        }
    } else {
        tracing::error!(
            "Unknown storage backend: '{}'. Use 'memory' or 'sqlite:<path>'",
            storage
        );
        tracing::warn!("Falling back to in-memory storage.");
        Box::new(InMemoryTaskStore::new())
    }
}
