//! Read-only HTTP status API (axum)

use crate::error::{Result, TarifError};
use crate::logging::get_logger;
use crate::snapshot::{FieldDescriptor, FieldValue, Snapshot};
use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub const APP_VERSION: &str = env!("APP_VERSION");

#[derive(Clone)]
pub struct AppState {
    pub snapshots: watch::Receiver<Arc<Snapshot>>,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

/// A catalog entry together with its current value
#[derive(Serialize)]
struct FieldEntry {
    #[serde(flatten)]
    descriptor: FieldDescriptor,
    value: FieldValue,
}

#[derive(Serialize)]
struct FieldsResponse {
    last_update_success: bool,
    updated_at: Option<NaiveDateTime>,
    fields: Vec<FieldEntry>,
}

async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(Health {
            status: "ok",
            version: APP_VERSION,
        }),
    )
}

async fn state(State(app): State<AppState>) -> impl IntoResponse {
    let snapshot = app.snapshots.borrow().clone();
    Json(Snapshot::clone(&snapshot))
}

async fn fields(State(app): State<AppState>) -> impl IntoResponse {
    let snapshot = app.snapshots.borrow().clone();
    let mut values = snapshot.state.fields();
    let fields = snapshot
        .catalog()
        .into_iter()
        .filter_map(|descriptor| {
            values.remove(&descriptor.key).map(|value| FieldEntry { descriptor, value })
        })
        .collect();

    Json(FieldsResponse {
        last_update_success: snapshot.last_update_success,
        updated_at: snapshot.updated_at,
        fields,
    })
}

pub fn router(snapshots: watch::Receiver<Arc<Snapshot>>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/state", get(state))
        .route("/api/fields", get(fields))
        .with_state(AppState { snapshots })
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(snapshots: watch::Receiver<Arc<Snapshot>>, host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| TarifError::web(format!("Invalid bind address {}:{}: {}", host, port, e)))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| TarifError::web(format!("Failed to bind {}: {}", addr, e)))?;
    get_logger("web").info(&format!("Status API listening on http://{}", addr));
    axum::serve(listener, router(snapshots))
        .await
        .map_err(|e| TarifError::web(e.to_string()))?;
    Ok(())
}
