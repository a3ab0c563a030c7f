#![cfg(feature = "web")]

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use http_body_util::BodyExt;
use std::sync::Arc;
use tarif_edf::contract::ContractType;
use tarif_edf::coordinator::TarifCoordinator;
use tower::ServiceExt;

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn tempo_coordinator() -> TarifCoordinator {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.respond(TEMPO_URL, TEMPO_SCHEDULE);
    fetcher.color(day(14), 1);
    fetcher.color(day(15), 3);
    fetcher.color(day(16), 0);
    let mut coordinator = TarifCoordinator::new(config(ContractType::Tempo), fetcher).unwrap();
    coordinator.tick_at(at(15, 23, 30)).await.unwrap();
    coordinator
}

#[tokio::test]
async fn health_reports_version() {
    let coordinator = tempo_coordinator().await;
    let app = tarif_edf::web::router(coordinator.subscribe());
    let (status, body) = get_json(app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], tarif_edf::web::APP_VERSION);
}

#[tokio::test]
async fn state_exposes_the_snapshot() {
    let coordinator = tempo_coordinator().await;
    let app = tarif_edf::web::router(coordinator.subscribe());
    let (status, body) = get_json(app, "/api/state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_update_success"], true);
    assert_eq!(body["state"]["contract_type"], "tempo");
    assert_eq!(body["state"]["tempo"]["current"], "rouge");
    assert_eq!(body["state"]["figures"]["contract_type"], "tempo");
    assert_eq!(body["updated_at"], "2024-03-15T23:30:00");
}

#[tokio::test]
async fn fields_list_only_known_values() {
    let coordinator = tempo_coordinator().await;
    let app = tarif_edf::web::router(coordinator.subscribe());
    let (status, body) = get_json(app, "/api/fields").await;
    assert_eq!(status, StatusCode::OK);

    let fields = body["fields"].as_array().unwrap();
    let find = |key: &str| fields.iter().find(|f| f["key"] == key).cloned();

    let rate = find("tarif_actuel_ttc").unwrap();
    assert_eq!(rate["value"], 0.1568);
    assert_eq!(rate["unit"], "EUR/kWh");
    assert_eq!(rate["kind"], "monetary");

    let next = find("tempo_prochaine_couleur").unwrap();
    assert_eq!(next["value"], "indéterminé");
    assert_eq!(next["options"].as_array().unwrap().len(), 4);

    assert_eq!(find("contract_power").unwrap()["value"], "6");
    // Every catalog entry has a value: 1 power + 5 colors + 2 aliases + 6 rates + fee + active
    assert_eq!(fields.len(), 16);
}

#[tokio::test]
async fn fields_before_first_tick() {
    let fetcher = Arc::new(MockFetcher::new());
    let coordinator = TarifCoordinator::new(config(ContractType::Base), fetcher).unwrap();
    let app = tarif_edf::web::router(coordinator.subscribe());
    let (_, body) = get_json(app, "/api/fields").await;
    assert_eq!(body["last_update_success"], false);
    assert!(body["updated_at"].is_null());
    assert_eq!(body["fields"].as_array().unwrap().len(), 1);
}
