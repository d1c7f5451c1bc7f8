use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json,
};
use serde_json::json;
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::Context;
use traffic_predictor::error::PredictError;
use traffic_predictor::features;
use traffic_predictor::level::TrafficLevel;
use traffic_predictor::model::Model;
use traffic_predictor::store::{self, DataStore};
use traffic_predictor::types::{PredictRequest, PredictResponse};

// ---------- Server state ----------

#[derive(Clone)]
struct AppState {
    store: Arc<DataStore>,
    model: Arc<Model>,
}

// ---------- Error mapping ----------

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, msg: String) -> ApiError {
    (status, Json(json!({ "error": msg })))
}

fn predict_error(err: PredictError) -> ApiError {
    api_error(err.http_status(), err.to_string())
}

// ---------- Handlers ----------

async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let target = store::parse_datetime(&req.datetime).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("unparseable datetime {:?}", req.datetime),
        )
    })?;

    let features = features::generate(&state.store, req.junction, target)
        .map_err(predict_error)?;
    let predicted = state.model.predict(&features).map_err(predict_error)?;
    let level = TrafficLevel::classify(predicted, &state.store.thresholds());

    tracing::info!(
        "junction={} target={} predicted={:.1} level={}",
        req.junction,
        target,
        predicted,
        level
    );

    let ts_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);
    Ok(Json(PredictResponse {
        junction: req.junction,
        datetime: target.to_string(),
        predicted_vehicles: predicted as i64,
        traffic_level: level,
        features,
        ts_ms,
    }))
}

async fn junctions(State(state): State<AppState>) -> Json<Vec<u32>> {
    Json(state.store.junctions())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let data_path = std::env::var("DATA_PATH").context("DATA_PATH not set")?;
    let model_path = std::env::var("MODEL_PATH").context("MODEL_PATH not set")?;
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    // One-time startup initialization; the store and model stay immutable for
    // the process lifetime.
    let store = DataStore::load(&data_path)?;
    let thresholds = store.thresholds();
    tracing::info!(
        "loaded {} records for junctions {:?}; level thresholds p70={:.1} p90={:.1}",
        store.record_count(),
        store.junctions(),
        thresholds.p70,
        thresholds.p90
    );

    let model = Model::load(&model_path)?;
    // Warmup forward; proves the artifact accepts the expected dimension.
    model.predict_raw(&vec![0.0; model.in_dim()])?;
    tracing::info!("model artifact ok; {} input features", model.in_dim());

    let state = AppState {
        store: Arc::new(store),
        model: Arc::new(model),
    };

    let app = axum::Router::new()
        .route("/predict", post(predict))
        .route("/junctions", get(junctions))
        .with_state(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
