//! HTTP endpoint handlers and JSON-RPC methods

use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use crate::{
    error::Error,
    gtfs::MAX_CLOSEST,
    protocol::{
        GetClosestParams, GetStationParams, Station, StationResult, StationsResult,
        SystemStatusResult,
    },
    state::AppState,
};
use super::{
    responses::{HealthResponse, StatusResponse},
    rpc::{handle_payload, RpcError},
};

/// Handle POST /rpc - JSON-RPC 2.0 single requests and batches
pub async fn rpc_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let now = Utc::now();
    let state: &AppState = &state;
    match handle_payload(&body, move |method, params| dispatch(state, method, params, now)).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Route one JSON-RPC call to its method
pub async fn dispatch(
    state: &AppState,
    method: String,
    params: Option<Value>,
    now: DateTime<Utc>,
) -> Result<Value, RpcError> {
    debug!("RPC {}", method);
    match method.as_str() {
        "GetSystemStatus" => to_result(get_system_status(state).await?),
        "GetStations" => to_result(get_stations(state)),
        "GetStation" => to_result(get_station(state, parse_params(params)?, now)?),
        "GetClosestStations" | "GetClosest" => {
            to_result(get_closest_stations(state, parse_params(params)?, now)?)
        }
        _ => Err(RpcError::method_not_found(&method)),
    }
}

/// Per-line subway service status
pub async fn get_system_status(state: &AppState) -> Result<SystemStatusResult, RpcError> {
    let service = state.service_status().await.map_err(internal)?;
    Ok(SystemStatusResult { service })
}

/// All stations with their member stops
pub fn get_stations(state: &AppState) -> StationsResult {
    StationsResult {
        stations: state.network.stations().map(Station::summary).collect(),
    }
}

/// One station with the merged arrivals of all its stops
pub fn get_station(
    state: &AppState,
    params: GetStationParams,
    now: DateTime<Utc>,
) -> Result<StationResult, RpcError> {
    let station = state.network.station(&params.id).map_err(|_| {
        RpcError::invalid_params(format!(
            "Station ID={} is invalid or does not exist.",
            params.id
        ))
    })?;
    let schedule = state.schedule(&station.id, now).map_err(internal)?;

    Ok(StationResult {
        station: Station::with_schedule(station, &schedule),
    })
}

/// The stations nearest to a coordinate, nearest first, with arrivals
pub fn get_closest_stations(
    state: &AppState,
    params: GetClosestParams,
    now: DateTime<Utc>,
) -> Result<StationsResult, RpcError> {
    if !params.lat.is_finite() || !params.lon.is_finite() {
        return Err(RpcError::invalid_params("Lat and Lon must be finite numbers"));
    }

    let count = params.num_stations.unwrap_or(MAX_CLOSEST as i64);
    let stations = state
        .network
        .closest(params.coordinates(), count)
        .into_iter()
        .map(|station| {
            let schedule = state.schedule(&station.id, now).map_err(internal)?;
            Ok(Station::with_schedule(station, &schedule))
        })
        .collect::<Result<Vec<_>, RpcError>>()?;

    Ok(StationsResult { stations })
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, RpcError> {
    serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|e| RpcError::invalid_params(e.to_string()))
}

fn to_result<T: serde::Serialize>(result: T) -> Result<Value, RpcError> {
    serde_json::to_value(result).map_err(|e| RpcError::internal(e.to_string()))
}

fn internal(e: Error) -> RpcError {
    error!("RPC failed: {}", e);
    RpcError::internal(e.to_string())
}

/// Handle GET /status - Return feed health and server metadata
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let (feeds, last_refresh) = match (state.get_feed_statuses(), state.last_refresh()) {
        (Ok(feeds), Ok(last_refresh)) => (feeds, last_refresh),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to get feed status: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    Ok(Json(StatusResponse {
        stations: state.network.station_count(),
        feeds,
        last_refresh,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Redirect plain-HTTP requests (as reported by the load balancer) to https
pub async fn ensure_ssl(request: Request, next: Next) -> Response {
    let forwarded_proto = request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok());
    if forwarded_proto == Some("https") {
        return next.run(request).await;
    }

    let Some(host) = request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|host| !host.is_empty())
    else {
        return (StatusCode::BAD_REQUEST, "missing Host header").into_response();
    };
    let path = request
        .uri()
        .path_and_query()
        .map_or("/", |path_and_query| path_and_query.as_str());

    Redirect::temporary(&format!("https://{}{}", host, path)).into_response()
}
