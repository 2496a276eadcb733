//! JSON-RPC client for the arrivals server

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::{
    api::rpc::{RpcError, RpcResponse, JSONRPC_VERSION},
    gtfs::Coordinates,
    protocol::{GetClosestParams, Station, StationsResult},
};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned error: {0}")]
    Rpc(RpcError),
    #[error("response carried neither result nor error")]
    EmptyResponse,
    #[error("unexpected result shape: {0}")]
    InvalidResult(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl RpcClient {
    /// `server` is the base URL of `mtapi serve`, e.g. `http://127.0.0.1:3000`.
    pub fn new(server: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/rpc", server.trim_end_matches('/')),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn call(&self, method: &str, params: Value) -> Result<Value, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": JSONRPC_VERSION,
            "method": method,
            "params": params,
            "id": id,
        });

        debug!("Calling {} (id {})", method, id);
        let response: RpcResponse = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match (response.result, response.error) {
            (_, Some(error)) => Err(ClientError::Rpc(error)),
            (Some(result), None) => Ok(result),
            (None, None) => Err(ClientError::EmptyResponse),
        }
    }

    /// The `count` stations nearest to `at`, each with its arrivals.
    pub async fn get_closest_stations(
        &self,
        at: Coordinates,
        count: i64,
    ) -> Result<Vec<Station>, ClientError> {
        let params = GetClosestParams {
            lat: at.lat,
            lon: at.lon,
            num_stations: Some(count),
        };
        let result = self
            .call("GetClosestStations", serde_json::to_value(params)?)
            .await?;
        let StationsResult { stations } = serde_json::from_value(result)?;
        Ok(stations)
    }
}
