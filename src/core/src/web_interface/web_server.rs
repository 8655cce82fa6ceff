use log::info;
use std::net::SocketAddr;
use std::sync::Arc;

use warp::{Filter, Rejection, Reply};

use super::routes::{ingest_log_route, list_logs_route, stats_route};
use crate::storage::storage_trait::LogStore;

/// HTTP API receiving captures from agents and serving them to dashboards.
pub struct WebServer {
    storage: Arc<dyn LogStore>,
}

impl WebServer {
    pub fn new(storage: Arc<dyn LogStore>) -> Self {
        Self { storage }
    }

    /// Every route, with CORS open to any origin for `GET` and `POST`.
    pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let cors = warp::cors()
            .allow_any_origin()
            .allow_methods(vec!["GET", "POST"])
            .allow_headers(vec!["content-type"]);

        ingest_log_route(self.storage.clone())
            .or(list_logs_route(self.storage.clone()))
            .or(stats_route(self.storage.clone()))
            .with(cors)
            .with(warp::log("bytebrew::collector"))
    }

    /// Serves the API on `addr` until the process stops.
    pub async fn start(&self, addr: SocketAddr) {
        info!("Collector listening on {}", addr);
        warp::serve(self.routes()).run(addr).await;
    }
}
