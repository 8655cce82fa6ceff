use log::error;
use std::sync::Arc;
use warp::{http::StatusCode, reply, Filter, Rejection, Reply};

use super::types::ApiStatus;
use crate::storage::storage_trait::LogStore;
use crate::storage::types::LogRecord;

/// Records returned by `GET /api/logs`.
pub const RECENT_LOGS_LIMIT: usize = 50;

/// Larger bodies are refused with 413 before being read.
///
/// An SSH packet is at most 256 KiB, and JSON escaping grows a credential at most sixfold.
pub const MAX_BODY_BYTES: u64 = 2 * 1024 * 1024;

/// POST /api/logs
pub fn ingest_log_route(
    storage: Arc<dyn LogStore>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("api" / "logs")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and_then(move |record: LogRecord| {
            let storage = storage.clone();
            async move {
                match storage.insert(record) {
                    Ok(_) => Ok::<_, Rejection>(reply::with_status(
                        reply::json(&ApiStatus::success()),
                        StatusCode::CREATED,
                    )),
                    Err(e) => {
                        error!("Error saving log: {}", e);
                        Ok::<_, Rejection>(reply::with_status(
                            reply::json(&ApiStatus::error(e.to_string())),
                            StatusCode::INTERNAL_SERVER_ERROR,
                        ))
                    }
                }
            }
        })
}

/// GET /api/logs
pub fn list_logs_route(
    storage: Arc<dyn LogStore>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("api" / "logs")
        .and(warp::get())
        .and_then(move || {
            let storage = storage.clone();
            async move {
                match storage.recent(RECENT_LOGS_LIMIT) {
                    Ok(logs) => {
                        Ok::<_, Rejection>(reply::with_status(reply::json(&logs), StatusCode::OK))
                    }
                    Err(e) => {
                        error!("Error fetching logs: {}", e);
                        Ok::<_, Rejection>(reply::with_status(
                            reply::json(&ApiStatus::error(e.to_string())),
                            StatusCode::INTERNAL_SERVER_ERROR,
                        ))
                    }
                }
            }
        })
}

/// GET /api/stats
pub fn stats_route(
    storage: Arc<dyn LogStore>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("api" / "stats")
        .and(warp::get())
        .and_then(move || {
            let storage = storage.clone();
            async move {
                match storage.stats() {
                    Ok(stats) => {
                        Ok::<_, Rejection>(reply::with_status(reply::json(&stats), StatusCode::OK))
                    }
                    Err(e) => {
                        error!("Error fetching stats: {}", e);
                        Ok::<_, Rejection>(reply::with_status(
                            reply::json(&ApiStatus::error(e.to_string())),
                            StatusCode::INTERNAL_SERVER_ERROR,
                        ))
                    }
                }
            }
        })
}
