// Web Interface module root
pub mod routes;
pub mod types;
pub mod web_server;

pub use routes::RECENT_LOGS_LIMIT;
pub use types::ApiStatus;
pub use web_server::WebServer;
