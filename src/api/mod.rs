//! SIR Pulse snapshot API
//! Read-only JSON view over the monitor's latest poll states

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use middleware::start_cleanup_task;
pub use routes::create_router;
pub use types::*;
