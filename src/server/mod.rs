//! HTTP API over the service reconciler

pub mod handlers;
pub mod state;

pub use handlers::{create_router, ApiError};
pub use state::AppState;
