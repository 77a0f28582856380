/// API routes and handlers
pub mod extract;
pub mod file;
pub mod health;
pub mod rpc;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(rpc::routes())
        .merge(file::routes())
}
