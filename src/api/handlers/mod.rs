//! REST endpoint handlers organized by resource.

pub mod admin;
pub mod sync;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes the sync and admin trigger routes.
pub fn routes() -> Router<AppState> {
    Router::new().merge(sync::routes()).merge(admin::routes())
}
