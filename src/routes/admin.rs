use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to administrators: moderation of
/// reported tenders, user oversight, and dashboard statistics.
///
/// Access Control:
/// Every handler takes the `AuthUser` extractor, so unauthenticated requests
/// are rejected before the handler body runs; the admin check itself happens
/// in each handler (via the guard), keeping the policy next to the operation
/// it protects.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/users
        // Lists every registered user (without credential material).
        .route("/users", get(handlers::get_admin_users))
        // GET /admin/reports
        // The moderation queue: every report, enriched, newest first.
        .route("/reports", get(handlers::get_admin_reports))
        // PUT /admin/reports/{id}
        // Closes a report as resolved or rejected via the lifecycle engine.
        .route("/reports/{id}", put(handlers::update_report_status))
        // GET /admin/stats
        // Dashboard counters (users, tenders, reports, pending reports).
        .route("/stats", get(handlers::get_admin_stats))
}
