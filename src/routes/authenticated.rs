use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has passed the
/// authentication layer. Every handler in this module relies on the
/// `AuthUser` extractor middleware being present on the router layer above,
/// guaranteeing a resolved identity (id + admin flag) which is then used for
/// all ownership checks.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /auth/user
        // The currently authenticated user's own record.
        .route("/auth/user", get(handlers::get_current_user))
        // --- Tender Submission & Maintenance ---
        // POST /tenders
        // Submits a new tender owned by the caller.
        .route("/tenders", post(handlers::create_tender))
        // PUT/DELETE /tenders/{id}
        // Modify or remove a tender. Ownership is enforced by the guard in
        // the handler; admins may override.
        .route(
            "/tenders/{id}",
            put(handlers::update_tender).delete(handlers::delete_tender),
        )
        // GET /me/tenders
        // All tenders owned by the caller.
        .route("/me/tenders", get(handlers::get_my_tenders))
        // --- Moderation Reports ---
        // POST /reports
        // Files a report against a tender. One report per reporter per
        // tender, enforced at the storage layer.
        .route("/reports", post(handlers::create_report))
        // GET /me/reports
        // Reports the caller has filed, with tender titles joined in.
        .route("/me/reports", get(handlers::get_my_reports))
}
