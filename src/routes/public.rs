use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any
/// client. Tender browsing is deliberately public; the identity gateway
/// endpoints (register, login) live here because they are what produce a
/// credential in the first place.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Simple liveness endpoint for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/register
        // Account creation. Returns a session token alongside the new user.
        .route("/auth/register", post(handlers::register_user))
        // POST /auth/login
        // Credential verification and token issuance.
        .route("/auth/login", post(handlers::login_user))
        // GET /tenders
        // Lists all tenders, newest first, with owner names joined in.
        .route("/tenders", get(handlers::get_tenders))
        // GET /tenders/{id}
        // Detailed view of a single tender.
        .route("/tenders/{id}", get(handlers::get_tender_details))
}
