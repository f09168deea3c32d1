use crate::{
    AppState,
    auth::{self, AuthUser},
    error::ApiError,
    guard::{self, Action},
    models::{
        AdminDashboardStats, AuthResponse, CreateReportRequest, CreateTenderRequest, LoginRequest,
        NewUser, RegisterRequest, Report, Tender, UpdateReportStatusRequest, UpdateTenderRequest,
        User,
    },
    moderation,
    repository::is_unique_violation,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

// --- Validation Helpers ---

fn require_non_blank(value: &str, field: &'static str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_valid_latitude(lat: f64) -> Result<(), ApiError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(ApiError::Validation("latitude out of range".to_string()));
    }
    Ok(())
}

fn require_valid_longitude(lng: f64) -> Result<(), ApiError> {
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(ApiError::Validation("longitude out of range".to_string()));
    }
    Ok(())
}

// --- Auth Handlers ---

/// register_user
///
/// [Public Route] Creates a new account and returns a signed session token.
/// The password is hashed with Argon2id before it reaches the repository.
/// A duplicate email is a conflict, enforced by the unique index on
/// `users.email` so a racing registration cannot slip through.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = AuthResponse),
        (status = 409, description = "Email taken")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    require_non_blank(&payload.name, "name")?;
    require_non_blank(&payload.email, "email")?;
    require_non_blank(&payload.password, "password")?;

    if state.repo.get_user_by_email(&payload.email).await?.is_some() {
        return Err(ApiError::Conflict("account already exists"));
    }

    let password_hash = auth::hash_password(&payload.password)?;
    let new_user = NewUser {
        name: payload.name,
        email: payload.email,
        password_hash,
        is_admin: false,
    };

    // The pre-check above can race another registration; the unique index is
    // the real enforcement point.
    let user = match state.repo.create_user(new_user).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::Conflict("account already exists"));
        }
        Err(e) => return Err(e.into()),
    };

    let token = auth::issue_token(user.id, &state.config.jwt_secret, state.config.token_ttl_secs)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// login_user
///
/// [Public Route] Verifies email and password and returns a fresh session
/// token. Unknown email and wrong password are indistinguishable to the
/// caller.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Bad credentials")
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    require_non_blank(&payload.email, "email")?;
    require_non_blank(&payload.password, "password")?;

    let account = state
        .repo
        .get_user_by_email(&payload.email)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if !auth::verify_password(&payload.password, &account.password_hash)? {
        return Err(ApiError::Unauthenticated);
    }

    let token =
        auth::issue_token(account.id, &state.config.jwt_secret, state.config.token_ttl_secs)?;

    Ok(Json(AuthResponse {
        token,
        user: account.into(),
    }))
}

/// get_current_user
///
/// [Authenticated Route] Returns the caller's own user record.
#[utoipa::path(
    get,
    path = "/auth/user",
    responses((status = 200, description = "Current user", body = User))
)]
pub async fn get_current_user(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(user))
}

// --- Tender Handlers ---

/// get_tenders
///
/// [Public Route] Lists all tenders, newest first, with the owner's name
/// joined in.
#[utoipa::path(
    get,
    path = "/tenders",
    responses((status = 200, description = "All tenders", body = [Tender]))
)]
pub async fn get_tenders(State(state): State<AppState>) -> Result<Json<Vec<Tender>>, ApiError> {
    Ok(Json(state.repo.list_tenders().await?))
}

/// get_tender_details
///
/// [Public Route] Retrieves a single tender by ID.
#[utoipa::path(
    get,
    path = "/tenders/{id}",
    params(("id" = Uuid, Path, description = "Tender ID")),
    responses(
        (status = 200, description = "Found", body = Tender),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_tender_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Tender>, ApiError> {
    let tender = state
        .repo
        .get_tender(id)
        .await?
        .ok_or(ApiError::NotFound("tender"))?;
    Ok(Json(tender))
}

/// create_tender
///
/// [Authenticated Route] Submits a new tender. The owner is always the
/// authenticated caller; it cannot be supplied in the payload.
#[utoipa::path(
    post,
    path = "/tenders",
    request_body = CreateTenderRequest,
    responses((status = 201, description = "Created", body = Tender))
)]
pub async fn create_tender(
    AuthUser { id: owner_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateTenderRequest>,
) -> Result<(StatusCode, Json<Tender>), ApiError> {
    require_non_blank(&payload.title, "title")?;
    require_non_blank(&payload.description, "description")?;
    require_valid_latitude(payload.lat)?;
    require_valid_longitude(payload.lng)?;

    let tender = state
        .repo
        .create_tender(
            owner_id,
            payload.title.trim(),
            payload.description.trim(),
            payload.lat,
            payload.lng,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(tender)))
}

/// update_tender
///
/// [Authenticated Route] Modifies an existing tender. Ownership is read from
/// the current record and checked by the guard; admins may override.
#[utoipa::path(
    put,
    path = "/tenders/{id}",
    params(("id" = Uuid, Path, description = "Tender ID")),
    request_body = UpdateTenderRequest,
    responses(
        (status = 200, description = "Updated", body = Tender),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_tender(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTenderRequest>,
) -> Result<Json<Tender>, ApiError> {
    if let Some(title) = &payload.title {
        require_non_blank(title, "title")?;
    }
    if let Some(description) = &payload.description {
        require_non_blank(description, "description")?;
    }
    if let Some(lat) = payload.lat {
        require_valid_latitude(lat)?;
    }
    if let Some(lng) = payload.lng {
        require_valid_longitude(lng)?;
    }

    let tender = state
        .repo
        .get_tender(id)
        .await?
        .ok_or(ApiError::NotFound("tender"))?;

    guard::authorize(&user, tender.owner_id, Action::Mutate, true).require()?;

    let updated = state
        .repo
        .update_tender(id, payload)
        .await?
        .ok_or(ApiError::NotFound("tender"))?;

    Ok(Json(updated))
}

/// delete_tender
///
/// [Authenticated Route] Removes a tender and, transactionally, every report
/// targeting it. Guarded by the ownership check with admin override.
#[utoipa::path(
    delete,
    path = "/tenders/{id}",
    params(("id" = Uuid, Path, description = "Tender ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_tender(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let tender = state
        .repo
        .get_tender(id)
        .await?
        .ok_or(ApiError::NotFound("tender"))?;

    guard::authorize(&user, tender.owner_id, Action::Delete, true).require()?;

    if state.repo.delete_tender_with_reports(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        // The row vanished between the ownership read and the delete.
        Err(ApiError::NotFound("tender"))
    }
}

/// get_my_tenders
///
/// [Authenticated Route] Lists all tenders owned by the requesting user.
#[utoipa::path(
    get,
    path = "/me/tenders",
    responses((status = 200, description = "My tenders", body = [Tender]))
)]
pub async fn get_my_tenders(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Tender>>, ApiError> {
    Ok(Json(state.repo.get_tenders_by_owner(id).await?))
}

// --- Report Handlers ---

/// create_report
///
/// [Authenticated Route] Files a moderation report against a tender. The
/// lifecycle engine enforces the existence check, the reason validation, and
/// one-report-per-reporter-per-tender.
#[utoipa::path(
    post,
    path = "/reports",
    request_body = CreateReportRequest,
    responses(
        (status = 201, description = "Filed", body = Report),
        (status = 404, description = "Tender missing"),
        (status = 409, description = "Already reported")
    )
)]
pub async fn create_report(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateReportRequest>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let report = moderation::file_report(state.repo.as_ref(), &user, payload).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// get_my_reports
///
/// [Authenticated Route] Lists the reports filed by the requesting user,
/// enriched with the target tender's title.
#[utoipa::path(
    get,
    path = "/me/reports",
    responses((status = 200, description = "My reports", body = [Report]))
)]
pub async fn get_my_reports(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Report>>, ApiError> {
    Ok(Json(state.repo.get_reports_by_reporter(id).await?))
}

// --- Admin Handlers ---

/// get_admin_users
///
/// [Admin Route] Lists every user record (no credential material).
#[utoipa::path(
    get,
    path = "/admin/users",
    responses((status = 200, description = "All users", body = [User]))
)]
pub async fn get_admin_users(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    guard::require_admin(&user).require()?;
    Ok(Json(state.repo.list_users().await?))
}

/// get_admin_reports
///
/// [Admin Route] Lists every report in the system, enriched with reporter
/// name and tender title, newest first.
#[utoipa::path(
    get,
    path = "/admin/reports",
    responses((status = 200, description = "All reports", body = [Report]))
)]
pub async fn get_admin_reports(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Report>>, ApiError> {
    guard::require_admin(&user).require()?;
    Ok(Json(state.repo.list_reports().await?))
}

/// update_report_status
///
/// [Admin Route] Moves a report to a terminal status via the lifecycle
/// engine, which performs the admin check itself.
#[utoipa::path(
    put,
    path = "/admin/reports/{id}",
    params(("id" = Uuid, Path, description = "Report ID")),
    request_body = UpdateReportStatusRequest,
    responses(
        (status = 200, description = "Updated", body = Report),
        (status = 403, description = "Not Admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_report_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReportStatusRequest>,
) -> Result<Json<Report>, ApiError> {
    let report =
        moderation::set_report_status(state.repo.as_ref(), &user, id, payload.status).await?;
    Ok(Json(report))
}

/// get_admin_stats
///
/// [Admin Route] Core application counters for the dashboard.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Stats", body = AdminDashboardStats))
)]
pub async fn get_admin_stats(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardStats>, ApiError> {
    guard::require_admin(&user).require()?;
    Ok(Json(state.repo.get_stats().await?))
}
