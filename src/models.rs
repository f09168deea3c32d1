use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The API-facing identity record from the `users` table. Never carries the
/// password hash; credential material lives in [`UserAccount`], which is not
/// serializable.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    // The admin flag consulted by the ownership guard.
    pub is_admin: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// UserAccount
///
/// Repository-internal user row including the Argon2id password hash. Used by
/// the login path only; converted to [`User`] before anything leaves the
/// repository boundary.
#[derive(Debug, Clone, FromRow)]
pub struct UserAccount {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserAccount> for User {
    fn from(account: UserAccount) -> Self {
        User {
            id: account.id,
            name: account.name,
            email: account.email,
            is_admin: account.is_admin,
            created_at: account.created_at,
        }
    }
}

/// NewUser
///
/// Repository input for user creation. The password arrives here already
/// hashed; plaintext never crosses the repository boundary.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Tender
///
/// A geo-tagged tender record from the `tenders` table. Owned by exactly one
/// user for its lifetime; the owner never changes.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Tender {
    pub id: Uuid,
    // FK to users.id (Owner). Fixed at creation.
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    // Loaded via a JOIN with users on read paths; absent on queries that
    // skip the join.
    #[sqlx(default)]
    pub owner_name: Option<String>,
}

/// ReportStatus
///
/// The closed moderation lifecycle. `Pending` is the only initial state;
/// `Resolved` and `Rejected` are terminal. Stored as the `report_status`
/// Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default, sqlx::Type,
)]
#[sqlx(type_name = "report_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ReportStatus {
    #[default]
    Pending,
    Resolved,
    Rejected,
}

impl ReportStatus {
    /// True for the states a report can never leave.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ReportStatus::Pending)
    }
}

/// Report
///
/// A moderation report raised by one user against one tender, from the
/// `reports` table. At most one report exists per (tender, reporter) pair,
/// enforced by a storage-level uniqueness constraint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Report {
    pub id: Uuid,
    pub tender_id: Uuid,
    pub reporter_id: Uuid,
    pub reason: String,
    pub status: ReportStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    // Read-side enrichment, loaded via JOINs with users and tenders.
    #[sqlx(default)]
    pub reporter_name: Option<String>,
    #[sqlx(default)]
    pub tender_title: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for the public registration endpoint (POST /auth/register).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// LoginRequest
///
/// Input payload for the login endpoint (POST /auth/login).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// CreateTenderRequest
///
/// Input payload for submitting a new tender (POST /tenders).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateTenderRequest {
    pub title: String,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
}

/// UpdateTenderRequest
///
/// Partial update payload for modifying an existing tender (PUT /tenders/{id}).
/// Uses `Option<T>` for all fields so only provided fields are updated.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateTenderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

/// CreateReportRequest
///
/// Input payload for filing a moderation report (POST /reports).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateReportRequest {
    pub tender_id: Uuid,
    pub reason: String,
}

/// UpdateReportStatusRequest
///
/// Input payload for the admin report-status endpoint
/// (PUT /admin/reports/{id}).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateReportStatusRequest {
    pub status: ReportStatus,
}

// --- Response Schemas (Output) ---

/// AuthResponse
///
/// Output schema for registration and login: the signed session token plus
/// the caller's user record.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// AdminDashboardStats
///
/// Output schema for the administrative statistics dashboard
/// (GET /admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub users: i64,
    pub tenders: i64,
    pub reports: i64,
    /// The number of reports still in the `pending` state.
    pub pending_reports: i64,
}
