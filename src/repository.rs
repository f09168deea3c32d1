use crate::models::{
    AdminDashboardStats, NewUser, Report, ReportStatus, Tender, UpdateTenderRequest, User,
    UserAccount,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, allowing the
/// handlers and the moderation engine to interact with the data layer without
/// knowing the specific implementation (Postgres, Mock, etc.).
///
/// Every method returns `Result`: a persistence failure is propagated to the
/// caller unchanged, never reduced to an empty result. Each method is a
/// single logical call; multi-statement operations run inside a transaction
/// so partial completion cannot be observed.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn create_user(&self, new_user: NewUser) -> Result<User, sqlx::Error>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;
    // Login path: includes the password hash.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, sqlx::Error>;
    // Admin access: all user records, newest first.
    async fn list_users(&self) -> Result<Vec<User>, sqlx::Error>;

    // --- Tenders ---
    async fn list_tenders(&self) -> Result<Vec<Tender>, sqlx::Error>;
    async fn get_tender(&self, id: Uuid) -> Result<Option<Tender>, sqlx::Error>;
    async fn get_tenders_by_owner(&self, owner_id: Uuid) -> Result<Vec<Tender>, sqlx::Error>;
    async fn create_tender(
        &self,
        owner_id: Uuid,
        title: &str,
        description: &str,
        lat: f64,
        lng: f64,
    ) -> Result<Tender, sqlx::Error>;
    // Updates by id only; the ownership decision is made by the guard before
    // this is called.
    async fn update_tender(
        &self,
        id: Uuid,
        req: UpdateTenderRequest,
    ) -> Result<Option<Tender>, sqlx::Error>;
    // Removes the tender and every report targeting it as one transaction.
    async fn delete_tender_with_reports(&self, id: Uuid) -> Result<bool, sqlx::Error>;

    // --- Reports ---
    // Returns `None` when a report already exists for (tender_id,
    // reporter_id); the uniqueness constraint makes the check-and-insert
    // atomic.
    async fn insert_report(
        &self,
        tender_id: Uuid,
        reporter_id: Uuid,
        reason: &str,
    ) -> Result<Option<Report>, sqlx::Error>;
    async fn find_report(
        &self,
        tender_id: Uuid,
        reporter_id: Uuid,
    ) -> Result<Option<Report>, sqlx::Error>;
    async fn get_report(&self, id: Uuid) -> Result<Option<Report>, sqlx::Error>;
    // Admin access: all reports, enriched, newest first.
    async fn list_reports(&self) -> Result<Vec<Report>, sqlx::Error>;
    async fn get_reports_by_reporter(
        &self,
        reporter_id: Uuid,
    ) -> Result<Vec<Report>, sqlx::Error>;
    async fn update_report_status(
        &self,
        id: Uuid,
        status: ReportStatus,
    ) -> Result<Option<Report>, sqlx::Error>;

    // --- Dashboard ---
    async fn get_stats(&self) -> Result<AdminDashboardStats, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// True when the error is a Postgres unique-constraint violation. Used by the
/// registration path to map a racing duplicate insert to a conflict instead
/// of a server error.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by a pooled
/// PostgreSQL connection. Connections are acquired from the pool per
/// operation and released when the call returns; no handle outlives a call.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_user(&self, new_user: NewUser) -> Result<User, sqlx::Error> {
        let new_id = Uuid::new_v4();
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, is_admin, created_at
            "#,
        )
        .bind(new_id)
        .bind(new_user.name)
        .bind(new_user.email)
        .bind(new_user.password_hash)
        .bind(new_user.is_admin)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, is_admin, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, sqlx::Error> {
        sqlx::query_as::<_, UserAccount>(
            r#"
            SELECT id, name, email, password_hash, is_admin, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_users(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, is_admin, created_at FROM users ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn list_tenders(&self) -> Result<Vec<Tender>, sqlx::Error> {
        sqlx::query_as::<_, Tender>(
            r#"
            SELECT t.id, t.owner_id, t.title, t.description, t.lat, t.lng,
                   t.created_at, u.name AS owner_name
            FROM tenders t
            JOIN users u ON t.owner_id = u.id
            ORDER BY t.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_tender(&self, id: Uuid) -> Result<Option<Tender>, sqlx::Error> {
        sqlx::query_as::<_, Tender>(
            r#"
            SELECT t.id, t.owner_id, t.title, t.description, t.lat, t.lng,
                   t.created_at, u.name AS owner_name
            FROM tenders t
            JOIN users u ON t.owner_id = u.id
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_tenders_by_owner(&self, owner_id: Uuid) -> Result<Vec<Tender>, sqlx::Error> {
        sqlx::query_as::<_, Tender>(
            r#"
            SELECT t.id, t.owner_id, t.title, t.description, t.lat, t.lng,
                   t.created_at, u.name AS owner_name
            FROM tenders t
            JOIN users u ON t.owner_id = u.id
            WHERE t.owner_id = $1
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_tender(
        &self,
        owner_id: Uuid,
        title: &str,
        description: &str,
        lat: f64,
        lng: f64,
    ) -> Result<Tender, sqlx::Error> {
        let new_id = Uuid::new_v4();
        // CTE so the insert and the owner-name join happen in one query.
        sqlx::query_as::<_, Tender>(
            r#"
            WITH inserted AS (
                INSERT INTO tenders (id, owner_id, title, description, lat, lng)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, owner_id, title, description, lat, lng, created_at
            )
            SELECT i.id, i.owner_id, i.title, i.description, i.lat, i.lng,
                   i.created_at, u.name AS owner_name
            FROM inserted i
            JOIN users u ON i.owner_id = u.id
            "#,
        )
        .bind(new_id)
        .bind(owner_id)
        .bind(title)
        .bind(description)
        .bind(lat)
        .bind(lng)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_tender(
        &self,
        id: Uuid,
        req: UpdateTenderRequest,
    ) -> Result<Option<Tender>, sqlx::Error> {
        // COALESCE keeps the stored value for any field the caller omitted.
        sqlx::query_as::<_, Tender>(
            r#"
            WITH updated AS (
                UPDATE tenders
                SET title = COALESCE($2, title),
                    description = COALESCE($3, description),
                    lat = COALESCE($4, lat),
                    lng = COALESCE($5, lng)
                WHERE id = $1
                RETURNING id, owner_id, title, description, lat, lng, created_at
            )
            SELECT i.id, i.owner_id, i.title, i.description, i.lat, i.lng,
                   i.created_at, u.name AS owner_name
            FROM updated i
            JOIN users u ON i.owner_id = u.id
            "#,
        )
        .bind(id)
        .bind(req.title)
        .bind(req.description)
        .bind(req.lat)
        .bind(req.lng)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_tender_with_reports(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        // Reports go first, then the tender row, in one transaction; a caller
        // can never observe a tender gone while its reports remain (or the
        // reverse). The FK cascade in the schema covers reports filed
        // concurrently with the delete.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM reports WHERE tender_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM tenders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_report(
        &self,
        tender_id: Uuid,
        reporter_id: Uuid,
        reason: &str,
    ) -> Result<Option<Report>, sqlx::Error> {
        let new_id = Uuid::new_v4();
        // ON CONFLICT DO NOTHING makes the duplicate check and the insert a
        // single atomic statement: under concurrent filing by the same
        // reporter against the same tender, exactly one row lands and the
        // loser sees no returned row.
        sqlx::query_as::<_, Report>(
            r#"
            WITH inserted AS (
                INSERT INTO reports (id, tender_id, reporter_id, reason)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (tender_id, reporter_id) DO NOTHING
                RETURNING id, tender_id, reporter_id, reason, status, created_at
            )
            SELECT i.id, i.tender_id, i.reporter_id, i.reason, i.status,
                   i.created_at, u.name AS reporter_name, t.title AS tender_title
            FROM inserted i
            JOIN users u ON i.reporter_id = u.id
            JOIN tenders t ON i.tender_id = t.id
            "#,
        )
        .bind(new_id)
        .bind(tender_id)
        .bind(reporter_id)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_report(
        &self,
        tender_id: Uuid,
        reporter_id: Uuid,
    ) -> Result<Option<Report>, sqlx::Error> {
        sqlx::query_as::<_, Report>(
            r#"
            SELECT id, tender_id, reporter_id, reason, status, created_at
            FROM reports
            WHERE tender_id = $1 AND reporter_id = $2
            "#,
        )
        .bind(tender_id)
        .bind(reporter_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_report(&self, id: Uuid) -> Result<Option<Report>, sqlx::Error> {
        sqlx::query_as::<_, Report>(
            r#"
            SELECT id, tender_id, reporter_id, reason, status, created_at
            FROM reports
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_reports(&self) -> Result<Vec<Report>, sqlx::Error> {
        sqlx::query_as::<_, Report>(
            r#"
            SELECT r.id, r.tender_id, r.reporter_id, r.reason, r.status,
                   r.created_at, u.name AS reporter_name, t.title AS tender_title
            FROM reports r
            JOIN users u ON r.reporter_id = u.id
            JOIN tenders t ON r.tender_id = t.id
            ORDER BY r.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_reports_by_reporter(
        &self,
        reporter_id: Uuid,
    ) -> Result<Vec<Report>, sqlx::Error> {
        sqlx::query_as::<_, Report>(
            r#"
            SELECT r.id, r.tender_id, r.reporter_id, r.reason, r.status,
                   r.created_at, u.name AS reporter_name, t.title AS tender_title
            FROM reports r
            JOIN users u ON r.reporter_id = u.id
            JOIN tenders t ON r.tender_id = t.id
            WHERE r.reporter_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(reporter_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn update_report_status(
        &self,
        id: Uuid,
        status: ReportStatus,
    ) -> Result<Option<Report>, sqlx::Error> {
        sqlx::query_as::<_, Report>(
            r#"
            WITH updated AS (
                UPDATE reports SET status = $2 WHERE id = $1
                RETURNING id, tender_id, reporter_id, reason, status, created_at
            )
            SELECT i.id, i.tender_id, i.reporter_id, i.reason, i.status,
                   i.created_at, u.name AS reporter_name, t.title AS tender_title
            FROM updated i
            JOIN users u ON i.reporter_id = u.id
            JOIN tenders t ON i.tender_id = t.id
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_stats(&self) -> Result<AdminDashboardStats, sqlx::Error> {
        let users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        let tenders = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tenders")
            .fetch_one(&self.pool)
            .await?;
        let reports = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reports")
            .fetch_one(&self.pool)
            .await?;
        let pending_reports =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reports WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await?;

        Ok(AdminDashboardStats {
            users,
            tenders,
            reports,
            pending_reports,
        })
    }
}
