use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tenderscope::{
    ApiError,
    auth::AuthUser,
    models::{
        AdminDashboardStats, CreateReportRequest, NewUser, Report, ReportStatus, Tender,
        UpdateTenderRequest, User, UserAccount,
    },
    moderation,
    repository::Repository,
};
use uuid::Uuid;

// --- Stateful Mock Repository ---

// Mirrors the storage contract the engine depends on: the uniqueness of
// (tender_id, reporter_id) is enforced inside a single locked section, so the
// insert is atomic exactly like the real ON CONFLICT path.
#[derive(Default)]
struct MockModerationRepo {
    tenders: Mutex<HashMap<Uuid, Tender>>,
    reports: Mutex<Vec<Report>>,
}

impl MockModerationRepo {
    fn with_tender(tender: Tender) -> Self {
        let repo = Self::default();
        repo.tenders.lock().unwrap().insert(tender.id, tender);
        repo
    }
}

#[async_trait]
impl Repository for MockModerationRepo {
    async fn get_tender(&self, id: Uuid) -> Result<Option<Tender>, sqlx::Error> {
        Ok(self.tenders.lock().unwrap().get(&id).cloned())
    }

    async fn insert_report(
        &self,
        tender_id: Uuid,
        reporter_id: Uuid,
        reason: &str,
    ) -> Result<Option<Report>, sqlx::Error> {
        let mut reports = self.reports.lock().unwrap();
        if reports
            .iter()
            .any(|r| r.tender_id == tender_id && r.reporter_id == reporter_id)
        {
            return Ok(None);
        }
        let tender_title = self
            .tenders
            .lock()
            .unwrap()
            .get(&tender_id)
            .map(|t| t.title.clone());
        let report = Report {
            id: Uuid::new_v4(),
            tender_id,
            reporter_id,
            reason: reason.to_string(),
            status: ReportStatus::Pending,
            created_at: Utc::now(),
            reporter_name: Some("Reporter".to_string()),
            tender_title,
        };
        reports.push(report.clone());
        Ok(Some(report))
    }

    async fn find_report(
        &self,
        tender_id: Uuid,
        reporter_id: Uuid,
    ) -> Result<Option<Report>, sqlx::Error> {
        Ok(self
            .reports
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.tender_id == tender_id && r.reporter_id == reporter_id)
            .cloned())
    }

    async fn get_report(&self, id: Uuid) -> Result<Option<Report>, sqlx::Error> {
        Ok(self
            .reports
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list_reports(&self) -> Result<Vec<Report>, sqlx::Error> {
        Ok(self.reports.lock().unwrap().clone())
    }

    async fn get_reports_by_reporter(
        &self,
        reporter_id: Uuid,
    ) -> Result<Vec<Report>, sqlx::Error> {
        Ok(self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.reporter_id == reporter_id)
            .cloned()
            .collect())
    }

    async fn update_report_status(
        &self,
        id: Uuid,
        status: ReportStatus,
    ) -> Result<Option<Report>, sqlx::Error> {
        let mut reports = self.reports.lock().unwrap();
        match reports.iter_mut().find(|r| r.id == id) {
            Some(report) => {
                report.status = status;
                Ok(Some(report.clone()))
            }
            None => Ok(None),
        }
    }

    // Unused by the engine.
    async fn create_user(&self, _new_user: NewUser) -> Result<User, sqlx::Error> {
        Ok(User::default())
    }
    async fn get_user(&self, _id: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(None)
    }
    async fn get_user_by_email(&self, _email: &str) -> Result<Option<UserAccount>, sqlx::Error> {
        Ok(None)
    }
    async fn list_users(&self) -> Result<Vec<User>, sqlx::Error> {
        Ok(vec![])
    }
    async fn list_tenders(&self) -> Result<Vec<Tender>, sqlx::Error> {
        Ok(vec![])
    }
    async fn get_tenders_by_owner(&self, _owner_id: Uuid) -> Result<Vec<Tender>, sqlx::Error> {
        Ok(vec![])
    }
    async fn create_tender(
        &self,
        _owner_id: Uuid,
        _title: &str,
        _description: &str,
        _lat: f64,
        _lng: f64,
    ) -> Result<Tender, sqlx::Error> {
        Ok(Tender::default())
    }
    async fn update_tender(
        &self,
        _id: Uuid,
        _req: UpdateTenderRequest,
    ) -> Result<Option<Tender>, sqlx::Error> {
        Ok(None)
    }
    async fn delete_tender_with_reports(&self, _id: Uuid) -> Result<bool, sqlx::Error> {
        Ok(false)
    }
    async fn get_stats(&self) -> Result<AdminDashboardStats, sqlx::Error> {
        Ok(AdminDashboardStats::default())
    }
}

// --- Test Utilities ---

const OWNER_ID: Uuid = Uuid::from_u128(10);
const REPORTER_ID: Uuid = Uuid::from_u128(11);
const ADMIN_ID: Uuid = Uuid::from_u128(12);

fn reporter() -> AuthUser {
    AuthUser {
        id: REPORTER_ID,
        is_admin: false,
    }
}

fn admin() -> AuthUser {
    AuthUser {
        id: ADMIN_ID,
        is_admin: true,
    }
}

fn sample_tender() -> Tender {
    Tender {
        id: Uuid::new_v4(),
        owner_id: OWNER_ID,
        title: "Office Building Construction".to_string(),
        description: "Five-story office building downtown.".to_string(),
        lat: 40.7128,
        lng: -74.0060,
        created_at: Utc::now(),
        owner_name: Some("Owner".to_string()),
    }
}

fn file_request(tender_id: Uuid, reason: &str) -> CreateReportRequest {
    CreateReportRequest {
        tender_id,
        reason: reason.to_string(),
    }
}

// --- Filing Tests ---

#[tokio::test]
async fn filing_creates_a_pending_report() {
    let tender = sample_tender();
    let repo = MockModerationRepo::with_tender(tender.clone());

    let report = moderation::file_report(&repo, &reporter(), file_request(tender.id, "spam"))
        .await
        .expect("filing should succeed");

    assert_eq!(report.status, ReportStatus::Pending);
    assert_eq!(report.tender_id, tender.id);
    assert_eq!(report.reporter_id, REPORTER_ID);
    assert_eq!(report.tender_title.as_deref(), Some(tender.title.as_str()));
}

#[tokio::test]
async fn filing_rejects_a_blank_reason() {
    let tender = sample_tender();
    let repo = MockModerationRepo::with_tender(tender.clone());

    let err = moderation::file_report(&repo, &reporter(), file_request(tender.id, "  \t "))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Validation(_)));
    assert!(repo.list_reports().await.unwrap().is_empty());
}

#[tokio::test]
async fn filing_trims_the_reason() {
    let tender = sample_tender();
    let repo = MockModerationRepo::with_tender(tender.clone());

    let report = moderation::file_report(&repo, &reporter(), file_request(tender.id, "  spam  "))
        .await
        .unwrap();

    assert_eq!(report.reason, "spam");
}

#[tokio::test]
async fn filing_against_a_missing_tender_fails() {
    let repo = MockModerationRepo::default();

    let err = moderation::file_report(&repo, &reporter(), file_request(Uuid::new_v4(), "spam"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound("tender")));
}

#[tokio::test]
async fn duplicate_filing_is_a_conflict() {
    let tender = sample_tender();
    let repo = MockModerationRepo::with_tender(tender.clone());

    moderation::file_report(&repo, &reporter(), file_request(tender.id, "spam"))
        .await
        .unwrap();
    let err = moderation::file_report(&repo, &reporter(), file_request(tender.id, "spam again"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(repo.list_reports().await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_duplicate_filing_persists_exactly_one_report() {
    let tender = sample_tender();
    let repo = Arc::new(MockModerationRepo::with_tender(tender.clone()));

    let (a, b) = tokio::join!(
        {
            let repo = repo.clone();
            let req = file_request(tender.id, "spam");
            async move { moderation::file_report(repo.as_ref(), &reporter(), req).await }
        },
        {
            let repo = repo.clone();
            let req = file_request(tender.id, "spam");
            async move { moderation::file_report(repo.as_ref(), &reporter(), req).await }
        }
    );

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    let conflicts = [&a, &b]
        .iter()
        .filter(|r| matches!(r, Err(ApiError::Conflict(_))))
        .count();

    assert_eq!(successes, 1, "exactly one filing must win");
    assert_eq!(conflicts, 1, "the loser must see a conflict");
    assert_eq!(repo.list_reports().await.unwrap().len(), 1);
}

#[tokio::test]
async fn different_reporters_may_report_the_same_tender() {
    let tender = sample_tender();
    let repo = MockModerationRepo::with_tender(tender.clone());
    let other = AuthUser {
        id: Uuid::from_u128(99),
        is_admin: false,
    };

    moderation::file_report(&repo, &reporter(), file_request(tender.id, "spam"))
        .await
        .unwrap();
    moderation::file_report(&repo, &other, file_request(tender.id, "misleading"))
        .await
        .unwrap();

    assert_eq!(repo.list_reports().await.unwrap().len(), 2);
}

// --- Transition Tests ---

async fn pending_report(repo: &MockModerationRepo, tender_id: Uuid) -> Report {
    moderation::file_report(repo, &reporter(), file_request(tender_id, "spam"))
        .await
        .unwrap()
}

#[tokio::test]
async fn non_admin_transition_is_forbidden_regardless_of_state() {
    let tender = sample_tender();
    let repo = MockModerationRepo::with_tender(tender.clone());
    let report = pending_report(&repo, tender.id).await;

    // Against an existing pending report.
    let err =
        moderation::set_report_status(&repo, &reporter(), report.id, ReportStatus::Resolved)
            .await
            .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden));

    // Even against a report id that does not exist: the admin check comes
    // first.
    let err =
        moderation::set_report_status(&repo, &reporter(), Uuid::new_v4(), ReportStatus::Resolved)
            .await
            .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden));
}

#[tokio::test]
async fn admin_resolves_a_pending_report() {
    let tender = sample_tender();
    let repo = MockModerationRepo::with_tender(tender.clone());
    let report = pending_report(&repo, tender.id).await;

    let updated = moderation::set_report_status(&repo, &admin(), report.id, ReportStatus::Resolved)
        .await
        .unwrap();

    assert_eq!(updated.status, ReportStatus::Resolved);
}

#[tokio::test]
async fn admin_rejects_a_pending_report() {
    let tender = sample_tender();
    let repo = MockModerationRepo::with_tender(tender.clone());
    let report = pending_report(&repo, tender.id).await;

    let updated = moderation::set_report_status(&repo, &admin(), report.id, ReportStatus::Rejected)
        .await
        .unwrap();

    assert_eq!(updated.status, ReportStatus::Rejected);
}

#[tokio::test]
async fn reapplying_the_same_terminal_status_is_idempotent() {
    let tender = sample_tender();
    let repo = MockModerationRepo::with_tender(tender.clone());
    let report = pending_report(&repo, tender.id).await;

    moderation::set_report_status(&repo, &admin(), report.id, ReportStatus::Resolved)
        .await
        .unwrap();
    let second = moderation::set_report_status(&repo, &admin(), report.id, ReportStatus::Resolved)
        .await
        .expect("idempotent re-write must succeed");

    assert_eq!(second.status, ReportStatus::Resolved);
    assert_eq!(repo.list_reports().await.unwrap().len(), 1);
}

#[tokio::test]
async fn moving_between_terminal_states_is_refused() {
    let tender = sample_tender();
    let repo = MockModerationRepo::with_tender(tender.clone());
    let report = pending_report(&repo, tender.id).await;

    moderation::set_report_status(&repo, &admin(), report.id, ReportStatus::Resolved)
        .await
        .unwrap();
    let err = moderation::set_report_status(&repo, &admin(), report.id, ReportStatus::Rejected)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Conflict(_)));
    // The stored status is untouched.
    let stored = repo.get_report(report.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReportStatus::Resolved);
}

#[tokio::test]
async fn targeting_pending_is_invalid() {
    let tender = sample_tender();
    let repo = MockModerationRepo::with_tender(tender.clone());
    let report = pending_report(&repo, tender.id).await;

    let err = moderation::set_report_status(&repo, &admin(), report.id, ReportStatus::Pending)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn transitioning_an_unknown_report_fails() {
    let repo = MockModerationRepo::default();

    let err = moderation::set_report_status(&repo, &admin(), Uuid::new_v4(), ReportStatus::Resolved)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound("report")));
}

// --- End-to-End Scenario ---

#[tokio::test]
async fn report_lifecycle_scenario() {
    // Reporter A files against tender T (owned by B) with reason "spam";
    // an admin resolves it; a second filing by A conflicts.
    let tender = sample_tender();
    let repo = MockModerationRepo::with_tender(tender.clone());

    let report = moderation::file_report(&repo, &reporter(), file_request(tender.id, "spam"))
        .await
        .expect("first filing succeeds");
    assert_eq!(report.status, ReportStatus::Pending);

    let resolved = moderation::set_report_status(&repo, &admin(), report.id, ReportStatus::Resolved)
        .await
        .expect("admin resolves");
    assert_eq!(resolved.status, ReportStatus::Resolved);

    let err = moderation::file_report(&repo, &reporter(), file_request(tender.id, "spam2"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}
