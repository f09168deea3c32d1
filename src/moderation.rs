//! Report lifecycle engine.
//!
//! Reports move through a fixed lifecycle: filed as `pending`, then closed by
//! an administrator as `resolved` or `rejected`. Transitions are strictly
//! forward-only — a closed report never re-opens and never moves to the other
//! terminal state; re-applying the status it already holds is an idempotent
//! re-write.

use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ApiError,
    guard,
    models::{CreateReportRequest, Report, ReportStatus},
    repository::Repository,
};

/// file_report
///
/// Files a moderation report against a tender on behalf of `reporter`.
///
/// The target must exist at filing time (checked against the live record,
/// never a cached view), the reason must be non-blank after trimming, and a
/// reporter may hold at most one report per tender. Duplicate prevention
/// rides the storage uniqueness constraint on (tender_id, reporter_id): the
/// insert itself is the atomic decision point, so two concurrent filings
/// cannot both land.
pub async fn file_report(
    repo: &dyn Repository,
    reporter: &AuthUser,
    req: CreateReportRequest,
) -> Result<Report, ApiError> {
    let reason = req.reason.trim();
    if reason.is_empty() {
        return Err(ApiError::Validation(
            "report reason must not be empty".to_string(),
        ));
    }

    if repo.get_tender(req.tender_id).await?.is_none() {
        return Err(ApiError::NotFound("tender"));
    }

    match repo
        .insert_report(req.tender_id, reporter.id, reason)
        .await?
    {
        Some(report) => Ok(report),
        None => Err(ApiError::Conflict("tender already reported")),
    }
}

/// set_report_status
///
/// Admin-only transition of a report to a terminal status.
///
/// Order of checks is fixed: a non-admin actor is refused before anything
/// else, regardless of whether the report exists or what state it is in.
/// Targeting `pending` is invalid; moving a closed report to the other
/// terminal state is refused; re-asserting the current terminal status is
/// allowed and idempotent.
pub async fn set_report_status(
    repo: &dyn Repository,
    actor: &AuthUser,
    report_id: Uuid,
    status: ReportStatus,
) -> Result<Report, ApiError> {
    // Only admins transition reports; ownership grants no exception here.
    guard::require_admin(actor).require()?;

    if status == ReportStatus::Pending {
        return Err(ApiError::Validation(
            "status must be 'resolved' or 'rejected'".to_string(),
        ));
    }

    let report = repo
        .get_report(report_id)
        .await?
        .ok_or(ApiError::NotFound("report"))?;

    if report.status.is_terminal() && report.status != status {
        return Err(ApiError::Conflict("report already closed"));
    }

    repo.update_report_status(report_id, status)
        .await?
        .ok_or(ApiError::NotFound("report"))
}
