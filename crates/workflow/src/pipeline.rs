//! Report submission pipeline.
//!
//! The single write path from a session to the store: re-validate the
//! driver's assignment, then persist the draft atomically as one check
//! record with its media and annotation rows.

use sqlx::SqlitePool;

use database::{check, NewCheck};

use crate::error::{Result, WorkflowError};
use crate::queue;
use crate::session::Session;

/// Commit the session's current draft and return the new check record
/// ID.
///
/// The driver's assignment is re-validated at commit time: an admin
/// may have unassigned or reassigned the driver mid-session. A stale
/// assignment fails with [`WorkflowError::Unassigned`] before any row
/// is written; this is terminal for the task. Store failures leave no
/// partial rows and may be retried by re-sending the input.
pub async fn commit(pool: &SqlitePool, session: &Session) -> Result<i64> {
    let assigned = queue::active_assignment(pool, &session.driver_id)
        .await?
        .ok_or(WorkflowError::Unassigned)?;

    // Reassignment to a different truck invalidates the draft too: the
    // record's truck must equal the driver's assignment at creation.
    if assigned.id != session.truck_id {
        return Err(WorkflowError::Unassigned);
    }

    let draft = &session.draft;
    let new_check = NewCheck {
        truck_id: session.truck_id,
        driver_id: session.driver_id.clone(),
        item_id: draft.item_id,
        skipped: draft.skipped,
        media: draft
            .media
            .iter()
            .map(|(kind, file_ref)| (kind.as_str().to_string(), file_ref.clone()))
            .collect(),
        comment: draft.comment.clone(),
        skip_reason: draft.skip_reason.clone(),
    };

    let check_id = check::create_check(pool, &new_check).await?;

    tracing::info!(
        "Committed check {} (driver {}, task {}/{})",
        check_id,
        session.driver_id,
        session.task_number(),
        session.total_tasks()
    );

    Ok(check_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::models::STATUS_PENDING;
    use database::{checklist, driver, truck, AnnotationBody, Database};
    use fleet_core::MediaKind;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn assigned_session(db: &Database) -> Session {
        let truck_id = truck::create_truck(db.pool(), "A-1", "Volvo").await.unwrap();
        checklist::create_item(db.pool(), truck_id, "Tires").await.unwrap();
        driver::upsert_driver(db.pool(), "d1", "Bob", None).await.unwrap();
        driver::assign_truck(db.pool(), "d1", Some(truck_id)).await.unwrap();

        let items = queue::resolve(db.pool(), "d1").await.unwrap();
        Session::new("d1", truck_id, items).unwrap()
    }

    #[tokio::test]
    async fn test_commit_writes_record_with_draft_contents() {
        let db = test_db().await;
        let mut session = assigned_session(&db).await;

        session.add_proof(MediaKind::Photo, "f1");
        session.draft.comment = Some(AnnotationBody::Text("ok".to_string()));

        let check_id = commit(db.pool(), &session).await.unwrap();

        let record = check::get_check(db.pool(), check_id).await.unwrap();
        assert_eq!(record.status, STATUS_PENDING);
        assert_eq!(record.driver_id, "d1");
        assert!(!record.skipped);

        let attachments = check::attachments_for(db.pool(), check_id).await.unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].kind, "photo");
    }

    #[tokio::test]
    async fn test_commit_fails_when_unassigned_mid_session() {
        let db = test_db().await;
        let mut session = assigned_session(&db).await;
        session.add_proof(MediaKind::Photo, "f1");

        // Admin unassigns the driver while the session is in flight.
        driver::assign_truck(db.pool(), "d1", None).await.unwrap();

        let result = commit(db.pool(), &session).await;
        assert!(matches!(result, Err(WorkflowError::Unassigned)));

        // No partial rows
        assert_eq!(check::count_checks(db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_commit_fails_when_reassigned_to_other_truck() {
        let db = test_db().await;
        let mut session = assigned_session(&db).await;
        session.add_proof(MediaKind::Photo, "f1");

        let other = truck::create_truck(db.pool(), "B-2", "Scania").await.unwrap();
        driver::assign_truck(db.pool(), "d1", Some(other)).await.unwrap();

        let result = commit(db.pool(), &session).await;
        assert!(matches!(result, Err(WorkflowError::Unassigned)));
        assert_eq!(check::count_checks(db.pool()).await.unwrap(), 0);
    }
}
