//! Check record operations: atomic submission writes, the pending
//! review queue, the guarded decision transition, and drill-down
//! reads.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{
    Annotation, AnnotationBody, CheckRecord, ItemStat, MediaAttachment, MediaFeedItem,
    NewCheck, PendingSummary, SkippedSummary, KIND_COMMENT, KIND_SKIP_REASON, STATUS_PENDING,
};

/// Persist a new submission and return the check record ID.
///
/// The record, its media rows, and its annotation rows are written in
/// one transaction: a failure leaves no partial rows, and a reader
/// never observes the record without its attachments.
pub async fn create_check(pool: &SqlitePool, check: &NewCheck) -> Result<i64> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO check_records (truck_id, driver_id, item_id, status, skipped)
        VALUES (?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(check.truck_id)
    .bind(&check.driver_id)
    .bind(check.item_id)
    .bind(check.skipped)
    .execute(&mut *tx)
    .await?;

    let check_id = result.last_insert_rowid();

    for (kind, file_ref) in &check.media {
        sqlx::query(
            r#"
            INSERT INTO media_attachments (check_id, file_ref, kind)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(check_id)
        .bind(file_ref)
        .bind(kind)
        .execute(&mut *tx)
        .await?;
    }

    if let Some(body) = &check.comment {
        insert_annotation(&mut tx, check_id, &check.driver_id, KIND_COMMENT, body).await?;
    }

    if let Some(body) = &check.skip_reason {
        insert_annotation(&mut tx, check_id, &check.driver_id, KIND_SKIP_REASON, body).await?;
    }

    tx.commit().await?;

    tracing::debug!(
        "Created check record {} for driver {} (item {}, skipped: {})",
        check_id,
        check.driver_id,
        check.item_id,
        check.skipped
    );

    Ok(check_id)
}

async fn insert_annotation(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    check_id: i64,
    driver_id: &str,
    kind: &str,
    body: &AnnotationBody,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO annotations (check_id, driver_id, text, voice_ref, kind)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(check_id)
    .bind(driver_id)
    .bind(body.text())
    .bind(body.voice_ref())
    .bind(kind)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Get a check record by ID.
pub async fn get_check(pool: &SqlitePool, id: i64) -> Result<CheckRecord> {
    sqlx::query_as::<_, CheckRecord>(
        r#"
        SELECT id, truck_id, driver_id, item_id, status, skipped, created_at
        FROM check_records
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "CheckRecord",
        id: id.to_string(),
    })
}

/// List pending check records, most recent first, with joined display
/// fields for the review queue.
pub async fn list_pending(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<PendingSummary>> {
    let summaries = sqlx::query_as::<_, PendingSummary>(
        r#"
        SELECT cr.id, cr.driver_id, d.name AS driver_name, d.handle AS driver_handle,
               t.number AS truck_number, ci.description AS item_description,
               cr.skipped, cr.created_at,
               (SELECT COUNT(*) FROM media_attachments ma WHERE ma.check_id = cr.id) AS media_count
        FROM check_records cr
        JOIN drivers d ON d.id = cr.driver_id
        LEFT JOIN trucks t ON t.id = cr.truck_id
        LEFT JOIN checklist_items ci ON ci.id = cr.item_id
        WHERE cr.status = 'pending'
        ORDER BY cr.created_at DESC, cr.id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(summaries)
}

/// Count check records still awaiting review.
pub async fn count_pending(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM check_records WHERE status = 'pending'
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Transition a pending check record to the given decided status.
///
/// The UPDATE is predicated on `status = 'pending'`, so the
/// double-decision guard holds even under concurrent admins: the
/// second decision finds zero affected rows and fails with
/// [`DatabaseError::AlreadyDecided`].
pub async fn decide(pool: &SqlitePool, id: i64, new_status: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE check_records
        SET status = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(new_status)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        // Distinguish a missing record from one already decided.
        let existing = sqlx::query_scalar::<_, String>(
            r#"
            SELECT status FROM check_records WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        return match existing {
            Some(status) if status != STATUS_PENDING => {
                Err(DatabaseError::AlreadyDecided { id })
            }
            _ => Err(DatabaseError::NotFound {
                entity: "CheckRecord",
                id: id.to_string(),
            }),
        };
    }

    tracing::info!("Check record {} decided: {}", id, new_status);
    Ok(())
}

/// Media attached to a check record, in attachment order.
pub async fn attachments_for(pool: &SqlitePool, check_id: i64) -> Result<Vec<MediaAttachment>> {
    let attachments = sqlx::query_as::<_, MediaAttachment>(
        r#"
        SELECT id, check_id, file_ref, kind
        FROM media_attachments
        WHERE check_id = ?
        ORDER BY id
        "#,
    )
    .bind(check_id)
    .fetch_all(pool)
    .await?;

    Ok(attachments)
}

/// Annotations on a check record.
pub async fn annotations_for(pool: &SqlitePool, check_id: i64) -> Result<Vec<Annotation>> {
    let annotations = sqlx::query_as::<_, Annotation>(
        r#"
        SELECT id, check_id, driver_id, text, voice_ref, kind, created_at
        FROM annotations
        WHERE check_id = ?
        ORDER BY id
        "#,
    )
    .bind(check_id)
    .fetch_all(pool)
    .await?;

    Ok(annotations)
}

/// Skipped submissions regardless of review status, newest first,
/// joined with their skip reason for the admin feed.
pub async fn list_skipped(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<SkippedSummary>> {
    let summaries = sqlx::query_as::<_, SkippedSummary>(
        r#"
        SELECT cr.id, d.name AS driver_name, d.handle AS driver_handle,
               ci.description AS item_description, cr.status, cr.created_at,
               a.text AS reason_text, a.voice_ref AS reason_voice
        FROM check_records cr
        JOIN drivers d ON d.id = cr.driver_id
        LEFT JOIN checklist_items ci ON ci.id = cr.item_id
        LEFT JOIN annotations a ON a.check_id = cr.id AND a.kind = 'skip_reason'
        WHERE cr.skipped = 1
        ORDER BY cr.created_at DESC, cr.id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(summaries)
}

/// Most recent proof media across all submissions, newest first, with
/// caption fields for the admin feed.
pub async fn recent_media(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<MediaFeedItem>> {
    let items = sqlx::query_as::<_, MediaFeedItem>(
        r#"
        SELECT ma.file_ref, ma.kind, d.name AS driver_name, d.handle AS driver_handle,
               ci.description AS item_description, cr.created_at
        FROM media_attachments ma
        JOIN check_records cr ON cr.id = ma.check_id
        JOIN drivers d ON d.id = cr.driver_id
        LEFT JOIN checklist_items ci ON ci.id = cr.item_id
        ORDER BY cr.created_at DESC, ma.id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

/// Total submissions recorded.
pub async fn count_checks(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM check_records
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Submissions recorded as skips.
pub async fn count_skipped(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM check_records WHERE skipped = 1
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Completion counts per checklist item, most completed first.
pub async fn completions_by_item(pool: &SqlitePool) -> Result<Vec<ItemStat>> {
    let stats = sqlx::query_as::<_, ItemStat>(
        r#"
        SELECT ci.description, COUNT(cr.id) AS completions
        FROM checklist_items ci
        LEFT JOIN check_records cr ON cr.item_id = ci.id AND cr.skipped = 0
        GROUP BY ci.id
        ORDER BY completions DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{STATUS_APPROVED, STATUS_REJECTED};
    use crate::{checklist, driver, truck, Database};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn fixture(db: &Database) -> (i64, i64) {
        let truck_id = truck::create_truck(db.pool(), "A-1", "Volvo").await.unwrap();
        let item_id = checklist::create_item(db.pool(), truck_id, "Check tires")
            .await
            .unwrap();
        driver::upsert_driver(db.pool(), "d1", "Bob", Some("bob"))
            .await
            .unwrap();
        driver::assign_truck(db.pool(), "d1", Some(truck_id))
            .await
            .unwrap();
        (truck_id, item_id)
    }

    fn completed(truck_id: i64, item_id: i64, media: Vec<(String, String)>) -> NewCheck {
        NewCheck {
            truck_id,
            driver_id: "d1".to_string(),
            item_id,
            skipped: false,
            media,
            comment: None,
            skip_reason: None,
        }
    }

    #[tokio::test]
    async fn test_create_check_with_media_and_comment() {
        let db = test_db().await;
        let (truck_id, item_id) = fixture(&db).await;

        let mut check = completed(
            truck_id,
            item_id,
            vec![
                ("photo".to_string(), "f1".to_string()),
                ("video".to_string(), "f2".to_string()),
            ],
        );
        check.comment = Some(AnnotationBody::Text("all good".to_string()));

        let check_id = create_check(db.pool(), &check).await.unwrap();

        let record = get_check(db.pool(), check_id).await.unwrap();
        assert_eq!(record.status, STATUS_PENDING);
        assert!(!record.skipped);

        let attachments = attachments_for(db.pool(), check_id).await.unwrap();
        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].file_ref, "f1");
        assert_eq!(attachments[1].kind, "video");

        let annotations = annotations_for(db.pool(), check_id).await.unwrap();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].kind, KIND_COMMENT);
        assert_eq!(annotations[0].text.as_deref(), Some("all good"));
        assert_eq!(annotations[0].voice_ref, None);
    }

    #[tokio::test]
    async fn test_create_skip_with_voice_reason() {
        let db = test_db().await;
        let (truck_id, item_id) = fixture(&db).await;

        let check = NewCheck {
            truck_id,
            driver_id: "d1".to_string(),
            item_id,
            skipped: true,
            media: vec![],
            comment: None,
            skip_reason: Some(AnnotationBody::Voice("v1".to_string())),
        };

        let check_id = create_check(db.pool(), &check).await.unwrap();

        let record = get_check(db.pool(), check_id).await.unwrap();
        assert!(record.skipped);

        let attachments = attachments_for(db.pool(), check_id).await.unwrap();
        assert!(attachments.is_empty());

        let annotations = annotations_for(db.pool(), check_id).await.unwrap();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].kind, KIND_SKIP_REASON);
        assert_eq!(annotations[0].voice_ref.as_deref(), Some("v1"));
        assert_eq!(annotations[0].text, None);
    }

    #[tokio::test]
    async fn test_list_pending_joins_and_pagination() {
        let db = test_db().await;
        let (truck_id, item_id) = fixture(&db).await;

        let mut ids = Vec::new();
        for i in 0..3 {
            let check = completed(
                truck_id,
                item_id,
                vec![("photo".to_string(), format!("f{}", i))],
            );
            ids.push(create_check(db.pool(), &check).await.unwrap());
        }

        // Newest first: same CURRENT_TIMESTAMP granularity, so the id
        // tie-break decides.
        let page = list_pending(db.pool(), 2, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, ids[2]);
        assert_eq!(page[0].driver_name, "Bob");
        assert_eq!(page[0].truck_number.as_deref(), Some("A-1"));
        assert_eq!(page[0].item_description.as_deref(), Some("Check tires"));
        assert_eq!(page[0].media_count, 1);

        let rest = list_pending(db.pool(), 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, ids[0]);

        assert_eq!(count_pending(db.pool()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_decide_guard() {
        let db = test_db().await;
        let (truck_id, item_id) = fixture(&db).await;

        let check_id = create_check(db.pool(), &completed(truck_id, item_id, vec![]))
            .await
            .unwrap();

        decide(db.pool(), check_id, STATUS_APPROVED).await.unwrap();

        let second = decide(db.pool(), check_id, STATUS_REJECTED).await;
        assert!(matches!(second, Err(DatabaseError::AlreadyDecided { .. })));

        // First decision retained
        let record = get_check(db.pool(), check_id).await.unwrap();
        assert_eq!(record.status, STATUS_APPROVED);

        // Decided records leave the pending queue
        assert_eq!(count_pending(db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_decide_missing_record() {
        let db = test_db().await;

        let result = decide(db.pool(), 42, STATUS_APPROVED).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_recent_media_feed() {
        let db = test_db().await;
        let (truck_id, item_id) = fixture(&db).await;

        let check = completed(
            truck_id,
            item_id,
            vec![
                ("photo".to_string(), "f1".to_string()),
                ("photo".to_string(), "f2".to_string()),
            ],
        );
        create_check(db.pool(), &check).await.unwrap();

        let feed = recent_media(db.pool(), 10, 0).await.unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].file_ref, "f2");
        assert_eq!(feed[0].driver_name, "Bob");

        let next = recent_media(db.pool(), 10, 2).await.unwrap();
        assert!(next.is_empty());
    }

    #[tokio::test]
    async fn test_list_skipped_with_reasons_across_statuses() {
        let db = test_db().await;
        let (truck_id, item_id) = fixture(&db).await;

        // A completed submission never enters the skipped feed.
        create_check(
            db.pool(),
            &completed(truck_id, item_id, vec![("photo".to_string(), "f1".to_string())]),
        )
        .await
        .unwrap();

        let text_skip = NewCheck {
            truck_id,
            driver_id: "d1".to_string(),
            item_id,
            skipped: true,
            media: vec![],
            comment: None,
            skip_reason: Some(AnnotationBody::Text("flat tire".to_string())),
        };
        let text_id = create_check(db.pool(), &text_skip).await.unwrap();

        let voice_skip = NewCheck {
            skip_reason: Some(AnnotationBody::Voice("v1".to_string())),
            ..text_skip.clone()
        };
        let voice_id = create_check(db.pool(), &voice_skip).await.unwrap();

        // Deciding a skip does not remove it from the feed.
        decide(db.pool(), text_id, STATUS_REJECTED).await.unwrap();

        let page = list_skipped(db.pool(), 10, 0).await.unwrap();
        assert_eq!(page.len(), 2);

        // Newest first
        assert_eq!(page[0].id, voice_id);
        assert_eq!(page[0].reason_voice.as_deref(), Some("v1"));
        assert_eq!(page[0].reason_text, None);

        assert_eq!(page[1].id, text_id);
        assert_eq!(page[1].reason_text.as_deref(), Some("flat tire"));
        assert_eq!(page[1].status, STATUS_REJECTED);
        assert_eq!(page[1].driver_name, "Bob");

        let rest = list_skipped(db.pool(), 10, 2).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_stats_counts() {
        let db = test_db().await;
        let (truck_id, item_id) = fixture(&db).await;

        create_check(db.pool(), &completed(truck_id, item_id, vec![]))
            .await
            .unwrap();

        let skip = NewCheck {
            truck_id,
            driver_id: "d1".to_string(),
            item_id,
            skipped: true,
            media: vec![],
            comment: None,
            skip_reason: Some(AnnotationBody::Text("flat tire".to_string())),
        };
        create_check(db.pool(), &skip).await.unwrap();

        assert_eq!(count_checks(db.pool()).await.unwrap(), 2);
        assert_eq!(count_skipped(db.pool()).await.unwrap(), 1);

        let stats = completions_by_item(db.pool()).await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].description, "Check tires");
        assert_eq!(stats[0].completions, 1);
    }
}
