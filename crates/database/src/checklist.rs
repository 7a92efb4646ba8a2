//! Checklist item CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::ChecklistItem;

/// Add a checklist item to a truck and return its ID.
pub async fn create_item(pool: &SqlitePool, truck_id: i64, description: &str) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO checklist_items (truck_id, description)
        VALUES (?, ?)
        "#,
    )
    .bind(truck_id)
    .bind(description)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_foreign_key_violation() {
                return DatabaseError::NotFound {
                    entity: "Truck",
                    id: truck_id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(result.last_insert_rowid())
}

/// Get a checklist item by ID.
pub async fn get_item(pool: &SqlitePool, id: i64) -> Result<ChecklistItem> {
    sqlx::query_as::<_, ChecklistItem>(
        r#"
        SELECT id, truck_id, description, is_active
        FROM checklist_items
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "ChecklistItem",
        id: id.to_string(),
    })
}

/// Rewrite an item's description.
pub async fn update_description(pool: &SqlitePool, id: i64, description: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE checklist_items
        SET description = ?
        WHERE id = ?
        "#,
    )
    .bind(description)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "ChecklistItem",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Activate or deactivate an item.
///
/// Deactivation removes the item from future walks only; existing
/// check records keep referencing it.
pub async fn set_active(pool: &SqlitePool, id: i64, is_active: bool) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE checklist_items
        SET is_active = ?
        WHERE id = ?
        "#,
    )
    .bind(is_active)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "ChecklistItem",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List all of a truck's items, active and inactive, in walk order.
pub async fn list_items(pool: &SqlitePool, truck_id: i64) -> Result<Vec<ChecklistItem>> {
    let items = sqlx::query_as::<_, ChecklistItem>(
        r#"
        SELECT id, truck_id, description, is_active
        FROM checklist_items
        WHERE truck_id = ?
        ORDER BY id
        "#,
    )
    .bind(truck_id)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

/// List a truck's active items in walk order (ascending ID).
///
/// Ascending ID is a contract: the driver-facing progression and the
/// review UI both depend on a reproducible walk order.
pub async fn list_active_items(pool: &SqlitePool, truck_id: i64) -> Result<Vec<ChecklistItem>> {
    let items = sqlx::query_as::<_, ChecklistItem>(
        r#"
        SELECT id, truck_id, description, is_active
        FROM checklist_items
        WHERE truck_id = ? AND is_active = 1
        ORDER BY id
        "#,
    )
    .bind(truck_id)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{truck, Database};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_item_crud() {
        let db = test_db().await;
        let truck_id = truck::create_truck(db.pool(), "A-1", "Volvo").await.unwrap();

        let id = create_item(db.pool(), truck_id, "Check tires").await.unwrap();

        let item = get_item(db.pool(), id).await.unwrap();
        assert_eq!(item.description, "Check tires");
        assert!(item.is_active);

        update_description(db.pool(), id, "Check tire pressure")
            .await
            .unwrap();
        set_active(db.pool(), id, false).await.unwrap();

        let item = get_item(db.pool(), id).await.unwrap();
        assert_eq!(item.description, "Check tire pressure");
        assert!(!item.is_active);
    }

    #[tokio::test]
    async fn test_item_for_missing_truck() {
        let db = test_db().await;

        let result = create_item(db.pool(), 99, "Check tires").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_active_items_ordered_by_id() {
        let db = test_db().await;
        let truck_id = truck::create_truck(db.pool(), "A-1", "Volvo").await.unwrap();

        let first = create_item(db.pool(), truck_id, "Tires").await.unwrap();
        let second = create_item(db.pool(), truck_id, "Oil").await.unwrap();
        let third = create_item(db.pool(), truck_id, "Lights").await.unwrap();
        set_active(db.pool(), second, false).await.unwrap();

        let items = list_active_items(db.pool(), truck_id).await.unwrap();
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![first, third]);
    }
}
