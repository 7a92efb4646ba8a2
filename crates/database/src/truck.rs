//! Truck CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Truck;

/// Register a new truck and return its ID.
pub async fn create_truck(pool: &SqlitePool, number: &str, model: &str) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO trucks (number, model)
        VALUES (?, ?)
        "#,
    )
    .bind(number)
    .bind(model)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Truck",
                    id: number.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(result.last_insert_rowid())
}

/// Get a truck by ID.
pub async fn get_truck(pool: &SqlitePool, id: i64) -> Result<Truck> {
    sqlx::query_as::<_, Truck>(
        r#"
        SELECT id, number, model, status
        FROM trucks
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Truck",
        id: id.to_string(),
    })
}

/// Get a truck by its fleet number.
pub async fn get_truck_by_number(pool: &SqlitePool, number: &str) -> Result<Truck> {
    sqlx::query_as::<_, Truck>(
        r#"
        SELECT id, number, model, status
        FROM trucks
        WHERE number = ?
        "#,
    )
    .bind(number)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Truck",
        id: number.to_string(),
    })
}

/// Change a truck's model description.
pub async fn update_model(pool: &SqlitePool, id: i64, model: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE trucks
        SET model = ?
        WHERE id = ?
        "#,
    )
    .bind(model)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Truck",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Set a truck's status ("active" or "retired").
pub async fn set_status(pool: &SqlitePool, id: i64, status: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE trucks
        SET status = ?
        WHERE id = ?
        "#,
    )
    .bind(status)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Truck",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Delete a truck.
///
/// Cascades to its checklist items and unassigns any drivers still
/// attached to it. Historical check records are untouched.
pub async fn delete_truck(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM trucks
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Truck",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List all trucks, active and retired.
pub async fn list_trucks(pool: &SqlitePool) -> Result<Vec<Truck>> {
    let trucks = sqlx::query_as::<_, Truck>(
        r#"
        SELECT id, number, model, status
        FROM trucks
        ORDER BY number
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(trucks)
}
