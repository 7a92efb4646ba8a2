//! Driver CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Driver;

/// Create or refresh a driver row on first contact.
///
/// Name and handle are updated on every start event; assignment and
/// status are never touched here.
pub async fn upsert_driver(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    handle: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO drivers (id, name, handle)
        VALUES (?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET name = excluded.name, handle = excluded.handle
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(handle)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a driver by chat identity.
pub async fn get_driver(pool: &SqlitePool, id: &str) -> Result<Driver> {
    sqlx::query_as::<_, Driver>(
        r#"
        SELECT id, name, handle, truck_id, status
        FROM drivers
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Driver",
        id: id.to_string(),
    })
}

/// Assign a driver to a truck, or unassign with `None`.
pub async fn assign_truck(pool: &SqlitePool, id: &str, truck_id: Option<i64>) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE drivers
        SET truck_id = ?
        WHERE id = ?
        "#,
    )
    .bind(truck_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Driver",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Set a driver's status ("active" or "retired").
pub async fn set_status(pool: &SqlitePool, id: &str, status: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE drivers
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
            entity: "Driver",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List all drivers.
pub async fn list_drivers(pool: &SqlitePool) -> Result<Vec<Driver>> {
    let drivers = sqlx::query_as::<_, Driver>(
        r#"
        SELECT id, name, handle, truck_id, status
        FROM drivers
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(drivers)
}
