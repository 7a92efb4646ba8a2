//! Task queue resolver.
//!
//! Computes the ordered set of outstanding checklist items for a
//! driver's currently assigned truck. Read-only.

use sqlx::SqlitePool;

use database::models::STATUS_ACTIVE;
use database::{checklist, driver, truck, ChecklistItem, DatabaseError, Truck};

use crate::error::Result;

/// The driver's current active assignment, if any.
///
/// Returns `None` when the driver is unknown, retired, unassigned, or
/// assigned to a retired or deleted truck. The session uses this to
/// show a distinct "unassigned" state before resolving the queue.
pub async fn active_assignment(pool: &SqlitePool, driver_id: &str) -> Result<Option<Truck>> {
    let driver = match driver::get_driver(pool, driver_id).await {
        Ok(d) => d,
        Err(DatabaseError::NotFound { .. }) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if driver.status != STATUS_ACTIVE {
        return Ok(None);
    }

    let truck_id = match driver.truck_id {
        Some(id) => id,
        None => return Ok(None),
    };

    let assigned = match truck::get_truck(pool, truck_id).await {
        Ok(t) => t,
        Err(DatabaseError::NotFound { .. }) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if assigned.status != STATUS_ACTIVE {
        return Ok(None);
    }

    Ok(Some(assigned))
}

/// Resolve the driver's outstanding checklist items in walk order
/// (ascending item ID).
///
/// An empty result means "nothing to do": either the driver has no
/// active assignment or the assigned truck has no active items.
pub async fn resolve(pool: &SqlitePool, driver_id: &str) -> Result<Vec<ChecklistItem>> {
    let assigned = match active_assignment(pool, driver_id).await? {
        Some(t) => t,
        None => return Ok(Vec::new()),
    };

    Ok(checklist::list_active_items(pool, assigned.id).await?)
}
