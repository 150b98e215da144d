//! Out-of-band schema revisions for the `orders` table.
//!
//! # Responsibility
//! - Register reversible revisions in strictly increasing order.
//! - Apply (`upgrade`) or revert (`downgrade`) revisions atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic and start at 1.
//! - Applied revision is mirrored to `PRAGMA user_version`.
//! - Core code never calls `upgrade`/`downgrade` on its own.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Revision {
    version: u32,
    name: &'static str,
    up: &'static str,
    down: &'static str,
}

const REVISIONS: &[Revision] = &[
    Revision {
        version: 1,
        name: "create_orders",
        up: include_str!("0001_create_orders.up.sql"),
        down: include_str!("0001_create_orders.down.sql"),
    },
    Revision {
        version: 2,
        name: "orders_price",
        up: include_str!("0002_orders_price.up.sql"),
        down: include_str!("0002_orders_price.down.sql"),
    },
];

/// Returns the latest revision known by this binary.
pub fn latest_revision() -> u32 {
    REVISIONS.last().map_or(0, |revision| revision.version)
}

/// Returns the short name of a known revision.
pub fn revision_name(version: u32) -> Option<&'static str> {
    REVISIONS
        .iter()
        .find(|revision| revision.version == version)
        .map(|revision| revision.name)
}

/// Reads the revision currently applied to the store.
pub fn current_revision(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Applies every pending revision up to head.
pub fn upgrade(conn: &mut Connection) -> DbResult<u32> {
    upgrade_to(conn, latest_revision())
}

/// Applies pending revisions up to and including `target`.
///
/// Returns the revision the store is at afterwards. A `target` at or below
/// the current revision is a no-op.
pub fn upgrade_to(conn: &mut Connection, target: u32) -> DbResult<u32> {
    let current = current_revision(conn)?;
    let latest = latest_revision();
    if current > latest || target > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current.max(target),
            latest_supported: latest,
        });
    }
    if target <= current {
        return Ok(current);
    }

    let tx = conn.transaction()?;
    for revision in REVISIONS {
        if revision.version <= current || revision.version > target {
            continue;
        }
        tx.execute_batch(revision.up)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", revision.version))?;
    }
    tx.commit()?;

    info!(
        "event=schema_upgrade module=db status=ok from={} to={}",
        current, target
    );
    Ok(target)
}

/// Reverts exactly one revision.
///
/// # Errors
/// - `NoRevisionToDowngrade` when the store is at revision 0.
pub fn downgrade(conn: &mut Connection) -> DbResult<u32> {
    let current = current_revision(conn)?;
    let latest = latest_revision();
    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    let Some(revision) = REVISIONS.iter().find(|revision| revision.version == current) else {
        return Err(DbError::NoRevisionToDowngrade);
    };
    let previous = current - 1;

    let tx = conn.transaction()?;
    tx.execute_batch(revision.down)?;
    tx.execute_batch(&format!("PRAGMA user_version = {previous};"))?;
    tx.commit()?;

    info!(
        "event=schema_downgrade module=db status=ok from={} to={} revision={}",
        current, previous, revision.name
    );
    Ok(previous)
}
