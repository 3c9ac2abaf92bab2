//! Walk snapshot rows: one per walk kind, upserted on every state change.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::checklist::WalkKind;
use crate::db::helpers::{flag_from_i64, parse_datetime};
use crate::db::Database;

/// One persisted snapshot as stored, payload still serialized.
#[derive(Debug, Clone)]
pub struct SnapshotRow {
    pub kind: WalkKind,
    pub payload: String,
    pub started_at: DateTime<Utc>,
    pub complete: bool,
    pub updated_at: DateTime<Utc>,
}

fn row_to_snapshot(row: &Row) -> Result<SnapshotRow> {
    let kind: String = row.get("kind")?;
    let started_at: String = row.get("started_at")?;
    let updated_at: String = row.get("updated_at")?;
    let complete: i64 = row.get("complete")?;

    Ok(SnapshotRow {
        kind: WalkKind::from_str(&kind)
            .ok_or_else(|| anyhow::anyhow!("unknown walk kind '{kind}' in snapshot row"))?,
        payload: row.get("payload")?,
        started_at: parse_datetime(&started_at, "started_at")?,
        complete: flag_from_i64(complete),
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

fn upsert(conn: &mut Connection, row: &SnapshotRow) -> Result<()> {
    conn.execute(
        "INSERT INTO walk_snapshots (kind, payload, started_at, complete, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(kind) DO UPDATE SET
             payload = excluded.payload,
             started_at = excluded.started_at,
             complete = excluded.complete,
             updated_at = excluded.updated_at",
        params![
            row.kind.as_str(),
            row.payload,
            row.started_at.to_rfc3339(),
            row.complete as i64,
            row.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

impl Database {
    /// Coalescing write: each state change supersedes the previous row.
    pub fn save_snapshot_detached(&self, row: SnapshotRow) {
        self.execute_detached("save walk snapshot", move |conn| upsert(conn, &row));
    }

    /// Blocking write for moments that must land, e.g. finalize.
    pub async fn save_snapshot(&self, row: SnapshotRow) -> Result<()> {
        self.execute(move |conn| upsert(conn, &row)).await
    }

    pub async fn load_snapshot(&self, kind: WalkKind) -> Result<Option<SnapshotRow>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT kind, payload, started_at, complete, updated_at
                 FROM walk_snapshots
                 WHERE kind = ?1",
            )?;

            let mut rows = stmt.query(params![kind.as_str()])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_snapshot(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn clear_snapshot(&self, kind: WalkKind) -> Result<()> {
        self.execute(move |conn| {
            conn.execute(
                "DELETE FROM walk_snapshots WHERE kind = ?1",
                params![kind.as_str()],
            )?;
            Ok(())
        })
        .await
    }
}
