//! Keyed photo blob channel: full payload bytes live here, never in the
//! snapshot row.

use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::checklist::WalkKind;
use crate::db::helpers::to_i64;
use crate::db::Database;

/// A photo payload as read back from the blob table.
#[derive(Debug, Clone)]
pub struct StoredPhoto {
    pub key: String,
    pub bytes: Vec<u8>,
}

impl Database {
    /// Fire-and-forget: the in-memory attachment already references the key,
    /// so a lost write only costs the payload, not walk correctness.
    pub fn store_photo_detached(&self, key: String, kind: WalkKind, bytes: Vec<u8>) {
        self.execute_detached("store photo blob", move |conn| {
            let byte_len = to_i64(bytes.len() as u64)?;
            conn.execute(
                "INSERT OR REPLACE INTO photo_blobs (key, walk_kind, bytes, byte_len, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    key,
                    kind.as_str(),
                    bytes,
                    byte_len,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        });
    }

    pub async fn load_photo(&self, key: &str) -> Result<Option<StoredPhoto>> {
        let key = key.to_string();
        self.execute(move |conn| {
            let bytes: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT bytes FROM photo_blobs WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(bytes.map(|bytes| StoredPhoto {
                key: key.clone(),
                bytes,
            }))
        })
        .await
    }

    /// Drop every blob belonging to one walk kind; used when a walk is reset
    /// or a stale draft is discarded.
    pub async fn delete_photos_for_walk(&self, kind: WalkKind) -> Result<usize> {
        self.execute(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM photo_blobs WHERE walk_kind = ?1",
                params![kind.as_str()],
            )?;
            Ok(deleted)
        })
        .await
    }
}
