//! SQLite persistence for weekly rollups
//!
//! Saved rollups are keyed by (week, grouping, key). Each grouping also
//! records a SHA-256 fingerprint of the CSV exports it was built from, so a
//! caller can tell whether the stored weeks are stale.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::core::pchart::ControlLimits;
use crate::core::week::{DateWindow, WeekId};
use crate::entities::bucket::{GroupBy, WeeklyBucket};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rollup store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS weekly_rollup (
    week        TEXT NOT NULL,
    group_by    TEXT NOT NULL,
    key         TEXT NOT NULL,
    total       INTEGER NOT NULL,
    pass        INTEGER NOT NULL,
    fail        INTEGER NOT NULL,
    sample_size INTEGER NOT NULL,
    defects     INTEGER NOT NULL,
    days        INTEGER NOT NULL,
    center_line REAL NOT NULL,
    ucl         REAL NOT NULL,
    lcl         REAL NOT NULL,
    PRIMARY KEY (week, group_by, key)
);
CREATE TABLE IF NOT EXISTS rollup_source (
    group_by    TEXT PRIMARY KEY,
    fingerprint TEXT NOT NULL,
    saved_at    TEXT NOT NULL
);
";

impl ToSql for WeekId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for WeekId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        WeekId::parse(s).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for GroupBy {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

/// Handle on a rollup database
pub struct RollupStore {
    conn: Connection,
}

impl RollupStore {
    /// Open (creating if needed) a store file
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        tracing::debug!(path = %path.display(), "opening rollup store");
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Replace the stored weeks covered by `buckets` and record the fingerprint
    ///
    /// Returns the number of rows written.
    pub fn save_weekly(
        &mut self,
        group_by: GroupBy,
        buckets: &[WeeklyBucket],
        fingerprint: &str,
    ) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;

        let weeks: HashSet<WeekId> = buckets.iter().map(|b| b.week).collect();
        for week in &weeks {
            tx.execute(
                "DELETE FROM weekly_rollup WHERE week = ?1 AND group_by = ?2",
                params![week, group_by],
            )?;
        }

        {
            let mut insert = tx.prepare(
                "INSERT INTO weekly_rollup
                 (week, group_by, key, total, pass, fail, sample_size, defects, days,
                  center_line, ucl, lcl)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            for b in buckets {
                insert.execute(params![
                    b.week,
                    group_by,
                    b.key,
                    b.total as i64,
                    b.pass as i64,
                    b.fail as i64,
                    b.sample_size as i64,
                    b.defects as i64,
                    b.days,
                    b.limits.center_line,
                    b.limits.ucl,
                    b.limits.lcl,
                ])?;
            }
        }

        tx.execute(
            "INSERT INTO rollup_source (group_by, fingerprint, saved_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(group_by) DO UPDATE SET
                 fingerprint = excluded.fingerprint,
                 saved_at = excluded.saved_at",
            params![group_by, fingerprint],
        )?;
        tx.commit()?;

        tracing::info!(
            rows = buckets.len(),
            weeks = weeks.len(),
            %group_by,
            "saved weekly rollup"
        );
        Ok(buckets.len())
    }

    /// Stored weeks for a grouping, optionally limited to a window
    pub fn load_weekly(
        &self,
        group_by: GroupBy,
        window: Option<&DateWindow>,
    ) -> Result<Vec<WeeklyBucket>, StoreError> {
        let wanted: Option<HashSet<WeekId>> = window.map(|w| w.weeks().into_iter().collect());

        let mut stmt = self.conn.prepare(
            "SELECT week, key, total, pass, fail, sample_size, defects, days,
                    center_line, ucl, lcl
             FROM weekly_rollup
             WHERE group_by = ?1
             ORDER BY week, key",
        )?;
        let rows = stmt.query_map(params![group_by], |row| {
            let sample_size = row.get::<_, i64>(5)?;
            let center_line: f64 = row.get(8)?;
            Ok(WeeklyBucket {
                week: row.get(0)?,
                key: row.get(1)?,
                total: row.get::<_, i64>(2)? as u64,
                pass: row.get::<_, i64>(3)? as u64,
                fail: row.get::<_, i64>(4)? as u64,
                sample_size: sample_size as u64,
                defects: row.get::<_, i64>(6)? as u64,
                days: row.get(7)?,
                limits: ControlLimits {
                    center_line,
                    ucl: row.get(9)?,
                    lcl: row.get(10)?,
                    degenerate: ControlLimits::is_degenerate_sample(center_line, sample_size),
                },
            })
        })?;

        let mut buckets = Vec::new();
        for row in rows {
            let bucket = row?;
            if wanted.as_ref().map_or(true, |w| w.contains(&bucket.week)) {
                buckets.push(bucket);
            }
        }
        Ok(buckets)
    }

    /// Fingerprint recorded by the last save for a grouping
    pub fn stored_fingerprint(&self, group_by: GroupBy) -> Result<Option<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT fingerprint FROM rollup_source WHERE group_by = ?1")?;
        let mut rows = stmt.query(params![group_by])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// True when the grouping was last saved from data with this fingerprint
    pub fn is_current(&self, group_by: GroupBy, fingerprint: &str) -> Result<bool, StoreError> {
        Ok(self.stored_fingerprint(group_by)?.as_deref() == Some(fingerprint))
    }
}

/// SHA-256 over the names and contents of the source files, hex encoded
pub fn source_fingerprint(files: &[PathBuf]) -> Result<String, StoreError> {
    let mut hasher = Sha256::new();
    for path in files {
        let content = std::fs::read(path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        hasher.update(path.to_string_lossy().as_bytes());
        hasher.update([0u8]);
        hasher.update((content.len() as u64).to_le_bytes());
        hasher.update(&content);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
