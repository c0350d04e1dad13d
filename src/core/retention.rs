//! Age-based retention purge.
//!
//! Tables are purged one after the other with no transaction spanning them.
//! Media rows lose their file first; a file that cannot be resolved safely
//! or removed never blocks deletion of its row. A file shared by rows of
//! several tables is counted once, by the first table that reaches it.

use crate::db::log::oplog_best_effort;
use crate::db::purge::{DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE, ManagedTable, aged_rows, delete_by_ids};
use crate::errors::{AppError, AppResult};
use crate::media::{MediaStore, PathRejected};
use crate::utils::time::{format_ts, now};
use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Default retention period in days.
pub const DEFAULT_RETENTION_DAYS: i64 = 35;

/// Result for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePurge {
    pub table: ManagedTable,
    /// Rows deleted, or rows that would be deleted on a dry run.
    pub rows: u64,
    /// Files removed, or existing files that would be removed on a dry run.
    pub files: u64,
    pub file_errors: u64,
    /// Stored URLs that did not resolve to a path inside the media root.
    pub rejected_paths: u64,
    pub batches: usize,
}

impl TablePurge {
    fn new(table: ManagedTable) -> Self {
        Self {
            table,
            rows: 0,
            files: 0,
            file_errors: 0,
            rejected_paths: 0,
            batches: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PurgeReport {
    pub dry_run: bool,
    pub cutoff: DateTime<Utc>,
    pub tables: Vec<TablePurge>,
}

impl PurgeReport {
    pub fn table(&self, table: ManagedTable) -> Option<&TablePurge> {
        self.tables.iter().find(|t| t.table == table)
    }

    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.rows).sum()
    }

    pub fn total_files(&self) -> u64 {
        self.tables.iter().map(|t| t.files).sum()
    }
}

pub struct RetentionPurge<'a> {
    conn: &'a Connection,
    store: &'a dyn MediaStore,
    batch_size: usize,
}

impl<'a> RetentionPurge<'a> {
    pub fn new(conn: &'a Connection, store: &'a dyn MediaStore, batch_size: usize) -> Self {
        Self {
            conn,
            store,
            batch_size: match batch_size {
                0 => DEFAULT_BATCH_SIZE,
                n => n.min(MAX_BATCH_SIZE),
            },
        }
    }

    /// Purge everything older than `days` days from now.
    pub fn purge_older_than(&self, days: i64, dry_run: bool) -> AppResult<PurgeReport> {
        self.purge_older_than_at(now(), days, dry_run)
    }

    /// Same as [`Self::purge_older_than`] with an explicit clock.
    pub fn purge_older_than_at(&self, now: DateTime<Utc>, days: i64, dry_run: bool) -> AppResult<PurgeReport> {
        if days < 0 {
            return Err(AppError::InvalidArgument(format!(
                "retention days must not be negative (got {})",
                days
            )));
        }

        let cutoff = cutoff_before(now, days);
        let mode = if dry_run { " (DRY RUN)" } else { "" };
        tracing::info!(cutoff = %format_ts(cutoff), days, dry_run, "Starting retention purge{}", mode);

        let mut tables = Vec::with_capacity(ManagedTable::ALL.len());
        let mut seen = BTreeSet::new();
        for table in ManagedTable::ALL {
            match self.purge_table(table, cutoff, dry_run, &mut seen) {
                Ok(result) => {
                    self.record(&result, dry_run);
                    tables.push(result);
                }
                Err(e) => {
                    tracing::error!(error = %e, table = %table, "retention purge aborted");
                    return Err(e);
                }
            }
        }

        let report = PurgeReport {
            dry_run,
            cutoff,
            tables,
        };
        tracing::info!(
            rows = report.total_rows(),
            files = report.total_files(),
            dry_run,
            "Retention purge complete{}",
            mode
        );
        Ok(report)
    }

    fn purge_table(
        &self,
        table: ManagedTable,
        cutoff: DateTime<Utc>,
        dry_run: bool,
        seen: &mut BTreeSet<PathBuf>,
    ) -> AppResult<TablePurge> {
        let mut result = TablePurge::new(table);

        let aged = aged_rows(self.conn, table, cutoff)?;
        let ids: Vec<i64> = aged.iter().map(|(id, _)| *id).collect();

        let paths: BTreeSet<PathBuf> = if table.has_media() {
            self.resolve_paths(&aged, &mut result)
                .into_iter()
                .filter(|p| seen.insert(p.clone()))
                .collect()
        } else {
            BTreeSet::new()
        };

        if dry_run {
            result.rows = ids.len() as u64;
            result.files = paths.iter().filter(|p| self.store.exists(p)).count() as u64;
            return Ok(result);
        }

        for path in &paths {
            if !self.store.exists(path) {
                continue;
            }
            match self.store.remove(path) {
                Ok(()) => result.files += 1,
                Err(e) => {
                    result.file_errors += 1;
                    tracing::warn!(error = %e, path = %path.display(), "failed to remove media file");
                }
            }
        }

        let deleted = delete_by_ids(self.conn, table, &ids, self.batch_size)?;
        result.rows = deleted.rows;
        result.batches = deleted.batches;

        Ok(result)
    }

    /// Distinct safe paths for the stored URLs. Rejected URLs are counted and dropped.
    fn resolve_paths(&self, aged: &[(i64, Option<String>)], result: &mut TablePurge) -> BTreeSet<PathBuf> {
        let mut paths = BTreeSet::new();

        for (id, url) in aged {
            let Some(url) = url.as_deref() else { continue };
            match self.store.resolve(url) {
                Ok(path) => {
                    paths.insert(path);
                }
                Err(PathRejected::Empty) => {}
                Err(rejected) => {
                    result.rejected_paths += 1;
                    tracing::warn!(
                        table = %result.table,
                        row_id = id,
                        reason = %rejected,
                        "unsafe media path skipped"
                    );
                }
            }
        }

        paths
    }

    fn record(&self, result: &TablePurge, dry_run: bool) {
        tracing::info!(
            table = %result.table,
            rows = result.rows,
            files = result.files,
            file_errors = result.file_errors,
            rejected_paths = result.rejected_paths,
            batches = result.batches,
            dry_run,
            "retention table processed"
        );

        let prefix = if dry_run { "dry run: would delete" } else { "deleted" };
        oplog_best_effort(
            self.conn,
            "purge",
            result.table.table_name(),
            &format!(
                "{} {} rows, {} files ({} file errors, {} rejected paths)",
                prefix, result.rows, result.files, result.file_errors, result.rejected_paths
            ),
        );
    }
}

/// `now - days`, or the earliest representable instant when that
/// underflows, in which case nothing is old enough to purge.
fn cutoff_before(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    Duration::try_days(days)
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{memory_db, seed_user};
    use crate::media::LocalMediaStore;
    use crate::models::{MediaKind, Role};
    use crate::utils::date::format_date;
    use chrono::TimeZone;
    use rusqlite::params;
    use std::fs;
    use std::io;
    use std::path::Path;

    const BASE: &str = "http://127.0.0.1:5000/media";

    fn clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn old() -> DateTime<Utc> {
        clock() - Duration::days(60)
    }

    fn fresh() -> DateTime<Utc> {
        clock() - Duration::days(1)
    }

    fn screenshot_row(conn: &Connection, user_id: i64, at: DateTime<Utc>, url: Option<&str>) -> i64 {
        conn.execute(
            "INSERT INTO screenshots (user_id, taken_at, url) VALUES (?1, ?2, ?3)",
            params![user_id, format_ts(at), url],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    fn recording_row(conn: &Connection, user_id: i64, at: DateTime<Utc>, url: &str) {
        conn.execute(
            "INSERT INTO screen_recordings (user_id, recorded_at, duration_seconds, url)
             VALUES (?1, ?2, 30, ?3)",
            params![user_id, format_ts(at), url],
        )
        .unwrap();
    }

    fn event_row(conn: &Connection, user_id: i64, at: DateTime<Utc>) {
        conn.execute(
            "INSERT INTO activity_events (user_id, event_type, occurred_at) VALUES (?1, 'inactive', ?2)",
            params![user_id, format_ts(at)],
        )
        .unwrap();
    }

    /// Local store whose `remove` fails for one path.
    struct StubbornStore {
        inner: LocalMediaStore,
        stuck: PathBuf,
    }

    impl MediaStore for StubbornStore {
        fn save(&self, kind: MediaKind, bytes: &[u8], suggested_name: &str) -> AppResult<String> {
            self.inner.save(kind, bytes, suggested_name)
        }

        fn resolve(&self, url: &str) -> Result<PathBuf, PathRejected> {
            self.inner.resolve(url)
        }

        fn exists(&self, path: &Path) -> bool {
            self.inner.exists(path)
        }

        fn remove(&self, path: &Path) -> io::Result<()> {
            if path == self.stuck {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
            self.inner.remove(path)
        }
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn dry_run_reports_what_a_live_run_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path(), BASE);
        let db = memory_db();
        let uid = seed_user(&db.conn, "alice", Role::User);

        let shot = store.save(MediaKind::Screenshot, b"a", "a.png").unwrap();
        let clip = store.save(MediaKind::Recording, b"b", "b.mp4").unwrap();
        let keep = store.save(MediaKind::Screenshot, b"c", "c.png").unwrap();

        screenshot_row(&db.conn, uid, old(), Some(shot.as_str()));
        // same file referenced twice, counted once
        screenshot_row(&db.conn, uid, old(), Some(shot.as_str()));
        screenshot_row(&db.conn, uid, old(), None);
        let missing = format!("{}/screenshots/missing.png", BASE);
        screenshot_row(&db.conn, uid, old(), Some(missing.as_str()));
        screenshot_row(&db.conn, uid, fresh(), Some(keep.as_str()));
        recording_row(&db.conn, uid, old(), &clip);
        event_row(&db.conn, uid, old());
        event_row(&db.conn, uid, fresh());
        crate::db::overtime::upsert_add(&db.conn, uid, old().date_naive(), 100).unwrap();
        crate::db::overtime::upsert_add(&db.conn, uid, fresh().date_naive(), 100).unwrap();

        let purge = RetentionPurge::new(&db.conn, &store, 1000);

        let dry = purge.purge_older_than_at(clock(), 35, true).unwrap();
        assert!(dry.dry_run);
        assert_eq!(count(&db.conn, "screenshots"), 5);

        let live = purge.purge_older_than_at(clock(), 35, false).unwrap();
        for table in ManagedTable::ALL {
            let d = dry.table(table).unwrap();
            let l = live.table(table).unwrap();
            assert_eq!(d.rows, l.rows, "{}", table);
            assert_eq!(d.files, l.files, "{}", table);
        }

        let shots = live.table(ManagedTable::Screenshots).unwrap();
        assert_eq!(shots.rows, 4);
        assert_eq!(shots.files, 1);
        assert_eq!(live.table(ManagedTable::ScreenRecordings).unwrap().files, 1);
        assert_eq!(live.table(ManagedTable::ActivityEvents).unwrap().rows, 1);
        assert_eq!(live.table(ManagedTable::UserOvertimes).unwrap().rows, 1);

        assert_eq!(count(&db.conn, "screenshots"), 1);
        assert_eq!(count(&db.conn, "screen_recordings"), 0);
        assert!(store.exists(&store.resolve(&keep).unwrap()));
        assert!(!store.exists(&store.resolve(&shot).unwrap()));
    }

    #[test]
    fn traversal_url_keeps_file_but_drops_row() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("media");
        fs::create_dir_all(&root).unwrap();
        let outside = dir.path().join("secret.txt");
        fs::write(&outside, b"keep me").unwrap();

        let store = LocalMediaStore::new(&root, BASE);
        let db = memory_db();
        let uid = seed_user(&db.conn, "mallory", Role::User);
        let escape = format!("{}/../secret.txt", BASE);
        screenshot_row(&db.conn, uid, old(), Some(escape.as_str()));
        screenshot_row(&db.conn, uid, old(), Some("/etc/passwd/../../../secret.txt"));

        let report = RetentionPurge::new(&db.conn, &store, 10)
            .purge_older_than_at(clock(), 35, false)
            .unwrap();

        let shots = report.table(ManagedTable::Screenshots).unwrap();
        assert_eq!(shots.rows, 2);
        assert_eq!(shots.files, 0);
        assert_eq!(shots.rejected_paths, 2);
        assert!(outside.exists());
        assert_eq!(count(&db.conn, "screenshots"), 0);
    }

    #[test]
    fn large_purge_is_batched_and_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path(), BASE);
        let mut db = memory_db();
        let uid = seed_user(&db.conn, "bulk", Role::User);

        let tx = db.conn.transaction().unwrap();
        {
            let mut stmt = tx
                .prepare("INSERT INTO activity_events (user_id, event_type, occurred_at) VALUES (?1, 'active', ?2)")
                .unwrap();
            for _ in 0..2500 {
                stmt.execute(params![uid, format_ts(old())]).unwrap();
            }
        }
        tx.commit().unwrap();

        let purge = RetentionPurge::new(&db.conn, &store, 1000);
        let first = purge.purge_older_than_at(clock(), 35, false).unwrap();
        let events = first.table(ManagedTable::ActivityEvents).unwrap();
        assert_eq!(events.rows, 2500);
        assert_eq!(events.batches, 3);

        let second = purge.purge_older_than_at(clock(), 35, false).unwrap();
        assert_eq!(second.total_rows(), 0);
        assert_eq!(second.table(ManagedTable::ActivityEvents).unwrap().batches, 0);
    }

    #[test]
    fn overtime_ages_by_calendar_date() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path(), BASE);
        let db = memory_db();
        let uid = seed_user(&db.conn, "ot", Role::User);

        let cutoff_day = (clock() - Duration::days(35)).date_naive();
        crate::db::overtime::upsert_add(&db.conn, uid, cutoff_day, 10).unwrap();
        crate::db::overtime::upsert_add(&db.conn, uid, cutoff_day.pred_opt().unwrap(), 10).unwrap();

        RetentionPurge::new(&db.conn, &store, 1000)
            .purge_older_than_at(clock(), 35, false)
            .unwrap();

        let left: String = db
            .conn
            .query_row("SELECT ot_date FROM user_overtimes", [], |r| r.get(0))
            .unwrap();
        assert_eq!(left, format_date(cutoff_day));
    }

    #[test]
    fn negative_days_rejected_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path(), BASE);
        let db = memory_db();
        let uid = seed_user(&db.conn, "x", Role::User);
        event_row(&db.conn, uid, old());

        let err = RetentionPurge::new(&db.conn, &store, 1000)
            .purge_older_than(-1, false)
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(count(&db.conn, "activity_events"), 1);
    }

    #[test]
    fn huge_retention_period_purges_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path(), BASE);
        let db = memory_db();
        let uid = seed_user(&db.conn, "old", Role::User);
        event_row(&db.conn, uid, old());
        crate::db::overtime::upsert_add(&db.conn, uid, old().date_naive(), 100).unwrap();

        let purge = RetentionPurge::new(&db.conn, &store, 1000);
        for days in [10_000_000_000, i64::MAX] {
            let dry = purge.purge_older_than(days, true).unwrap();
            assert_eq!(dry.total_rows(), 0);
            let live = purge.purge_older_than_at(clock(), days, false).unwrap();
            assert_eq!(live.total_rows(), 0);
        }

        assert_eq!(count(&db.conn, "activity_events"), 1);
        assert_eq!(count(&db.conn, "user_overtimes"), 1);
    }

    #[test]
    fn oversized_batch_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path(), BASE);
        let mut db = memory_db();
        let uid = seed_user(&db.conn, "bulk", Role::User);

        let tx = db.conn.transaction().unwrap();
        {
            let mut stmt = tx
                .prepare("INSERT INTO activity_events (user_id, event_type, occurred_at) VALUES (?1, 'active', ?2)")
                .unwrap();
            for _ in 0..33_000 {
                stmt.execute(params![uid, format_ts(old())]).unwrap();
            }
        }
        tx.commit().unwrap();

        let report = RetentionPurge::new(&db.conn, &store, 50_000)
            .purge_older_than_at(clock(), 35, false)
            .unwrap();
        let events = report.table(ManagedTable::ActivityEvents).unwrap();
        assert_eq!(events.rows, 33_000);
        assert_eq!(events.batches, 2);
        assert_eq!(count(&db.conn, "activity_events"), 0);
    }

    #[test]
    fn failed_file_removal_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalMediaStore::new(dir.path(), BASE);
        let db = memory_db();
        let uid = seed_user(&db.conn, "frank", Role::User);

        let gone = local.save(MediaKind::Screenshot, b"a", "a.png").unwrap();
        let stuck = local.save(MediaKind::Screenshot, b"b", "b.png").unwrap();
        let clip = local.save(MediaKind::Recording, b"c", "c.mp4").unwrap();
        screenshot_row(&db.conn, uid, old(), Some(gone.as_str()));
        screenshot_row(&db.conn, uid, old(), Some(stuck.as_str()));
        recording_row(&db.conn, uid, old(), &clip);

        let store = StubbornStore {
            stuck: local.resolve(&stuck).unwrap(),
            inner: local,
        };
        let report = RetentionPurge::new(&db.conn, &store, 1000)
            .purge_older_than_at(clock(), 35, false)
            .unwrap();

        let shots = report.table(ManagedTable::Screenshots).unwrap();
        assert_eq!(shots.files, 1);
        assert_eq!(shots.file_errors, 1);
        assert_eq!(shots.rows, 2);
        assert_eq!(report.table(ManagedTable::ScreenRecordings).unwrap().files, 1);

        assert!(!store.exists(&store.resolve(&gone).unwrap()));
        assert!(store.exists(&store.stuck));
        assert!(!store.exists(&store.resolve(&clip).unwrap()));
        assert_eq!(count(&db.conn, "screenshots"), 0);
        assert_eq!(count(&db.conn, "screen_recordings"), 0);
    }

    #[test]
    fn file_shared_across_tables_counts_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path(), BASE);
        let db = memory_db();
        let uid = seed_user(&db.conn, "gina", Role::User);

        let shot = store.save(MediaKind::Screenshot, b"a", "a.png").unwrap();
        screenshot_row(&db.conn, uid, old(), Some(shot.as_str()));
        recording_row(&db.conn, uid, old(), &shot);

        let purge = RetentionPurge::new(&db.conn, &store, 1000);
        let dry = purge.purge_older_than_at(clock(), 35, true).unwrap();
        let live = purge.purge_older_than_at(clock(), 35, false).unwrap();

        assert_eq!(dry.total_files(), 1);
        assert_eq!(live.total_files(), 1);
        assert_eq!(live.table(ManagedTable::ScreenRecordings).unwrap().rows, 1);
        assert_eq!(live.table(ManagedTable::ScreenRecordings).unwrap().file_errors, 0);
    }
}
