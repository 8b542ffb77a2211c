//! KPI time-series tool backed by the relational store.
//!
//! This is the router's default tool: a descriptor with an unrecognized
//! name lands here, and that name is the series to read. Time bounds
//! come from the extracted `ini`/`end` parameters.

use std::collections::HashMap;
use std::fmt::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, params};

use crate::error::{Error, ToolError};

use super::{PARAM_TOOL, Tool};

/// Schema for the relational tool database.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS kpis (
    kpi     TEXT NOT NULL,
    dt      TEXT NOT NULL,
    value   REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_kpis_kpi_dt ON kpis(kpi, dt);
";

/// Fallback timestamp layout accepted after RFC 3339, for models that
/// emit bare `YYYY-MM-DD HH:MM:SS` values.
const PLAIN_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// Opens (and migrates) the relational tool database.
///
/// # Errors
///
/// Returns [`Error::Database`] if the file cannot be opened or the
/// schema cannot be applied.
pub fn open_tool_db(path: &Path) -> Result<Arc<Mutex<Connection>>, Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| Error::Config {
            message: format!("cannot create {}: {e}", parent.display()),
        })?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Reads a KPI series over a time range and renders it as a statement.
pub struct SeriesTool {
    conn: Arc<Mutex<Connection>>,
}

impl SeriesTool {
    /// Creates the tool over an opened tool database.
    #[must_use]
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, ToolError> {
        self.conn.lock().map_err(|_| ToolError::Poisoned)
    }
}

impl std::fmt::Debug for SeriesTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesTool").finish_non_exhaustive()
    }
}

/// Parses a timestamp parameter: RFC 3339 first, then the plain
/// space-separated layout interpreted as UTC.
fn parse_timestamp(name: &str, value: &str) -> Result<DateTime<Utc>, ToolError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, PLAIN_LAYOUT)
        .map(|naive| naive.and_utc())
        .map_err(|_| ToolError::Timestamp {
            name: name.to_string(),
            value: value.to_string(),
        })
}

#[async_trait]
impl Tool for SeriesTool {
    fn name(&self) -> &'static str {
        "kpi"
    }

    async fn run(&self, params: &HashMap<String, String>) -> Result<String, ToolError> {
        // The router injects the resolved descriptor name under "tool";
        // that name is the series identity.
        let kpi = params
            .get(PARAM_TOOL)
            .map(String::as_str)
            .unwrap_or_default();
        let ini = parse_timestamp(
            "ini",
            params.get("ini").map(String::as_str).unwrap_or_default(),
        )?;
        let end = parse_timestamp(
            "end",
            params.get("end").map(String::as_str).unwrap_or_default(),
        )?;

        let rows: Vec<(String, f64)> = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(
                "SELECT dt, value FROM kpis WHERE kpi = ?1 AND dt >= ?2 AND dt <= ?3 ORDER BY dt",
            )?;
            let mapped = stmt.query_map(
                params![kpi, ini.to_rfc3339(), end.to_rfc3339()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
            )?;
            mapped.collect::<Result<_, _>>()?
        };

        let mut out = format!("Values for {kpi} by date: ");
        for (dt, value) in rows {
            let day = DateTime::parse_from_rfc3339(&dt)
                .map(|ts| ts.format("%d-%m-%Y").to_string())
                .unwrap_or(dt);
            let _ = write!(out, "{day}: {value}, ");
        }
        Ok(out.trim_end_matches(", ").to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn seeded_conn() -> (Arc<Mutex<Connection>>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let conn = open_tool_db(&dir.path().join("db.sqlite")).unwrap();
        {
            let guard = conn.lock().unwrap();
            for (dt, value) in [
                ("2026-03-01T00:00:00+00:00", 10.5),
                ("2026-03-02T00:00:00+00:00", 11.0),
                ("2026-03-03T00:00:00+00:00", 9.25),
            ] {
                guard
                    .execute(
                        "INSERT INTO kpis (kpi, dt, value) VALUES (?1, ?2, ?3)",
                        params!["cpu", dt, value],
                    )
                    .unwrap();
            }
        }
        (conn, dir)
    }

    fn seeded_tool() -> (SeriesTool, tempfile::TempDir) {
        let (conn, dir) = seeded_conn();
        (SeriesTool::new(conn), dir)
    }

    fn range_params(series: &str, ini: &str, end: &str) -> HashMap<String, String> {
        let mut params = HashMap::new();
        params.insert(PARAM_TOOL.to_string(), series.to_string());
        params.insert("ini".to_string(), ini.to_string());
        params.insert("end".to_string(), end.to_string());
        params
    }

    #[tokio::test]
    async fn test_renders_rows_in_date_order() {
        let (tool, _dir) = seeded_tool();
        let out = tool
            .run(&range_params(
                "cpu",
                "2026-03-01T00:00:00Z",
                "2026-03-03T23:59:59Z",
            ))
            .await
            .unwrap();
        assert_eq!(
            out,
            "Values for cpu by date: 01-03-2026: 10.5, 02-03-2026: 11, 03-03-2026: 9.25"
        );
    }

    #[tokio::test]
    async fn test_range_bounds_are_inclusive() {
        let (tool, _dir) = seeded_tool();
        let out = tool
            .run(&range_params(
                "cpu",
                "2026-03-02T00:00:00Z",
                "2026-03-02T00:00:00Z",
            ))
            .await
            .unwrap();
        assert_eq!(out, "Values for cpu by date: 02-03-2026: 11");
    }

    #[tokio::test]
    async fn test_unknown_kpi_yields_empty_series() {
        let (tool, _dir) = seeded_tool();
        let out = tool
            .run(&range_params(
                "memory",
                "2026-03-01T00:00:00Z",
                "2026-03-03T00:00:00Z",
            ))
            .await
            .unwrap();
        assert_eq!(out, "Values for memory by date: ");
    }

    #[tokio::test]
    async fn test_plain_timestamp_layout_accepted() {
        let (tool, _dir) = seeded_tool();
        let out = tool
            .run(&range_params(
                "cpu",
                "2026-03-01 00:00:00",
                "2026-03-03 23:59:59",
            ))
            .await
            .unwrap();
        assert!(out.contains("01-03-2026: 10.5"));
    }

    #[tokio::test]
    async fn test_bad_timestamp_is_rejected() {
        let (tool, _dir) = seeded_tool();
        let err = tool
            .run(&range_params("cpu", "yesterday", "2026-03-03T00:00:00Z"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timestamp { ref name, .. } if name == "ini"));
    }

    #[tokio::test]
    async fn test_router_fallthrough_reads_series_named_by_descriptor() {
        let (conn, _dir) = seeded_conn();
        let router = super::super::ToolRouter::with_builtins(SeriesTool::new(conn));

        // "cpu" matches no registered tool; the router falls through to
        // the series tool, which must read the series of that name.
        let mut extracted = HashMap::new();
        extracted.insert("ini".to_string(), "2026-03-01T00:00:00Z".to_string());
        extracted.insert("end".to_string(), "2026-03-03T23:59:59Z".to_string());
        let out = router.dispatch("cpu", &extracted).await.unwrap();

        assert!(out.starts_with("Values for cpu by date: "));
        assert!(out.contains("01-03-2026: 10.5"));
    }

    #[test]
    fn test_parse_timestamp_rfc3339_offset_normalizes_to_utc() {
        let ts = parse_timestamp("ini", "2026-03-01T02:00:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-03-01T00:00:00+00:00");
    }
}
