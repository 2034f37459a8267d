use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::info;

use crate::schema::init_sql;

/// A DuckDB backend for Prooflet.
///
/// DuckDB is single-writer: concurrent reads are fine, but concurrent writes
/// cause contention. We wrap the connection in `Arc<Mutex<_>>` so the async
/// runtime serialises writes while the struct stays cheap to clone and share
/// across Axum handlers.
#[derive(Clone)]
pub struct DuckDbBackend {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl DuckDbBackend {
    /// Open (or create) a DuckDB database file at `path`.
    ///
    /// `memory_limit` is a DuckDB size string such as `"1GB"` or `"512MB"`,
    /// read from `Config.duckdb_memory_limit` at the call site.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        info!(
            "DuckDB opened at {} with memory_limit={}, threads=2",
            path, memory_limit
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an **in-memory** DuckDB database.
    ///
    /// Intended for tests only — data is discarded when the struct is
    /// dropped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Expose the raw connection for integration tests that need to assert
    /// directly against table contents.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}

/// Parse a timestamp string as DuckDB hands it back from
/// `CAST(col AS VARCHAR)` — a naive "YYYY-MM-DD HH:MM:SS[.ffffff]" in UTC.
/// RFC 3339 input is accepted too, for values written by older builds.
pub(crate) fn parse_db_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map_err(|e| anyhow!("unparseable timestamp {raw:?}: {e}"))?;
    Ok(naive.and_utc())
}

/// Read a JSON-string column. Targeting rules are stored as JSON; a value
/// this build cannot parse degrades to `None` ("unrestricted") rather than
/// failing the whole row — the predicates fail open anyway.
pub(crate) fn opt_json<T: serde::de::DeserializeOwned>(
    row: &duckdb::Row<'_>,
    idx: usize,
) -> Result<Option<T>, duckdb::Error> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .and_then(|s| serde_json::from_str(&s).ok()))
}

pub(crate) fn to_json_opt<T: serde::Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value
        .map(serde_json::to_string)
        .transpose()
        .map_err(prooflet_core::error::CoreError::from)
        .map_err(Into::into)
}

/// Wrap a row-mapping failure (timestamp or JSON parse) in the error type
/// `query_map`/`query_row` closures must return.
pub(crate) fn conv_err(idx: usize, e: impl std::fmt::Display) -> duckdb::Error {
    duckdb::Error::FromSqlConversionFailure(
        idx,
        duckdb::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_duckdb_varchar_timestamps() {
        let dt = parse_db_timestamp("2024-03-05 09:30:00").expect("naive form");
        assert_eq!(dt.to_rfc3339(), "2024-03-05T09:30:00+00:00");
        let with_frac = parse_db_timestamp("2024-03-05 09:30:00.250").expect("fractional form");
        assert!(with_frac > dt);
        assert!(parse_db_timestamp("2024-03-05T09:30:00Z").is_ok());
        assert!(parse_db_timestamp("not a time").is_err());
    }
}
