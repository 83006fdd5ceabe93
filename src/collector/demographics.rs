//! Patient demographics collector.

#![allow(clippy::missing_errors_doc)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use crate::bundle::MetricsBundle;
use crate::error::CollectorError;
use crate::traits::{AggregateCollector, RealTimeProvider, SharedTimeProvider, TimeProvider};

/// Sex labels, always present in `by_sex`.
pub const SEX_LABELS: [&str; 3] = ["female", "male", "unspecified"];

/// Age bracket labels, always present in `by_age_bracket`.
pub const AGE_BRACKETS: [&str; 7] = ["0-4", "5-14", "15-24", "25-44", "45-59", "60+", "unknown"];

/// Label for patients without a district.
pub const UNASSIGNED_DISTRICT: &str = "Unassigned";

const UNKNOWN_AGE: &str = "unknown";

const SEX_QUERY: &str = "SELECT CAST(sex AS TEXT) AS value, COUNT(*) AS n FROM patients GROUP BY 1";
const AGE_QUERY: &str =
    "SELECT CAST(birth_date AS TEXT) AS value, COUNT(*) AS n FROM patients GROUP BY 1";
const DISTRICT_QUERY: &str =
    "SELECT CAST(district AS TEXT) AS value, COUNT(*) AS n FROM patients GROUP BY 1";

/// Collects demographics from the `patients` table of the health office
/// database.
///
/// Produces `total_patients`, `by_sex`, `by_age_bracket` and `by_district`.
/// All four queries run inside one read transaction, so the breakdowns
/// always add up to the total.
#[derive(Clone)]
pub struct SqliteDemographicsCollector {
    pool: SqlitePool,
    source: Option<PathBuf>,
    clock: SharedTimeProvider,
}

impl std::fmt::Debug for SqliteDemographicsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDemographicsCollector")
            .field("pool", &self.pool)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

fn read_only_options(path: &Path) -> Result<SqliteConnectOptions, CollectorError> {
    Ok(
        SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=ro", path.display()))
            .map_err(|e| CollectorError::DataUnavailable {
                message: format!("Invalid source database path: {e}"),
            })?
            .read_only(true),
    )
}

fn missing_source(path: &Path) -> CollectorError {
    tracing::warn!(path = %path.display(), "source database missing");
    CollectorError::DataUnavailable {
        message: format!("source database not found: {}", path.display()),
    }
}

impl SqliteDemographicsCollector {
    /// Open the source database read-only.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::DataUnavailable`] if the file does not exist
    /// or cannot be opened.
    pub async fn connect(database_path: impl AsRef<Path>) -> Result<Self, CollectorError> {
        let path = database_path.as_ref();
        if !path.exists() {
            return Err(missing_source(path));
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(read_only_options(path)?)
            .await
            .map_err(|e| CollectorError::DataUnavailable {
                message: format!("Failed to open source database: {e}"),
            })?;

        tracing::debug!(path = %path.display(), "source database connected");
        Ok(Self::from_pool(pool))
    }

    /// Prepare a read-only collector without touching the file yet.
    ///
    /// The source is opened on first collection, and each collection checks
    /// that the file still exists, so a server can start before the health
    /// office database is in place.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::DataUnavailable`] if the path cannot form a
    /// valid connection string.
    pub fn open_lazy(database_path: impl AsRef<Path>) -> Result<Self, CollectorError> {
        let path = database_path.as_ref();
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_lazy_with(read_only_options(path)?);
        Ok(Self {
            source: Some(path.to_path_buf()),
            ..Self::from_pool(pool)
        })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            source: None,
            clock: Arc::new(RealTimeProvider),
        }
    }

    /// Replace the clock that fixes the collection date for ages.
    #[must_use]
    pub fn with_clock(mut self, clock: SharedTimeProvider) -> Self {
        self.clock = clock;
        self
    }

    fn query_error(query: &str, err: &sqlx::Error) -> CollectorError {
        match err {
            sqlx::Error::Database(db)
                if db.message().contains("no such table")
                    || db.message().contains("no such column")
                    || db.message().contains("unable to open database") =>
            {
                CollectorError::DataUnavailable {
                    message: format!("patients data is not available: {}", db.message()),
                }
            }
            sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                CollectorError::DataUnavailable {
                    message: format!("{query}: {err}"),
                }
            }
            _ => CollectorError::QueryFailed {
                query: query.to_string(),
                message: err.to_string(),
            },
        }
    }

    fn decode(query: &str, row: &SqliteRow) -> Result<(Option<String>, i64), CollectorError> {
        let value: Option<String> = row
            .try_get("value")
            .map_err(|e| Self::query_error(query, &e))?;
        let count: i64 = row
            .try_get("n")
            .map_err(|e| Self::query_error(query, &e))?;
        Ok((value, count))
    }

    async fn collect_inner(&self) -> Result<MetricsBundle, CollectorError> {
        if let Some(path) = self.source.as_deref().filter(|p| !p.exists()) {
            return Err(missing_source(path));
        }
        let today = self.clock.now().date_naive();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Self::query_error("BEGIN", &e))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM patients")
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| Self::query_error("SELECT COUNT patients", &e))?;

        let mut by_sex = [0_i64; SEX_LABELS.len()];
        for row in sqlx::query(SEX_QUERY)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| Self::query_error(SEX_QUERY, &e))?
        {
            let (sex, n) = Self::decode(SEX_QUERY, &row)?;
            let label = normalize_sex(sex.as_deref());
            if let Some(slot) = SEX_LABELS.iter().position(|l| *l == label) {
                by_sex[slot] += n;
            }
        }

        let mut by_age = [0_i64; AGE_BRACKETS.len()];
        for row in sqlx::query(AGE_QUERY)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| Self::query_error(AGE_QUERY, &e))?
        {
            let (birth_date, n) = Self::decode(AGE_QUERY, &row)?;
            let label = age_bracket(birth_date.as_deref(), today);
            if let Some(slot) = AGE_BRACKETS.iter().position(|l| *l == label) {
                by_age[slot] += n;
            }
        }

        let mut by_district: BTreeMap<String, i64> = BTreeMap::new();
        for row in sqlx::query(DISTRICT_QUERY)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| Self::query_error(DISTRICT_QUERY, &e))?
        {
            let (district, n) = Self::decode(DISTRICT_QUERY, &row)?;
            let label = match district.as_deref().map(str::trim) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => UNASSIGNED_DISTRICT.to_string(),
            };
            *by_district.entry(label).or_insert(0) += n;
        }

        tx.rollback()
            .await
            .map_err(|e| Self::query_error("ROLLBACK", &e))?;

        Ok(MetricsBundle::new()
            .with_scalar("total_patients", total)
            .with_categorical("by_sex", SEX_LABELS.into_iter().zip(by_sex))
            .with_categorical("by_age_bracket", AGE_BRACKETS.into_iter().zip(by_age))
            .with_categorical("by_district", by_district))
    }
}

#[async_trait]
impl AggregateCollector for SqliteDemographicsCollector {
    async fn collect(&self) -> Result<MetricsBundle, CollectorError> {
        match self.collect_inner().await {
            Ok(bundle) => {
                tracing::debug!(metrics = bundle.len(), "demographics collected");
                Ok(bundle)
            }
            Err(e) => {
                tracing::warn!(error = %e, "demographics collection failed");
                Err(e)
            }
        }
    }
}

/// Map a stored sex value onto one of [`SEX_LABELS`].
///
/// `F`/`female` and `M`/`male` match case-insensitively; anything else,
/// including NULL, is `unspecified`.
#[must_use]
pub fn normalize_sex(value: Option<&str>) -> &'static str {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("f" | "female") => "female",
        Some("m" | "male") => "male",
        _ => "unspecified",
    }
}

/// Age bracket for a birth date on `today`.
///
/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp. Missing, unparsable and
/// future dates are `unknown`.
#[must_use]
pub fn age_bracket(birth_date: Option<&str>, today: NaiveDate) -> &'static str {
    let Some(birth) = birth_date.and_then(parse_birth_date) else {
        return UNKNOWN_AGE;
    };
    if birth > today {
        return UNKNOWN_AGE;
    }

    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }

    match years {
        0..=4 => "0-4",
        5..=14 => "5-14",
        15..=24 => "15-24",
        25..=44 => "25-44",
        45..=59 => "45-59",
        _ => "60+",
    }
}

fn parse_birth_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}
