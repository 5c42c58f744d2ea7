//! Observation sources
//!
//! A source returns the raw event records for a query window. The metric
//! modules never read files themselves; the CLI builds a source and hands the
//! fetched observations to the pure calculators.
//!
//! CSV exports use one row per event with the header
//! `serial,station,model,part_number,timestamp,kind,status,code`.
//! `part_number`, `kind`, `status` and `code` may be empty; `kind` defaults to
//! `test`.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;
use walkdir::WalkDir;

use crate::core::standardize::standardize_station;
use crate::core::week::DateWindow;
use crate::entities::observation::{EventKind, Observation, TestStatus};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("data path not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}:{line}: unrecognised timestamp '{value}'")]
    Timestamp {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("{path}:{line}: test record without a pass/fail status")]
    MissingStatus { path: PathBuf, line: u64 },
}

/// What to fetch: a date window plus optional model and station predicates
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationQuery {
    pub window: DateWindow,

    /// Exact model match (case-insensitive)
    pub model: Option<String>,

    /// Station match after standardization
    pub station: Option<String>,
}

impl ObservationQuery {
    pub fn new(window: DateWindow) -> Self {
        Self {
            window,
            model: None,
            station: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_station(mut self, station: impl Into<String>) -> Self {
        self.station = Some(station.into());
        self
    }

    /// True when the observation satisfies every predicate
    pub fn matches(&self, obs: &Observation) -> bool {
        if !self.window.contains_time(&obs.timestamp) {
            return false;
        }
        if let Some(model) = &self.model {
            if !obs.model.trim().eq_ignore_ascii_case(model.trim()) {
                return false;
            }
        }
        if let Some(station) = &self.station {
            let wanted = standardize_station(Some(station));
            if standardize_station(Some(&obs.station)) != wanted {
                return false;
            }
        }
        true
    }
}

/// Anything that can produce observations for a query
pub trait ObservationSource {
    fn fetch(&self, query: &ObservationQuery) -> Result<Vec<Observation>, SourceError>;
}

/// In-memory source, filtered on every fetch
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    observations: Vec<Observation>,
}

impl MemorySource {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }
}

impl ObservationSource for MemorySource {
    fn fetch(&self, query: &ObservationQuery) -> Result<Vec<Observation>, SourceError> {
        Ok(self
            .observations
            .iter()
            .filter(|o| query.matches(o))
            .cloned()
            .collect())
    }
}

/// CSV export file, or a directory searched recursively for `*.csv`
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    serial: String,
    station: String,
    model: String,
    #[serde(default)]
    part_number: Option<String>,
    timestamp: String,
    #[serde(default)]
    kind: Option<EventKind>,
    #[serde(default)]
    status: Option<TestStatus>,
    #[serde(default)]
    code: Option<String>,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// CSV files backing this source, sorted by path
    pub fn files(&self) -> Result<Vec<PathBuf>, SourceError> {
        if self.path.is_file() {
            return Ok(vec![self.path.clone()]);
        }
        if !self.path.is_dir() {
            return Err(SourceError::NotFound(self.path.clone()));
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&self.path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            })
            .map(|e| e.into_path())
            .collect();
        files.sort();
        Ok(files)
    }

    fn read_file(
        &self,
        path: &Path,
        query: &ObservationQuery,
        out: &mut Vec<Observation>,
    ) -> Result<(), SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| csv_error(path, source))?;

        let mut read = 0usize;
        let mut kept = 0usize;
        for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
            // header is line 1
            let line = i as u64 + 2;
            let row = row.map_err(|source| csv_error(path, source))?;
            let obs = row.into_observation(path, line)?;
            read += 1;
            if query.matches(&obs) {
                kept += 1;
                out.push(obs);
            }
        }

        tracing::debug!(path = %path.display(), read, kept, "read csv export");
        Ok(())
    }
}

impl ObservationSource for CsvSource {
    fn fetch(&self, query: &ObservationQuery) -> Result<Vec<Observation>, SourceError> {
        let files = self.files()?;
        tracing::debug!(files = files.len(), window = %query.window, "fetching observations");

        let mut observations = Vec::new();
        for file in &files {
            self.read_file(file, query, &mut observations)?;
        }
        observations.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(observations)
    }
}

impl CsvRow {
    fn into_observation(self, path: &Path, line: u64) -> Result<Observation, SourceError> {
        let timestamp = parse_timestamp(&self.timestamp).ok_or_else(|| SourceError::Timestamp {
            path: path.to_path_buf(),
            line,
            value: self.timestamp.clone(),
        })?;
        let kind = self.kind.unwrap_or_default();
        if kind == EventKind::Test && self.status.is_none() {
            return Err(SourceError::MissingStatus {
                path: path.to_path_buf(),
                line,
            });
        }

        Ok(Observation {
            serial: self.serial,
            station: self.station,
            model: self.model,
            part_number: self.part_number.filter(|s| !s.is_empty()),
            timestamp,
            kind,
            status: self.status,
            code: self.code.filter(|s| !s.is_empty()),
        })
    }
}

fn csv_error(path: &Path, source: csv::Error) -> SourceError {
    if source.is_io_error() {
        if let csv::ErrorKind::Io(io) = source.into_kind() {
            return SourceError::Io {
                path: path.to_path_buf(),
                source: io,
            };
        }
        return SourceError::NotFound(path.to_path_buf());
    }
    SourceError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse the timestamp layouts found in station exports
///
/// A bare date is taken as midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
