//! Observation entity - one manufacturing event recorded by station equipment
//!
//! Observations are produced upstream (test fixtures, repair benches, packing
//! scanners) and consumed read-only by the metrics engine.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Kind of event recorded against a unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Functional or visual test at a station
    #[default]
    #[serde(alias = "TEST", alias = "Test")]
    Test,
    /// Rework performed at a repair bench
    #[serde(alias = "REPAIR", alias = "Repair")]
    Repair,
    /// Unit packed for shipment (end of flow)
    #[serde(alias = "PACK", alias = "Pack", alias = "packing", alias = "PACKING")]
    Pack,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Test => write!(f, "test"),
            EventKind::Repair => write!(f, "repair"),
            EventKind::Pack => write!(f, "pack"),
        }
    }
}

/// Pass/fail outcome of a test event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    #[serde(alias = "PASS", alias = "Pass", alias = "P")]
    Pass,
    #[serde(alias = "FAIL", alias = "Fail", alias = "F")]
    Fail,
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestStatus::Pass => write!(f, "pass"),
            TestStatus::Fail => write!(f, "fail"),
        }
    }
}

/// A single manufacturing event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Unit serial number
    pub serial: String,

    /// Station name as entered on the line (not standardized)
    pub station: String,

    /// Product model type
    pub model: String,

    /// Part number, when the export carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_number: Option<String>,

    /// Local time the event was recorded
    pub timestamp: NaiveDateTime,

    /// Event kind
    #[serde(default)]
    pub kind: EventKind,

    /// Outcome (required for test events)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TestStatus>,

    /// Defect or repair code, free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Observation {
    /// Create a test event
    pub fn test(
        serial: impl Into<String>,
        station: impl Into<String>,
        model: impl Into<String>,
        timestamp: NaiveDateTime,
        status: TestStatus,
    ) -> Self {
        Self {
            serial: serial.into(),
            station: station.into(),
            model: model.into(),
            part_number: None,
            timestamp,
            kind: EventKind::Test,
            status: Some(status),
            code: None,
        }
    }

    /// Create a repair event carrying a repair code
    pub fn repair(
        serial: impl Into<String>,
        station: impl Into<String>,
        model: impl Into<String>,
        timestamp: NaiveDateTime,
        code: impl Into<String>,
    ) -> Self {
        Self {
            serial: serial.into(),
            station: station.into(),
            model: model.into(),
            part_number: None,
            timestamp,
            kind: EventKind::Repair,
            status: None,
            code: Some(code.into()),
        }
    }

    /// Create a packing event
    pub fn pack(
        serial: impl Into<String>,
        model: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            serial: serial.into(),
            station: "PACK".to_string(),
            model: model.into(),
            part_number: None,
            timestamp,
            kind: EventKind::Pack,
            status: None,
            code: None,
        }
    }

    /// Attach a defect code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach a part number
    pub fn with_part_number(mut self, part_number: impl Into<String>) -> Self {
        self.part_number = Some(part_number.into());
        self
    }

    /// Calendar date of the event
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// True for test events with a recorded outcome
    pub fn is_test(&self) -> bool {
        self.kind == EventKind::Test && self.status.is_some()
    }

    pub fn is_pass(&self) -> bool {
        self.is_test() && self.status == Some(TestStatus::Pass)
    }

    pub fn is_fail(&self) -> bool {
        self.is_test() && self.status == Some(TestStatus::Fail)
    }
}
