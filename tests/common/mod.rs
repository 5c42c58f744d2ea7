//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo;
use assert_cmd::Command;
use tempfile::TempDir;

/// Helper to get a qdash command isolated from the caller's environment
pub fn qdash() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("qdash"));
    cmd.env_remove("QDASH_DATA")
        .env_remove("QDASH_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

pub const CSV_HEADER: &str = "serial,station,model,part_number,timestamp,kind,status,code";

/// Two weeks of line data (2024-W10 for M100, 2024-W11 for M200)
///
/// SN001 and SN005 are the only first-pass units. SN006 never gets past ICT.
pub const LINE_ROWS: &[&str] = &[
    "SN001,VI,M100,PN-100,2024-03-04 08:00,test,PASS,",
    "SN001,ICT,M100,PN-100,2024-03-04 08:10,test,PASS,",
    "SN001,FT1,M100,PN-100,2024-03-04 08:20,test,PASS,",
    "SN001,FI,M100,PN-100,2024-03-04 08:30,test,PASS,",
    "SN001,PACK,M100,PN-100,2024-03-04 09:00,pack,,",
    "SN002,VI,M100,PN-100,2024-03-04 08:05,test,PASS,",
    "SN002,ICT,M100,PN-100,2024-03-04 08:15,test,FAIL,SHORT",
    "SN002,REPAIR,M100,PN-100,2024-03-04 08:40,repair,,no fault found",
    "SN002,ICT1,M100,PN-100,2024-03-04 09:00,test,PASS,",
    "SN002,FT1,M100,PN-100,2024-03-04 09:10,test,PASS,",
    "SN002,FI,M100,PN-100,2024-03-04 09:20,test,PASS,",
    "SN002,PACK,M100,PN-100,2024-03-04 09:40,pack,,",
    "SN003,VI!,M100,PN-100,2024-03-05 08:00,test,PASS,",
    "SN003,ICT,M100,PN-100,2024-03-05 08:10,test,PASS,",
    "SN003,FCT,M100,PN-100,2024-03-05 08:20,test,FAIL,NO BOOT",
    "SN003,REPAIR,M100,PN-100,2024-03-05 10:00,repair,,Aligned bent pin J501",
    "SN003,FCT,M100,PN-100,2024-03-05 10:30,test,PASS,",
    "SN003,FI,M100,PN-100,2024-03-05 10:40,test,PASS,",
    "SN004,VI,M100,PN-100,2024-03-05 08:05,test,PASS,",
    "SN004,ICT,M100,PN-100,2024-03-05 08:15,test,PASS,",
    "SN004,FT,M100,PN-100,2024-03-05 08:25,test,PASS,",
    "SN004,FI1,M100,PN-100,2024-03-05 08:35,test,FAIL,COSMETIC",
    "SN004,REPAIR,M100,PN-100,2024-03-05 11:00,repair,,NFF",
    "SN004,FI,M100,PN-100,2024-03-05 11:30,test,PASS,",
    "SN004,PACK,M100,PN-100,2024-03-05 12:00,pack,,",
    "SN005,VI,M200,,2024-03-11 08:00,test,PASS,",
    "SN005,ICT,M200,,2024-03-11 08:10,test,PASS,",
    "SN005,FCT,M200,,2024-03-11 08:20,test,PASS,",
    "SN005,FI,M200,,2024-03-11 08:30,test,PASS,",
    "SN005,PACK,M200,,2024-03-11 09:00,pack,,",
    "SN006,VI,M200,,2024-03-12 08:00,test,PASS,",
    "SN006,ICT,M200,,2024-03-12 08:10,test,FAIL,OPEN",
    "SN006,REPAIR,M200,,2024-03-12 09:00,repair,,Replaced heatsink & thermal pad",
];

/// Write the sample line data as `line.csv` and return its path
pub fn write_line_data(tmp: &TempDir) -> PathBuf {
    write_csv(tmp, "line.csv", LINE_ROWS)
}

/// Write a CSV export with the standard header
pub fn write_csv(tmp: &TempDir, name: &str, rows: &[&str]) -> PathBuf {
    let path = tmp.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut content = String::from(CSV_HEADER);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(&path, content).unwrap();
    path
}

/// Write `qdash.yaml` into the temp dir
pub fn write_config(tmp: &TempDir, yaml: &str) -> PathBuf {
    let path = tmp.path().join("qdash.yaml");
    fs::write(&path, yaml).unwrap();
    path
}

/// Temp dir holding the sample data, plus the window flags covering it
pub fn setup_line() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let data = write_line_data(&tmp);
    (tmp, data)
}

/// Window flags covering all of the sample data
pub const MARCH: [&str; 4] = ["--from", "2024-03-01", "--to", "2024-03-31"];

/// Parse stdout as JSON
pub fn json_stdout(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}
