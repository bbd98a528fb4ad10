//! Shared fixtures for domain unit tests.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::case::{self, CaseDefinition};

pub const SAMPLE_CASE_JSON: &str = include_str!("../../../cases/gallery_heist.json");

pub fn sample_case_json() -> Value {
    serde_json::from_str(SAMPLE_CASE_JSON).expect("sample case is valid JSON")
}

pub fn sample_case() -> CaseDefinition {
    case::load(&sample_case_json()).expect("sample case loads")
}

/// Sample case after `mutate` has edited the raw document.
pub fn case_with(mutate: impl FnOnce(&mut Value)) -> CaseDefinition {
    let mut raw = sample_case_json();
    mutate(&mut raw);
    case::load(&raw).expect("mutated case loads")
}

/// A fixed real-world instant the tests count from.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 21, 0, 0).unwrap()
}
