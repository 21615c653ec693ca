// Query-parameter normalizer: raw string filters in, typed criteria out.
//
// Malformed optional input never fails the search; the offending criterion is
// dropped with a diagnostic and the rest of the pipeline proceeds.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate};
use tracing::warn;

use crate::dates::DateRange;
use crate::filter::FilterCriteria;

impl FilterCriteria {
    /// Build criteria from raw query parameters.
    ///
    /// Unknown and absent keys leave the corresponding field unset, and an
    /// empty string value counts as absent. Numeric fields must parse as
    /// positive integers or they are ignored. The date constraint applies
    /// only when both `startDate` and `endDate` are present and parse as
    /// calendar dates.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self {
            category: non_empty(params, "category"),
            location_value: non_empty(params, "locationValue"),
            date_range: parse_date_range(params),
            guest_count: parse_count(params, "guestCount"),
            room_count: parse_count(params, "roomCount"),
            bathroom_count: parse_count(params, "bathroomCount"),
        }
    }
}

fn non_empty(params: &HashMap<String, String>, key: &str) -> Option<String> {
    params.get(key).filter(|v| !v.is_empty()).cloned()
}

fn parse_count(params: &HashMap<String, String>, key: &str) -> Option<u32> {
    let raw = params.get(key)?;
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            warn!(key, value = %raw, "dropping count filter: not a positive integer");
            None
        }
    }
}

fn parse_date_range(params: &HashMap<String, String>) -> Option<DateRange> {
    let (raw_start, raw_end) = match (params.get("startDate"), params.get("endDate")) {
        (Some(s), Some(e)) => (s, e),
        (None, None) => return None,
        _ => {
            warn!("dropping date filter: startDate and endDate must both be present");
            return None;
        }
    };

    let (start, end) = match (parse_date(raw_start), parse_date(raw_end)) {
        (Some(s), Some(e)) => (s, e),
        _ => {
            warn!(start = %raw_start, end = %raw_end, "dropping date filter: unparseable date");
            return None;
        }
    };

    match DateRange::new(start, end) {
        Ok(range) => Some(range),
        Err(err) => {
            warn!(%err, "dropping date filter");
            None
        }
    }
}

// Accepts plain calendar dates and full RFC 3339 timestamps; search forms
// serialize the picker state either way.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    raw.parse::<NaiveDate>()
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
