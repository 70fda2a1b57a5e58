//! Shared fixtures for the integration tests.
//!
//! The `OperatingSystem` entity and its rows are chosen so that every
//! operator has matching, non-matching and null cases.

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use dynamic_search::metadata::{EntitySchema, SearchableEntity};
use dynamic_search::types::{
    FilterCriteria, FilterOperator, SearchCriteria, SearchResult, SortCriteria,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingSystem {
    pub id: i64,
    pub name: String,
    pub version: Option<String>,
    pub kernel: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub usages: Option<i32>,
}

impl SearchableEntity for OperatingSystem {
    fn schema() -> EntitySchema {
        EntitySchema::new("OperatingSystem")
            .field::<i64>("id")
            .field::<String>("name")
            .field::<Option<String>>("version")
            .field::<Option<String>>("kernel")
            .field::<Option<NaiveDate>>("releaseDate")
            .field::<Option<i32>>("usages")
    }
}

/// Table layout used by the SQLite tests.
pub const OPERATING_SYSTEM_DDL: &str = "CREATE TABLE operating_system (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    version TEXT,
    kernel TEXT,
    releaseDate TEXT,
    usages INTEGER
)";

fn os(
    id: i64,
    name: &str,
    version: Option<&str>,
    kernel: Option<&str>,
    release_date: Option<(i32, u32, u32)>,
    usages: Option<i32>,
) -> OperatingSystem {
    OperatingSystem {
        id,
        name: name.to_string(),
        version: version.map(str::to_string),
        kernel: kernel.map(str::to_string),
        release_date: release_date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        usages,
    }
}

pub fn sample_systems() -> Vec<OperatingSystem> {
    vec![
        os(1, "Windows", Some("11"), Some("NT 10.0"), Some((2021, 10, 5)), Some(300)),
        os(2, "Ubuntu", Some("24.04"), Some("Linux 6.8"), Some((2024, 4, 25)), Some(120)),
        os(3, "Debian", Some("12"), Some("Linux 6.1"), Some((2023, 6, 10)), Some(80)),
        os(4, "Fedora", Some("40"), Some("Linux 6.8"), Some((2024, 4, 23)), Some(45)),
        os(5, "macOS", Some("15"), Some("Darwin 24.0"), Some((2024, 9, 16)), None),
        os(6, "FreeBSD", Some(""), Some("FreeBSD 14.1"), Some((2024, 6, 4)), Some(10)),
        os(7, "Arch Linux", None, None, None, Some(60)),
    ]
}

pub fn ids(result: &SearchResult<OperatingSystem>) -> Vec<i64> {
    result.content.iter().map(|os| os.id).collect()
}

fn by_id(filter: FilterCriteria) -> SearchCriteria {
    SearchCriteria::default()
        .with_filter(filter)
        .with_sort(SortCriteria::asc("id"))
}

/// A named criteria document and the ids it must return, in id order.
pub struct Scenario {
    pub name: &'static str,
    pub criteria: SearchCriteria,
    pub expected: Vec<i64>,
}

fn scenario(name: &'static str, criteria: SearchCriteria, expected: &[i64]) -> Scenario {
    Scenario {
        name,
        criteria,
        expected: expected.to_vec(),
    }
}

/// The operator contract, one scenario per rule.
pub fn operator_scenarios() -> Vec<Scenario> {
    use FilterOperator::*;

    vec![
        scenario(
            "equals text",
            by_id(FilterCriteria::with_value("name", Equals, "Debian")),
            &[3],
        ),
        scenario(
            "contains is case-insensitive",
            by_id(FilterCriteria::with_value("name", Contains, "win")),
            &[1],
        ),
        scenario(
            "starts with",
            by_id(FilterCriteria::with_value("name", StartsWith, "FRE")),
            &[6],
        ),
        scenario(
            "ends with",
            by_id(FilterCriteria::with_value("kernel", EndsWith, "6.8")),
            &[2, 4],
        ),
        scenario(
            "contains treats wildcards literally",
            by_id(FilterCriteria::with_value("name", Contains, "%")),
            &[],
        ),
        scenario(
            "not contains skips nulls",
            by_id(FilterCriteria::with_value("kernel", NotContains, "LINUX")),
            &[1, 5, 6],
        ),
        scenario(
            "date-only equals covers the whole day",
            by_id(FilterCriteria::with_value("releaseDate", Equals, "2024-04-25")),
            &[2],
        ),
        scenario(
            "date-time equals is exact",
            by_id(FilterCriteria::with_value("releaseDate", Equals, "2024-04-25T00:00:00")),
            &[2],
        ),
        scenario(
            "date greater than",
            by_id(FilterCriteria::with_value("releaseDate", GreaterThan, "2024-04-24")),
            &[2, 5, 6],
        ),
        scenario(
            "date between",
            by_id(FilterCriteria::between("releaseDate", "2023-01-01", "24/04/2024 00:00:00")),
            &[3, 4],
        ),
        scenario(
            "number between is inclusive",
            by_id(FilterCriteria::between("usages", "45", "120")),
            &[2, 3, 4, 7],
        ),
        scenario(
            "number less than skips nulls",
            by_id(FilterCriteria::with_value("usages", LessThan, "50")),
            &[4, 6],
        ),
        scenario(
            "number less than with a decimal bound",
            by_id(FilterCriteria::with_value("usages", LessThan, "45.5")),
            &[4, 6],
        ),
        scenario(
            "not equals skips nulls",
            by_id(FilterCriteria::with_value("usages", NotEquals, "120")),
            &[1, 3, 4, 6, 7],
        ),
        scenario(
            "in",
            by_id(FilterCriteria::membership("name", In, ["Debian", "Fedora"])),
            &[3, 4],
        ),
        scenario(
            "in on numbers",
            by_id(FilterCriteria::membership("usages", In, ["10", "300", "999"])),
            &[1, 6],
        ),
        scenario(
            "not in skips nulls",
            by_id(FilterCriteria::membership("kernel", NotIn, ["Linux 6.8"])),
            &[1, 3, 5, 6],
        ),
        scenario(
            "blank text matches null and empty",
            by_id(FilterCriteria::new("version", Blank)),
            &[6, 7],
        ),
        scenario(
            "not blank text needs a non-empty value",
            by_id(FilterCriteria::new("version", NotBlank)),
            &[1, 2, 3, 4, 5],
        ),
        scenario(
            "blank number matches null",
            by_id(FilterCriteria::new("usages", Blank)),
            &[5],
        ),
        scenario(
            "not blank date",
            by_id(FilterCriteria::new("releaseDate", NotBlank)),
            &[1, 2, 3, 4, 5, 6],
        ),
        scenario(
            "ordering operator on text is dropped",
            by_id(FilterCriteria::with_value("name", GreaterThan, "M")),
            &[1, 2, 3, 4, 5, 6, 7],
        ),
        scenario(
            "between on text is dropped",
            by_id(FilterCriteria::between("name", "A", "C")),
            &[1, 2, 3, 4, 5, 6, 7],
        ),
        scenario(
            "text operator on number is dropped",
            by_id(FilterCriteria::with_value("usages", Contains, "1")),
            &[1, 2, 3, 4, 5, 6, 7],
        ),
        scenario(
            "filters combine with and",
            by_id(FilterCriteria::with_value("kernel", Contains, "linux"))
                .with_filter(FilterCriteria::with_value("usages", GreaterThan, "50")),
            &[2, 3],
        ),
        scenario(
            "full text spans every text field",
            SearchCriteria::default()
                .with_full_text("LINUX")
                .with_sort(SortCriteria::asc("id")),
            &[2, 3, 4, 7],
        ),
        scenario(
            "full text and filters",
            SearchCriteria::default()
                .with_full_text("linux")
                .with_filter(FilterCriteria::with_value("usages", LessThan, "70"))
                .with_sort(SortCriteria::asc("id")),
            &[4, 7],
        ),
        scenario(
            "blank full text is ignored",
            SearchCriteria::default()
                .with_full_text("   ")
                .with_sort(SortCriteria::asc("id")),
            &[1, 2, 3, 4, 5, 6, 7],
        ),
        scenario(
            "starts with ignores case",
            by_id(FilterCriteria::with_value("kernel", StartsWith, "darwin")),
            &[5],
        ),
    ]
}

/// Sort scenarios; ids are expected in result order.
pub fn sort_scenarios() -> Vec<Scenario> {
    vec![
        scenario(
            "descending puts nulls last",
            SearchCriteria::default().with_sort(SortCriteria::desc("usages")),
            &[1, 2, 3, 7, 4, 6, 5],
        ),
        scenario(
            "ascending puts nulls first",
            SearchCriteria::default().with_sort(SortCriteria::asc("usages")),
            &[5, 6, 4, 7, 3, 2, 1],
        ),
        scenario(
            "multiple keys apply in order",
            SearchCriteria::default()
                .with_filter(FilterCriteria::with_value("kernel", FilterOperator::Contains, "linux"))
                .with_sort(SortCriteria::desc("kernel"))
                .with_sort(SortCriteria::asc("name")),
            &[4, 2, 3],
        ),
        scenario(
            "text sort is by code point",
            SearchCriteria::default().with_sort(SortCriteria::asc("name")),
            &[7, 3, 4, 6, 2, 1, 5],
        ),
    ]
}

/// An entity with time-of-day and zoned timestamps and non-ASCII text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub starts_at: NaiveDateTime,
    pub published_at: Option<DateTime<Utc>>,
}

impl SearchableEntity for Event {
    fn schema() -> EntitySchema {
        EntitySchema::new("Event")
            .field::<i64>("id")
            .field::<String>("title")
            .field::<NaiveDateTime>("startsAt")
            .field::<Option<DateTime<Utc>>>("publishedAt")
    }
}

/// Table layout used by the SQLite tests.
pub const EVENT_DDL: &str = "CREATE TABLE event (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    startsAt TEXT NOT NULL,
    publishedAt TEXT
)";

fn at(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").unwrap()
}

fn event(id: i64, title: &str, starts_at: &str, published_at: Option<&str>) -> Event {
    Event {
        id,
        title: title.to_string(),
        starts_at: at(starts_at),
        published_at: published_at.map(|p| at(p).and_utc()),
    }
}

/// Rows straddling 2024-03-15: the last millisecond before it, its first
/// instant, mid-afternoon, its last millisecond and the next midnight.
pub fn sample_events() -> Vec<Event> {
    vec![
        event(1, "École d'été", "2024-03-14T23:59:59.999", Some("2024-03-15T10:30:00")),
        event(2, "ÅRHUS Festival", "2024-03-15T00:00:00", None),
        event(3, "Zürich Marathon", "2024-03-15T15:30:00", Some("2024-03-14T23:30:00")),
        event(4, "Night Run", "2024-03-15T23:59:59.999", Some("2024-03-16T00:00:00")),
        event(5, "Morning Swim", "2024-03-16T00:00:00", Some("2024-01-01T00:00:00")),
    ]
}

pub fn event_ids(result: &SearchResult<Event>) -> Vec<i64> {
    result.content.iter().map(|e| e.id).collect()
}

/// Date boundaries, zoned timestamps and case folding beyond ASCII.
pub fn event_scenarios() -> Vec<Scenario> {
    use FilterOperator::*;

    vec![
        scenario(
            "date-only equals covers every time of the day",
            by_id(FilterCriteria::with_value("startsAt", Equals, "2024-03-15")),
            &[2, 3, 4],
        ),
        scenario(
            "date-only not equals is exact",
            by_id(FilterCriteria::with_value("startsAt", NotEquals, "2024-03-15")),
            &[1, 3, 4, 5],
        ),
        scenario(
            "greater than a date-time",
            by_id(FilterCriteria::with_value("startsAt", GreaterThan, "2024-03-15 15:30:00")),
            &[4, 5],
        ),
        scenario(
            "between whole days",
            by_id(FilterCriteria::between("startsAt", "2024-03-15", "2024-03-16")),
            &[2, 3, 4, 5],
        ),
        scenario(
            "date-only equals on zoned timestamps",
            by_id(FilterCriteria::with_value("publishedAt", Equals, "2024-03-15")),
            &[1],
        ),
        scenario(
            "greater than on zoned timestamps",
            by_id(FilterCriteria::with_value("publishedAt", GreaterThan, "2024-01-01")),
            &[1, 3, 4],
        ),
        scenario(
            "contains folds accented letters",
            by_id(FilterCriteria::with_value("title", Contains, "éco")),
            &[1],
        ),
        scenario(
            "contains folds ring above",
            by_id(FilterCriteria::with_value("title", Contains, "århus")),
            &[2],
        ),
        scenario(
            "starts with folds umlauts",
            by_id(FilterCriteria::with_value("title", StartsWith, "ZÜRICH")),
            &[3],
        ),
        scenario(
            "full text folds accented letters",
            SearchCriteria::default()
                .with_full_text("ÉTÉ")
                .with_sort(SortCriteria::asc("id")),
            &[1],
        ),
        scenario(
            "zoned timestamps sort chronologically",
            SearchCriteria::default().with_sort(SortCriteria::asc("publishedAt")),
            &[2, 5, 3, 1, 4],
        ),
    ]
}
