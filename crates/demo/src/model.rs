//! The `OperatingSystem` example entity and its sample data.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use dynamic_search::metadata::{EntitySchema, SearchableEntity};

/// Table holding the sample rows.
pub const TABLE: &str = "operating_system";

/// Table layout for [`OperatingSystem`].
pub const DDL: &str = "CREATE TABLE IF NOT EXISTS operating_system (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    version TEXT,
    kernel TEXT,
    releaseDate TEXT,
    usages INTEGER
)";

/// An operating system release.
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

const OS_NAMES: &[&str] = &[
    "Windows",
    "Ubuntu",
    "Debian",
    "Fedora",
    "Red Hat Enterprise Linux",
    "CentOS",
    "Arch Linux",
    "openSUSE",
    "Linux Mint",
    "macOS",
    "Android",
    "iOS",
    "FreeBSD",
    "OpenBSD",
    "Rocky Linux",
    "AlmaLinux",
    "Manjaro",
    "Pop!_OS",
    "elementary OS",
    "Zorin OS",
];

const KERNELS: &[&str] = &[
    "NT 10.0",
    "NT 6.3",
    "NT 6.1",
    "Linux 6.11",
    "Linux 6.10",
    "Linux 6.8",
    "Linux 6.6",
    "Linux 6.1",
    "Linux 5.15",
    "Linux 5.14",
    "Linux 5.10",
    "Linux 5.4",
    "Linux 4.19",
    "Linux 4.18",
    "Linux 3.10",
    "Darwin 24.1",
    "Darwin 24.0",
    "Darwin 23.6",
    "Darwin 23.0",
    "Darwin 22.0",
    "FreeBSD 14.1",
    "OpenBSD 7.6",
];

/// Generates `count` rows; the same count always yields the same rows.
///
/// Every 11th row has no kernel, every 17th no usage count and every 23rd
/// an empty version, so the null and blank operators have something to find.
pub fn sample_rows(count: usize) -> Vec<OperatingSystem> {
    let epoch = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default();

    (1..=count)
        .map(|i| {
            let name = OS_NAMES[(i * 7) % OS_NAMES.len()];
            let kernel = (i % 11 != 0).then(|| KERNELS[(i * 13) % KERNELS.len()].to_string());
            let version = if i % 23 == 0 {
                String::new()
            } else {
                format!("{}.{}", i % 15 + 1, i % 10)
            };
            let release_date = epoch.checked_add_days(Days::new(((i * 37) % 5475) as u64));
            let usages = (i % 17 != 0).then(|| ((i * 7919) % 100_000) as i32);

            OperatingSystem {
                id: i as i64,
                name: name.to_string(),
                version: Some(version),
                kernel,
                release_date,
                usages,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rows_are_deterministic() {
        assert_eq!(sample_rows(50), sample_rows(50));
        assert_eq!(sample_rows(50).len(), 50);
    }

    #[test]
    fn test_sample_rows_cover_nulls_and_blanks() {
        let rows = sample_rows(100);
        assert!(rows.iter().any(|r| r.kernel.is_none()));
        assert!(rows.iter().any(|r| r.usages.is_none()));
        assert!(rows.iter().any(|r| r.version.as_deref() == Some("")));
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[0].name, "openSUSE");
    }
}
