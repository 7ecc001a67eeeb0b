use std::time::Duration;

/// Label recorded for requests that failed before a template was selected.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Number of progress notifications spread over a run.
pub const PROGRESS_STEPS: usize = 10;

/// Number of distinct error messages kept in a [`Report`](crate::Report).
pub const MAX_ERROR_ENTRIES: usize = 5;

/// Default ceiling on waiting for (or opening) a pooled connection.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// The "magic date" marking currently valid rows in the employees schema.
pub const DEFAULT_ACTIVE_DATE: &str = "9999-01-01";

pub const DEFAULT_MIN_EMPLOYEE_ID: i64 = 10_001;
pub const DEFAULT_MAX_EMPLOYEE_ID: i64 = 200_000;

pub const DEFAULT_MIN_SALARY: i64 = 90_000;
pub const DEFAULT_MAX_SALARY: i64 = 150_000;

pub const DEFAULT_FIRST_YEAR: i32 = 1990;
pub const DEFAULT_LAST_YEAR: i32 = 1998;

/// Length of the last-name prefix typed into an autocomplete box.
pub const PREFIX_LEN: usize = 3;

pub const DEPARTMENTS: &[&str] = &[
    "d001", "d002", "d003", "d004", "d005", "d006", "d007", "d008", "d009",
];

pub const LAST_NAMES: &[&str] = &[
    "Smith",
    "Johnson",
    "Williams",
    "Brown",
    "Jones",
    "Garcia",
    "Miller",
    "Davis",
    "Rodriguez",
    "Martinez",
];

pub const TITLES: &[&str] = &[
    "Senior Engineer",
    "Staff",
    "Engineer",
    "Senior Staff",
    "Assistant Engineer",
    "Technique Leader",
    "Manager",
];
