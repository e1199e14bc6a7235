//! Timestamped log lines for the harnesses.

use chrono::{DateTime, TimeZone, Utc};

/// A fixed instant `secs` seconds after 2024-01-15T10:00:00Z.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap() + chrono::Duration::seconds(secs)
}

/// A line as the Docker daemon emits it with `timestamps=1`.
pub fn stamped(secs: i64, message: &str) -> String {
    format!(
        "{} {message}",
        at(secs).to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
    )
}

/// Raw container output interleaving requests and a slow query.
pub const WEB_SESSION: &[(i64, &str)] = &[
    (1, "GET /healthz 200"),
    (3, "POST /api/v1/payments 201"),
    (6, "GET /api/v1/users/42 200"),
];

pub const DB_SESSION: &[(i64, &str)] = &[
    (2, "checkpoint starting"),
    (4, "slow query: SELECT * FROM payments (4200ms)"),
    (5, "checkpoint complete"),
];
