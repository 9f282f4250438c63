use std::time::Duration;

use reqwest::header::HeaderMap;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

static REMAINING_HEADER: &str = "x-ratelimit-remaining";
static RESET_HEADER: &str = "x-ratelimit-reset";

/// How long to wait before the next request, if the remaining request budget is at or
/// below `floor` and the reset time is still in the future
pub(crate) fn check_rate_limit(
    headers: &HeaderMap,
    floor: u64,
    now: OffsetDateTime,
) -> Option<Duration> {
    let remaining = headers
        .get(REMAINING_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()?;
    if remaining > floor {
        return None;
    }

    let reset_at = parse_reset(headers.get(RESET_HEADER)?.to_str().ok()?)?;
    let wait = reset_at - now;
    if !wait.is_positive() {
        return None;
    }
    Duration::try_from(wait).ok()
}

// The API sends an RFC 3339 timestamp, fall back to unix seconds
fn parse_reset(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    OffsetDateTime::parse(value, &Rfc3339).ok().or_else(|| {
        value
            .parse::<i64>()
            .ok()
            .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
    })
}
