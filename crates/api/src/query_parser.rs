//! Query-string parsing for `GET /api/traces`.
//!
//! Recognized parameters:
//! - `service`, `operation`
//! - `tag` (repeatable, `key:value`) and `tags` (JSON object of strings)
//! - `start`, `end` (Unix microseconds)
//! - `minDuration`, `maxDuration` (`300ms`, `1.5s`, `1m30s`)
//! - `limit`
//! - `traceID` (repeatable); when present the search is a lookup by ID

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracegate_models::{TraceId, TraceQueryParameters, DEFAULT_NUM_TRACES};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed query string: {0}")]
    QueryString(String),

    #[error("parameter 'service' is required")]
    ServiceRequired,

    #[error("malformed 'tag' parameter, expecting key:value, received: {0}")]
    MalformedTag(String),

    #[error("malformed 'tags' parameter, expecting a JSON object of strings: {0}")]
    MalformedTags(String),

    #[error("unable to parse param '{param}': {value}")]
    InvalidValue { param: &'static str, value: String },

    #[error("cannot parse traceID param: {0}")]
    InvalidTraceId(String),

    #[error("'minDuration' should be lower than or equal to 'maxDuration'")]
    MinDurationAboveMax,

    #[error("'start' should be lower than or equal to 'end'")]
    StartAfterEnd,
}

/// How far back a search looks when `start` is omitted.
const DEFAULT_LOOKBACK_HOURS: i64 = 1;

/// A parsed search request.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceQuery {
    pub params: TraceQueryParameters,
    pub trace_ids: Vec<TraceId>,
}

pub fn parse(raw: Option<&str>) -> Result<TraceQuery, ParseError> {
    parse_at(raw, Utc::now())
}

/// Parse with an explicit clock; `now` anchors the default time window.
pub fn parse_at(raw: Option<&str>, now: DateTime<Utc>) -> Result<TraceQuery, ParseError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw.unwrap_or(""))
        .map_err(|e| ParseError::QueryString(e.to_string()))?;

    let mut service = None;
    let mut operation = None;
    let mut tags = BTreeMap::new();
    let mut start = None;
    let mut end = None;
    let mut min_duration = None;
    let mut max_duration = None;
    let mut limit = None;
    let mut trace_ids = Vec::new();

    for (key, value) in pairs {
        match key.as_str() {
            "service" => service = non_empty(value),
            "operation" => operation = non_empty(value),
            "tag" => {
                let (k, v) = value
                    .split_once(':')
                    .ok_or_else(|| ParseError::MalformedTag(value.clone()))?;
                tags.insert(k.to_string(), v.to_string());
            }
            "tags" => {
                let parsed: BTreeMap<String, String> = serde_json::from_str(&value)
                    .map_err(|e| ParseError::MalformedTags(e.to_string()))?;
                tags.extend(parsed);
            }
            "start" => start = Some(parse_micros("start", &value)?),
            "end" => end = Some(parse_micros("end", &value)?),
            "minDuration" => min_duration = Some(parse_duration("minDuration", &value)?),
            "maxDuration" => max_duration = Some(parse_duration("maxDuration", &value)?),
            "limit" => {
                let n: usize = value.trim().parse().map_err(|_| ParseError::InvalidValue {
                    param: "limit",
                    value: value.clone(),
                })?;
                limit = Some(n);
            }
            "traceID" => {
                let id = value
                    .parse::<TraceId>()
                    .map_err(|e| ParseError::InvalidTraceId(e.to_string()))?;
                trace_ids.push(id);
            }
            _ => {}
        }
    }

    if service.is_none() && trace_ids.is_empty() {
        return Err(ParseError::ServiceRequired);
    }
    if let (Some(min), Some(max)) = (min_duration, max_duration) {
        if min > max {
            return Err(ParseError::MinDurationAboveMax);
        }
    }

    let end = end.unwrap_or(now);
    let start = match start {
        Some(start) => start,
        None => end
            .checked_sub_signed(ChronoDuration::hours(DEFAULT_LOOKBACK_HOURS))
            .ok_or_else(|| ParseError::InvalidValue {
                param: "end",
                value: end.timestamp_micros().to_string(),
            })?,
    };
    if start > end {
        return Err(ParseError::StartAfterEnd);
    }

    let mut params = TraceQueryParameters::new(service.unwrap_or_default(), start, end);
    params.operation_name = operation;
    params.tags = tags;
    params.duration_min = min_duration;
    params.duration_max = max_duration;
    params.num_traces = limit.filter(|n| *n > 0).unwrap_or(DEFAULT_NUM_TRACES);

    Ok(TraceQuery { params, trace_ids })
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_micros(param: &'static str, value: &str) -> Result<DateTime<Utc>, ParseError> {
    let invalid = || ParseError::InvalidValue {
        param,
        value: value.to_string(),
    };
    let micros: i64 = value.trim().parse().map_err(|_| invalid())?;
    DateTime::from_timestamp_micros(micros).ok_or_else(invalid)
}

/// Parse a duration such as `250us`, `1.5s` or `1h30m`.
pub fn parse_duration(param: &'static str, value: &str) -> Result<Duration, ParseError> {
    let invalid = || ParseError::InvalidValue {
        param,
        value: value.to_string(),
    };

    let mut rest = value.trim();
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total_nanos = 0f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];
        total_nanos += number * nanos_per_unit;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(total_nanos as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp_micros(1_700_000_000_000_000).unwrap()
    }

    #[test]
    fn test_parse_full_search() {
        let query = parse_at(
            Some("service=checkout&operation=pay&tag=http.method:POST&tags=%7B%22region%22%3A%22eu%22%7D&start=1000&end=2000&minDuration=10ms&maxDuration=1s&limit=20"),
            now(),
        )
        .unwrap();

        let params = &query.params;
        assert_eq!(params.service_name, "checkout");
        assert_eq!(params.operation_name.as_deref(), Some("pay"));
        assert_eq!(params.tags.get("http.method").map(String::as_str), Some("POST"));
        assert_eq!(params.tags.get("region").map(String::as_str), Some("eu"));
        assert_eq!(params.start_time_min.timestamp_micros(), 1000);
        assert_eq!(params.start_time_max.timestamp_micros(), 2000);
        assert_eq!(params.duration_min, Some(Duration::from_millis(10)));
        assert_eq!(params.duration_max, Some(Duration::from_secs(1)));
        assert_eq!(params.num_traces, 20);
        assert!(query.trace_ids.is_empty());
    }

    #[test]
    fn test_defaults() {
        let query = parse_at(Some("service=checkout"), now()).unwrap();
        assert_eq!(query.params.start_time_max, now());
        assert_eq!(query.params.start_time_min, now() - ChronoDuration::hours(1));
        assert_eq!(query.params.num_traces, DEFAULT_NUM_TRACES);
        assert!(query.params.tags.is_empty());
    }

    #[test]
    fn test_tag_value_may_contain_colons() {
        let query = parse_at(Some("service=a&tag=url:http://x"), now()).unwrap();
        assert_eq!(query.params.tags.get("url").map(String::as_str), Some("http://x"));
    }

    #[test]
    fn test_service_required_without_trace_ids() {
        assert_eq!(parse_at(None, now()), Err(ParseError::ServiceRequired));
        assert_eq!(parse_at(Some("service="), now()), Err(ParseError::ServiceRequired));
    }

    #[test]
    fn test_trace_ids_without_service() {
        let query = parse_at(Some("traceID=1&traceID=ab"), now()).unwrap();
        assert_eq!(query.trace_ids, vec![TraceId::new(0, 1), TraceId::new(0, 0xab)]);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            parse_at(Some("traceID=zz"), now()),
            Err(ParseError::InvalidTraceId(_))
        ));
        assert!(matches!(
            parse_at(Some("service=a&tag=novalue"), now()),
            Err(ParseError::MalformedTag(_))
        ));
        assert!(matches!(
            parse_at(Some("service=a&tags=notjson"), now()),
            Err(ParseError::MalformedTags(_))
        ));
        assert!(matches!(
            parse_at(Some("service=a&limit=-1"), now()),
            Err(ParseError::InvalidValue { param: "limit", .. })
        ));
        assert_eq!(
            parse_at(Some("service=a&minDuration=2s&maxDuration=1s"), now()),
            Err(ParseError::MinDurationAboveMax)
        );
        assert_eq!(
            parse_at(Some("service=a&start=2000&end=1000"), now()),
            Err(ParseError::StartAfterEnd)
        );
    }

    #[test]
    fn test_end_too_early_for_default_lookback() {
        let end = DateTime::<Utc>::MIN_UTC.timestamp_micros();
        let result = parse_at(Some(&format!("service=a&end={end}")), now());
        assert!(matches!(
            result,
            Err(ParseError::InvalidValue { param: "end", .. })
        ));

        let with_start = parse_at(Some(&format!("service=a&start={end}&end={end}")), now());
        assert!(with_start.is_ok());
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("d", "250us").unwrap(), Duration::from_micros(250));
        assert_eq!(parse_duration("d", "1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("d", "1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("d", "2h").unwrap(), Duration::from_secs(7200));
        assert!(parse_duration("d", "10").is_err());
        assert!(parse_duration("d", "ms").is_err());
        assert!(parse_duration("d", "5days").is_err());
    }
}
