/// Log line extraction: scan debug-log lines for cache-size measurements
/// and collect them into an ordered series.
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Lines below this height belong to an earlier operational era and are
/// skipped.
pub const MIN_HEIGHT: u64 = 840_000;

/// Matches a full log line: ISO timestamp at the start, then a `height=`
/// token, then a `cache=<value>MiB` token, with arbitrary text in between.
static LOG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z).*height=(\d+).*cache=(\d+\.\d+)MiB")
        .unwrap()
});

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One cache-size measurement taken from a single log line.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSample {
    pub timestamp: DateTime<Utc>,
    pub cache_size_mib: f64,
}

/// Parse one log line.
///
/// Returns `Ok(None)` when the line does not match the expected shape or
/// its height is below [`MIN_HEIGHT`] — both are deliberate skips, not
/// errors. A line that matches the shape but carries an invalid calendar
/// timestamp (or an overflowing height) is a fatal error: the pattern is
/// expected to guarantee validity, so a violation means the log is not
/// what this tool was built for.
pub fn parse_line(line: &str) -> Result<Option<CacheSample>, ExtractError> {
    let caps = match LOG_LINE.captures(line) {
        Some(caps) => caps,
        None => return Ok(None),
    };

    let height: u64 = caps[2].parse().map_err(|e| ExtractError::Height {
        raw: caps[2].to_string(),
        source: e,
    })?;

    if height < MIN_HEIGHT {
        debug!(height, "skipping line below height threshold");
        return Ok(None);
    }

    let timestamp = NaiveDateTime::parse_from_str(&caps[1], TIMESTAMP_FORMAT)
        .map_err(|e| ExtractError::Timestamp {
            raw: caps[1].to_string(),
            source: e,
        })?
        .and_utc();

    let cache_size_mib: f64 = caps[3].parse().map_err(|e| ExtractError::CacheSize {
        raw: caps[3].to_string(),
        source: e,
    })?;

    Ok(Some(CacheSample {
        timestamp,
        cache_size_mib,
    }))
}

/// Scan the full log content and collect every matching, threshold-passing
/// line into a series, preserving input order.
///
/// Lines are independent: a skipped line never affects its neighbors. The
/// first fatal parse error aborts the scan.
pub fn analyze(content: &str) -> Result<Vec<CacheSample>, ExtractError> {
    let mut series = Vec::new();
    for line in content.lines() {
        if let Some(sample) = parse_line(line)? {
            series.push(sample);
        }
    }
    Ok(series)
}

#[derive(Debug)]
pub enum ExtractError {
    Timestamp {
        raw: String,
        source: chrono::ParseError,
    },
    Height {
        raw: String,
        source: std::num::ParseIntError,
    },
    CacheSize {
        raw: String,
        source: std::num::ParseFloatError,
    },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Timestamp { raw, source } => {
                write!(f, "invalid timestamp '{raw}': {source}")
            }
            ExtractError::Height { raw, source } => {
                write!(f, "invalid height '{raw}': {source}")
            }
            ExtractError::CacheSize { raw, source } => {
                write!(f, "invalid cache size '{raw}': {source}")
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::Timestamp { source, .. } => Some(source),
            ExtractError::Height { source, .. } => Some(source),
            ExtractError::CacheSize { source, .. } => Some(source),
        }
    }
}
