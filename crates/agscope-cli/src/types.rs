use agscope_engine::RenderMode;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clap::ValueEnum;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    Plain,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Plain => write!(f, "plain"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum ShowMode {
    Transcript,
    Terminal,
    Json,
}

impl From<ShowMode> for RenderMode {
    fn from(mode: ShowMode) -> Self {
        match mode {
            ShowMode::Transcript => RenderMode::Transcript,
            ShowMode::Terminal => RenderMode::Terminal,
            ShowMode::Json => RenderMode::Json,
        }
    }
}

/// `--since` value: RFC 3339, or a bare date meaning the start of that day (UTC)
pub fn parse_since(value: &str) -> Result<DateTime<Utc>, String> {
    parse_bound(value, false)
}

/// `--until` value: RFC 3339, or a bare date meaning the end of that day (UTC)
pub fn parse_until(value: &str) -> Result<DateTime<Utc>, String> {
    parse_bound(value, true)
}

fn parse_bound(value: &str, end_of_day: bool) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("expected YYYY-MM-DD or RFC 3339 timestamp, got '{}'", value))?;
    let start = date.and_time(NaiveTime::MIN).and_utc();
    if end_of_day {
        Ok(start + Duration::days(1) - Duration::milliseconds(1))
    } else {
        Ok(start)
    }
}
