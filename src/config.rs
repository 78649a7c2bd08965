use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{FixedOffset, NaiveTime};
use dotenvy::dotenv;

use crate::attendance::punctuality::WorkSchedule;
use crate::device::hikvision::DEFAULT_MAX_RESULTS;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_attendance_per_min: u32,

    // Terminals
    pub device_scheme: String,
    pub device_timeout: Duration,
    pub device_probe_timeout: Duration,
    pub device_query_concurrency: usize,
    pub acs_max_results: u32,
    /// self-signed certificates tolerated on private LAN addresses
    pub device_accept_private_certs: bool,

    // Attendance day and rollup
    pub attendance_offset: FixedOffset,
    pub rollup_interval: Duration,
    pub rollup_enabled: bool,
    pub schedule: WorkSchedule,

    pub log_level: tracing::Level,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn time_of_day(key: &str, default: &str) -> Result<NaiveTime> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .with_context(|| format!("{key} must look like HH:MM, got {raw:?}"))
}

/// Parses `+07:00` / `-05:30` style offsets.
pub fn parse_offset(raw: &str) -> Result<FixedOffset> {
    let raw = raw.trim();
    let (sign, rest) = match raw.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => anyhow::bail!("offset must start with + or -: {raw:?}"),
    };
    let (hours, minutes) = rest
        .split_once(':')
        .with_context(|| format!("offset must look like +HH:MM: {raw:?}"))?;
    let seconds = hours.parse::<i32>()? * 3600 + minutes.parse::<i32>()? * 60;

    FixedOffset::east_opt(sign * seconds).with_context(|| format!("offset out of range: {raw:?}"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let offset = env::var("ATTENDANCE_UTC_OFFSET").unwrap_or_else(|_| "+07:00".to_string());

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            rate_attendance_per_min: parsed("RATE_ATTENDANCE_PER_MIN", 120)?,

            device_scheme: env::var("DEVICE_SCHEME").unwrap_or_else(|_| "http".to_string()),
            device_timeout: Duration::from_secs(parsed("DEVICE_TIMEOUT_SECS", 10)?),
            device_probe_timeout: Duration::from_secs(parsed("DEVICE_PROBE_TIMEOUT_SECS", 3)?),
            device_query_concurrency: parsed("DEVICE_QUERY_CONCURRENCY", 4)?,
            acs_max_results: parsed("ACS_MAX_RESULTS", DEFAULT_MAX_RESULTS)?,
            device_accept_private_certs: parsed("DEVICE_ACCEPT_PRIVATE_CERTS", true)?,

            attendance_offset: parse_offset(&offset)?,
            rollup_interval: Duration::from_secs(parsed("ROLLUP_INTERVAL_SECS", 60)?),
            rollup_enabled: parsed("ROLLUP_ENABLED", true)?,
            schedule: WorkSchedule {
                late_after: time_of_day("LATE_AFTER", "07:30")?,
                early_before: time_of_day("EARLY_BEFORE", "16:30")?,
            },

            log_level: parsed("LOG_LEVEL", tracing::Level::DEBUG)?,
        })
    }
}
