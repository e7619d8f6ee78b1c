use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::BackendError;

/// Returns the value of the named environment variable if it exists or panics.
pub fn get_variable(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("must define {} environment variable", name))
}

/// Returns the value of the named environment variable, or `default`
/// if it isn't set.
pub fn get_variable_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_owned())
}

/// Parses the named environment variable, falling back to `default`
/// when it isn't set.
pub fn parse_variable<T>(name: &str, default: T) -> Result<T, BackendError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

/// Interprets the named environment variable as a flag. `1`, `true`
/// and `yes` enable it; `0`, `false` and `no` disable it.
pub fn flag_variable(name: &str, default: bool) -> Result<bool, BackendError> {
    match env::var(name) {
        Ok(raw) => parse_flag(name, &raw),
        Err(_) => Ok(default),
    }
}

/// Reads the named environment variable as a whole number of seconds,
/// rejecting values above `max`.
pub fn seconds_variable(
    name: &str,
    default: Duration,
    max: Duration,
) -> Result<Duration, BackendError> {
    match env::var(name) {
        Ok(raw) => parse_seconds(name, &raw, max),
        Err(_) => Ok(default.min(max)),
    }
}

/// Where records are kept.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Storage {
    /// In this process, lost on exit.
    Memory,
    Postgres,
}

impl FromStr for Storage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Storage::Memory),
            "postgres" | "postgresql" => Ok(Storage::Postgres),
            other => Err(format!("unknown storage {:?}", other)),
        }
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, BackendError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| BackendError::InvalidConfiguration {
            name: name.to_owned(),
            reason: e.to_string(),
        })
}

fn parse_seconds(name: &str, raw: &str, max: Duration) -> Result<Duration, BackendError> {
    let seconds: u64 = parse_value(name, raw)?;

    if seconds > max.as_secs() {
        return Err(BackendError::InvalidConfiguration {
            name: name.to_owned(),
            reason: format!("must be at most {} seconds", max.as_secs()),
        });
    }

    Ok(Duration::from_secs(seconds))
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, BackendError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(BackendError::InvalidConfiguration {
            name: name.to_owned(),
            reason: format!("{:?} is not a flag", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{parse_flag, parse_seconds, parse_value, Storage};
    use crate::errors::BackendError;

    #[test]
    fn flags_parse() {
        assert!(parse_flag("X", "1").unwrap());
        assert!(parse_flag("X", " Yes ").unwrap());
        assert!(!parse_flag("X", "false").unwrap());

        match parse_flag("X", "maybe") {
            Err(BackendError::InvalidConfiguration { name, .. }) => assert_eq!(name, "X"),
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn values_parse() {
        assert_eq!(parse_value::<u16>("PORT", " 8080").unwrap(), 8080);
        assert!(parse_value::<u16>("PORT", "eighty").is_err());
    }

    #[test]
    fn storage_kinds_parse() {
        assert_eq!(parse_value::<Storage>("S", " memory ").unwrap(), Storage::Memory);
        assert_eq!(parse_value::<Storage>("S", "Postgres").unwrap(), Storage::Postgres);
        assert!(parse_value::<Storage>("S", "redis").is_err());
    }

    #[test]
    fn seconds_are_capped() {
        let max = Duration::from_secs(3600);

        assert_eq!(parse_seconds("TTL", "60", max).unwrap(), Duration::from_secs(60));
        assert_eq!(parse_seconds("TTL", "3600", max).unwrap(), max);
        assert!(parse_seconds("TTL", "-1", max).is_err());

        for raw in &["3601", "18446744073709551615"] {
            match parse_seconds("TTL", raw, max) {
                Err(BackendError::InvalidConfiguration { name, reason }) => {
                    assert_eq!(name, "TTL");
                    assert!(reason.contains("3600"));
                }
                other => panic!("expected configuration error, got {:?}", other),
            }
        }
    }
}
