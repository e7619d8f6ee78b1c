use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::errors::BackendError;

/// Calendar dates travel as `YYYY-MM-DD`, the format of an HTML date
/// input.
const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Returns today's date (UTC) formatted as `YYYY-MM-DD`.
pub fn today() -> String {
    format_date(OffsetDateTime::now_utc().date())
}

pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

/// Validates a `YYYY-MM-DD` date, returning it in canonical form.
pub fn parse_date(field: &'static str, raw: &str) -> Result<String, BackendError> {
    let date = Date::parse(raw.trim(), DATE_FORMAT).map_err(|e| {
        BackendError::invalid_field(field, format!("{:?} is not a YYYY-MM-DD date ({})", raw, e))
    })?;

    Ok(format_date(date))
}

#[cfg(test)]
mod tests {
    use super::{parse_date, today};
    use crate::errors::BackendError;

    #[test]
    fn dates_round_trip() {
        assert_eq!(parse_date("dueDate", " 2024-02-29 ").unwrap(), "2024-02-29");
    }

    #[test]
    fn impossible_dates_are_rejected() {
        for raw in &["2023-02-29", "2024-13-01", "tomorrow", ""] {
            match parse_date("dueDate", raw) {
                Err(BackendError::InvalidField { field, .. }) => assert_eq!(field, "dueDate"),
                other => panic!("expected {:?} to be rejected, got {:?}", raw, other),
            }
        }
    }

    #[test]
    fn today_is_parsable() {
        let today = today();

        assert_eq!(parse_date("dateAdded", &today).unwrap(), today);
    }
}
