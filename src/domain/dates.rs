//! Date parsing and formatting shared by documents, templates and feeds.

use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time,
    format_description::BorrowedFormatItem,
    format_description::well_known::{Rfc2822, Rfc3339},
    macros::format_description,
};

/// Human-friendly format used by layouts, e.g. `May 3, 2016`.
pub const HUMAN_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");

const URL_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]/[month]/[day]");

const DATE_ONLY: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month padding:none]-[day padding:none]");

const DATE_TIME_SECONDS: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month padding:none]-[day padding:none] [hour padding:none]:[minute]:[second]"
);

const DATE_TIME_MINUTES: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month padding:none]-[day padding:none] [hour padding:none]:[minute]"
);

/// Parse a front-matter date. Values without an offset are taken as UTC.
pub fn parse_front_matter_date(input: &str) -> Result<OffsetDateTime, String> {
    let trimmed = input.trim();

    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(parsed);
    }

    for format in [DATE_TIME_SECONDS, DATE_TIME_MINUTES] {
        if let Ok(parsed) = PrimitiveDateTime::parse(trimmed, format) {
            return Ok(parsed.assume_utc());
        }
    }

    Date::parse(trimmed, DATE_ONLY)
        .map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc())
        .map_err(|_| {
            format!("`{trimmed}` is not `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]` or RFC 3339")
        })
}

/// Start of the given calendar day in UTC.
pub fn start_of_day(date: Date) -> OffsetDateTime {
    PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc()
}

/// `YYYY/MM/DD` segment used in post URLs.
pub fn url_date_path(date: Date) -> String {
    date.format(URL_DATE_FORMAT)
        .unwrap_or_else(|_| format!("{:04}/{:02}/{:02}", date.year(), u8::from(date.month()), date.day()))
}

pub fn format_human_date(value: OffsetDateTime) -> String {
    value
        .format(HUMAN_DATE_FORMAT)
        .unwrap_or_else(|_| value.date().to_string())
}

pub fn format_rfc3339(value: OffsetDateTime) -> String {
    value
        .format(&Rfc3339)
        .unwrap_or_else(|_| value.to_string())
}

pub fn format_rfc2822(value: OffsetDateTime) -> String {
    value
        .format(&Rfc2822)
        .unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Month, macros::datetime};

    #[test]
    fn parses_every_supported_shape() {
        assert_eq!(
            parse_front_matter_date("2016-5-3").expect("date"),
            datetime!(2016-05-03 0:00 UTC)
        );
        assert_eq!(
            parse_front_matter_date("2016-05-03 14:30").expect("date"),
            datetime!(2016-05-03 14:30 UTC)
        );
        assert_eq!(
            parse_front_matter_date("2016-05-03 14:30:15").expect("date"),
            datetime!(2016-05-03 14:30:15 UTC)
        );
        assert_eq!(
            parse_front_matter_date("2016-05-03T14:30:00+02:00").expect("date"),
            datetime!(2016-05-03 14:30 +2)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_front_matter_date("yesterday").is_err());
        assert!(parse_front_matter_date("2016-13-01").is_err());
    }

    #[test]
    fn url_path_pads_month_and_day() {
        let date = Date::from_calendar_date(2016, Month::May, 3).expect("date");
        assert_eq!(url_date_path(date), "2016/05/03");
    }

    #[test]
    fn human_date_is_readable() {
        assert_eq!(
            format_human_date(datetime!(2016-05-03 0:00 UTC)),
            "May 3, 2016"
        );
    }
}
