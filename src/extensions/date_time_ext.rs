use chrono::{DateTime, SecondsFormat, TimeZone};
use std::fmt::Display;

pub trait ToFileStamp {
    /// RFC 3339 with millisecond precision, with ':' and '.' replaced so it can be part of a file name.
    fn to_file_stamp(&self) -> String;
}

impl<Tz: TimeZone> ToFileStamp for DateTime<Tz>
where
    Tz::Offset: Display,
{
    fn to_file_stamp(&self) -> String {
        self.to_rfc3339_opts(SecondsFormat::Millis, true).replace([':', '.'], "-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    #[test]
    fn to_file_stamp_has_no_separators_that_break_file_names() {
        let time = Utc.with_ymd_and_hms(2025, 3, 1, 10, 4, 5).unwrap() + chrono::Duration::milliseconds(42);

        assert_eq!(time.to_file_stamp(), "2025-03-01T10-04-05-042Z");
    }
}
