use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;

/// Wall-clock zone used for day boundaries and lateness, independent of the
/// server's locale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CivilZone {
    Named(Tz),
    Fixed(FixedOffset),
}

/// Western Indonesia Time offset in seconds.
const WIB_OFFSET_SECS: i32 = 7 * 3600;

fn parse_fixed_offset(raw: &str) -> Option<FixedOffset> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (sign, rest) = match trimmed.chars().next()? {
        '+' => (1, &trimmed[1..]),
        '-' => (-1, &trimmed[1..]),
        _ => return None,
    };

    let rest = rest.trim();
    if rest.is_empty() || !rest.is_ascii() {
        return None;
    }

    let (hours, minutes) = if let Some((h, m)) = rest.split_once(':') {
        (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)
    } else if rest.len() > 2 {
        let (h, m) = rest.split_at(rest.len() - 2);
        (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)
    } else {
        (rest.parse::<i32>().ok()?, 0)
    };

    if hours > 14 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl CivilZone {
    /// UTC+7, the default attendance zone.
    pub fn wib() -> Self {
        FixedOffset::east_opt(WIB_OFFSET_SECS)
            .map(CivilZone::Fixed)
            .unwrap_or(CivilZone::Named(chrono_tz::Asia::Jakarta))
    }

    /// Accepts `UTC`, `GMT`, `UTC+7`, `+07:00`, `WIB`, or an IANA name such as
    /// `Asia/Jakarta`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let upper = trimmed.to_uppercase();
        if upper == "UTC" || upper == "GMT" {
            return FixedOffset::east_opt(0).map(CivilZone::Fixed);
        }
        if upper == "WIB" {
            return Some(Self::wib());
        }

        if upper.starts_with("UTC") || upper.starts_with("GMT") {
            let offset = &trimmed[3..];
            if offset.is_empty() {
                return FixedOffset::east_opt(0).map(CivilZone::Fixed);
            }
            return parse_fixed_offset(offset).map(CivilZone::Fixed);
        }

        if let Some(offset) = parse_fixed_offset(trimmed) {
            return Some(CivilZone::Fixed(offset));
        }

        trimmed.parse::<Tz>().ok().map(CivilZone::Named)
    }

    pub fn local(&self, utc_dt: DateTime<Utc>) -> NaiveDateTime {
        match self {
            CivilZone::Named(tz) => utc_dt.with_timezone(tz).naive_local(),
            CivilZone::Fixed(offset) => utc_dt.with_timezone(offset).naive_local(),
        }
    }

    pub fn today(&self, utc_dt: DateTime<Utc>) -> NaiveDate {
        self.local(utc_dt).date()
    }

    /// Civil time of day truncated to whole seconds.
    pub fn time_of_day(&self, utc_dt: DateTime<Utc>) -> NaiveTime {
        let time = self.local(utc_dt).time();
        time.with_nanosecond(0).unwrap_or(time)
    }

    /// Interprets a wall-clock reading in this zone. Ambiguous readings resolve
    /// to the earlier instant; readings inside a gap yield `None`.
    pub fn to_utc(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            CivilZone::Named(tz) => tz
                .from_local_datetime(&local)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            CivilZone::Fixed(offset) => offset
                .from_local_datetime(&local)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    pub fn format_time(&self, utc_dt: DateTime<Utc>) -> String {
        self.local(utc_dt).format("%H:%M:%S").to_string()
    }

    pub fn format_datetime(&self, utc_dt: DateTime<Utc>) -> String {
        self.local(utc_dt).format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl Default for CivilZone {
    fn default() -> Self {
        Self::wib()
    }
}

/// First and last calendar day of the month containing `date`.
///
/// The last day is found by jumping to day 28, adding four days (always lands
/// in the next month), truncating to the 1st and stepping back one day.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let day_28 = date.with_day(28).unwrap_or(date);
    let next_month = day_28 + Duration::days(4);
    let last = next_month
        .with_day(1)
        .map(|d| d - Duration::days(1))
        .unwrap_or(date);
    (first, last)
}

/// Short English weekday label (`Mon`..`Sun`).
pub fn weekday_label(date: NaiveDate) -> &'static str {
    match date.weekday() {
        chrono::Weekday::Mon => "Mon",
        chrono::Weekday::Tue => "Tue",
        chrono::Weekday::Wed => "Wed",
        chrono::Weekday::Thu => "Thu",
        chrono::Weekday::Fri => "Fri",
        chrono::Weekday::Sat => "Sat",
        chrono::Weekday::Sun => "Sun",
    }
}
