use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// One day of the booking calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekDay {
    pub date: NaiveDate,
    pub day_name: String,
}

/// A fixed one-hour slot `[start_time, end_time)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourSlot {
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

/// `days` consecutive calendar days starting at `start`.
pub fn build_week_days(start: NaiveDate, days: u32) -> Vec<WeekDay> {
    start
        .iter_days()
        .take(days as usize)
        .map(|date| WeekDay {
            date,
            day_name: date.format("%A").to_string(),
        })
        .collect()
}

/// Hourly slots from `start_hour` up to (not including) `end_hour`.
///
/// Hours past 23 cannot be represented as a wall-clock time and are dropped.
pub fn build_hour_slots(start_hour: u32, end_hour: u32) -> Vec<HourSlot> {
    (start_hour..end_hour)
        .filter_map(|hour| {
            let start_time = NaiveTime::from_hms_opt(hour, 0, 0)?;
            let end_time = NaiveTime::from_hms_opt(hour + 1, 0, 0)?;
            Some(HourSlot { start_time, end_time })
        })
        .collect()
}

/// Half-open interval overlap: `[a_start, a_end)` and `[b_start, b_end)`
/// share at least one instant.
///
/// This is the only definition of "these two windows conflict"; slot grids,
/// conflict checks and the SQL conflict query all follow it.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && b_start < a_end
}

/// The venue's calendar date at `now`.
pub fn today_in(offset: FixedOffset, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// Wall-clock `date` + `time` at the venue, as a UTC instant. Fails when the
/// shifted instant falls outside chrono's range.
pub fn local_instant(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> CoreResult<DateTime<Utc>> {
    date.and_time(time)
        .checked_sub_signed(Duration::seconds(i64::from(offset.local_minus_utc())))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| CoreError::ValidationError(format!("Date {} is out of range.", date)))
}

/// Serializes `NaiveTime` as zero-padded `HH:mm`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::Serializer;

        pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match time {
                Some(t) => super::serialize(t, serializer),
                None => serializer.serialize_none(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_week_days_are_consecutive() {
        let week = build_week_days(date("2024-06-03"), 7);
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, date("2024-06-03"));
        assert_eq!(week[0].day_name, "Monday");
        assert_eq!(week[6].date, date("2024-06-09"));
        assert_eq!(week[6].day_name, "Sunday");
    }

    #[test]
    fn test_week_crosses_month_boundary() {
        let week = build_week_days(date("2024-02-27"), 4);
        let dates: Vec<String> = week.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-02-27", "2024-02-28", "2024-02-29", "2024-03-01"]);
    }

    #[test]
    fn test_hour_slots_reference_grid() {
        let slots = build_hour_slots(9, 21);
        assert_eq!(slots.len(), 12);
        assert_eq!(slots[0].start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(slots[11].end_time, NaiveTime::from_hms_opt(21, 0, 0).unwrap());

        let json = serde_json::to_value(slots[0]).unwrap();
        assert_eq!(json["startTime"], "09:00");
        assert_eq!(json["endTime"], "10:00");
    }

    #[test]
    fn test_hour_slots_empty_range() {
        assert!(build_hour_slots(12, 12).is_empty());
        assert!(build_hour_slots(15, 10).is_empty());
    }

    #[test]
    fn test_overlap_vectors() {
        assert!(overlaps("09:00", "10:00", "09:30", "10:30"));
        assert!(!overlaps("09:00", "10:00", "10:00", "11:00"));
        assert!(!overlaps("10:00", "11:00", "09:00", "10:00"));
        assert!(overlaps("09:00", "12:00", "10:00", "11:00"));
        assert!(overlaps("10:00", "11:00", "09:00", "12:00"));
        assert!(overlaps("14:00", "15:00", "14:00", "15:00"));
    }

    #[test]
    fn test_overlap_string_and_time_agree() {
        let t = |s: &str| NaiveTime::parse_from_str(s, "%H:%M").unwrap();
        let vectors = [
            ("09:00", "10:00", "09:30", "10:30"),
            ("09:00", "10:00", "10:00", "11:00"),
            ("08:00", "09:00", "10:00", "11:00"),
            ("13:15", "14:45", "14:44", "16:00"),
        ];
        for (a, b, c, d) in vectors {
            assert_eq!(overlaps(a, b, c, d), overlaps(t(a), t(b), t(c), t(d)));
        }
    }

    #[test]
    fn test_local_instant_applies_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let instant = local_instant(date("2024-06-05"), NaiveTime::from_hms_opt(15, 0, 0).unwrap(), offset).unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-06-05T13:00:00+00:00");

        let west = FixedOffset::west_opt(5 * 3600).unwrap();
        let instant = local_instant(date("2024-06-05"), NaiveTime::from_hms_opt(22, 0, 0).unwrap(), west).unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-06-06T03:00:00+00:00");
    }

    #[test]
    fn test_local_instant_out_of_range_is_an_error() {
        let late = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
        let west = FixedOffset::west_opt(3600).unwrap();
        assert!(local_instant(NaiveDate::MAX, late, west).is_err());

        let east = FixedOffset::east_opt(3600).unwrap();
        assert!(local_instant(NaiveDate::MIN, NaiveTime::MIN, east).is_err());
    }

    #[test]
    fn test_today_in_venue_offset() {
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 23, 30, 0).unwrap();
        assert_eq!(today_in(FixedOffset::east_opt(0).unwrap(), now), date("2024-06-03"));
        assert_eq!(today_in(FixedOffset::east_opt(3600).unwrap(), now), date("2024-06-04"));
    }
}
