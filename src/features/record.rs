//! Raw record parsing.
//!
//! Turns the scraped free-text fields of a `RawRecord` into the numeric fields
//! of a `ParsedRecord`:
//!
//! - `Date_of_Journey` (`DD/MM/YYYY`) -> day + month (year discarded)
//! - `Dep_Time` / `Arrival_Time` -> hour + minute
//! - `Duration` (`"2h 50m"`, `"4h"`, `"30m"`) -> hours + minutes
//! - `Total_Stops` (`"non-stop"`, `"1 stop"`, ...) -> 0..=4
//!
//! Errors carry the offending field and value; the caller attaches the line.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

use crate::domain::{ParsedRecord, RawRecord};
use crate::error::IngestError;

/// Parse one raw record into its model-ready projection.
pub fn parse_record(raw: &RawRecord) -> Result<ParsedRecord, IngestError> {
    let (journey_date, journey_month) = parse_journey_date(&raw.date_of_journey)?;
    let (dep_hour, dep_min) = parse_time_of_day("Dep_Time", &raw.dep_time)?;
    let (arrival_hour, arrival_min) = parse_time_of_day("Arrival_Time", &raw.arrival_time)?;
    let (duration_hours, duration_mins) = parse_duration(&raw.duration)?;
    let total_stops = parse_total_stops(&raw.total_stops)?;

    Ok(ParsedRecord {
        airline: raw.airline.clone(),
        source: raw.source.clone(),
        destination: raw.destination.clone(),
        total_stops,
        price: raw.price,
        journey_date,
        journey_month,
        dep_hour,
        dep_min,
        arrival_hour,
        arrival_min,
        duration_hours,
        duration_mins,
    })
}

/// `DD/MM/YYYY` -> `(day, month)`.
pub fn parse_journey_date(s: &str) -> Result<(u32, u32), IngestError> {
    let date = NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y")
        .map_err(|e| IngestError::malformed("Date_of_Journey", s, format!("expected DD/MM/YYYY ({e})")))?;
    Ok((date.day(), date.month()))
}

/// Time-of-day -> `(hour, minute)`.
///
/// Scraped times come as `"22:20"`, `"01:10 22 Mar"` or `"2019-03-24 09:25"`:
/// exactly one whitespace token must look like `HH:MM` (or `HH:MM:SS`); the
/// remaining tokens are a date and are ignored.
pub fn parse_time_of_day(field: &'static str, s: &str) -> Result<(u32, u32), IngestError> {
    let mut clock_tokens = s.split_whitespace().filter(|t| t.contains(':'));
    let (Some(token), None) = (clock_tokens.next(), clock_tokens.next()) else {
        return Err(IngestError::malformed(field, s, "expected exactly one HH:MM time"));
    };

    let time = NaiveTime::parse_from_str(token, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(token, "%H:%M:%S"))
        .map_err(|e| IngestError::malformed(field, s, format!("invalid time '{token}' ({e})")))?;
    Ok((time.hour(), time.minute()))
}

/// Free-text duration -> `(hours, minutes)`.
///
/// A string without exactly two tokens is first normalized: if it contains an
/// `h` it is hours-only and gets `" 0m"` appended, otherwise it is
/// minutes-only and gets `"0h "` prepended. Hours are then the integer before
/// the first `h`; minutes the last token before the first `m`.
pub fn parse_duration(s: &str) -> Result<(u32, u32), IngestError> {
    let normalized = if s.split_whitespace().count() != 2 {
        if s.contains('h') {
            format!("{} 0m", s.trim())
        } else {
            format!("0h {s}")
        }
    } else {
        s.to_string()
    };

    if normalized.split_whitespace().count() != 2 {
        return Err(IngestError::malformed("Duration", s, "expected `<h>h <m>m`, `<h>h` or `<m>m`"));
    }

    let hours_text = match normalized.split_once('h') {
        Some((before, _)) => before,
        None => normalized.as_str(),
    };
    let hours = hours_text
        .trim()
        .parse::<u32>()
        .map_err(|_| IngestError::malformed("Duration", s, format!("invalid hours '{}'", hours_text.trim())))?;

    let before_m = match normalized.split_once('m') {
        Some((before, _)) => before,
        None => normalized.as_str(),
    };
    let minutes_text = before_m.split_whitespace().last().unwrap_or("");
    let minutes = minutes_text
        .parse::<u32>()
        .map_err(|_| IngestError::malformed("Duration", s, format!("invalid minutes '{minutes_text}'")))?;
    if minutes > 59 {
        return Err(IngestError::malformed("Duration", s, "minutes must be in 0..=59"));
    }

    Ok((hours, minutes))
}

/// `"non-stop"` / `"N stop(s)"` -> number of stops.
pub fn parse_total_stops(s: &str) -> Result<u8, IngestError> {
    match s.trim() {
        "non-stop" => Ok(0),
        "1 stop" => Ok(1),
        "2 stops" => Ok(2),
        "3 stops" => Ok(3),
        "4 stops" => Ok(4),
        _ => Err(IngestError::UnknownCategory {
            line: 0,
            field: "Total_Stops",
            value: s.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawRecord {
        RawRecord {
            airline: "IndiGo".to_string(),
            date_of_journey: "24/03/2019".to_string(),
            source: "Banglore".to_string(),
            destination: "New Delhi".to_string(),
            route: "BLR → DEL".to_string(),
            dep_time: "22:20".to_string(),
            arrival_time: "01:10 22 Mar".to_string(),
            duration: "2h 50m".to_string(),
            total_stops: "non-stop".to_string(),
            additional_info: "No info".to_string(),
            price: 3897,
        }
    }

    #[test]
    fn parses_typical_listing() {
        let parsed = parse_record(&raw()).unwrap();
        assert_eq!(parsed.airline, "IndiGo");
        assert_eq!(parsed.total_stops, 0);
        assert_eq!((parsed.journey_date, parsed.journey_month), (24, 3));
        assert_eq!((parsed.dep_hour, parsed.dep_min), (22, 20));
        assert_eq!((parsed.arrival_hour, parsed.arrival_min), (1, 10));
        assert_eq!((parsed.duration_hours, parsed.duration_mins), (2, 50));
        assert_eq!(parsed.price, 3897);
    }

    #[test]
    fn duration_fills_missing_unit_with_zero() {
        for h in [0u32, 1, 5, 19, 47] {
            for m in [0u32, 5, 30, 59] {
                assert_eq!(parse_duration(&format!("{h}h {m}m")).unwrap(), (h, m));
            }
            assert_eq!(parse_duration(&format!("{h}h")).unwrap(), (h, 0));
        }
        for m in [5u32, 30, 59] {
            assert_eq!(parse_duration(&format!("{m}m")).unwrap(), (0, m));
        }
    }

    #[test]
    fn duration_single_token_with_h_is_hours() {
        assert_eq!(parse_duration("4h").unwrap(), (4, 0));
        assert_eq!(parse_duration(" 4h ").unwrap(), (4, 0));
    }

    #[test]
    fn duration_rejects_garbage() {
        for bad in ["abc", "", "h", "2x 3y", "1h 2m 3m", "-1h 5m", "2h 75m"] {
            let err = parse_duration(bad).unwrap_err();
            assert!(
                matches!(err, IngestError::MalformedRecord { field: "Duration", .. }),
                "{bad:?} -> {err}"
            );
        }
    }

    #[test]
    fn journey_date_drops_year() {
        assert_eq!(parse_journey_date("1/3/2019").unwrap(), (1, 3));
        assert_eq!(parse_journey_date("31/12/2020").unwrap(), (31, 12));
        assert_eq!(parse_journey_date("31/12/1999").unwrap(), parse_journey_date("31/12/2020").unwrap());
    }

    #[test]
    fn journey_date_is_strict() {
        for bad in ["2019-03-24", "32/01/2019", "29/02/2019", "24/03", "03/24/2019"] {
            assert!(parse_journey_date(bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn time_ignores_date_prefix_or_suffix() {
        assert_eq!(parse_time_of_day("Dep_Time", "09:25").unwrap(), (9, 25));
        assert_eq!(parse_time_of_day("Arrival_Time", "04:25 10 Jun").unwrap(), (4, 25));
        assert_eq!(parse_time_of_day("Arrival_Time", "2019-06-10 04:25").unwrap(), (4, 25));
        assert_eq!(parse_time_of_day("Dep_Time", "23:59:30").unwrap(), (23, 59));
    }

    #[test]
    fn time_rejects_bad_clock() {
        for bad in ["25:00", "noon", "10:00 11:00", ""] {
            assert!(parse_time_of_day("Dep_Time", bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn total_stops_mapping() {
        assert_eq!(parse_total_stops("non-stop").unwrap(), 0);
        assert_eq!(parse_total_stops("1 stop").unwrap(), 1);
        assert_eq!(parse_total_stops("4 stops").unwrap(), 4);
        let err = parse_total_stops("5 stops").unwrap_err();
        assert!(matches!(err, IngestError::UnknownCategory { field: "Total_Stops", .. }));
    }
}
