//! Rendering of PHP `date()`-style patterns such as `Y-m-d` or
//! `F j, Y, g:i a`.
//!
//! Every recognised letter is replaced by the matching date component,
//! `\` escapes the following character and everything else is copied
//! verbatim. A nonsensical pattern therefore produces odd text, never an
//! error.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::fmt::{self, Write};

pub const DEFAULT_DATE_FORMAT: &str = "F j, Y, g:i a";
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// A resolved timezone: either an IANA zone or a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Named(Tz),
    Fixed(FixedOffset),
}

/// Resolve a timezone string.
///
/// Accepts IANA names (`Europe/Berlin`), `UTC`/`Z` and fixed offsets in
/// the `+03:00`, `+0300` or `+03` shapes. Returns `None` for anything else.
pub fn resolve_timezone(name: &str) -> Option<Zone> {
    let name = name.trim();
    if name.eq_ignore_ascii_case("utc") || name.eq_ignore_ascii_case("z") {
        return Some(Zone::Named(Tz::UTC));
    }
    if let Ok(tz) = name.parse::<Tz>() {
        return Some(Zone::Named(tz));
    }
    parse_offset(name).map(Zone::Fixed)
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Render `instant` with `pattern` in the given timezone.
///
/// An unresolvable timezone falls back to UTC.
pub fn render_in(pattern: &str, instant: DateTime<Utc>, timezone: &str) -> String {
    match resolve_timezone(timezone) {
        Some(Zone::Named(tz)) => render(pattern, &instant.with_timezone(&tz), tz.name()),
        Some(Zone::Fixed(offset)) => {
            let id = offset.to_string();
            render(pattern, &instant.with_timezone(&offset), &id)
        }
        None => render(pattern, &instant.with_timezone(&Tz::UTC), DEFAULT_TIMEZONE),
    }
}

/// Render a localized date with a PHP-style pattern.
///
/// `zone_id` is what the `e` letter prints.
pub fn render<Z>(pattern: &str, dt: &DateTime<Z>, zone_id: &str) -> String
where
    Z: TimeZone,
    Z::Offset: fmt::Display,
{
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
            continue;
        }
        // Writing into a String cannot fail.
        let _ = write_letter(&mut out, c, dt, zone_id);
    }
    out
}

fn write_letter<Z>(out: &mut String, c: char, dt: &DateTime<Z>, zone_id: &str) -> fmt::Result
where
    Z: TimeZone,
    Z::Offset: fmt::Display,
{
    let offset_secs = dt.offset().fix().local_minus_utc();
    match c {
        // day
        'd' => write!(out, "{:02}", dt.day()),
        'D' => write!(out, "{}", dt.format("%a")),
        'j' => write!(out, "{}", dt.day()),
        'l' => write!(out, "{}", dt.format("%A")),
        'N' => write!(out, "{}", dt.weekday().number_from_monday()),
        'S' => out.write_str(ordinal_suffix(dt.day())),
        'w' => write!(out, "{}", dt.weekday().num_days_from_sunday()),
        'z' => write!(out, "{}", dt.ordinal0()),
        // week
        'W' => write!(out, "{:02}", dt.iso_week().week()),
        // month
        'F' => write!(out, "{}", dt.format("%B")),
        'm' => write!(out, "{:02}", dt.month()),
        'M' => write!(out, "{}", dt.format("%b")),
        'n' => write!(out, "{}", dt.month()),
        't' => write!(out, "{}", days_in_month(dt.year(), dt.month())),
        // year
        'L' => out.write_str(if is_leap_year(dt.year()) { "1" } else { "0" }),
        'o' => write!(out, "{}", dt.iso_week().year()),
        'Y' => write!(out, "{}", dt.year()),
        'y' => write!(out, "{:02}", dt.year().rem_euclid(100)),
        // time
        'a' => out.write_str(if dt.hour12().0 { "pm" } else { "am" }),
        'A' => out.write_str(if dt.hour12().0 { "PM" } else { "AM" }),
        'g' => write!(out, "{}", dt.hour12().1),
        'G' => write!(out, "{}", dt.hour()),
        'h' => write!(out, "{:02}", dt.hour12().1),
        'H' => write!(out, "{:02}", dt.hour()),
        'i' => write!(out, "{:02}", dt.minute()),
        's' => write!(out, "{:02}", dt.second()),
        'u' => write!(out, "{:06}", (dt.nanosecond() % 1_000_000_000) / 1_000),
        'v' => write!(out, "{:03}", (dt.nanosecond() % 1_000_000_000) / 1_000_000),
        // timezone
        'e' => out.write_str(zone_id),
        'T' => write!(out, "{}", dt.offset()),
        'P' => write_offset(out, offset_secs, true),
        'p' if offset_secs == 0 => out.write_str("Z"),
        'p' => write_offset(out, offset_secs, true),
        'O' => write_offset(out, offset_secs, false),
        'Z' => write!(out, "{}", offset_secs),
        // full date/time
        'c' => write!(out, "{}", dt.format("%Y-%m-%dT%H:%M:%S%:z")),
        'r' => write!(out, "{}", dt.format("%a, %d %b %Y %H:%M:%S %z")),
        'U' => write!(out, "{}", dt.timestamp()),
        other => out.write_char(other),
    }
}

fn write_offset(out: &mut String, secs: i32, colon: bool) -> fmt::Result {
    let sign = if secs < 0 { '-' } else { '+' };
    let abs = secs.abs();
    let (hours, minutes) = (abs / 3600, (abs % 3600) / 60);
    if colon {
        write!(out, "{}{:02}:{:02}", sign, hours, minutes)
    } else {
        write!(out, "{}{:02}{:02}", sign, hours, minutes)
    }
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn renders_iso_date() {
        assert_eq!(render_in("Y-m-d", instant("2024-01-01T00:00:00Z"), "UTC"), "2024-01-01");
    }

    #[test]
    fn renders_default_pattern() {
        let at = instant("2024-01-01T00:05:00Z");
        assert_eq!(render_in(DEFAULT_DATE_FORMAT, at, "UTC"), "January 1, 2024, 12:05 am");
        let at = instant("2024-03-22T15:30:00Z");
        assert_eq!(render_in(DEFAULT_DATE_FORMAT, at, "UTC"), "March 22, 2024, 3:30 pm");
    }

    #[test]
    fn applies_named_timezone() {
        let at = instant("2024-07-01T22:30:00Z");
        assert_eq!(render_in("Y-m-d H:i T", at, "Europe/Berlin"), "2024-07-02 00:30 CEST");
        assert_eq!(render_in("e P", at, "Europe/Berlin"), "Europe/Berlin +02:00");
    }

    #[test]
    fn applies_fixed_offsets() {
        let at = instant("2024-01-01T00:00:00Z");
        assert_eq!(render_in("H:i O", at, "-05:30"), "18:30 -0530");
        assert_eq!(render_in("H:i P", at, "+03"), "03:00 +03:00");
    }

    #[test]
    fn unknown_timezone_renders_in_utc() {
        let at = instant("2024-01-01T12:00:00Z");
        assert_eq!(render_in("H:i e", at, "Mars/Olympus"), "12:00 UTC");
    }

    #[test]
    fn escapes_and_unknown_letters_pass_through() {
        let at = instant("2024-02-03T04:05:06Z");
        assert_eq!(render_in("\\Y\\e\\a\\r: Y!", at, "UTC"), "Year: 2024!");
        assert_eq!(render_in("jS \\o\\f F", at, "UTC"), "3rd of February");
        assert_eq!(render_in("t L", at, "UTC"), "29 1");
    }

    #[test]
    fn full_datetime_letters() {
        let at = instant("2004-02-12T15:19:21Z");
        assert_eq!(render_in("c", at, "UTC"), "2004-02-12T15:19:21+00:00");
        assert_eq!(render_in("r", at, "UTC"), "Thu, 12 Feb 2004 15:19:21 +0000");
        assert_eq!(render_in("U", at, "UTC"), "1076599161");
        assert_eq!(render_in("p", at, "UTC"), "Z");
    }

    #[test]
    fn ordinal_suffixes() {
        assert_eq!(ordinal_suffix(1), "st");
        assert_eq!(ordinal_suffix(11), "th");
        assert_eq!(ordinal_suffix(22), "nd");
        assert_eq!(ordinal_suffix(13), "th");
        assert_eq!(ordinal_suffix(31), "st");
    }
}
