use std::ops::Sub;
use std::str::FromStr;
use thiserror::Error;

/// Minutes since the start of the service day.
///
/// GTFS clocks keep counting past midnight for overnight trips, so
/// "25:10:00" is a legal stamp and maps to 1510 minutes. Seconds are
/// truncated; schedules are modeled at minute resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Time(u32);

impl From<u32> for Time {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Sub<Time> for Time {
    type Output = i64;

    fn sub(self, rhs: Self) -> Self::Output {
        i64::from(self.0) - i64::from(rhs.0)
    }
}

impl Time {
    pub const fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    pub const fn as_minutes(&self) -> u32 {
        self.0
    }

    /// Parses an `HH:MM:SS` stamp, hours unbounded. Returns `None` for
    /// anything that does not look like a clock time.
    pub fn from_hms(time: &str) -> Option<Self> {
        let mut split = time.trim().split(':');
        let hours: u32 = split.next()?.trim().parse().ok()?;
        let minutes: u32 = split.next()?.trim().parse().ok()?;
        if minutes >= 60 {
            return None;
        }
        if let Some(seconds) = split.next() {
            let seconds: u32 = seconds.trim().parse().ok()?;
            if seconds >= 60 {
                return None;
            }
        }
        if split.next().is_some() {
            return None;
        }
        Some(Self(hours * 60 + minutes))
    }
}

#[derive(Error, Debug)]
pub enum ParseWindowError {
    #[error("expected a window like 0700_0800, got {0:?}")]
    InvalidFormat(String),
    #[error("window {0:?} ends before it starts")]
    Inverted(String),
}

/// Inclusive analysis window, parsed from `HHMM_HHMM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Time,
    pub end: Time,
}

impl TimeWindow {
    pub const fn new(start: Time, end: Time) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: Time) -> bool {
        self.start <= time && time <= self.end
    }

    pub fn length_minutes(&self) -> u32 {
        self.end.as_minutes() - self.start.as_minutes()
    }
}

impl FromStr for TimeWindow {
    type Err = ParseWindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseWindowError::InvalidFormat(s.to_string());
        let (start, end) = s.trim().split_once('_').ok_or_else(invalid)?;
        let start = parse_hhmm(start).ok_or_else(invalid)?;
        let end = parse_hhmm(end).ok_or_else(invalid)?;
        if end < start {
            return Err(ParseWindowError::Inverted(s.to_string()));
        }
        Ok(Self { start, end })
    }
}

fn parse_hhmm(part: &str) -> Option<Time> {
    if part.len() != 4 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: u32 = part[..2].parse().ok()?;
    let minutes: u32 = part[2..].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    Some(Time::from_minutes(hours * 60 + minutes))
}

#[test]
fn valid_time_test_1() {
    assert_eq!(Time::from_hms("00:00:00").unwrap().as_minutes(), 0);
}

#[test]
fn valid_time_test_2() {
    assert_eq!(Time::from_hms("07:10:00").unwrap().as_minutes(), 430);
}

#[test]
fn valid_time_test_3() {
    // seconds are truncated, not rounded
    assert_eq!(Time::from_hms("00:01:59").unwrap().as_minutes(), 1);
}

#[test]
fn overnight_time_test() {
    assert_eq!(Time::from_hms("25:10:00").unwrap().as_minutes(), 1510);
}

#[test]
fn invalid_time_test_1() {
    assert!(Time::from_hms("00:00:0a").is_none())
}

#[test]
fn invalid_time_test_2() {
    assert!(Time::from_hms("07:65:00").is_none())
}

#[test]
fn invalid_time_test_3() {
    assert!(Time::from_hms("").is_none())
}

#[test]
fn window_parse_test() {
    let window: TimeWindow = "0700_0800".parse().unwrap();
    assert_eq!(window.start.as_minutes(), 420);
    assert_eq!(window.end.as_minutes(), 480);
    assert_eq!(window.length_minutes(), 60);
}

#[test]
fn window_bounds_inclusive_test() {
    let window: TimeWindow = "0700_0800".parse().unwrap();
    assert!(window.contains(Time::from_minutes(420)));
    assert!(window.contains(Time::from_minutes(480)));
    assert!(!window.contains(Time::from_minutes(481)));
    assert!(!window.contains(Time::from_minutes(419)));
}

#[test]
fn window_invalid_test() {
    assert!("0700-0800".parse::<TimeWindow>().is_err());
    assert!("07000800".parse::<TimeWindow>().is_err());
    assert!("0800_0700".parse::<TimeWindow>().is_err());
    assert!("07a0_0800".parse::<TimeWindow>().is_err());
}
