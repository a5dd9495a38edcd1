//! Parsing of status SMS sent by the heating controller.
//!
//! The controller speaks two dialects. A normal status report lists one line per zone:
//!
//! ```text
//! Hovedenhet: PÅ 21C T
//! "Stua1": AV, --C
//! ```
//!
//! A frost-protection report is recognised by the `Temp knt: PÅ` marker. Zone names and
//! values may sit on separate lines, so a cursor tracks the zone the next values belong to.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use crate::models::{ParsedMessage, Zone};

pub const FROST_PROTECTION_MARKER: &str = "Temp knt: PÅ";
pub const HEATING_ON: &str = "PÅ";
pub const UNKNOWN_TEMPERATURE: &str = "--";

static MAIN_UNIT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Hovedenhet: (?P<state>PÅ|AV)\s+(?P<temp>-?\d+|--)C\s*(?P<flag>T)?")
        .expect("main unit grammar is a valid regex")
});

static ROOM_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?P<room>Stua1|Stua2|Sov1)": (?P<state>PÅ|AV), (?P<temp>-?\d+|--)C\s*(?P<flag>T)?"#)
        .expect("room grammar is a valid regex")
});

static FROST_VALUE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?P<zone>Hovedenhet|"[^"]+"):\s*(?P<state>PÅ|AV)\s+(?P<temp>-?\d+|--)C"#)
        .expect("frost protection grammar is a valid regex")
});

/// Values read from one recognised zone line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMatch {
    pub heating_on: bool,
    pub temperature: Option<i32>,
    pub frost_protection: bool,
}

impl LineMatch {
    /// `None` when the temperature does not fit, which leaves the line unrecognised.
    fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        Some(Self {
            heating_on: &caps["state"] == HEATING_ON,
            temperature: parse_temperature(&caps["temp"])?,
            frost_protection: caps.name("flag").is_some(),
        })
    }
}

/// Parses a raw controller message. Unrecognised lines are skipped.
pub fn parse(message: &str) -> ParsedMessage {
    let frost_protection_report = is_frost_protection_report(message);
    let parsed = if frost_protection_report {
        parse_frost_protection_report(message)
    } else {
        parse_status_report(message)
    };

    debug!(
        zones = parsed.temperatures.len(),
        frost_protection_report,
        "parsed controller message"
    );

    parsed
}

pub fn is_frost_protection_report(message: &str) -> bool {
    message
        .lines()
        .any(|line| line.contains(FROST_PROTECTION_MARKER))
}

/// `Hovedenhet: <PÅ|AV> <N|-->C [T]`
pub fn match_main_unit_line(line: &str) -> Option<LineMatch> {
    MAIN_UNIT_LINE
        .captures(line)
        .and_then(|caps| LineMatch::from_captures(&caps))
}

/// `"<room>": <PÅ|AV>, <N|-->C [T]`
pub fn match_room_line(line: &str) -> Option<(Zone, LineMatch)> {
    let caps = ROOM_LINE.captures(line)?;
    let zone = caps["room"].parse().ok()?;
    Some((zone, LineMatch::from_captures(&caps)?))
}

/// `(Hovedenhet|"<name>"): <PÅ|AV> <N|-->C` inside a frost-protection report.
///
/// The matched zone name is ignored; values always belong to the cursor. These lines
/// carry no flag token, so `frost_protection` is always false.
pub fn match_frost_value_line(line: &str) -> Option<LineMatch> {
    FROST_VALUE_LINE
        .captures(line)
        .and_then(|caps| LineMatch::from_captures(&caps))
}

/// First quoted room name found in the line, checked in `Stua1`, `Stua2`, `Sov1` order.
pub fn room_marker(line: &str) -> Option<Zone> {
    Zone::ROOMS
        .into_iter()
        .find(|room| line.contains(&format!("\"{}\"", room.name())))
}

/// `Some(None)` for the `--` unknown token, never zero. `None` when the digits
/// overflow an i32.
fn parse_temperature(token: &str) -> Option<Option<i32>> {
    if token == UNKNOWN_TEMPERATURE {
        return Some(None);
    }
    token.parse().ok().map(Some)
}

fn parse_status_report(message: &str) -> ParsedMessage {
    let mut parsed = ParsedMessage::new(message);

    for line in message.lines() {
        if let Some(m) = match_main_unit_line(line) {
            record(&mut parsed, Zone::Main, m);
            continue;
        }

        if let Some((room, m)) = match_room_line(line) {
            record(&mut parsed, room, m);
        }
    }

    parsed
}

fn parse_frost_protection_report(message: &str) -> ParsedMessage {
    let mut parsed = ParsedMessage::new(message);
    let mut cursor = Zone::Main;

    for line in message.lines() {
        if let Some(room) = room_marker(line) {
            cursor = room;
        }

        if let Some(m) = match_frost_value_line(line) {
            parsed.is_heating_on.insert(cursor, m.heating_on);
            parsed.temperatures.insert(cursor, m.temperature);
            continue;
        }

        if line.contains(FROST_PROTECTION_MARKER) {
            parsed.is_frost_protection_on.insert(cursor, true);
        }
    }

    parsed
}

fn record(parsed: &mut ParsedMessage, zone: Zone, m: LineMatch) {
    parsed.is_heating_on.insert(zone, m.heating_on);
    parsed.temperatures.insert(zone, m.temperature);
    parsed.is_frost_protection_on.insert(zone, m.frost_protection);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_unit_line_with_flag() {
        let m = match_main_unit_line("Hovedenhet: PÅ 21C T").unwrap();
        assert!(m.heating_on);
        assert_eq!(m.temperature, Some(21));
        assert!(m.frost_protection);
    }

    #[test]
    fn test_main_unit_line_without_flag() {
        let m = match_main_unit_line("Hovedenhet: AV 5C").unwrap();
        assert!(!m.heating_on);
        assert_eq!(m.temperature, Some(5));
        assert!(!m.frost_protection);
    }

    #[test]
    fn test_main_unit_line_negative_temperature() {
        let m = match_main_unit_line("Hovedenhet: AV -3C").unwrap();
        assert_eq!(m.temperature, Some(-3));
    }

    #[test]
    fn test_main_unit_line_unknown_temperature_is_none_not_zero() {
        let m = match_main_unit_line("Hovedenhet: PÅ --C").unwrap();
        assert_eq!(m.temperature, None);
    }

    #[test]
    fn test_main_unit_line_rejects_other_state_tokens() {
        assert!(match_main_unit_line("Hovedenhet: ON 21C").is_none());
        assert!(match_main_unit_line("Hovedenhet: PÅ C").is_none());
    }

    #[test]
    fn test_overflowing_temperature_is_not_unknown() {
        assert!(match_main_unit_line("Hovedenhet: PÅ 99999999999C").is_none());
        assert!(match_room_line(r#""Sov1": AV, 99999999999C"#).is_none());

        let parsed = parse("Hovedenhet: PÅ 99999999999C\n\"Stua1\": AV, --C");
        assert!(!parsed.temperatures.contains_key(&Zone::Main));
        assert_eq!(parsed.temperatures.get(&Zone::Stua1), Some(&None));
    }

    #[test]
    fn test_room_line_requires_comma() {
        assert!(match_room_line(r#""Stua1": PÅ 21C"#).is_none());
        let (zone, m) = match_room_line(r#""Stua1": PÅ, 21C"#).unwrap();
        assert_eq!(zone, Zone::Stua1);
        assert_eq!(m.temperature, Some(21));
    }

    #[test]
    fn test_room_line_rejects_unknown_room() {
        assert!(match_room_line(r#""Kjokken": PÅ, 21C"#).is_none());
    }

    #[test]
    fn test_frost_value_line_accepts_any_quoted_name() {
        let m = match_frost_value_line(r#""Kjokken": AV 7C"#).unwrap();
        assert!(!m.heating_on);
        assert_eq!(m.temperature, Some(7));
    }

    #[test]
    fn test_room_marker_order() {
        assert_eq!(room_marker(r#""Sov1" og "Stua2""#), Some(Zone::Stua2));
        assert_eq!(room_marker("Stua1"), None);
    }

    #[test]
    fn test_frost_cursor_moves_before_value_match_on_same_line() {
        let parsed = parse("Temp knt: PÅ\n\"Sov1\": PÅ 12C");

        assert_eq!(parsed.temperatures.get(&Zone::Sov1), Some(&Some(12)));
        assert_eq!(parsed.is_heating_on.get(&Zone::Sov1), Some(&true));
        assert!(!parsed.temperatures.contains_key(&Zone::Main));
        assert_eq!(parsed.is_frost_protection_on.get(&Zone::Main), Some(&true));
    }

    #[test]
    fn test_frost_value_line_skips_marker_check() {
        let parsed = parse("Hovedenhet: PÅ 10C Temp knt: PÅ");

        assert_eq!(parsed.temperatures.get(&Zone::Main), Some(&Some(10)));
        assert!(parsed.is_frost_protection_on.is_empty());
    }

    #[test]
    fn test_frost_marker_on_room_line_marks_room() {
        let parsed = parse("\"Stua1\" Temp knt: PÅ");

        assert_eq!(parsed.is_frost_protection_on.get(&Zone::Stua1), Some(&true));
        assert!(parsed.temperatures.is_empty());
    }

    #[test]
    fn test_normal_report_ignores_noise() {
        let parsed = parse("Status\nukjent linje\n");
        assert!(parsed.temperatures.is_empty());
        assert!(parsed.is_heating_on.is_empty());
        assert!(parsed.is_frost_protection_on.is_empty());
        assert_eq!(parsed.text, "Status\nukjent linje\n");
    }

    #[test]
    fn test_crlf_line_endings() {
        let parsed = parse("Hovedenhet: PÅ 20C\r\n\"Sov1\": AV, 16C\r\n");
        assert_eq!(parsed.temperatures.get(&Zone::Main), Some(&Some(20)));
        assert_eq!(parsed.temperatures.get(&Zone::Sov1), Some(&Some(16)));
    }
}
