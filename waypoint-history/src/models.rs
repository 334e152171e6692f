use std::collections::BTreeMap;

use arrayvec::ArrayString;
use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// Calendar day key ("YYYY-MM-DD") - always 10 characters, stored inline.
pub type DayKey = ArrayString<10>;

/// Every sample recorded for one identity, bucketed by day.
pub type DayMap = BTreeMap<DayKey, Vec<Sample>>;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// One recorded position of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
  pub x: i64,
  pub y: i64,
  pub z: i64,
  /// Unix timestamp of the ingestion cycle that recorded this sample
  #[serde(rename = "t")]
  pub time: i64,
}

/// Day bucket key for an instant, in that instant's own time zone.
pub fn day_key<Tz>(now: &DateTime<Tz>) -> DayKey
where
  Tz: TimeZone,
  Tz::Offset: std::fmt::Display,
{
  let mut key = DayKey::new();
  // Years past 9999 do not fit; such keys end up truncated and get swept as unparseable.
  for c in now.format(DAY_FORMAT).to_string().chars() {
    if key.try_push(c).is_err() {
      break;
    }
  }
  key
}

/// Parse a day key back into a date. None for anything that is not "YYYY-MM-DD".
pub fn parse_day(key: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(key, DAY_FORMAT).ok()
}

/// Storage key for a raw identity: colons become underscores so the key is a safe file name.
pub fn normalize_identity(raw: &str) -> String {
  raw.replace(':', "_")
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  #[test]
  fn test_day_key_format() {
    let now = Utc.with_ymd_and_hms(2024, 3, 7, 23, 59, 59).unwrap();
    assert_eq!(day_key(&now).as_str(), "2024-03-07");
  }

  #[test]
  fn test_parse_day() {
    assert_eq!(parse_day("2024-01-01"), NaiveDate::from_ymd_opt(2024, 1, 1));
    assert!(parse_day("yesterday").is_none());
    assert!(parse_day("2024-13-01").is_none());
  }

  #[test]
  fn test_normalize_identity() {
    assert_eq!(normalize_identity("steam:11000010a1b2c3d"), "steam_11000010a1b2c3d");
    assert_eq!(normalize_identity("license:a:b"), "license_a_b");
    assert_eq!(normalize_identity("plain"), "plain");
  }

  #[test]
  fn test_sample_wire_format() {
    let sample = Sample { x: 1, y: 2, z: 3, time: 100 };
    let json = serde_json::to_value(sample).unwrap();
    assert_eq!(json, serde_json::json!({"x": 1, "y": 2, "z": 3, "t": 100}));
  }
}
