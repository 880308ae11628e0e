use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const LATITUDE_RANGE: RangeInclusive<f64> = 35.0..=45.0;
pub const LONGITUDE_RANGE: RangeInclusive<f64> = -120.0..=-70.0;
pub const COORDINATE_DECIMALS: i32 = 6;

/// Wire format of `dateTime`: local wall-clock time, second precision, no offset.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const DEFAULT_ROSTER: [&str; 6] = ["Alice", "Bob", "Charlie", "David", "Eve", "Frank"];

/// One simulated location fix for a user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationEvent {
    pub latitude: f64,
    pub longitude: f64,
    pub user_id: String,
    #[serde(with = "date_time")]
    pub date_time: NaiveDateTime,
}

impl LocationEvent {
    pub fn new(lat: f64, lon: f64, user_id: &str, date_time: NaiveDateTime) -> Self {
        Self {
            latitude: round_coordinate(lat),
            longitude: round_coordinate(lon),
            user_id: user_id.to_string(),
            date_time: date_time.with_nanosecond(0).unwrap_or(date_time),
        }
    }

    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

pub fn round_coordinate(value: f64) -> f64 {
    let scale = 10f64.powi(COORDINATE_DECIMALS);
    (value * scale).round() / scale
}

mod date_time {
    use super::DATE_TIME_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&value.format(DATE_TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, DATE_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}
