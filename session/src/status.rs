//! Device status snapshots ("heartbeats").

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Operating mode reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceMode {
    /// Device decides by itself based on the rain sensor.
    Auto,
    /// Operator forced the line open.
    ForceOpen,
    /// Operator forced the line closed.
    ForceClose,
}

impl DeviceMode {
    /// Parse a mode token. Unknown tokens map to `None`, not an error.
    pub fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("AUTO") {
            Some(DeviceMode::Auto)
        } else if token.eq_ignore_ascii_case("FORCE_OPEN") {
            Some(DeviceMode::ForceOpen)
        } else if token.eq_ignore_ascii_case("FORCE_CLOSE") {
            Some(DeviceMode::ForceClose)
        } else {
            None
        }
    }
}

/// One observed device snapshot plus its local receipt time.
///
/// Every device-supplied field is independently optional because the
/// heartbeat payload is not guaranteed complete. `received_at` is always
/// present; it is stamped by the session at the moment the message is
/// accepted, never supplied by the device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRecord {
    /// Ambient temperature in degrees Celsius.
    pub temp_c: Option<f64>,
    /// Relative humidity in percent.
    pub humidity: Option<f64>,
    /// Whether the rain sensor currently detects precipitation.
    pub rain: Option<bool>,
    /// Operating mode the device reports itself in.
    pub mode: Option<DeviceMode>,
    /// Device uptime in milliseconds.
    pub uptime_ms: Option<u64>,
    /// Local time the heartbeat was accepted.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub received_at: DateTime<Utc>,
}

impl StatusRecord {
    /// Decode a heartbeat payload.
    ///
    /// Returns `None` when the payload is not a JSON object. Recognized
    /// fields are extracted individually; a missing field or one with an
    /// unexpected type maps to `None` instead of failing the whole
    /// message. Unknown fields are ignored.
    pub fn decode(payload: &[u8], received_at: DateTime<Utc>) -> Option<Self> {
        let value: Value = serde_json::from_slice(payload).ok()?;
        let map = value.as_object()?;

        Some(StatusRecord {
            temp_c: map.get("temp_c").and_then(Value::as_f64),
            humidity: map.get("humidity").and_then(Value::as_f64),
            rain: map.get("rain").and_then(Value::as_bool),
            mode: map
                .get("mode")
                .and_then(Value::as_str)
                .and_then(DeviceMode::parse),
            uptime_ms: map.get("uptime_ms").and_then(Value::as_u64),
            received_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn decodes_a_complete_heartbeat() {
        let payload =
            br#"{"temp_c": 24.5, "humidity": 61.0, "rain": true, "mode": "FORCE_OPEN", "uptime_ms": 123456}"#;
        let at = now();
        let record = StatusRecord::decode(payload, at).unwrap();

        assert_eq!(record.temp_c, Some(24.5));
        assert_eq!(record.humidity, Some(61.0));
        assert_eq!(record.rain, Some(true));
        assert_eq!(record.mode, Some(DeviceMode::ForceOpen));
        assert_eq!(record.uptime_ms, Some(123456));
        assert_eq!(record.received_at, at);
    }

    #[test]
    fn missing_fields_map_to_absent() {
        let record = StatusRecord::decode(br#"{"temp_c": 24.5, "mode": "AUTO"}"#, now()).unwrap();

        assert_eq!(record.temp_c, Some(24.5));
        assert_eq!(record.mode, Some(DeviceMode::Auto));
        assert_eq!(record.humidity, None);
        assert_eq!(record.rain, None);
        assert_eq!(record.uptime_ms, None);
    }

    #[test]
    fn mistyped_fields_map_to_absent() {
        let payload = br#"{"temp_c": "hot", "rain": "yes", "mode": 3, "uptime_ms": -5}"#;
        let record = StatusRecord::decode(payload, now()).unwrap();

        assert_eq!(record.temp_c, None);
        assert_eq!(record.rain, None);
        assert_eq!(record.mode, None);
        assert_eq!(record.uptime_ms, None);
    }

    #[test]
    fn unknown_mode_token_maps_to_absent() {
        let record = StatusRecord::decode(br#"{"mode": "HALF_OPEN"}"#, now()).unwrap();
        assert_eq!(record.mode, None);

        let record = StatusRecord::decode(br#"{"mode": "force_close"}"#, now()).unwrap();
        assert_eq!(record.mode, Some(DeviceMode::ForceClose));
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let record =
            StatusRecord::decode(br#"{"firmware": "1.2.0", "rssi": -60, "rain": false}"#, now())
                .unwrap();
        assert_eq!(record.rain, Some(false));
    }

    #[test]
    fn non_object_payloads_are_rejected() {
        assert!(StatusRecord::decode(b"", now()).is_none());
        assert!(StatusRecord::decode(b"hello", now()).is_none());
        assert!(StatusRecord::decode(b"[1, 2, 3]", now()).is_none());
        assert!(StatusRecord::decode(b"42", now()).is_none());
        assert!(StatusRecord::decode(b"{\"temp_c\": ", now()).is_none());
    }

    #[test]
    fn serializes_mode_in_wire_casing() {
        let record = StatusRecord::decode(br#"{"mode": "FORCE_OPEN"}"#, now()).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["mode"], "FORCE_OPEN");
        assert!(json["received_at"].is_i64());
    }
}
