// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Data structures for inbound telemetry frames and persisted camera events.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{
    error::{SessionError, SessionResult},
    registry::DeviceId,
};

/// One decoded telemetry frame as sent by a camera device.
///
/// Wire format is a UTF-8 JSON text frame:
/// `{"motionDetected": bool, "timestamp": <ISO-8601 offset datetime>, "object": string}`.
/// Transient; converted into a [`CameraEvent`] immediately after decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Whether the device detected motion.
    #[serde(rename = "motionDetected")]
    pub motion_detected: bool,
    /// Device-local observation instant, offset-aware.
    pub timestamp: DateTime<FixedOffset>,
    /// Label of the detected object.
    pub object: String,
}

/// Decodes a raw text frame into a [`TelemetryFrame`].
///
/// # Errors
///
/// Returns an error if the payload is not valid JSON for the telemetry schema.
pub fn parse_telemetry_frame(text: &str) -> SessionResult<TelemetryFrame> {
    serde_json::from_str(text).map_err(|e| SessionError::Json(e.to_string()))
}

/// A persisted motion-detection event.
///
/// Built only from a successfully decoded [`TelemetryFrame`] inside a
/// connection session; immutable once created. Ownership passes to the
/// [`EventSink`](crate::sink::EventSink) on append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraEvent {
    /// The originating device.
    pub device_id: DeviceId,
    /// Whether the device detected motion.
    pub motion_detected: bool,
    /// Device-local observation instant.
    pub timestamp: DateTime<FixedOffset>,
    /// Label of the detected object.
    pub object: String,
}

impl CameraEvent {
    /// Creates a new [`CameraEvent`] from a decoded frame.
    #[must_use]
    pub fn from_frame(device_id: DeviceId, frame: TelemetryFrame) -> Self {
        Self {
            device_id,
            motion_detected: frame.motion_detected,
            timestamp: frame.timestamp,
            object: frame.object,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_parse_valid_frame() {
        let json = r#"{
            "motionDetected": true,
            "timestamp": "2024-01-01T00:00:00+00:00",
            "object": "person"
        }"#;

        let frame = parse_telemetry_frame(json).unwrap();
        assert!(frame.motion_detected);
        assert_eq!(frame.object, "person");
        assert_eq!(frame.timestamp.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[rstest]
    fn test_parse_preserves_offset() {
        let json = r#"{"motionDetected": false, "timestamp": "2024-06-15T09:30:00+02:00", "object": "vehicle"}"#;

        let frame = parse_telemetry_frame(json).unwrap();
        assert_eq!(frame.timestamp.offset().local_minus_utc(), 2 * 3600);
    }

    #[rstest]
    #[case("not json at all")]
    #[case(r#"{"motionDetected": "yes", "timestamp": "2024-01-01T00:00:00+00:00", "object": "person"}"#)]
    #[case(r#"{"timestamp": "2024-01-01T00:00:00+00:00", "object": "person"}"#)]
    #[case(r#"{"motionDetected": true, "timestamp": "yesterday", "object": "person"}"#)]
    fn test_parse_malformed_frame(#[case] payload: &str) {
        assert!(matches!(
            parse_telemetry_frame(payload),
            Err(SessionError::Json(_))
        ));
    }

    #[rstest]
    fn test_event_from_frame() {
        let frame = parse_telemetry_frame(
            r#"{"motionDetected": true, "timestamp": "2024-01-01T00:00:00+00:00", "object": "person"}"#,
        )
        .unwrap();

        let event = CameraEvent::from_frame(DeviceId(7), frame.clone());
        assert_eq!(event.device_id, DeviceId(7));
        assert_eq!(event.motion_detected, frame.motion_detected);
        assert_eq!(event.timestamp, frame.timestamp);
        assert_eq!(event.object, frame.object);
    }
}
