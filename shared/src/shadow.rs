//! Shadow update document
//!
//! Partial updates are published to the thing's shadow update topic as
//! ```text
//! {"state": {"reported": {"<key>": <value>}}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which half of the shadow an update targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Reported,
    Desired,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Reported => "reported",
            ReportKind::Desired => "desired",
        }
    }
}

/// Topic that accepts partial updates for `thing`
pub fn update_topic(thing: &str) -> String {
    format!("$aws/things/{}/shadow/update", thing)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowDocument {
    pub state: ShadowState,
}

impl ShadowDocument {
    /// Document carrying a single key under `kind`
    pub fn single(kind: ReportKind, key: impl Into<String>, value: Value) -> Self {
        let mut entries = Map::new();
        entries.insert(key.into(), value);

        let state = match kind {
            ReportKind::Reported => ShadowState {
                reported: Some(entries),
                desired: None,
            },
            ReportKind::Desired => ShadowState {
                reported: None,
                desired: Some(entries),
            },
        };

        Self { state }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_topic() {
        assert_eq!(update_topic("pi-01"), "$aws/things/pi-01/shadow/update");
    }

    #[test]
    fn test_reported_payload_shape() {
        let doc = ShadowDocument::single(ReportKind::Reported, "vstream", json!("Running"));
        let value: Value = serde_json::from_slice(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(value, json!({"state": {"reported": {"vstream": "Running"}}}));
    }

    #[test]
    fn test_desired_payload_omits_reported() {
        let doc = ShadowDocument::single(ReportKind::Desired, "light", json!(1));
        let value: Value = serde_json::from_slice(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(value, json!({"state": {"desired": {"light": 1}}}));
    }

    #[test]
    fn test_parse_partial_document() {
        let doc = ShadowDocument::from_slice(br#"{"state":{"reported":{"a":"b"}}}"#).unwrap();
        assert!(doc.state.desired.is_none());
        assert_eq!(doc.state.reported.unwrap()["a"], json!("b"));
    }
}
